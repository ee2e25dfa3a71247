use clap::Parser;
use std::path::PathBuf;

use platewarp::Step;

#[derive(Parser, Debug)]
#[command(
    name = "platewarp",
    version,
    about = "Georeference historical atlas plates and publish them as XYZ tiles"
)]
pub struct CliArgs {
    /// Pipeline step to run
    #[arg(long, value_enum, default_value_t = Step::DownloadInputs)]
    pub step: Step,

    /// Catalog identifier of the atlas (required by download-inputs)
    #[arg(long)]
    pub identifier: Option<String>,

    /// Work directory holding the tmp/ and output/ trees
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    /// JSON pipeline configuration; omitted keys keep their defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Explicit mosaic merge order, one path per line (default: tmp/mosaic-order.txt)
    #[arg(long)]
    pub order_file: Option<PathBuf>,

    /// Override the target CRS (e.g., EPSG:3857)
    #[arg(long)]
    pub target_crs: Option<String>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_download_in_current_directory() {
        let args = CliArgs::parse_from(["platewarp", "--identifier", "abc"]);
        assert_eq!(args.step, Step::DownloadInputs);
        assert_eq!(args.workdir, PathBuf::from("."));
        assert_eq!(args.identifier.as_deref(), Some("abc"));
        assert!(!args.log);
    }

    #[test]
    fn mask_transform_is_an_alias() {
        let args = CliArgs::parse_from(["platewarp", "--step", "mask-transform"]);
        assert_eq!(args.step, Step::AllmapsTransform);
        let args = CliArgs::parse_from(["platewarp", "--step", "mosaic-plates", "--order-file", "o.txt"]);
        assert_eq!(args.step, Step::MosaicPlates);
        assert_eq!(args.order_file, Some(PathBuf::from("o.txt")));
    }

    #[test]
    fn unknown_step_is_rejected() {
        assert!(CliArgs::try_parse_from(["platewarp", "--step", "sharpen"]).is_err());
    }
}
