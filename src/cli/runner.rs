use tracing::info;
use tracing_subscriber::EnvFilter;

use platewarp::api::{
    check_inputs, create_xyz, download_inputs, mosaic_plates, transform_masks, warp_plates,
};
use platewarp::core::layout::StagingLayout;
use platewarp::core::mosaic::LargestFirst;
use platewarp::io::fetch::HttpAnnotationService;
use platewarp::io::tools::GdalCommandLine;
use platewarp::{GdalReprojector, PipelineConfig, Step};

use super::args::CliArgs;
use super::errors::AppError;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(args: &CliArgs) -> Result<PipelineConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => {
            PipelineConfig::from_json_file(path).map_err(|source| AppError::Config {
                path: path.clone(),
                source,
            })?
        }
        None => PipelineConfig::default(),
    };
    if let Some(crs) = &args.target_crs {
        config.target_crs = crs.clone();
    }
    Ok(config)
}

fn required_identifier(args: &CliArgs) -> Result<&str, AppError> {
    args.identifier.as_deref().ok_or(AppError::MissingArgument {
        arg: "--identifier".to_string(),
    })
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(args.log);

    let config = load_config(&args)?;
    let layout = StagingLayout::new(&args.workdir);
    layout.ensure().map_err(AppError::from)?;
    info!("Running step {} in {:?}", args.step, layout.root());

    let toolkit = GdalCommandLine::new(config.tools.clone());

    match args.step {
        Step::DownloadInputs => {
            let identifier = required_identifier(&args)?;
            let service = HttpAnnotationService::new().map_err(AppError::from)?;
            download_inputs(identifier, &layout, &config, &service).map_err(AppError::from)?;
        }
        Step::CheckInputs => {
            let check = check_inputs(&layout, &config).map_err(AppError::from)?;
            if !check.is_clean() {
                let problems = check.unreadable.len()
                    + check.unexpected_bands.len()
                    + check.missing_sources.len()
                    + check.malformed_annotations.len();
                return Err(AppError::InputsIncomplete { problems }.into());
            }
        }
        Step::AllmapsTransform => {
            let service = HttpAnnotationService::new().map_err(AppError::from)?;
            transform_masks(&layout, &config, &service, &toolkit).map_err(AppError::from)?;
        }
        Step::WarpPlates => {
            let reprojector = GdalReprojector::new(&config.source_crs, &config.target_crs)
                .map_err(|e| AppError::from(platewarp::Error::from(e)))?;
            warp_plates(&layout, &config, &toolkit, &reprojector).map_err(AppError::from)?;
        }
        Step::MosaicPlates => {
            mosaic_plates(
                &layout,
                &config,
                &toolkit,
                args.order_file.as_deref(),
                &LargestFirst,
            )
            .map_err(AppError::from)?;
        }
        Step::CreateXyz => {
            create_xyz(&layout, &config, &toolkit).map_err(AppError::from)?;
        }
    }

    info!("Step {} finished", args.step);
    Ok(())
}
