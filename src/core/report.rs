//! Per-run failure collection.
//!
//! Failures are grouped by `FailureClass`, printed as a table with a
//! remediation link per plate, and persisted as a CSV restart manifest that
//! the next mask-transform run reads to retry only those plates.
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::types::FailureClass;

/// One plate that needs manual remediation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub class: FailureClass,
    pub plate_id: String,
    pub remediation_url: String,
    pub detail: String,
    pub recorded_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct FailureReport {
    entries: Vec<Failure>,
}

impl FailureReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        class: FailureClass,
        plate_id: &str,
        remediation_url: String,
        detail: impl Into<String>,
    ) {
        let detail = detail.into();
        warn!("{} [{}]: {}", plate_id, class, detail);
        self.entries.push(Failure {
            class,
            plate_id: plate_id.to_string(),
            remediation_url,
            detail,
            recorded_at: chrono::Utc::now().to_rfc3339(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Failure] {
        &self.entries
    }

    pub fn count(&self, class: FailureClass) -> usize {
        self.entries.iter().filter(|f| f.class == class).count()
    }

    /// Distinct plate identifiers, in first-recorded order
    pub fn plate_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for f in &self.entries {
            if !ids.contains(&f.plate_id) {
                ids.push(f.plate_id.clone());
            }
        }
        ids
    }

    pub fn by_class(&self) -> BTreeMap<FailureClass, Vec<&Failure>> {
        let mut groups: BTreeMap<FailureClass, Vec<&Failure>> = BTreeMap::new();
        for f in &self.entries {
            groups.entry(f.class).or_default().push(f);
        }
        groups
    }

    /// Console table: one section per failure class, one row per plate
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        for (class, failures) in self.by_class() {
            let id_width = failures
                .iter()
                .map(|f| f.plate_id.len())
                .max()
                .unwrap_or(0)
                .max("plate".len());
            out.push_str(&format!("{} ({})\n", class.remediation(), failures.len()));
            out.push_str(&format!("  {:<id_width$}  {}\n", "plate", "remediation"));
            out.push_str(&format!("  {}  {}\n", "-".repeat(id_width), "-".repeat(11)));
            for f in failures {
                out.push_str(&format!("  {:<id_width$}  {}\n", f.plate_id, f.remediation_url));
            }
            out.push('\n');
        }
        out
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for f in &self.entries {
            writer.serialize(f)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut entries = Vec::new();
        for row in reader.deserialize() {
            entries.push(row?);
        }
        Ok(Self { entries })
    }

    /// Print the table and persist the restart manifest, or remove a stale
    /// manifest when the run had no failures.
    pub fn finish(&self, manifest: &Path) -> Result<()> {
        if self.is_empty() {
            if manifest.exists() {
                std::fs::remove_file(manifest)?;
                info!("No failures; removed restart manifest {:?}", manifest);
            }
            return Ok(());
        }
        warn!(
            "{} plate(s) need attention:\n{}",
            self.len(),
            self.render_table()
        );
        self.write_csv(manifest)?;
        info!("Restart manifest written to {:?}", manifest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FailureReport {
        let mut r = FailureReport::new();
        r.record(FailureClass::InsufficientPoints, "a1", "https://e/a1".into(), "2 points");
        r.record(FailureClass::BadMask, "b2", "https://e/b2".into(), "gdalwarp failed");
        r.record(FailureClass::InsufficientPoints, "c3", "https://e/c3".into(), "collinear");
        r.record(FailureClass::NoCutline, "a1", "https://e/a1".into(), "empty");
        r
    }

    #[test]
    fn groups_and_counts() {
        let r = sample();
        assert_eq!(r.len(), 4);
        assert_eq!(r.count(FailureClass::InsufficientPoints), 2);
        assert_eq!(r.plate_ids(), vec!["a1", "b2", "c3"]);
        let groups = r.by_class();
        assert_eq!(groups[&FailureClass::InsufficientPoints].len(), 2);
    }

    #[test]
    fn table_lists_each_plate_with_link() {
        let table = sample().render_table();
        assert!(table.contains("fix maps with insufficient points (2)"));
        assert!(table.contains("fix maps with bad masks (1)"));
        assert!(table.contains("a1"));
        assert!(table.contains("https://e/c3"));
    }

    #[test]
    fn csv_round_trip_preserves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failures.csv");
        let r = sample();
        r.write_csv(&path).unwrap();
        let back = FailureReport::read_csv(&path).unwrap();
        assert_eq!(back.entries(), r.entries());
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("class,plate_id,remediation_url,detail,recorded_at"));
        assert!(text.contains("insufficient-points,a1,"));
    }

    #[test]
    fn finish_writes_or_clears_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failures.csv");
        sample().finish(&path).unwrap();
        assert!(path.exists());
        FailureReport::new().finish(&path).unwrap();
        assert!(!path.exists());
    }
}
