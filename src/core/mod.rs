//! Core pipeline building blocks: configuration, the staging layout, GCP
//! extraction, cutline handling, per-plate rectification, mosaic ordering
//! and failure reporting. These are internal primitives consumed by the
//! high-level `api` module.
pub mod cutline;
pub mod footprint;
pub mod gcp;
pub mod layout;
pub mod mosaic;
pub mod params;
pub mod rectify;
pub mod report;
