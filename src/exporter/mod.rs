mod exporter;

pub use exporter::{ExportOptions, StateExporter};
