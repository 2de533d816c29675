pub mod export;
pub mod formatter;

pub use export::{to_csv, to_json, write_output, ProviderDocument, ReportDocument};
pub use formatter::{format_count, render_table};
