pub mod export;
pub mod types;

pub use export::{export_view, failure_line, render_fragment_html, render_fragment_text};
pub use types::ExportFormat;
