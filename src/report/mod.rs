//! Rendering of the final diagnostic report.

mod generator;

pub use generator::{
    format_ddr_for_display, generate_json_report, generate_markdown_report, write_report,
};
