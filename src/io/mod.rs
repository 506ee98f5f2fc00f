//! File I/O for designs and layouts.
//!
//! Both formats are JSON. Functions here return `anyhow::Result` with the
//! offending path in the error context.

pub mod design;
pub mod layout;

pub use design::{DesignFile, from_design_string, read_design};
pub use layout::{
    GridRecord, LayoutRecord, SourceRecord, from_layout_string, read_layout, to_layout_string,
    write_layout,
};
