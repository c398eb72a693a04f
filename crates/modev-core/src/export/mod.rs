//! Export pipeline.
//!
//! ```text
//! nbs/**/*.py ──► NotebookLoader ──► extract ──► assemble ──► resolve ──► src/<pkg>/...
//!                                       │                        │
//!                                       ▼                        ▼
//!                                  parse_directive           WriteRecord
//! ```

mod assemble;
mod directive;
mod extract;
mod manifest;
mod pipeline;
mod record;
mod resolve;

pub use assemble::{assemble, provenance_line, provenance_prefix};
pub use directive::{
    Directive, MODULE_EXTENSION, TagStyle, has_directive_line, is_exportable, parse_directive,
};
pub use extract::{ExportUnit, ExportableCell, directive_cell, extract};
pub use manifest::PublicManifest;
pub use pipeline::{
    ExportCallback, ExportWarning, Exporter, RunSummary, Severity, TracingCallback, write_output,
};
pub use record::WriteRecord;
pub use resolve::resolve;
