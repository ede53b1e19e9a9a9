/*!
# IO utilities

Reading of corpus inputs (tar archives, JSON lines manifests) and writing of plain-text tables.
!*/
pub mod archive;
pub mod manifest;
mod tables;

pub use manifest::{ManifestReader, ManifestRecord};
pub use tables::{ensure_absent, write_lines, TableWriter};
