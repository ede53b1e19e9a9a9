//! Pipeline trait.
use crate::error::Error;

/// A sequence of processing steps, run in one go.
///
/// Generic over the return type: [super::DataPrep] returns `()` since everything it
/// produces ends up on disk.
pub trait Pipeline<T> {
    /// Logged when the pipeline starts, to trace outputs back to the build that made them.
    fn version() -> &'static str;
    fn run(&self) -> Result<T, Error>;
}
