//! Pipelines.
//!
//! The module provides a light [pipeline::Pipeline] trait, implemented by the
//! staged Kaldi data preparation in [dataprep].
pub mod dataprep;
#[allow(clippy::module_inception)]
pub mod pipeline;

pub use dataprep::{DataPrep, Stage};
pub use pipeline::Pipeline;
