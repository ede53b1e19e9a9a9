//! # kaldiprep
//!
//! Staged conversion of a speech corpus shipped as tar archives plus a JSON lines
//! transcript manifest into a Kaldi data directory and pronunciation dictionary.
//!
//! The crate can be used through the `kaldiprep` binary or as a library:
//! [pipelines::DataPrep] runs the whole thing, [processing] exposes each step.
pub mod collation;
pub mod error;
pub mod external;
pub mod g2p;
pub mod io;
pub mod pipelines;
pub mod processing;
