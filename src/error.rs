//! Error enum
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Serde(serde_json::Error),
    Glob(glob::GlobError),
    GlobPattern(glob::PatternError),
    ThreadPool(rayon::ThreadPoolBuildError),
    /// Unreadable archive or corrupt tar header.
    Archive {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Malformed manifest line (1-based line number).
    Manifest {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
    MissingInput(String),
    G2p(String),
    /// External command exited unsuccessfully.
    Command {
        program: String,
        status: ExitStatus,
    },
    Custom(String),
}

impl Error {
    pub fn archive(path: &Path, source: std::io::Error) -> Self {
        Error::Archive {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Serde(e) => write!(f, "json error: {}", e),
            Error::Glob(e) => write!(f, "glob error: {}", e),
            Error::GlobPattern(e) => write!(f, "invalid glob pattern: {}", e),
            Error::ThreadPool(e) => write!(f, "could not build thread pool: {}", e),
            Error::Archive { path, source } => {
                write!(f, "could not index archive {:?}: {}", path, source)
            }
            Error::Manifest { path, line, source } => {
                write!(f, "malformed manifest {:?} at line {}: {}", path, line, source)
            }
            Error::MissingInput(s) => write!(f, "missing input: {}", s),
            Error::G2p(s) => write!(f, "g2p conversion failed: {}", s),
            Error::Command { program, status } => write!(f, "{} failed ({})", program, status),
            Error::Custom(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}

impl From<glob::GlobError> for Error {
    fn from(e: glob::GlobError) -> Error {
        Error::Glob(e)
    }
}

impl From<glob::PatternError> for Error {
    fn from(e: glob::PatternError) -> Error {
        Error::GlobPattern(e)
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(e: rayon::ThreadPoolBuildError) -> Error {
        Error::ThreadPool(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
