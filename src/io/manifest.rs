/*! Transcript manifest reading

Manifests are JSON lines files, one utterance per line:

```json
{"audio_filepath": "some/utt.flac", "text": "hello world", "duration": 1.2}
```

Only `audio_filepath` and `text` are read, other fields are ignored.
!*/
use std::{
    fs::File,
    io::{BufRead, BufReader, Lines},
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestRecord {
    pub audio_filepath: String,
    pub text: String,
}

/// Streams [ManifestRecord]s out of a manifest, skipping blank lines.
///
/// A malformed line yields an [Error::Manifest] carrying the line number.
pub struct ManifestReader<R> {
    path: PathBuf,
    lines: Lines<R>,
    line_no: usize,
}

impl ManifestReader<BufReader<File>> {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let f = File::open(path).map_err(|e| {
            Error::MissingInput(format!("could not open manifest {:?}: {}", path, e))
        })?;
        Ok(Self::new(path, BufReader::new(f)))
    }
}

impl<R: BufRead> ManifestReader<R> {
    /// `path` is only used to report errors.
    pub fn new(path: &Path, reader: R) -> Self {
        Self {
            path: path.to_path_buf(),
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for ManifestReader<R> {
    type Item = Result<ManifestRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(Error::Io(e))),
            };
            self.line_no += 1;

            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }

            return Some(
                serde_json::from_str(line).map_err(|source| Error::Manifest {
                    path: self.path.clone(),
                    line: self.line_no,
                    source,
                }),
            );
        }
    }
}
