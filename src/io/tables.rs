/*! Plain-text table writing.

Every table produced by the pipeline (`wav.scp`, `text`, `utt2spk`, dictionary files)
is a newline-terminated, space-separated text file.

Tables are written through a [TableWriter], which writes into a hidden sibling file and
only renames it onto the destination on [TableWriter::commit].
A stage that fails midway thus never leaves a half-written table at the destination path.
!*/
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, warn};

use crate::error::Error;

pub struct TableWriter {
    dst: PathBuf,
    tmp: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl TableWriter {
    /// Create (or truncate) the temporary file backing `dst`.
    pub fn create(dst: &Path) -> Result<Self, Error> {
        let filename = dst
            .file_name()
            .ok_or_else(|| Error::Custom(format!("table path has no file name: {:?}", dst)))?;
        let tmp = dst.with_file_name(format!(".{}.tmp", filename.to_string_lossy()));

        let writer = BufWriter::new(File::create(&tmp)?);
        Ok(Self {
            dst: dst.to_path_buf(),
            tmp,
            writer: Some(writer),
        })
    }

    /// Flush and atomically move the table into place.
    pub fn commit(mut self) -> Result<(), Error> {
        if let Some(writer) = self.writer.take() {
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        if let Err(e) = std::fs::rename(&self.tmp, &self.dst) {
            if let Err(rm) = std::fs::remove_file(&self.tmp) {
                warn!("could not remove partial table {:?}: {}", self.tmp, rm);
            }
            return Err(Error::Io(e));
        }
        debug!("wrote {:?}", self.dst);
        Ok(())
    }

    fn inner(&mut self) -> std::io::Result<&mut BufWriter<File>> {
        self.writer.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "table already committed")
        })
    }
}

impl Write for TableWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner()?.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner()?.flush()
    }
}

impl Drop for TableWriter {
    fn drop(&mut self) {
        // not committed: discard the partial table
        if self.writer.take().is_some() {
            if let Err(e) = std::fs::remove_file(&self.tmp) {
                warn!("could not remove partial table {:?}: {}", self.tmp, e);
            }
        }
    }
}

/// Write `lines` to `dst`, one per line.
pub fn write_lines<I, S>(dst: &Path, lines: I) -> Result<(), Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut w = TableWriter::create(dst)?;
    for line in lines {
        w.write_all(line.as_ref().as_bytes())?;
        w.write_all(b"\n")?;
    }
    w.commit()
}

/// Make sure `path` does not exist.
///
/// Returns `true` if a file was removed. A missing file is not an error, so calling this
/// any number of times leaves the filesystem in the same state.
pub fn ensure_absent(path: &Path) -> Result<bool, Error> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Io(e)),
    }
}
