//! Tar archive member listing.
//!
//! Wraps the [tar] crate to enumerate the members of an archive using header metadata only:
//! payloads are skipped with [std::io::Seek] rather than read, so listing a multi-gigabyte
//! archive costs one header read per member.
use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};

use log::debug;
use tar::Archive;

use crate::error::Error;

/// A regular file inside a tar archive, located by its data offset and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarMember {
    pub name: String,
    /// Offset of the first payload byte from the start of the archive file.
    pub offset: u64,
    pub size: u64,
}

/// List the regular-file members of the archive at `path`, in archive order.
pub fn list_members(path: &Path) -> Result<Vec<TarMember>, Error> {
    let file = File::open(path).map_err(|e| Error::archive(path, e))?;
    list_members_from(BufReader::new(file)).map_err(|e| Error::archive(path, e))
}

/// Same as [list_members], on any seekable reader.
pub fn list_members_from<R: Read + Seek>(reader: R) -> std::io::Result<Vec<TarMember>> {
    let mut archive = Archive::new(reader);
    let mut members = Vec::new();

    for entry in archive.entries_with_seek()? {
        let entry = entry?;
        let header = entry.header();

        // directories, links and the like carry no audio
        if !header.entry_type().is_file() {
            debug!("skipping non-file entry {:?}", entry.path()?);
            continue;
        }

        // a lossy name would not match the member any more
        let name = String::from_utf8(entry.path_bytes().into_owned()).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "member name is not UTF-8: {:?}",
                    String::from_utf8_lossy(e.as_bytes())
                ),
            )
        })?;

        let size = header.entry_size()?;
        members.push(TarMember {
            name,
            offset: entry.raw_file_position(),
            size,
        });
    }

    Ok(members)
}
