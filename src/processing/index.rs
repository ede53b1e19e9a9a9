/*! Archive indexing (`wav.scp`)

Every audio file of the corpus lives in a tar archive.
Instead of extracting them, `wav.scp` maps each utterance to a `dd` command that reads
the right byte range out of its archive:

```text
<identifier> dd if=<archive> of=/dev/stdout skip=<offset> count=<length> iflag=skip_bytes,count_bytes |
```

# Processing

1. Archives are distributed over a pool of `nj` threads, one archive at a time per thread,
   so at most `nj` archives are open concurrently.
1. Each thread lists the members of its archive (headers only) and sends them, as one batch,
   to a collector thread.
1. Once every archive is done, the collected members are sorted and written in one go.
   Sorting has to wait for all archives since any of them can hold the smallest identifier.

The sort uses the same [Collation] as the transcript tables, so that every table of a data
directory lists its keys in the same order.
!*/
use std::{
    cmp::Ordering,
    fmt,
    io::Write,
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread,
};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::collation::Collation;
use crate::error::Error;
use crate::io::{archive, TableWriter};

use super::normalize_identifier;

/// An audio item of the corpus, located inside its archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    pub identifier: String,
    pub source_archive: Arc<Path>,
    pub byte_offset: u64,
    pub byte_length: u64,
}

impl ArchiveMember {
    /// Extraction command writing the member's bytes on stdout.
    pub fn command(&self) -> String {
        format!(
            "dd if={} of=/dev/stdout skip={} count={} iflag=skip_bytes,count_bytes |",
            self.source_archive.display(),
            self.byte_offset,
            self.byte_length
        )
    }

    /// Ordering of the index table: by identifier, then by location so that the
    /// order stays total if two raw names normalize to the same identifier.
    fn table_order(&self, other: &Self, collation: &Collation) -> Ordering {
        collation
            .compare(&self.identifier, &other.identifier)
            .then_with(|| self.source_archive.cmp(&other.source_archive))
            .then_with(|| self.byte_offset.cmp(&other.byte_offset))
    }
}

/// `wav.scp` line, without the trailing newline.
impl fmt::Display for ArchiveMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.identifier, self.command())
    }
}

pub struct ArchiveIndexer {
    archives: Vec<PathBuf>,
    nj: usize,
}

impl ArchiveIndexer {
    /// `nj` is the number of archives indexed concurrently. It has to be at least 1.
    pub fn new(archives: Vec<PathBuf>, nj: usize) -> Result<Self, Error> {
        if nj == 0 {
            return Err(Error::Custom(
                "number of indexing jobs must be at least 1".to_string(),
            ));
        }
        Ok(Self { archives, nj })
    }

    /// List the members of a single archive.
    fn index_archive(path: &Path) -> Result<Vec<ArchiveMember>, Error> {
        let members = archive::list_members(path)?;
        debug!("{:?}: {} members", path, members.len());

        let source_archive: Arc<Path> = Arc::from(path);
        Ok(members
            .into_iter()
            .map(|member| ArchiveMember {
                identifier: normalize_identifier(&member.name),
                source_archive: source_archive.clone(),
                byte_offset: member.offset,
                byte_length: member.size,
            })
            .collect())
    }

    /// Index every archive and return the members in table order.
    ///
    /// Fails if any archive fails: a partial index is useless.
    pub fn collect(&self, collation: &Collation) -> Result<Vec<ArchiveMember>, Error> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.nj)
            .thread_name(|idx| format!("index-{}", idx))
            .build()?;

        info!(
            "indexing {} archives with {} jobs",
            self.archives.len(),
            self.nj
        );

        let (tx, rx) = mpsc::channel::<Vec<ArchiveMember>>();
        let collector = thread::spawn(move || {
            let mut members = Vec::new();
            for batch in rx {
                members.extend(batch);
            }
            members
        });

        // every sender clone is dropped when this returns, which ends the collector loop.
        let indexed = pool.install(|| {
            self.archives.par_iter().try_for_each_with(tx, |tx, path| {
                let batch = Self::index_archive(path)?;
                tx.send(batch)
                    .map_err(|_| Error::Custom("index collector hung up".to_string()))
            })
        });

        let mut members = collector
            .join()
            .map_err(|_| Error::Custom("index collector panicked".to_string()))?;
        indexed?;

        match collation {
            Collation::Bytes => pool.install(|| {
                members.par_sort_unstable_by(|a, b| a.table_order(b, &Collation::Bytes))
            }),
            // ICU collators are not shared across threads
            Collation::Locale { .. } => {
                members.sort_unstable_by(|a, b| a.table_order(b, collation))
            }
        }

        for pair in members.windows(2) {
            if pair[0].identifier == pair[1].identifier {
                warn!(
                    "duplicate identifier {} ({:?} and {:?})",
                    pair[0].identifier, pair[0].source_archive, pair[1].source_archive
                );
            }
        }

        Ok(members)
    }

    /// Index every archive into `dst`, returning the number of lines written.
    pub fn write(&self, dst: &Path, collation: &Collation) -> Result<usize, Error> {
        let members = self.collect(collation)?;

        let mut w = TableWriter::create(dst)?;
        for member in &members {
            writeln!(w, "{}", member)?;
        }
        w.commit()?;

        info!("wrote {} entries to {:?}", members.len(), dst);
        Ok(members.len())
    }
}
