/*! Transcript tables (`text`, `utt2spk`, `spk2utt`)

Manifests are read in full, sorted by identifier using the configured [Collation],
then written as `text` and `utt2spk`.
Every utterance is its own speaker: `utt2spk` maps each identifier to itself.

Identifiers get the same normalization as in [crate::processing::index],
so that `text` and `wav.scp` keys match.

For large corpora the transcript list weighs several gigabytes:
it is consumed by [write_tables] and freed before anything else runs.
!*/
use std::{io::Write, path::Path};

use log::info;

use crate::collation::Collation;
use crate::error::Error;
use crate::external::ExternalCommand;
use crate::io::{ManifestReader, TableWriter};

use super::normalize_identifier;

pub const TEXT: &str = "text";
pub const UTT2SPK: &str = "utt2spk";
pub const SPK2UTT: &str = "spk2utt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub identifier: String,
    pub transcript: String,
}

/// Read every record of every manifest, in order.
pub fn read_manifests<P: AsRef<Path>>(manifests: &[P]) -> Result<Vec<TranscriptEntry>, Error> {
    let mut entries = Vec::new();
    for manifest in manifests {
        let manifest = manifest.as_ref();
        let before = entries.len();
        for record in ManifestReader::from_path(manifest)? {
            let record = record?;
            entries.push(TranscriptEntry {
                identifier: normalize_identifier(&record.audio_filepath),
                transcript: record.text,
            });
        }
        info!("{:?}: {} transcripts", manifest, entries.len() - before);
    }
    Ok(entries)
}

/// Sort `entries` and write `text` and `utt2spk` into `data_dir`.
///
/// Takes ownership of `entries` so that they are freed as soon as the tables are written.
pub fn write_tables(
    mut entries: Vec<TranscriptEntry>,
    data_dir: &Path,
    collation: &Collation,
) -> Result<usize, Error> {
    collation.sort_by_key(&mut entries, |e| e.identifier.as_str());

    let mut text = TableWriter::create(&data_dir.join(TEXT))?;
    let mut utt2spk = TableWriter::create(&data_dir.join(UTT2SPK))?;
    for entry in &entries {
        writeln!(text, "{} {}", entry.identifier, entry.transcript)?;
        writeln!(utt2spk, "{} {}", entry.identifier, entry.identifier)?;
    }
    text.commit()?;
    utt2spk.commit()?;

    let nb_entries = entries.len();
    drop(entries);

    info!("wrote {} transcripts to {:?}", nb_entries, data_dir);
    Ok(nb_entries)
}

/// Build `spk2utt` from `utt2spk` with the toolkit's grouping utility.
pub fn group_speakers(data_dir: &Path, grouper: &ExternalCommand) -> Result<(), Error> {
    grouper.filter_file(&data_dir.join(UTT2SPK), &data_dir.join(SPK2UTT))
}

/// Whole transcript stage: manifests to `text`, `utt2spk` and `spk2utt`.
pub fn merge<P: AsRef<Path>>(
    manifests: &[P],
    data_dir: &Path,
    collation: &Collation,
    grouper: &ExternalCommand,
) -> Result<usize, Error> {
    let entries = read_manifests(manifests)?;
    let nb_entries = write_tables(entries, data_dir, collation)?;
    group_speakers(data_dir, grouper)?;
    Ok(nb_entries)
}
