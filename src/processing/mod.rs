/*! Corpus processing

One module per kind of output:

- [index]: archives to `wav.scp`,
- [transcripts]: manifests to `text`, `utt2spk` and `spk2utt`,
- [lexicon]: vocabulary and `text` to the dictionary directory,
- [ref_filter]: case folding of reference transcripts.
!*/
pub mod index;
pub mod lexicon;
pub mod ref_filter;
pub mod transcripts;

pub use index::{ArchiveIndexer, ArchiveMember};
pub use lexicon::PhonemeCache;
pub use transcripts::TranscriptEntry;

/// Utterance identifier for a raw archive entry or manifest path.
///
/// Kaldi tables are space-separated, so spaces become underscores.
/// Two names differing only by a space and an underscore end up with the same identifier.
pub fn normalize_identifier(name: &str) -> String {
    name.replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::normalize_identifier;

    #[test]
    fn spaces_become_underscores() {
        assert_eq!(normalize_identifier("b a.flac"), "b_a.flac");
        assert_eq!(normalize_identifier("a  b"), "a__b");
        assert_eq!(normalize_identifier("b_a.flac"), "b_a.flac");
    }
}
