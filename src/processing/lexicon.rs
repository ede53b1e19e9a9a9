/*! Pronunciation dictionary

Builds the dictionary directory (`words.txt`, `lexicon.txt` and phone sets) from a
vocabulary file and the `text` table.

# Processing

1. Pass 1: every word of the vocabulary file.
1. Pass 2: every word of every transcript.

In both passes, a word is converted only if it is not already in the [PhonemeCache].
Reserved words (silence, spoken noise and the unknown word token) have fixed
pronunciations: they are never converted and only appear in the reserved lexicon lines.
Whitespace-only phonemes produced by the converter are dropped (and logged),
the word itself is kept.

Words are written in the order they were first seen, not alphabetically.
Nothing is written if the converter fails on any word.
!*/
use std::{
    collections::{BTreeSet, HashMap, HashSet},
    fs::File,
    hash::BuildHasherDefault,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use itertools::Itertools;
use log::{debug, info, warn};
use twox_hash::XxHash64;

use crate::error::Error;
use crate::g2p::Grapheme2Phoneme;
use crate::io::{write_lines, TableWriter};

pub const SILENCE_PHONE: &str = "SIL";
pub const SPOKEN_NOISE_PHONE: &str = "SPN";
pub const SILENCE_WORD: &str = "!SIL";
pub const SPOKEN_NOISE_WORD: &str = "<spoken_noise>";

pub const WORDS: &str = "words.txt";
pub const LEXICON: &str = "lexicon.txt";
pub const SILENCE_PHONES: &str = "silence_phones.txt";
pub const OPTIONAL_SILENCE: &str = "optional_silence.txt";
pub const NONSILENCE_PHONES: &str = "nonsilence_phones.txt";
pub const EXTRA_QUESTIONS: &str = "extra_questions.txt";

/// Lexicon variants derived from `lexicon.txt` by the toolkit's `prepare_lang.sh`.
/// They go stale as soon as `lexicon.txt` is regenerated.
pub const DERIVED_LEXICONS: [&str; 2] = ["lexiconp.txt", "lexiconp_silprob.txt"];

/// Memoized word to phonemes mapping, remembering insertion order,
/// along with the inventory of every phoneme seen so far.
#[derive(Debug, Default)]
pub struct PhonemeCache {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize, BuildHasherDefault<XxHash64>>,
    inventory: BTreeSet<String>,
    reserved: HashSet<String, BuildHasherDefault<XxHash64>>,
}

impl PhonemeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache that never converts nor stores any of `reserved`.
    pub fn with_reserved<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reserved: reserved.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    pub fn is_reserved(&self, word: &str) -> bool {
        self.reserved.contains(word)
    }

    pub fn get(&self, word: &str) -> Option<&[String]> {
        self.index
            .get(word)
            .map(|idx| self.entries[*idx].1.as_slice())
    }

    /// Convert `word` unless it is already cached or reserved.
    ///
    /// Returns `true` if the converter was called.
    pub fn add_word<G>(&mut self, word: &str, g2p: &mut G) -> Result<bool, Error>
    where
        G: Grapheme2Phoneme + ?Sized,
    {
        if self.contains(word) {
            return Ok(false);
        }
        if self.is_reserved(word) {
            debug!("reserved word {}, not converted", word);
            return Ok(false);
        }

        let raw = g2p.phonemes(word)?;
        let phonemes: Vec<String> = if raw.iter().any(|p| p.trim().is_empty()) {
            warn!("offending word {}: {:?}", word, raw);
            raw.into_iter().filter(|p| !p.trim().is_empty()).collect()
        } else {
            raw
        };

        for phoneme in &phonemes {
            if !self.inventory.contains(phoneme) {
                self.inventory.insert(phoneme.clone());
            }
        }
        self.index.insert(word.to_string(), self.entries.len());
        self.entries.push((word.to_string(), phonemes));

        Ok(true)
    }

    /// Words, in first-encounter order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(word, _)| word.as_str())
    }

    /// `(word, phonemes)` pairs, in first-encounter order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(word, phonemes)| (word.as_str(), phonemes.as_slice()))
    }

    /// Every phoneme used by a cached word, sorted.
    pub fn inventory(&self) -> &BTreeSet<String> {
        &self.inventory
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pass 1: add each line of the vocabulary file.
///
/// Returns the number of converted words.
pub fn add_vocabulary<G>(
    cache: &mut PhonemeCache,
    vocabulary: &Path,
    g2p: &mut G,
) -> Result<usize, Error>
where
    G: Grapheme2Phoneme + ?Sized,
{
    let f = File::open(vocabulary).map_err(|e| {
        Error::MissingInput(format!("could not open vocabulary {:?}: {}", vocabulary, e))
    })?;

    let mut converted = 0;
    for (idx, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        let word = line.trim_end();
        if word.is_empty() {
            warn!("{:?}:{}: empty vocabulary entry, skipping", vocabulary, idx + 1);
            continue;
        }
        if cache.add_word(word, g2p)? {
            converted += 1;
        }
    }

    info!("{:?}: {} words converted", vocabulary, converted);
    Ok(converted)
}

/// Pass 2: add every word of every transcript of a `text` table.
///
/// Returns the number of converted words.
pub fn add_transcripts<G>(cache: &mut PhonemeCache, text: &Path, g2p: &mut G) -> Result<usize, Error>
where
    G: Grapheme2Phoneme + ?Sized,
{
    let f = File::open(text)
        .map_err(|e| Error::MissingInput(format!("could not open {:?}: {}", text, e)))?;

    let mut converted = 0;
    for line in BufReader::new(f).lines() {
        let line = line?;
        // an utterance without transcript has no words
        let transcript = match line.trim_end().split_once(' ') {
            Some((_, transcript)) => transcript,
            None => continue,
        };
        for word in transcript.split_whitespace() {
            if cache.add_word(word, g2p)? {
                converted += 1;
            }
        }
    }

    info!("{:?}: {} new words converted", text, converted);
    Ok(converted)
}

/// Write the dictionary directory.
pub fn write_dictionary(cache: &PhonemeCache, dict_dir: &Path, unk: &str) -> Result<(), Error> {
    write_lines(&dict_dir.join(WORDS), cache.words())?;
    write_lines(
        &dict_dir.join(SILENCE_PHONES),
        [SILENCE_PHONE, SPOKEN_NOISE_PHONE],
    )?;
    write_lines(&dict_dir.join(OPTIONAL_SILENCE), [SILENCE_PHONE])?;
    write_lines(&dict_dir.join(NONSILENCE_PHONES), cache.inventory())?;
    write_lines(
        &dict_dir.join(EXTRA_QUESTIONS),
        [format!("{} {}", SILENCE_PHONE, SPOKEN_NOISE_PHONE)],
    )?;

    let mut lexicon = TableWriter::create(&dict_dir.join(LEXICON))?;
    writeln!(lexicon, "{} {}", SILENCE_WORD, SILENCE_PHONE)?;
    writeln!(lexicon, "{} {}", SPOKEN_NOISE_WORD, SPOKEN_NOISE_PHONE)?;
    writeln!(lexicon, "{} {}", unk, SPOKEN_NOISE_PHONE)?;
    for (word, phonemes) in cache.entries() {
        writeln!(lexicon, "{} {}", word, phonemes.iter().join(" "))?;
    }
    lexicon.commit()?;

    info!(
        "dictionary: {} words, {} phones in {:?}",
        cache.len(),
        cache.inventory().len(),
        dict_dir
    );
    Ok(())
}

/// Both passes, then the dictionary directory.
pub fn build_dictionary<G>(
    vocabulary: &Path,
    text: &Path,
    dict_dir: &Path,
    unk: &str,
    g2p: &mut G,
) -> Result<PhonemeCache, Error>
where
    G: Grapheme2Phoneme + ?Sized,
{
    let mut cache = PhonemeCache::with_reserved([SILENCE_WORD, SPOKEN_NOISE_WORD, unk]);
    add_vocabulary(&mut cache, vocabulary, g2p)?;
    add_transcripts(&mut cache, text, g2p)?;
    write_dictionary(&cache, dict_dir, unk)?;
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::tempdir;

    use super::*;

    /// Converter backed by a fixed table, counting calls per word.
    struct TableG2p {
        table: HashMap<&'static str, Vec<&'static str>>,
        calls: HashMap<String, usize>,
    }

    impl TableG2p {
        fn new(table: &[(&'static str, &[&'static str])]) -> Self {
            Self {
                table: table.iter().map(|(w, p)| (*w, p.to_vec())).collect(),
                calls: HashMap::new(),
            }
        }
    }

    impl Grapheme2Phoneme for TableG2p {
        fn phonemes(&mut self, word: &str) -> Result<Vec<String>, Error> {
            *self.calls.entry(word.to_string()).or_insert(0) += 1;
            self.table
                .get(word)
                .map(|p| p.iter().map(|x| x.to_string()).collect())
                .ok_or_else(|| Error::G2p(format!("unknown word {}", word)))
        }
    }

    #[test]
    fn words_in_first_encounter_order() {
        let dir = tempdir().unwrap();
        let vocab = dir.path().join("words.txt");
        let text = dir.path().join("text");
        std::fs::write(&vocab, "cat\n").unwrap();
        std::fs::write(&text, "u1 cat dog\n").unwrap();

        let mut g2p = TableG2p::new(&[("cat", &["K", "AE", "T"]), ("dog", &["D", "AA", "G"])]);
        let dict = dir.path().join("dict");
        std::fs::create_dir(&dict).unwrap();
        build_dictionary(&vocab, &text, &dict, "<unk>", &mut g2p).unwrap();

        let read = |name: &str| std::fs::read_to_string(dict.join(name)).unwrap();
        assert_eq!(read(WORDS), "cat\ndog\n");
        assert_eq!(read(NONSILENCE_PHONES), "AA\nAE\nD\nG\nK\nT\n");
        assert_eq!(read(SILENCE_PHONES), "SIL\nSPN\n");
        assert_eq!(read(OPTIONAL_SILENCE), "SIL\n");
        assert_eq!(read(EXTRA_QUESTIONS), "SIL SPN\n");
        assert_eq!(
            read(LEXICON),
            "!SIL SIL\n<spoken_noise> SPN\n<unk> SPN\ncat K AE T\ndog D AA G\n"
        );
    }

    #[test]
    fn each_word_is_converted_once() {
        let dir = tempdir().unwrap();
        let vocab = dir.path().join("words.txt");
        let text = dir.path().join("text");
        std::fs::write(&vocab, "cat\ncat\n").unwrap();
        std::fs::write(&text, "u1 cat cat\nu2 cat\n").unwrap();

        let mut g2p = TableG2p::new(&[("cat", &["K", "AE", "T"])]);
        let mut cache = PhonemeCache::new();
        assert_eq!(add_vocabulary(&mut cache, &vocab, &mut g2p).unwrap(), 1);
        assert_eq!(add_transcripts(&mut cache, &text, &mut g2p).unwrap(), 0);

        assert_eq!(g2p.calls.get("cat"), Some(&1));
        assert_eq!(cache.len(), 1);
    }

    #[test_log::test]
    fn whitespace_phonemes_are_dropped() {
        let mut g2p = TableG2p::new(&[("icecream", &["AY", " ", "S", "", "K", "R", "IY", "M"])]);
        let mut cache = PhonemeCache::new();
        cache.add_word("icecream", &mut g2p).unwrap();

        let expected: Vec<String> = ["AY", "S", "K", "R", "IY", "M"]
            .iter()
            .map(|x| x.to_string())
            .collect();
        assert_eq!(cache.get("icecream"), Some(expected.as_slice()));
        assert!(cache.inventory().iter().all(|p| !p.trim().is_empty()));
    }

    #[test]
    fn repeated_phonemes_are_kept() {
        let mut g2p = TableG2p::new(&[("papa", &["P", "AA", "P", "AA"])]);
        let mut cache = PhonemeCache::new();
        cache.add_word("papa", &mut g2p).unwrap();

        assert_eq!(cache.get("papa").unwrap().len(), 4);
        assert_eq!(cache.inventory().len(), 2);
    }

    #[test]
    fn reserved_words_have_one_entry() {
        let dir = tempdir().unwrap();
        let vocab = dir.path().join("words.txt");
        let text = dir.path().join("text");
        std::fs::write(&vocab, "<unk>\ncat\n!SIL\n").unwrap();
        std::fs::write(&text, "u1 cat <spoken_noise> <unk>\n").unwrap();

        let mut g2p = TableG2p::new(&[("cat", &["K", "AE", "T"])]);
        let dict = dir.path().join("dict");
        std::fs::create_dir(&dict).unwrap();
        let cache = build_dictionary(&vocab, &text, &dict, "<unk>", &mut g2p).unwrap();

        assert!(g2p.calls.get("<unk>").is_none());
        assert_eq!(cache.words().collect::<Vec<_>>(), vec!["cat"]);
        assert_eq!(
            std::fs::read_to_string(dict.join(LEXICON)).unwrap(),
            "!SIL SIL\n<spoken_noise> SPN\n<unk> SPN\ncat K AE T\n"
        );
        assert_eq!(
            std::fs::read_to_string(dict.join(NONSILENCE_PHONES)).unwrap(),
            "AE\nK\nT\n"
        );
    }

    #[test]
    fn converter_failure_writes_nothing() {
        let dir = tempdir().unwrap();
        let vocab = dir.path().join("words.txt");
        let text = dir.path().join("text");
        std::fs::write(&vocab, "cat\n").unwrap();
        std::fs::write(&text, "u1 cat zzyzx\n").unwrap();

        let mut g2p = TableG2p::new(&[("cat", &["K", "AE", "T"])]);
        let dict = dir.path().join("dict");
        std::fs::create_dir(&dict).unwrap();
        let res = build_dictionary(&vocab, &text, &dict, "<unk>", &mut g2p);

        assert!(matches!(res, Err(Error::G2p(_))));
        assert_eq!(std::fs::read_dir(&dict).unwrap().count(), 0);
    }

    #[test]
    fn transcript_words_are_covered() {
        let dir = tempdir().unwrap();
        let vocab = dir.path().join("words.txt");
        let text = dir.path().join("text");
        std::fs::write(&vocab, "\nzebra\n").unwrap();
        std::fs::write(&text, "u1 a b\nu2\nu3 b  c\n").unwrap();

        let mut g2p = |w: &str| -> Result<Vec<String>, Error> {
            Ok(w.chars().map(|c| c.to_uppercase().to_string()).collect())
        };
        let dict = dir.path().join("dict");
        std::fs::create_dir(&dict).unwrap();
        let cache = build_dictionary(&vocab, &text, &dict, "<UNK>", &mut g2p).unwrap();

        assert_eq!(cache.words().collect::<Vec<_>>(), vec!["zebra", "a", "b", "c"]);
        let lexicon = std::fs::read_to_string(dict.join(LEXICON)).unwrap();
        let inventory = std::fs::read_to_string(dict.join(NONSILENCE_PHONES)).unwrap();
        let inventory: Vec<&str> = inventory.lines().collect();
        for line in lexicon.lines().skip(3) {
            let mut fields = line.split(' ');
            let word = fields.next().unwrap();
            assert_eq!(lexicon.lines().filter(|l| l.split(' ').next() == Some(word)).count(), 1);
            assert!(fields.all(|p| inventory.contains(&p)));
        }
    }
}
