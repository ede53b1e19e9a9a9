//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;
use std::str::FromStr;

use structopt::StructOpt;

use kaldiprep::collation::Collation;
use kaldiprep::external::ExternalCommand;
use kaldiprep::pipelines::dataprep;

#[derive(Debug, StructOpt)]
#[structopt(name = "kaldiprep", about = "speech corpus to Kaldi data directory tool.")]
/// Holds every command that is callable by the `kaldiprep` command.
pub enum KaldiPrep {
    #[structopt(about = "Run data preparation stages")]
    DataPrep(DataPrep),
    #[structopt(about = "Lowercase reference transcripts (stdin to stdout)")]
    FilterRef,
}

/// Which identifier ordering to use for `wav.scp`, `text` and `utt2spk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollationKind {
    /// Byte order, whatever the locale.
    C,
    /// Collation of `LC_ALL`/`LC_COLLATE`/`LANG`.
    Locale,
}

impl FromStr for CollationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" | "C" => Ok(CollationKind::C),
            "locale" => Ok(CollationKind::Locale),
            other => Err(format!("unknown collation {:?} (c, locale)", other)),
        }
    }
}

impl CollationKind {
    pub fn collation(self) -> Collation {
        match self {
            CollationKind::C => Collation::Bytes,
            CollationKind::Locale => Collation::from_env(),
        }
    }
}

#[derive(Debug, StructOpt)]
/// Data preparation command and parameters.
///
/// ```sh
/// kaldiprep data-prep --data-dir data/train --dict-dir data/local/dict \
///     --words-txt words.txt --input-dir /corpus --unk-string '<UNK>' --stage 0 --nj 32
/// ```
///
/// Stages: 0 = wav.scp, 1 = text/utt2spk/spk2utt, 2 = dictionary, 3 = validation.
pub struct DataPrep {
    #[structopt(long, parse(from_os_str), help = "Kaldi data directory to create")]
    pub data_dir: PathBuf,
    #[structopt(long, parse(from_os_str), help = "vocabulary file, one word per line")]
    pub words_txt: PathBuf,
    #[structopt(long, parse(from_os_str), help = "dictionary directory to create")]
    pub dict_dir: PathBuf,
    #[structopt(long, parse(from_os_str), help = "corpus root (contains archives and manifest)")]
    pub input_dir: PathBuf,
    #[structopt(long, help = "unknown word token of the lexicon")]
    pub unk_string: String,
    #[structopt(
        long,
        allow_hyphen_values = true,
        help = "first stage to run (0 or less runs every stage)"
    )]
    pub stage: i32,
    #[structopt(long, help = "number of archives indexed concurrently")]
    pub nj: usize,
    #[structopt(
        long,
        default_value = "repartitioned_dataset_tars_jul_28_wav_new_join_no_space/*.tar",
        help = "archive glob, relative to the input dir"
    )]
    pub archives: String,
    #[structopt(
        long,
        default_value = "dataset_manifest_nemo_jul_28_wav_filtered_single_new_join_no_space/*.json",
        help = "manifest glob, relative to the input dir"
    )]
    pub manifests: String,
    #[structopt(
        long,
        default_value = "g2p-jsonl",
        help = "G2P converter command (JSON lines on stdin/stdout)"
    )]
    pub g2p_cmd: ExternalCommand,
    #[structopt(
        long,
        default_value = "utils/utt2spk_to_spk2utt.pl",
        help = "utt2spk to spk2utt command"
    )]
    pub spk2utt_cmd: ExternalCommand,
    #[structopt(
        long,
        default_value = "utils/validate_data_dir.sh",
        help = "data directory validation command"
    )]
    pub validate_cmd: ExternalCommand,
    #[structopt(
        long,
        default_value = "c",
        help = "identifier ordering of every table: c (bytes) or locale (LC_ALL/LC_COLLATE/LANG)"
    )]
    pub collation: CollationKind,
}

impl DataPrep {
    pub fn into_pipeline(self) -> dataprep::DataPrep {
        dataprep::DataPrep::new(
            self.data_dir,
            self.dict_dir,
            self.words_txt,
            self.input_dir,
            self.unk_string,
        )
        .stage(self.stage)
        .jobs(self.nj)
        .archives(&self.archives)
        .manifests(&self.manifests)
        .g2p(self.g2p_cmd)
        .spk2utt(self.spk2utt_cmd)
        .validator(self.validate_cmd)
        .collation(self.collation.collation())
    }
}

#[cfg(test)]
mod tests {
    use kaldiprep::pipelines::dataprep::{
        DEFAULT_ARCHIVES, DEFAULT_G2P, DEFAULT_MANIFESTS, DEFAULT_SPK2UTT, DEFAULT_VALIDATE,
    };

    use super::*;

    #[test]
    fn parse_data_prep() {
        let opt = KaldiPrep::from_iter_safe([
            "kaldiprep",
            "data-prep",
            "--data-dir",
            "data/train",
            "--words-txt",
            "words.txt",
            "--dict-dir",
            "data/local/dict",
            "--input-dir",
            "/corpus",
            "--unk-string",
            "<UNK>",
            "--stage",
            "2",
            "--nj",
            "8",
            "--g2p-cmd",
            "python3 g2p.py --json",
            "--collation",
            "locale",
        ])
        .unwrap();

        match opt {
            KaldiPrep::DataPrep(p) => {
                assert_eq!(p.stage, 2);
                assert_eq!(p.nj, 8);
                assert_eq!(p.archives, DEFAULT_ARCHIVES);
                assert_eq!(p.manifests, DEFAULT_MANIFESTS);
                assert_eq!(p.g2p_cmd, ExternalCommand::parse("python3 g2p.py --json").unwrap());
                assert_eq!(p.spk2utt_cmd, ExternalCommand::new(DEFAULT_SPK2UTT));
                assert_eq!(p.validate_cmd, ExternalCommand::new(DEFAULT_VALIDATE));
                assert_eq!(p.collation, CollationKind::Locale);
            }
            other => panic!("expected data-prep, got {:?}", other),
        }
    }

    #[test]
    fn default_converter() {
        let opt = KaldiPrep::from_iter_safe([
            "kaldiprep",
            "data-prep",
            "--data-dir",
            "d",
            "--words-txt",
            "w",
            "--dict-dir",
            "l",
            "--input-dir",
            "i",
            "--unk-string",
            "<unk>",
            "--stage",
            "0",
            "--nj",
            "1",
        ])
        .unwrap();
        match opt {
            KaldiPrep::DataPrep(p) => {
                assert_eq!(p.g2p_cmd, ExternalCommand::new(DEFAULT_G2P));
                assert_eq!(p.collation, CollationKind::C);
            }
            other => panic!("expected data-prep, got {:?}", other),
        }
    }

    #[test]
    fn negative_stage() {
        let opt = KaldiPrep::from_iter_safe([
            "kaldiprep",
            "data-prep",
            "--data-dir",
            "d",
            "--words-txt",
            "w",
            "--dict-dir",
            "l",
            "--input-dir",
            "i",
            "--unk-string",
            "<unk>",
            "--stage",
            "-1",
            "--nj",
            "1",
        ])
        .unwrap();
        match opt {
            KaldiPrep::DataPrep(p) => assert_eq!(p.stage, -1),
            other => panic!("expected data-prep, got {:?}", other),
        }
    }

    #[test]
    fn parse_filter_ref() {
        let opt = KaldiPrep::from_iter_safe(["kaldiprep", "filter-ref"]).unwrap();
        assert!(matches!(opt, KaldiPrep::FilterRef));
    }

    #[test]
    fn required_arguments() {
        assert!(KaldiPrep::from_iter_safe(["kaldiprep", "data-prep", "--nj", "2"]).is_err());
    }
}
