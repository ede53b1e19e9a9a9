//! Kaldi data preparation pipeline
//!
//! Turns a tar-archived speech corpus and its JSON lines manifest into a Kaldi data
//! directory (`wav.scp`, `text`, `utt2spk`, `spk2utt`) and dictionary directory.
//!
//! # Stages
//! 0. Index archives into `wav.scp`.
//! 1. Merge manifests into `text` and `utt2spk`, group speakers into `spk2utt`.
//! 2. Build the dictionary directory from the vocabulary file and `text`.
//! 3. Remove derived lexicons left by a previous run, then validate the data directory.
//!
//! Starting from stage `S` runs every stage numbered `S` or more.
//! Stages only communicate through files, and every stage overwrites its outputs,
//! so a run can be resumed from any stage.
use std::{
    ffi::OsStr,
    fmt,
    path::{Path, PathBuf},
};

use log::{debug, error, info, warn};

use crate::collation::Collation;
use crate::error::Error;
use crate::external::ExternalCommand;
use crate::g2p::{Grapheme2Phoneme, ProcessG2p};
use crate::io::ensure_absent;
use crate::pipelines::pipeline::Pipeline;
use crate::processing::{index::ArchiveIndexer, lexicon, transcripts};

pub const WAV_SCP: &str = "wav.scp";
pub const DEFAULT_ARCHIVES: &str = "repartitioned_dataset_tars_jul_28_wav_new_join_no_space/*.tar";
pub const DEFAULT_MANIFESTS: &str =
    "dataset_manifest_nemo_jul_28_wav_filtered_single_new_join_no_space/*.json";
pub const DEFAULT_G2P: &str = "g2p-jsonl";
pub const DEFAULT_SPK2UTT: &str = "utils/utt2spk_to_spk2utt.pl";
pub const DEFAULT_VALIDATE: &str = "utils/validate_data_dir.sh";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Index = 0,
    Transcripts = 1,
    Dictionary = 2,
    Validate = 3,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Index,
        Stage::Transcripts,
        Stage::Dictionary,
        Stage::Validate,
    ];

    pub fn number(self) -> u32 {
        self as u32
    }

    /// Stages run when starting from stage `start`, in order.
    /// Any `start` of 0 or less runs every stage.
    pub fn from_start(start: i32) -> impl Iterator<Item = Stage> {
        Self::ALL
            .into_iter()
            .filter(move |stage| i64::from(stage.number()) >= i64::from(start))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Index => "index archives",
            Stage::Transcripts => "merge transcripts",
            Stage::Dictionary => "build dictionary",
            Stage::Validate => "validate",
        };
        write!(f, "{}", name)
    }
}

pub struct DataPrep {
    data_dir: PathBuf,
    dict_dir: PathBuf,
    words_txt: PathBuf,
    input_dir: PathBuf,
    unk_string: String,
    stage: i32,
    nj: usize,
    archives: String,
    manifests: String,
    g2p: ExternalCommand,
    spk2utt: ExternalCommand,
    validator: ExternalCommand,
    collation: Collation,
}

impl DataPrep {
    /// New pipeline starting at stage 0 with one job, default input layout and
    /// toolkit commands, and byte order collation.
    pub fn new(
        data_dir: PathBuf,
        dict_dir: PathBuf,
        words_txt: PathBuf,
        input_dir: PathBuf,
        unk_string: String,
    ) -> Self {
        Self {
            data_dir,
            dict_dir,
            words_txt,
            input_dir,
            unk_string,
            stage: 0,
            nj: 1,
            archives: DEFAULT_ARCHIVES.to_string(),
            manifests: DEFAULT_MANIFESTS.to_string(),
            g2p: ExternalCommand::new(DEFAULT_G2P),
            spk2utt: ExternalCommand::new(DEFAULT_SPK2UTT),
            validator: ExternalCommand::new(DEFAULT_VALIDATE),
            collation: Collation::Bytes,
        }
    }

    pub fn stage(mut self, stage: i32) -> Self {
        self.stage = stage;
        self
    }

    pub fn jobs(mut self, nj: usize) -> Self {
        self.nj = nj;
        self
    }

    /// Archive glob pattern, relative to the input directory unless absolute.
    pub fn archives(mut self, pattern: &str) -> Self {
        self.archives = pattern.to_string();
        self
    }

    /// Manifest glob pattern, relative to the input directory unless absolute.
    pub fn manifests(mut self, pattern: &str) -> Self {
        self.manifests = pattern.to_string();
        self
    }

    pub fn g2p(mut self, cmd: ExternalCommand) -> Self {
        self.g2p = cmd;
        self
    }

    pub fn spk2utt(mut self, cmd: ExternalCommand) -> Self {
        self.spk2utt = cmd;
        self
    }

    pub fn validator(mut self, cmd: ExternalCommand) -> Self {
        self.validator = cmd;
        self
    }

    /// Ordering of every table of the data directory.
    ///
    /// Kaldi checks tables in byte order (`LC_ALL=C`), keep the default unless the
    /// recipe runs the toolkit under another locale.
    pub fn collation(mut self, collation: Collation) -> Self {
        self.collation = collation;
        self
    }

    /// List input files matching `pattern`, sorted. No match is an error.
    fn glob_inputs(&self, pattern: &str, what: &str) -> Result<Vec<PathBuf>, Error> {
        let pattern = if Path::new(pattern).is_absolute() {
            PathBuf::from(pattern)
        } else {
            self.input_dir.join(pattern)
        };
        let pattern = pattern.to_string_lossy();

        let mut paths = glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?;
        if paths.is_empty() {
            return Err(Error::MissingInput(format!(
                "no {} matching {}",
                what, pattern
            )));
        }
        paths.sort();
        debug!("{} {}: {:#?}", paths.len(), what, paths);
        Ok(paths)
    }

    fn index(&self) -> Result<(), Error> {
        std::fs::create_dir_all(&self.data_dir)?;
        let archives = self.glob_inputs(&self.archives, "archives")?;
        ArchiveIndexer::new(archives, self.nj)?
            .write(&self.data_dir.join(WAV_SCP), &self.collation)?;
        Ok(())
    }

    fn transcripts(&self) -> Result<(), Error> {
        std::fs::create_dir_all(&self.data_dir)?;
        let manifests = self.glob_inputs(&self.manifests, "manifests")?;
        transcripts::merge(&manifests, &self.data_dir, &self.collation, &self.spk2utt)?;
        Ok(())
    }

    fn dictionary<G: Grapheme2Phoneme>(&self, g2p: &mut G) -> Result<(), Error> {
        std::fs::create_dir_all(&self.dict_dir)?;
        lexicon::build_dictionary(
            &self.words_txt,
            &self.data_dir.join(transcripts::TEXT),
            &self.dict_dir,
            &self.unk_string,
            g2p,
        )?;
        Ok(())
    }

    /// Ensure no lexicon derived from a previous `lexicon.txt` is left in the
    /// dictionary directory, since it would not match a regenerated `lexicon.txt`.
    ///
    /// Idempotent: absent files are fine.
    pub fn remove_stale_lexicons(&self) -> Result<(), Error> {
        for name in lexicon::DERIVED_LEXICONS {
            let path = self.dict_dir.join(name);
            if ensure_absent(&path)? {
                info!("removed stale {:?}", path);
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), Error> {
        self.remove_stale_lexicons()?;
        self.validator
            .run([OsStr::new("--no-feats"), self.data_dir.as_os_str()])?;
        info!("{:?} is valid", self.data_dir);
        Ok(())
    }

    /// Run the stages, creating the G2P converter with `make_g2p` only if the
    /// dictionary stage runs.
    pub fn run_with<G, F>(&self, make_g2p: F) -> Result<(), Error>
    where
        G: Grapheme2Phoneme,
        F: FnOnce() -> Result<G, Error>,
    {
        let mut make_g2p = Some(make_g2p);
        let mut ran = 0;

        for stage in Stage::from_start(self.stage) {
            info!("stage {}: {}", stage.number(), stage);
            let done = match stage {
                Stage::Index => self.index(),
                Stage::Transcripts => self.transcripts(),
                Stage::Dictionary => match make_g2p.take() {
                    Some(make_g2p) => make_g2p().and_then(|mut g2p| self.dictionary(&mut g2p)),
                    None => Err(Error::Custom("dictionary stage ran twice".to_string())),
                },
                Stage::Validate => self.validate(),
            };
            if let Err(e) = done {
                error!("stage {} ({}) failed: {}", stage.number(), stage, e);
                return Err(e);
            }
            ran += 1;
        }

        if ran == 0 {
            warn!("nothing to do from stage {}", self.stage);
        }
        Ok(())
    }
}

impl Pipeline<()> for DataPrep {
    fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn run(&self) -> Result<(), Error> {
        info!(
            "data preparation {} from stage {} ({:?})",
            Self::version(),
            self.stage,
            self.collation
        );
        self.run_with(|| ProcessG2p::spawn(&self.g2p))
    }
}
