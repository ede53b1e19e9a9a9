/*! Grapheme-to-phoneme conversion

The conversion algorithm itself lives outside of this crate.
[Grapheme2Phoneme] is the seam: anything turning a word into a sequence of phoneme tokens.

[ProcessG2p] talks to a long-running converter process over a JSON lines protocol:
each request is a JSON string on its own line, each response a JSON array of strings.

```text
> "cat"
< ["K", "AE1", "T"]
```

Converters may emit whitespace tokens (some models do between sub-words);
these are filtered out by the lexicon builder, not here.
!*/
use std::{
    io::{BufRead, BufReader, BufWriter, Write},
    process::{Child, ChildStdin, ChildStdout, Stdio},
};

use log::{debug, warn};

use crate::{error::Error, external::ExternalCommand};

pub trait Grapheme2Phoneme {
    /// Convert `word` to its pronunciation. Order and repetitions are meaningful.
    fn phonemes(&mut self, word: &str) -> Result<Vec<String>, Error>;
}

impl<F> Grapheme2Phoneme for F
where
    F: FnMut(&str) -> Result<Vec<String>, Error>,
{
    fn phonemes(&mut self, word: &str) -> Result<Vec<String>, Error> {
        self(word)
    }
}

/// Converter running as a child process.
pub struct ProcessG2p {
    program: String,
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    buf: String,
}

impl ProcessG2p {
    pub fn spawn(cmd: &ExternalCommand) -> Result<Self, Error> {
        let mut child = cmd
            .command(std::iter::empty::<&str>())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| Error::G2p(format!("could not start {}: {}", cmd.program(), e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::G2p("converter stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::G2p("converter stdout unavailable".to_string()))?;

        debug!("started g2p converter {} (pid {})", cmd.program(), child.id());
        Ok(Self {
            program: cmd.program().to_string(),
            child,
            stdin: BufWriter::new(stdin),
            stdout: BufReader::new(stdout),
            buf: String::new(),
        })
    }
}

impl Grapheme2Phoneme for ProcessG2p {
    fn phonemes(&mut self, word: &str) -> Result<Vec<String>, Error> {
        serde_json::to_writer(&mut self.stdin, word)?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()?;

        self.buf.clear();
        if self.stdout.read_line(&mut self.buf)? == 0 {
            return Err(Error::G2p(format!(
                "{} exited while converting {:?}",
                self.program, word
            )));
        }

        serde_json::from_str(self.buf.trim_end()).map_err(|e| {
            Error::G2p(format!(
                "{} answered {:?} for {:?}: {}",
                self.program,
                self.buf.trim_end(),
                word,
                e
            ))
        })
    }
}

impl Drop for ProcessG2p {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            debug!("g2p converter already gone: {}", e);
        }
        if let Err(e) = self.child.wait() {
            warn!("could not reap g2p converter: {}", e);
        }
    }
}
