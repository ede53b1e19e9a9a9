//! Reference transcript filtering for scoring.
//!
//! Lowercases the transcript of `<key> <transcript>` lines so that references match
//! the case of the lexicon. Case folding is the only normalization done on transcripts.
use std::io::{BufRead, Write};

use crate::error::Error;

/// Filter `input` into `output`. Blank lines are dropped.
pub fn filter_ref<R: BufRead, W: Write>(input: R, mut output: W) -> Result<usize, Error> {
    let mut nb_lines = 0;
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (key, text) = match line.split_once(char::is_whitespace) {
            Some((key, text)) => (key, text.trim_start()),
            None => (line, ""),
        };
        writeln!(output, "{} {}", key, text.to_lowercase())?;
        nb_lines += 1;
    }
    output.flush()?;
    Ok(nb_lines)
}
