//! # kaldiprep
//!
//! Prepares a Kaldi data directory and pronunciation dictionary from a speech corpus
//! shipped as tar archives with a JSON lines transcript manifest.
//!
//! ## Getting started
//!
//! ```sh
//! kaldiprep 0.1.0
//! speech corpus to Kaldi data directory tool.
//!
//! USAGE:
//!     kaldiprep <SUBCOMMAND>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -V, --version    Prints version information
//!
//! SUBCOMMANDS:
//!     data-prep     Run data preparation stages
//!     filter-ref    Lowercase reference transcripts (stdin to stdout)
//!     help          Prints this message or the help of the given subcommand(s)
//! ```
//!
//! Logging is controlled by `RUST_LOG` (e.g. `RUST_LOG=kaldiprep=info`).
use std::io::{self, BufWriter};

use structopt::StructOpt;

use kaldiprep::error::Error;
use kaldiprep::pipelines::Pipeline;
use kaldiprep::processing::ref_filter::filter_ref;

#[macro_use]
extern crate log;

mod cli;

fn main() -> Result<(), Error> {
    env_logger::init();

    let opt = cli::KaldiPrep::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::KaldiPrep::DataPrep(p) => {
            let p = p.into_pipeline();
            p.run()?;
        }
        cli::KaldiPrep::FilterRef => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            let nb_lines = filter_ref(stdin.lock(), BufWriter::new(stdout.lock()))?;
            debug!("filtered {} lines", nb_lines);
        }
    };

    Ok(())
}
