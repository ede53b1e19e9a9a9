/*! External toolkit commands

The speaker grouping utility (`utt2spk_to_spk2utt.pl`), the data directory validator
(`validate_data_dir.sh`) and the G2P converter are external programs.
They are configured as shell-like command lines and run without a shell.
!*/
use std::{
    ffi::OsStr,
    fs::File,
    io::Write,
    path::Path,
    process::{Command, Stdio},
    str::FromStr,
};

use log::{debug, info};

use crate::error::Error;
use crate::io::TableWriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    /// Split a command line (`python3 g2p.py --model x`) into a program and its arguments.
    pub fn parse(cmdline: &str) -> Result<Self, Error> {
        let mut parts = shlex::split(cmdline)
            .ok_or_else(|| Error::Custom(format!("malformed command line: {:?}", cmdline)))?
            .into_iter();
        let program = parts
            .next()
            .ok_or_else(|| Error::Custom("empty command line".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Build a [Command] with the configured arguments followed by `extra`.
    pub fn command<I, S>(&self, extra: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).args(extra);
        cmd
    }

    /// Run to completion with inherited stdio, failing on a non-zero exit.
    pub fn run<I, S>(&self, extra: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = self.command(extra);
        debug!("running {:?}", cmd);
        let status = cmd.status()?;
        self.check(status)
    }

    /// Run with `src` as stdin and `dst` as stdout.
    ///
    /// `dst` only appears once the command has succeeded.
    pub fn filter_file(&self, src: &Path, dst: &Path) -> Result<(), Error> {
        let mut output = TableWriter::create(dst)?;
        self.pipe_into(src, &mut output)?;
        output.commit()?;
        info!("{} {:?} > {:?}", self.program, src, dst);
        Ok(())
    }

    /// Run with `src` as stdin, copying stdout into `output`.
    ///
    /// The child is always waited for, even if `output` fails.
    fn pipe_into<W: Write>(&self, src: &Path, output: &mut W) -> Result<(), Error> {
        let input = File::open(src)?;
        let mut child = self
            .command(std::iter::empty::<&OsStr>())
            .stdin(Stdio::from(input))
            .stdout(Stdio::piped())
            .spawn()?;

        // stdout is closed at the end of the match, so that a child still writing
        // gets a broken pipe instead of blocking the wait below.
        let copied = match child.stdout.take() {
            Some(mut stdout) => std::io::copy(&mut stdout, output).map(|_| ()),
            None => Ok(()),
        };
        let status = child.wait()?;
        copied?;
        self.check(status)
    }

    fn check(&self, status: std::process::ExitStatus) -> Result<(), Error> {
        if status.success() {
            Ok(())
        } else {
            Err(Error::Command {
                program: self.program.clone(),
                status,
            })
        }
    }
}

impl FromStr for ExternalCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quoted() {
        let cmd = ExternalCommand::parse("python3 'my g2p.py' --lang en").unwrap();
        assert_eq!(cmd.program(), "python3");
        assert_eq!(cmd.args, vec!["my g2p.py", "--lang", "en"]);
    }

    #[test]
    fn parse_malformed() {
        assert!(ExternalCommand::parse("python3 'oops").is_err());
        assert!(ExternalCommand::parse("   ").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn run_reports_exit_status() {
        assert!(ExternalCommand::new("true").run(["x"]).is_ok());
        match ExternalCommand::new("false").run(["x"]) {
            Err(Error::Command { program, status }) => {
                assert_eq!(program, "false");
                assert!(!status.success());
            }
            other => panic!("expected a command error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn filter_file_pipes_content() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("utt2spk");
        let dst = dir.path().join("spk2utt");
        std::fs::write(&src, "u1 u1\nu2 u2\n").unwrap();

        ExternalCommand::new("cat").filter_file(&src, &dst).unwrap();
        assert_eq!(std::fs::read_to_string(&dst).unwrap(), "u1 u1\nu2 u2\n");
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[cfg(unix)]
    #[test]
    fn child_is_waited_for_when_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("utt2spk");
        let done = dir.path().join("done");
        std::fs::write(&src, "u1 u1\n").unwrap();

        let cmd = ExternalCommand {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                format!("cat; echo ok > '{}'", done.display()),
            ],
        };
        let res = cmd.pipe_into(&src, &mut BrokenSink);

        assert!(matches!(res, Err(Error::Io(_))));
        // the shell wrote its marker before exiting, so it has been waited for
        assert_eq!(std::fs::read_to_string(&done).unwrap(), "ok\n");
    }

    #[cfg(unix)]
    #[test]
    fn failed_filter_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("utt2spk");
        let dst = dir.path().join("spk2utt");
        std::fs::write(&src, "u1 u1\n").unwrap();

        let cmd = ExternalCommand::parse("sh -c 'cat; exit 3'").unwrap();
        assert!(cmd.filter_file(&src, &dst).is_err());
        assert!(!dst.exists());
    }
}
