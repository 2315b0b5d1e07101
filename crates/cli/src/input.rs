//! Acquires the exception report from the command line, a file, or stdin.

use std::io::Read;

use anyhow::{bail, Context, Result};
use triage::ExceptionReport;

use crate::config::Cli;

/// Returns the exception text from the first available source: the positional
/// argument, `--file`, or standard input.
///
/// Only a completely empty report is refused; whitespace and arbitrarily long
/// text are passed on untouched.
pub fn read_exception(cli: &Cli) -> Result<ExceptionReport> {
    let text = match (&cli.exception, &cli.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read exception details from {}", path.display()))?,
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read exception details from stdin")?;
            buffer
        }
    };

    if text.is_empty() {
        bail!("no exception details provided");
    }
    Ok(ExceptionReport::new(text))
}
