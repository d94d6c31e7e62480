//! Errors reported by the command-line interface

use miette::Diagnostic;
use tailspin_runtime::RuntimeError;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Unknown demo: {name}")]
    #[diagnostic(
        code(tailspin::cli::unknown_demo),
        help("Run `tailspin list` to see the available demos")
    )]
    UnknownDemo { name: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Runtime(#[from] RuntimeError),
}
