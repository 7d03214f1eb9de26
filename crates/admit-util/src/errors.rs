use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all Admit operations.
#[derive(Debug, Error, Diagnostic)]
pub enum AdmitError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed activation plan (e.g. Admit.toml).
    #[error("Plan error: {message}")]
    #[diagnostic(help("Check your Admit.toml for syntax errors and undeclared modules"))]
    Plan { message: String },

    /// Invalid global configuration.
    #[error("Config error: {message}")]
    #[diagnostic(help("Check ~/.admit/config.toml or the file named by ADMIT_CONFIG"))]
    Config { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type AdmitResult<T> = miette::Result<T>;
