use std::path::PathBuf;

/// Failures the shell can observe.  None of them are fatal to the host:
/// callers log them and fall back to a degraded state.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("host container `{0}` is missing")]
    MissingHost(String),

    #[error("bridge factory export is missing: {0}")]
    MissingFactory(String),

    #[error("bridge resolution failed: {0}")]
    BridgeResolution(String),

    #[error("local font access denied or unavailable: {0}")]
    FontAccess(String),

    #[error("invalid config value for `{key}`: {value}")]
    Config { key: String, value: String },

    #[error("config file {0} could not be written")]
    ConfigWrite(PathBuf, #[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShellError>;
