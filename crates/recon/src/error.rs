use std::fmt;

/// Errors raised at the edges of the engine: config loading and the record
/// source. The reconciliation itself never fails.
#[derive(Debug)]
pub enum StockError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty alias list, ratio out of range, etc.).
    ConfigValidation(String),
    /// File could not be read or written.
    Io { path: String, message: String },
    /// CSV or JSON content could not be parsed.
    Parse { path: String, message: String },
    /// File extension is neither `.csv` nor `.json`.
    UnsupportedFormat(String),
    /// Append target has no header row.
    MissingHeader(String),
}

impl fmt::Display for StockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Io { path, message } => write!(f, "{path}: {message}"),
            Self::Parse { path, message } => write!(f, "{path}: cannot parse: {message}"),
            Self::UnsupportedFormat(path) => {
                write!(f, "{path}: unsupported format (expected .csv or .json)")
            }
            Self::MissingHeader(path) => write!(f, "{path}: no header row to append against"),
        }
    }
}

impl std::error::Error for StockError {}

impl StockError {
    pub(crate) fn io(path: &std::path::Path, err: impl fmt::Display) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn parse(path: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::Parse {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
