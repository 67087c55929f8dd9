use std::io;
use thiserror::Error;
use tokio::time::error::Elapsed;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Connection timed out")]
    ConnectionTimeout(#[from] Elapsed),

    #[error("Error creating connection after {retries} retries")]
    DatabaseConnection { retries: u32 },

    #[error(transparent)]
    Database(tokio_postgres::Error),

    #[error("Could not allocate a unique code with prefix {prefix} after {attempts} attempts")]
    CouldNotAllocate { prefix: String, attempts: u32 },

    #[error("Code {code} already exists")]
    DuplicateCode { code: String },

    #[error("Code suffix for prefix {prefix} is exhausted")]
    SuffixOverflow { prefix: String },

    #[error("Emergency bed {key} was not found")]
    NotFound { key: String },

    #[error("Unknown bed status {status}")]
    UnknownBedStatus { status: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Prometheus(#[from] metrics_exporter_prometheus::BuildError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value {value} for {name}")]
    InvalidParameter { name: String, value: String },

    #[error("Missing field {name} from configuration file or environment")]
    MissingParameter { name: String },

    #[error(transparent)]
    FileOrEnvironment(#[from] config::ConfigError),
}

impl Error {
    ///
    /// HTTP status a request handler reports for this error.
    ///
    /// A duplicate code is the caller's problem (4xx), exhausting the retry budget is ours (5xx).
    ///
    pub fn status_code(&self) -> u16 {
        match self {
            Error::DuplicateCode { .. } | Error::UnknownBedStatus { .. } => 400,
            Error::NotFound { .. } => 404,
            Error::ConnectionTimeout(_) | Error::DatabaseConnection { .. } => 503,
            _ => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.into())
    }
}

impl From<tokio_postgres::Error> for Error {
    fn from(e: tokio_postgres::Error) -> Self {
        Error::Database(e)
    }
}
