use std::{
    error::Error as StdError,
    fmt::{self, Display},
    result,
};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Rusqlite(rusqlite::Error),
    /// No open connection, either because opening failed at startup or the
    /// store was already closed.
    Unavailable,
    /// A thread panicked while holding the connection lock.
    Poisoned,
    /// The file was migrated by a newer build.
    UnsupportedVersion { found: u32, supported: u32 },
}

impl Error {
    #[inline]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Error::Unavailable | Error::Poisoned)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Rusqlite(inner) => fmt::Display::fmt(&inner, f),
            Error::Unavailable => f.write_str("Database is not connected"),
            Error::Poisoned => f.write_str("Database lock was poisoned"),
            Error::UnsupportedVersion { found, supported } => write!(
                f,
                "Database version {found} is newer than this build supports ({supported})"
            ),
        }
    }
}

impl StdError for Error {}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Error {
        Error::Rusqlite(e)
    }
}
