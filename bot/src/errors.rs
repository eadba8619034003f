use std::{
    error::Error as StdError,
    fmt::{self, Display},
    result,
};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Serenity(serenity::Error),
    Db(db::Error),
    Config(toml::de::Error),
    IoError(std::io::Error),
    InvalidConfig(String),
    ConstStr(&'static str),
}

impl Error {
    /// True when the store has no open connection, as opposed to a failing
    /// query.
    pub const fn is_unavailable(&self) -> bool {
        match self {
            Error::Db(inner) => inner.is_unavailable(),
            _ => false,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Serenity(inner) => fmt::Display::fmt(&inner, f),
            Error::Db(inner) => fmt::Display::fmt(&inner, f),
            Error::Config(inner) => fmt::Display::fmt(&inner, f),
            Error::IoError(inner) => fmt::Display::fmt(&inner, f),
            Error::InvalidConfig(inner) => write!(f, "Invalid config: {inner}"),
            Error::ConstStr(inner) => f.write_str(inner),
        }
    }
}

impl StdError for Error {}

impl From<serenity::Error> for Error {
    fn from(e: serenity::Error) -> Error {
        Error::Serenity(e)
    }
}

impl From<db::Error> for Error {
    fn from(e: db::Error) -> Error {
        Error::Db(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Error {
        Error::Config(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::IoError(e)
    }
}
