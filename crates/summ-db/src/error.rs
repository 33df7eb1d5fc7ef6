use rusqlite::ffi;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    #[error("duplicate value: {0}")]
    Duplicate(String),

    /// A FOREIGN KEY constraint rejected the write.
    #[error("referenced row does not exist: {0}")]
    MissingReference(String),

    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, msg) = &e {
            let detail = msg.clone().unwrap_or_else(|| err.to_string());
            match err.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return Self::Duplicate(detail);
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Self::MissingReference(detail),
                _ => {}
            }
        }
        Self::Sqlite(e)
    }
}
