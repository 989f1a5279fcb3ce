//! Key-value store contract.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of the underlying key-value backend.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Backing table is absent; the connection skipped migrations.
    MissingTable(&'static str),
    /// Backend refused the write (used by the in-memory store).
    WriteRejected(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingTable(table) => write!(f, "store table `{table}` is missing"),
            Self::WriteRejected(message) => write!(f, "store write rejected: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MissingTable(_) | Self::WriteRejected(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// String-keyed store of serialized values.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes all entries or none of them.
    fn put_many(&self, entries: &[(&str, String)]) -> StoreResult<()>;

    /// Removes keys; missing keys are ignored.
    fn remove_many(&self, keys: &[&str]) -> StoreResult<()>;

    fn put(&self, key: &str, value: String) -> StoreResult<()> {
        self.put_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.remove_many(&[key])
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn put_many(&self, entries: &[(&str, String)]) -> StoreResult<()> {
        (**self).put_many(entries)
    }

    fn remove_many(&self, keys: &[&str]) -> StoreResult<()> {
        (**self).remove_many(keys)
    }
}
