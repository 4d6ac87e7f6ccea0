//! Options store trait with in-memory and SQLite implementations.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::repo::options_repo::{OptionsRepository, SqliteOptionsRepository};
use crate::repo::RepoError;
use log::{error, warn};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

pub type OptionsResult<T> = Result<T, OptionsError>;

/// Options persistence errors.
#[derive(Debug)]
pub enum OptionsError {
    Repo(RepoError),
    InvalidValue { name: String, value: String },
}

impl Display for OptionsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::InvalidValue { name, value } => {
                write!(f, "invalid value `{value}` for option `{name}`")
            }
        }
    }
}

impl Error for OptionsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<RepoError> for OptionsError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for OptionsError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

/// One observed option change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionChange {
    pub name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

pub type OptionListener = Arc<dyn Fn(&OptionChange) + Send + Sync>;

/// Handle returned by [`OptionsStore::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptionListenerId(u64);

/// Key-value preferences with change notification.
pub trait OptionsStore: Send + Sync {
    fn get_string(&self, name: &str) -> Option<String>;
    fn set_string(&self, name: &str, value: &str) -> OptionsResult<()>;
    fn remove(&self, name: &str) -> OptionsResult<()>;
    fn add_listener(&self, listener: OptionListener) -> OptionListenerId;
    fn remove_listener(&self, id: OptionListenerId) -> bool;

    fn get_int(&self, name: &str, default: i64) -> i64 {
        match self.get_string(name) {
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                warn!("event=option_parse module=options status=fallback name={name} kind=int");
                default
            }),
            None => default,
        }
    }

    fn get_bool(&self, name: &str, default: bool) -> bool {
        match self.get_string(name).as_deref().map(str::trim) {
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(_) => {
                warn!("event=option_parse module=options status=fallback name={name} kind=bool");
                default
            }
            None => default,
        }
    }

    fn set_int(&self, name: &str, value: i64) -> OptionsResult<()> {
        self.set_string(name, &value.to_string())
    }

    fn set_bool(&self, name: &str, value: bool) -> OptionsResult<()> {
        self.set_string(name, if value { "true" } else { "false" })
    }
}

#[derive(Default)]
struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(OptionListenerId, OptionListener)>>,
}

impl ListenerRegistry {
    fn add(&self, listener: OptionListener) -> OptionListenerId {
        let id = OptionListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, listener));
        id
    }

    fn remove(&self, id: OptionListenerId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(entry_id, _)| *entry_id != id);
        listeners.len() != before
    }

    fn len(&self) -> usize {
        lock(&self.listeners).len()
    }

    fn notify(&self, change: OptionChange) {
        if change.old_value == change.new_value {
            return;
        }
        // Snapshot so listeners may (de)register without deadlocking.
        let listeners: Vec<OptionListener> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&change))).is_err() {
                error!(
                    "event=option_listener module=options status=panic name={}",
                    change.name
                );
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Volatile options store, used for tests and portable sessions.
#[derive(Default)]
pub struct MemoryOptionsStore {
    values: Mutex<BTreeMap<String, String>>,
    listeners: ListenerRegistry,
}

impl MemoryOptionsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    pub fn with_values<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        {
            let mut values = lock(&store.values);
            for (name, value) in entries {
                values.insert(name.to_string(), value.to_string());
            }
        }
        store
    }

    /// Number of registered change listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl OptionsStore for MemoryOptionsStore {
    fn get_string(&self, name: &str) -> Option<String> {
        lock(&self.values).get(name).cloned()
    }

    fn set_string(&self, name: &str, value: &str) -> OptionsResult<()> {
        let old_value = lock(&self.values).insert(name.to_string(), value.to_string());
        self.listeners.notify(OptionChange {
            name: name.to_string(),
            old_value,
            new_value: Some(value.to_string()),
        });
        Ok(())
    }

    fn remove(&self, name: &str) -> OptionsResult<()> {
        let old_value = lock(&self.values).remove(name);
        self.listeners.notify(OptionChange {
            name: name.to_string(),
            old_value,
            new_value: None,
        });
        Ok(())
    }

    fn add_listener(&self, listener: OptionListener) -> OptionListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: OptionListenerId) -> bool {
        self.listeners.remove(id)
    }
}

/// Options store persisted in a SQLite `options` table.
pub struct SqliteOptionsStore {
    conn: Mutex<Connection>,
    listeners: ListenerRegistry,
}

impl SqliteOptionsStore {
    pub fn open(path: impl AsRef<Path>) -> OptionsResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn in_memory() -> OptionsResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            listeners: ListenerRegistry::default(),
        }
    }

    /// Returns all stored options ordered by name.
    pub fn entries(&self) -> OptionsResult<Vec<(String, String)>> {
        let conn = lock(&self.conn);
        Ok(SqliteOptionsRepository::new(&conn).list()?)
    }
}

impl OptionsStore for SqliteOptionsStore {
    fn get_string(&self, name: &str) -> Option<String> {
        let conn = lock(&self.conn);
        match SqliteOptionsRepository::new(&conn).get(name) {
            Ok(value) => value,
            Err(err) => {
                error!("event=option_read module=options status=error name={name} error={err}");
                None
            }
        }
    }

    fn set_string(&self, name: &str, value: &str) -> OptionsResult<()> {
        let old_value = {
            let conn = lock(&self.conn);
            let repo = SqliteOptionsRepository::new(&conn);
            let old_value = repo.get(name)?;
            repo.put(name, value)?;
            old_value
        };
        self.listeners.notify(OptionChange {
            name: name.to_string(),
            old_value,
            new_value: Some(value.to_string()),
        });
        Ok(())
    }

    fn remove(&self, name: &str) -> OptionsResult<()> {
        let old_value = {
            let conn = lock(&self.conn);
            let repo = SqliteOptionsRepository::new(&conn);
            let old_value = repo.get(name)?;
            repo.remove(name)?;
            old_value
        };
        self.listeners.notify(OptionChange {
            name: name.to_string(),
            old_value,
            new_value: None,
        });
        Ok(())
    }

    fn add_listener(&self, listener: OptionListener) -> OptionListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: OptionListenerId) -> bool {
        self.listeners.remove(id)
    }
}
