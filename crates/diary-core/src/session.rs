//! Short-lived holder of the verified password.
//!
//! The session lives in volatile storage (gone when the "tab" goes away) as
//! `{ "password": ..., "timestamp": <epoch millis> }`. It expires 24 hours
//! after the last touch, so every save slides the window forward.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::clock::{Clock, SystemClock};
use crate::error::{DiaryError, Result};

/// Volatile key holding the session record.
pub const SESSION_KEY: &str = "authSession";

/// Sliding expiry window.
pub const SESSION_TIMEOUT_HOURS: i64 = 24;

/// Storage that does not survive the end of the app instance.
pub trait VolatileStore {
    fn get_item(&self, key: &str) -> Result<Option<Zeroizing<String>>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

impl<T: VolatileStore + ?Sized> VolatileStore for &T {
    fn get_item(&self, key: &str) -> Result<Option<Zeroizing<String>>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

/// Process-local volatile storage.
#[derive(Default)]
pub struct MemoryVolatileStore {
    items: Mutex<HashMap<String, Zeroizing<String>>>,
}

impl MemoryVolatileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything, as closing the tab would.
    pub fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Zeroizing<String>>>> {
        self.items
            .lock()
            .map_err(|_| DiaryError::Storage("Volatile store lock poisoned".to_string()))
    }
}

impl VolatileStore for MemoryVolatileStore {
    fn get_item(&self, key: &str) -> Result<Option<Zeroizing<String>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?
            .insert(key.to_string(), Zeroizing::new(value.to_string()));
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct SessionRecord {
    password: String,
    timestamp: i64,
}

/// Explicit session context handed to every operation that needs the password.
///
/// Writes are last-write-wins; there is only ever one session slot.
pub struct SessionStore<V, C = SystemClock> {
    store: V,
    clock: C,
    timeout: Duration,
}

impl<V: VolatileStore> SessionStore<V, SystemClock> {
    pub fn new(store: V) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<V: VolatileStore, C: Clock> SessionStore<V, C> {
    pub fn with_clock(store: V, clock: C) -> Self {
        Self {
            store,
            clock,
            timeout: Duration::hours(SESSION_TIMEOUT_HOURS),
        }
    }

    pub fn store(&self) -> &V {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Start a session for an already verified password.
    pub fn open(&self, password: &str) -> Result<()> {
        self.write(password)?;
        debug!("session opened");
        Ok(())
    }

    /// Whether a session exists and has not expired.
    ///
    /// Reading an expired or unreadable record removes it, so this "read"
    /// can mutate storage.
    pub fn is_valid(&self) -> Result<bool> {
        let Some(record) = self.read()? else {
            return Ok(false);
        };
        let expired = self
            .clock
            .now_millis()
            .checked_sub(record.timestamp)
            .map_or(true, |elapsed| elapsed > self.timeout.num_milliseconds());
        if expired {
            self.store.remove_item(SESSION_KEY)?;
            debug!("session expired");
            return Ok(false);
        }
        Ok(true)
    }

    /// The stored password, without checking expiry.
    ///
    /// Call [`is_valid`](Self::is_valid) first when expiry must be enforced.
    pub fn peek_password(&self) -> Result<Option<Zeroizing<String>>> {
        Ok(self
            .read()?
            .map(|record| Zeroizing::new(record.password.clone())))
    }

    /// Re-stamp the session with the current time. No-op without a session.
    pub fn touch(&self) -> Result<()> {
        if let Some(record) = self.read()? {
            self.write(&record.password)?;
        }
        Ok(())
    }

    /// Remove the session unconditionally.
    pub fn close(&self) -> Result<()> {
        self.store.remove_item(SESSION_KEY)?;
        debug!("session closed");
        Ok(())
    }

    fn read(&self) -> Result<Option<SessionRecord>> {
        let Some(raw) = self.store.get_item(SESSION_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(_) => {
                self.store.remove_item(SESSION_KEY)?;
                debug!("discarded unreadable session record");
                Ok(None)
            }
        }
    }

    fn write(&self, password: &str) -> Result<()> {
        let record = SessionRecord {
            password: password.to_string(),
            timestamp: self.clock.now_millis(),
        };
        let json = Zeroizing::new(serde_json::to_string(&record)?);
        self.store.set_item(SESSION_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const T0: i64 = 1_700_000_000_000;

    fn minutes(value: i64) -> Duration {
        Duration::minutes(value)
    }

    #[test]
    fn test_open_then_valid() {
        let store = MemoryVolatileStore::new();
        let session = SessionStore::with_clock(&store, ManualClock::new(T0));
        assert!(!session.is_valid().unwrap());

        session.open("Abcd1234").unwrap();
        assert!(session.is_valid().unwrap());
        assert_eq!(session.peek_password().unwrap().unwrap().as_str(), "Abcd1234");
    }

    #[test]
    fn test_expiry_boundary() {
        let store = MemoryVolatileStore::new();
        let clock = ManualClock::new(T0);
        let session = SessionStore::with_clock(&store, &clock);
        session.open("Abcd1234").unwrap();

        clock.set(T0 + (Duration::hours(23) + minutes(59)).num_milliseconds());
        assert!(session.is_valid().unwrap());

        clock.set(T0 + (Duration::hours(24) + minutes(1)).num_milliseconds());
        assert!(!session.is_valid().unwrap());
        assert!(session.peek_password().unwrap().is_none());
        assert!(store.get_item(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_touch_slides_window() {
        let store = MemoryVolatileStore::new();
        let clock = ManualClock::new(T0);
        let session = SessionStore::with_clock(&store, &clock);
        session.open("Abcd1234").unwrap();

        clock.advance(Duration::hours(23));
        session.touch().unwrap();
        clock.advance(Duration::hours(23));

        assert!(session.is_valid().unwrap());
    }

    #[test]
    fn test_touch_without_session_is_noop() {
        let store = MemoryVolatileStore::new();
        let session = SessionStore::with_clock(&store, ManualClock::new(T0));
        session.touch().unwrap();
        assert!(store.get_item(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_peek_ignores_expiry() {
        let store = MemoryVolatileStore::new();
        let clock = ManualClock::new(T0);
        let session = SessionStore::with_clock(&store, &clock);
        session.open("Abcd1234").unwrap();
        clock.advance(Duration::hours(30));

        assert!(session.peek_password().unwrap().is_some());
    }

    #[test]
    fn test_close_removes_record() {
        let store = MemoryVolatileStore::new();
        let session = SessionStore::with_clock(&store, ManualClock::new(T0));
        session.open("Abcd1234").unwrap();
        session.close().unwrap();
        assert!(!session.is_valid().unwrap());
    }

    #[test]
    fn test_reopen_overwrites() {
        let store = MemoryVolatileStore::new();
        let session = SessionStore::with_clock(&store, ManualClock::new(T0));
        session.open("First1234").unwrap();
        session.open("Second1234").unwrap();
        assert_eq!(
            session.peek_password().unwrap().unwrap().as_str(),
            "Second1234"
        );
    }

    #[test]
    fn test_corrupt_record_reads_as_absent() {
        let store = MemoryVolatileStore::new();
        store.set_item(SESSION_KEY, "{not json").unwrap();
        let session = SessionStore::with_clock(&store, ManualClock::new(T0));

        assert!(!session.is_valid().unwrap());
        assert!(store.get_item(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_out_of_range_timestamp_reads_as_expired() {
        let store = MemoryVolatileStore::new();
        store
            .set_item(
                SESSION_KEY,
                &format!(r#"{{"password":"Abcd1234","timestamp":{}}}"#, i64::MIN),
            )
            .unwrap();
        let session = SessionStore::with_clock(&store, ManualClock::new(T0));

        assert!(!session.is_valid().unwrap());
        assert!(store.get_item(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_record_is_json_with_timestamp() {
        let store = MemoryVolatileStore::new();
        let session = SessionStore::with_clock(&store, ManualClock::new(T0));
        session.open("Abcd1234").unwrap();

        let raw = store.get_item(SESSION_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["password"], "Abcd1234");
        assert_eq!(value["timestamp"], T0);
    }
}
