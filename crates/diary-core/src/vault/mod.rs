//! The vault: one diary's settings, session and entries behind a single API.
//!
//! A [`Vault`] ties a persistent store to a session held in volatile storage
//! and to the origin the app is served from. Password handling lives in
//! `auth`, the entry service in `entries`, and whole-diary re-encryption
//! passes in `migrate`.

mod auth;
mod entries;
mod migrate;

pub use auth::FreshAuth;
pub use entries::DecryptedEntry;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::platform::Origin;
use crate::policy::{EncryptionMode, ModePolicy};
use crate::session::{SessionStore, VolatileStore};
use crate::settings::SettingsStore;

pub struct Vault<S, V, C = SystemClock> {
    store: S,
    session: SessionStore<V, C>,
    origin: Origin,
}

impl<S, V: VolatileStore> Vault<S, V, SystemClock> {
    pub fn new(store: S, volatile: V, origin: Origin) -> Self {
        Self::with_session(store, SessionStore::new(volatile), origin)
    }
}

impl<S, V: VolatileStore, C: Clock> Vault<S, V, C> {
    pub fn with_session(store: S, session: SessionStore<V, C>, origin: Origin) -> Self {
        Self {
            store,
            session,
            origin,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn session(&self) -> &SessionStore<V, C> {
        &self.session
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}

impl<S: SettingsStore, V: VolatileStore, C: Clock> Vault<S, V, C> {
    pub fn policy(&self) -> ModePolicy<&S> {
        ModePolicy::new(&self.store)
    }

    /// The active encryption mode.
    pub fn mode(&self) -> Result<EncryptionMode> {
        self.policy().get_mode()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::blocks::{Block, BlockType};
    use crate::clock::ManualClock;
    use crate::platform::Origin;
    use crate::session::{MemoryVolatileStore, SessionStore};
    use crate::storage::{NewTemplate, SqliteStorage, StorageEngine};

    use super::Vault;

    pub const PASSWORD: &str = "Correct1Horse";

    pub struct Fixture {
        pub storage: SqliteStorage,
        pub volatile: MemoryVolatileStore,
        pub clock: ManualClock,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self {
                storage: SqliteStorage::open_in_memory().unwrap(),
                volatile: MemoryVolatileStore::new(),
                clock: ManualClock::new(1_700_000_000_000),
            }
        }

        pub fn vault(
            &self,
        ) -> Vault<&SqliteStorage, &MemoryVolatileStore, &ManualClock> {
            Vault::with_session(
                &self.storage,
                SessionStore::with_clock(&self.volatile, &self.clock),
                Origin::localhost(),
            )
        }

        pub fn template(&self) -> (uuid::Uuid, Vec<Block>) {
            let blocks = vec![
                Block::new(BlockType::Textarea, "Notes"),
                Block::new(BlockType::Multiselect, "Activities")
                    .with_choices(vec!["work".into(), "sport".into()]),
            ];
            let id = self
                .storage
                .create_template(&NewTemplate::new("Journal", blocks.clone()))
                .unwrap();
            (id, blocks)
        }
    }
}
