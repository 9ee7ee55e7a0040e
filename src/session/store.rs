//! Single-slot credential store.
//!
//! Holds the most recently resolved credential for the lifetime of the
//! process. Never persisted to disk. `put` overwrites unconditionally -
//! under interleaved resolutions the last writer wins, which is
//! acceptable because the store is a cache of convenience, not a
//! consistency-critical resource. Staleness is detected downstream by
//! the API client's 401 classification, not by a TTL here.

use crate::session::credential::Credential;

#[derive(Debug, Default)]
pub struct CredentialStore {
    slot: Option<Credential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a credential, replacing any previous one.
    pub fn put(&mut self, credential: Credential) {
        self.slot = Some(credential);
    }

    /// The current credential, if one is held.
    pub fn get(&self) -> Option<&Credential> {
        self.slot.as_ref()
    }

    /// Empty the slot (user-initiated clear).
    pub fn clear(&mut self) {
        self.slot = None;
    }
}
