use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info};

use crate::config::WritePolicy;
use crate::domain::{
    BearerToken, Candidate, CandidateId, Channel, ChannelId, Document, Team, TeamId, TeamUpdate,
};
use crate::errors::StoreError;
use crate::migrate::{self, VersionedDocument};
use crate::storage::DocumentStorage;

/// Reads the stored document. Never fails: a missing document and an
/// unreadable one both come back as a fresh empty document.
pub fn load<S: DocumentStorage>(storage: &S) -> VersionedDocument {
    let location = storage.location().display().to_string();

    let raw = match storage.read() {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            info!(
                event_name = "store.load.missing",
                location = %location,
                "no document found, a new one will be written on the next change"
            );
            return VersionedDocument::Current(Document::default());
        }
        Err(err) => {
            error!(
                event_name = "store.load.failed",
                location = %location,
                error = %err,
                "document could not be read, starting from an empty document"
            );
            return VersionedDocument::Current(Document::default());
        }
    };

    match migrate::decode(&raw) {
        Ok(document) => document,
        Err(err) => {
            error!(
                event_name = "store.load.failed",
                location = %location,
                error = %err,
                "document could not be parsed, starting from an empty document"
            );
            VersionedDocument::Current(Document::default())
        }
    }
}

/// Serializes the whole document and overwrites the stored copy.
pub fn save<S: DocumentStorage>(storage: &S, document: &Document) -> Result<(), StoreError> {
    let serialized = serde_json::to_string_pretty(document).map_err(StoreError::Serialize)?;
    storage.write(&serialized)
}

/// The single in-memory document plus the storage it is written through to.
#[derive(Debug)]
pub struct DocumentStore<S: DocumentStorage> {
    storage: S,
    document: Document,
    write_policy: WritePolicy,
}

impl<S: DocumentStorage> DocumentStore<S> {
    /// Loads the document, upgrades it to the current schema and persists
    /// the upgraded form when a migration ran.
    pub fn open(storage: S, write_policy: WritePolicy) -> Result<Self, StoreError> {
        let upgrade = migrate::upgrade(load(&storage));
        let changed = upgrade.changed();
        let store = Self { storage, document: upgrade.document, write_policy };

        if changed {
            store.persist()?;
        }

        Ok(store)
    }

    /// Wraps an already-built document without touching storage.
    pub fn with_document(storage: S, document: Document, write_policy: WritePolicy) -> Self {
        Self { storage, document, write_policy }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    pub fn channel(&self, team_id: &TeamId, channel_id: &ChannelId) -> Option<&Channel> {
        self.document.channel(team_id, channel_id)
    }

    /// Candidates of a channel in insertion order; empty when the channel is unknown.
    pub fn candidates(&self, team_id: &TeamId, channel_id: &ChannelId) -> &[Candidate] {
        self.channel(team_id, channel_id).map_or(&[], |channel| channel.candidates.as_slice())
    }

    pub fn not_eligible_users(
        &self,
        team_id: &TeamId,
        channel_id: &ChannelId,
    ) -> BTreeSet<CandidateId> {
        self.channel(team_id, channel_id)
            .map(|channel| channel.not_eligible_users.clone())
            .unwrap_or_default()
    }

    pub fn bearer(&self, team_id: &TeamId) -> Option<&BearerToken> {
        self.document.team(team_id).and_then(|team| team.token.as_ref())
    }

    pub fn set_candidates(
        &mut self,
        team_id: &TeamId,
        channel_id: &ChannelId,
        candidates: Vec<Candidate>,
    ) -> Result<Vec<Candidate>, StoreError> {
        self.update_channel(team_id, channel_id, |channel| {
            channel.candidates = candidates;
            channel.candidates.clone()
        })
    }

    pub fn set_not_eligible_users(
        &mut self,
        team_id: &TeamId,
        channel_id: &ChannelId,
        users: BTreeSet<CandidateId>,
    ) -> Result<BTreeSet<CandidateId>, StoreError> {
        self.update_channel(team_id, channel_id, |channel| {
            channel.not_eligible_users = users;
            channel.not_eligible_users.clone()
        })
    }

    /// Merges `update` into the team record, creating it with no channels if absent.
    pub fn update_team_data(
        &mut self,
        team_id: &TeamId,
        update: TeamUpdate,
    ) -> Result<Team, StoreError> {
        let team = self.document.teams.entry(team_id.clone()).or_default();
        team.merge(update);
        let updated = team.clone();

        info!(
            event_name = "store.team.updated",
            team_id = %team_id,
            has_token = updated.token.is_some(),
            "team data updated"
        );
        self.persist()?;
        Ok(updated)
    }

    /// Applies `change` to the channel (created on first use) and writes the document once.
    pub fn update_channel<T>(
        &mut self,
        team_id: &TeamId,
        channel_id: &ChannelId,
        change: impl FnOnce(&mut Channel) -> T,
    ) -> Result<T, StoreError> {
        let result = change(self.document.channel_mut(team_id, channel_id));
        debug!(
            event_name = "store.channel.updated",
            team_id = %team_id,
            channel_id = %channel_id,
            "channel updated"
        );
        self.persist()?;
        Ok(result)
    }

    /// Writes the current document, applying the configured [`WritePolicy`] on failure.
    pub fn persist(&self) -> Result<(), StoreError> {
        let Err(err) = save(&self.storage, &self.document) else {
            return Ok(());
        };

        error!(
            event_name = "store.save.failed",
            location = %self.storage.location().display(),
            write_policy = ?self.write_policy,
            error = %err,
            "document write failed, in-memory state kept"
        );
        match self.write_policy {
            WritePolicy::BestEffort => Ok(()),
            WritePolicy::Strict => Err(err),
        }
    }
}

/// Cloneable handle serializing every read-modify-persist sequence behind one lock.
#[derive(Debug)]
pub struct SharedStore<S: DocumentStorage> {
    inner: Arc<Mutex<DocumentStore<S>>>,
}

impl<S: DocumentStorage> Clone for SharedStore<S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<S: DocumentStorage> SharedStore<S> {
    pub fn new(store: DocumentStore<S>) -> Self {
        Self { inner: Arc::new(Mutex::new(store)) }
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut DocumentStore<S>) -> T) -> Result<T, StoreError> {
        let mut store = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&mut store))
    }
}
