//! Fair code-review candidate rotation.
//!
//! A [`DocumentStore`] owns the persisted document of teams, channels,
//! candidates and rotation state. [`CandidateRegistry`] manages a channel's
//! candidates and [`SelectionEngine`] draws reviewers so nobody is picked
//! twice before the rest of the eligible pool has had a turn.

pub mod config;
pub mod domain;
pub mod errors;
pub mod migrate;
pub mod registry;
pub mod selection;
pub mod storage;
pub mod store;

pub use config::{AppConfig, ConfigError, LoadOptions, WritePolicy};
pub use domain::{
    BearerToken, Candidate, CandidateId, Channel, ChannelId, Document, GroupFilter, GroupId, Team,
    TeamId, TeamUpdate, CURRENT_SCHEMA_VERSION,
};
pub use errors::{ApplicationError, StoreError};
pub use migrate::{SchemaVersion, Upgrade, VersionedDocument};
pub use registry::{review_count_options, CandidateRegistry};
pub use selection::{Draw, SelectionEngine, SelectionRequest};
pub use storage::{DocumentStorage, InMemoryStorage, JsonFileStorage};
pub use store::{DocumentStore, SharedStore};
