pub mod candidate;
pub mod document;
pub mod team;

pub use candidate::{Candidate, CandidateId, GroupFilter, GroupId};
pub use document::{Document, CURRENT_SCHEMA_VERSION};
pub use team::{BearerToken, Channel, ChannelId, Team, TeamId, TeamUpdate};
