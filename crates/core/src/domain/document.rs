use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::team::{Channel, ChannelId, Team, TeamId};

/// Schema version stamped on every document written by this crate.
pub const CURRENT_SCHEMA_VERSION: &str = "2";

/// Root of the persisted state: every team, its channels and their rotation state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub version: String,
    #[serde(default)]
    pub teams: BTreeMap<TeamId, Team>,
}

impl Default for Document {
    fn default() -> Self {
        Self { version: CURRENT_SCHEMA_VERSION.to_owned(), teams: BTreeMap::new() }
    }
}

impl Document {
    pub fn team(&self, team_id: &TeamId) -> Option<&Team> {
        self.teams.get(team_id)
    }

    pub fn channel(&self, team_id: &TeamId, channel_id: &ChannelId) -> Option<&Channel> {
        self.team(team_id).and_then(|team| team.channels.get(channel_id))
    }

    /// Returns the channel, creating the team and channel records on first reference.
    pub fn channel_mut(&mut self, team_id: &TeamId, channel_id: &ChannelId) -> &mut Channel {
        self.teams
            .entry(team_id.clone())
            .or_default()
            .channels
            .entry(channel_id.clone())
            .or_default()
    }
}
