pub mod channel;
pub mod config;
pub mod doctor;
pub mod migrate;
pub mod pick;
pub mod team;

use roulette_core::{
    AppConfig, ApplicationError, CandidateId, ChannelId, DocumentStore, JsonFileStorage, TeamId,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(command, error.error_class(), error.to_string(), error.exit_code())
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Team and channel a command operates on.
#[derive(Debug, Clone, clap::Args)]
pub struct ChannelScope {
    #[arg(long, help = "Workspace (team) identifier")]
    pub team: String,
    #[arg(long, help = "Channel identifier")]
    pub channel: String,
}

impl ChannelScope {
    pub fn team_id(&self) -> TeamId {
        TeamId(self.team.clone())
    }

    pub fn channel_id(&self) -> ChannelId {
        ChannelId(self.channel.clone())
    }
}

pub(crate) fn open_store(
    config: &AppConfig,
) -> Result<DocumentStore<JsonFileStorage>, ApplicationError> {
    let storage = JsonFileStorage::new(&config.storage.data_path);
    Ok(DocumentStore::open(storage, config.storage.write_policy)?)
}

pub(crate) fn candidate_ids(names: &[String]) -> Vec<CandidateId> {
    names.iter().map(|name| CandidateId(name.trim().to_string())).collect()
}
