use roulette_core::{AppConfig, ApplicationError, BearerToken, TeamId, TeamUpdate};
use serde_json::json;

use crate::commands::{open_store, CommandResult};

/// Records installation data for a workspace, keeping its channels intact.
pub fn run(
    config: &AppConfig,
    team: &str,
    token: Option<String>,
    name: Option<String>,
) -> CommandResult {
    if token.is_none() && name.is_none() {
        return CommandResult::from_error(
            "team",
            &ApplicationError::InvalidRequest("nothing to update: pass --token or --name".into()),
        );
    }

    let team_id = TeamId(team.to_string());
    let update = TeamUpdate { token: token.map(BearerToken::new), name };
    let outcome = open_store(config).and_then(|mut store| {
        store.update_team_data(&team_id, update).map_err(ApplicationError::from)
    });

    match outcome {
        Ok(updated) => CommandResult::success_with_data(
            "team",
            format!("team {team_id} updated"),
            Some(json!({
                "name": updated.name,
                "has_token": updated.token.is_some(),
                "channels": updated.channels.len(),
            })),
        ),
        Err(error) => CommandResult::from_error("team", &error),
    }
}
