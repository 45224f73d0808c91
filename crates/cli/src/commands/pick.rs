use roulette_core::{
    review_count_options, AppConfig, ApplicationError, CandidateId, CandidateRegistry,
    GroupFilter, SelectionEngine, SelectionRequest,
};
use serde_json::json;

use crate::commands::{open_store, ChannelScope, CommandResult};

#[derive(Debug, Clone)]
pub struct PickArgs {
    pub asking_user: String,
    pub count: usize,
    pub group: GroupFilter,
    pub seed: Option<u64>,
}

pub fn run(config: &AppConfig, scope: &ChannelScope, args: &PickArgs) -> CommandResult {
    match pick(config, scope, args) {
        Ok(chosen) => {
            let message = if chosen.is_empty() {
                "no reviewer available".to_string()
            } else {
                format!(
                    "selected {}",
                    chosen.iter().map(CandidateId::as_str).collect::<Vec<_>>().join(", ")
                )
            };
            CommandResult::success_with_data(
                "pick",
                message,
                Some(json!({ "reviewers": chosen, "group": args.group.to_string() })),
            )
        }
        Err(error) => CommandResult::from_error("pick", &error),
    }
}

fn pick(
    config: &AppConfig,
    scope: &ChannelScope,
    args: &PickArgs,
) -> Result<Vec<CandidateId>, ApplicationError> {
    let mut store = open_store(config)?;
    let asking_user = CandidateId(args.asking_user.clone());

    let pool_size = CandidateRegistry::new(&mut store).max_reviewers(
        &scope.team_id(),
        &scope.channel_id(),
        &asking_user,
        &args.group,
    );
    let cap = config.selection.max_reviewers_per_request;
    if u32::try_from(args.count).map_or(true, |count| count > cap) {
        let options = review_count_options(pool_size, cap);
        return Err(ApplicationError::InvalidRequest(format!(
            "at most {cap} reviewer(s) may be requested at once (available choices: {options:?})"
        )));
    }

    let mut engine = match args.seed {
        Some(seed) => SelectionEngine::seeded(seed),
        None => SelectionEngine::from_entropy(),
    };
    let request = SelectionRequest {
        team_id: scope.team_id(),
        channel_id: scope.channel_id(),
        asking_user,
        count: args.count,
        group: args.group.clone(),
    };

    Ok(engine.select_candidates(&mut store, &request)?)
}
