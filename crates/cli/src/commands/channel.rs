use roulette_core::{
    AppConfig, ApplicationError, Candidate, CandidateId, CandidateRegistry, GroupId,
};
use serde_json::json;

use crate::commands::{candidate_ids, open_store, ChannelScope, CommandResult};

pub fn list(config: &AppConfig, scope: &ChannelScope) -> CommandResult {
    let outcome = open_store(config).map(|store| {
        let candidates = store.candidates(&scope.team_id(), &scope.channel_id()).to_vec();
        let not_eligible = store.not_eligible_users(&scope.team_id(), &scope.channel_id());
        (candidates, not_eligible)
    });

    match outcome {
        Ok((candidates, not_eligible)) => CommandResult::success_with_data(
            "ls",
            format!("{} candidate(s) in channel {}", candidates.len(), scope.channel),
            Some(json!({ "candidates": candidates, "not_eligible_users": not_eligible })),
        ),
        Err(error) => CommandResult::from_error("ls", &error),
    }
}

pub fn add(
    config: &AppConfig,
    scope: &ChannelScope,
    names: &[String],
    groups: &[String],
) -> CommandResult {
    let names = candidate_ids(names);
    if names.iter().any(|name| name.as_str().is_empty()) {
        return CommandResult::from_error(
            "add",
            &ApplicationError::InvalidRequest("candidate names must not be empty".to_string()),
        );
    }
    let groups = group_ids(groups);

    let outcome = open_store(config).and_then(|mut store| {
        CandidateRegistry::new(&mut store)
            .add_candidates(&scope.team_id(), &scope.channel_id(), &names, &groups)
            .map_err(ApplicationError::from)
    });

    report("add", format!("added {}", join(&names)), outcome)
}

pub fn remove(config: &AppConfig, scope: &ChannelScope, names: &[String]) -> CommandResult {
    let names = candidate_ids(names);

    let outcome = open_store(config).and_then(|mut store| {
        CandidateRegistry::new(&mut store)
            .remove_candidates(&scope.team_id(), &scope.channel_id(), &names)
            .map_err(ApplicationError::from)
    });

    report("rm", format!("removed {}", join(&names)), outcome)
}

pub fn ungroup(
    config: &AppConfig,
    scope: &ChannelScope,
    names: &[String],
    groups: &[String],
) -> CommandResult {
    let names = candidate_ids(names);
    let groups = group_ids(groups);

    let outcome = open_store(config).and_then(|mut store| {
        CandidateRegistry::new(&mut store)
            .remove_groups_from_candidates(&scope.team_id(), &scope.channel_id(), &names, &groups)
            .map_err(ApplicationError::from)
    });

    report("ungroup", format!("removed groups from {}", join(&names)), outcome)
}

pub fn groups(config: &AppConfig, scope: &ChannelScope, asking_user: &str) -> CommandResult {
    let asking_user = CandidateId(asking_user.to_string());

    let outcome = open_store(config).map(|mut store| {
        CandidateRegistry::new(&mut store).list_groups(
            &scope.team_id(),
            &scope.channel_id(),
            &asking_user,
        )
    });

    match outcome {
        Ok(groups) => CommandResult::success_with_data(
            "groups",
            format!("{} group(s) available", groups.len()),
            Some(json!({ "groups": groups })),
        ),
        Err(error) => CommandResult::from_error("groups", &error),
    }
}

fn report(
    command: &str,
    message: String,
    outcome: Result<Vec<Candidate>, ApplicationError>,
) -> CommandResult {
    match outcome {
        Ok(candidates) => CommandResult::success_with_data(
            command,
            message,
            Some(json!({ "candidates": candidates })),
        ),
        Err(error) => CommandResult::from_error(command, &error),
    }
}

fn group_ids(groups: &[String]) -> Vec<GroupId> {
    groups
        .iter()
        .map(|group| group.trim())
        .filter(|group| !group.is_empty())
        .map(|group| GroupId(group.to_string()))
        .collect()
}

fn join(names: &[CandidateId]) -> String {
    names.iter().map(CandidateId::as_str).collect::<Vec<_>>().join(", ")
}
