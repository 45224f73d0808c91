use std::collections::BTreeSet;

use tracing::info;

use crate::domain::{Candidate, CandidateId, ChannelId, GroupFilter, GroupId, TeamId};
use crate::errors::StoreError;
use crate::storage::DocumentStorage;
use crate::store::DocumentStore;

/// Candidates other than the requester, in channel order.
pub fn available<'a>(
    candidates: &'a [Candidate],
    asking_user: &'a CandidateId,
) -> impl Iterator<Item = &'a Candidate> + 'a {
    candidates.iter().filter(move |candidate| &candidate.name != asking_user)
}

/// Candidates other than the requester that the filter lets through.
pub fn available_for_group<'a>(
    candidates: &'a [Candidate],
    asking_user: &'a CandidateId,
    filter: &'a GroupFilter,
) -> impl Iterator<Item = &'a Candidate> + 'a {
    available(candidates, asking_user).filter(move |candidate| filter.matches(candidate))
}

/// Review counts a requester may pick from: `1..=min(pool_size, cap)`.
pub fn review_count_options(pool_size: usize, cap: u32) -> Vec<u32> {
    let upper = u32::try_from(pool_size).unwrap_or(u32::MAX).min(cap);
    (1..=upper).collect()
}

/// Channel-scoped candidate management on top of a [`DocumentStore`].
pub struct CandidateRegistry<'a, S: DocumentStorage> {
    store: &'a mut DocumentStore<S>,
}

impl<'a, S: DocumentStorage> CandidateRegistry<'a, S> {
    pub fn new(store: &'a mut DocumentStore<S>) -> Self {
        Self { store }
    }

    pub fn candidates(&self, team_id: &TeamId, channel_id: &ChannelId) -> &[Candidate] {
        self.store.candidates(team_id, channel_id)
    }

    /// Adds new candidates with exactly `groups` and unions `groups` into existing ones.
    /// Existing candidates keep their position; new ones are appended in input order.
    pub fn add_candidates(
        &mut self,
        team_id: &TeamId,
        channel_id: &ChannelId,
        names: &[CandidateId],
        groups: &[GroupId],
    ) -> Result<Vec<Candidate>, StoreError> {
        let updated = self.store.update_channel(team_id, channel_id, |channel| {
            for name in names {
                match channel.candidates.iter_mut().find(|candidate| &candidate.name == name) {
                    Some(existing) => existing.groups.extend(groups.iter().cloned()),
                    None => channel
                        .candidates
                        .push(Candidate::new(name.clone(), groups.iter().cloned())),
                }
            }
            channel.candidates.clone()
        })?;

        info!(
            event_name = "registry.candidates.added",
            team_id = %team_id,
            channel_id = %channel_id,
            added = names.len(),
            groups = groups.len(),
            total = updated.len(),
            "candidates added"
        );
        Ok(updated)
    }

    /// Removes the named candidates and drops them from the rotation exclusion set.
    /// Names that are not registered are ignored.
    pub fn remove_candidates(
        &mut self,
        team_id: &TeamId,
        channel_id: &ChannelId,
        names: &[CandidateId],
    ) -> Result<Vec<Candidate>, StoreError> {
        let touches_channel = self.store.channel(team_id, channel_id).is_some_and(|channel| {
            names.iter().any(|name| {
                channel.candidate(name).is_some() || channel.not_eligible_users.contains(name)
            })
        });
        if !touches_channel {
            return Ok(self.store.candidates(team_id, channel_id).to_vec());
        }

        let updated = self.store.update_channel(team_id, channel_id, |channel| {
            channel.candidates.retain(|candidate| !names.contains(&candidate.name));
            for name in names {
                channel.not_eligible_users.remove(name);
            }
            channel.candidates.clone()
        })?;

        info!(
            event_name = "registry.candidates.removed",
            team_id = %team_id,
            channel_id = %channel_id,
            requested = names.len(),
            total = updated.len(),
            "candidates removed"
        );
        Ok(updated)
    }

    /// Takes `groups` away from the named candidates. A candidate left with no
    /// group stays registered and is still drawn by [`GroupFilter::Any`].
    pub fn remove_groups_from_candidates(
        &mut self,
        team_id: &TeamId,
        channel_id: &ChannelId,
        names: &[CandidateId],
        groups: &[GroupId],
    ) -> Result<Vec<Candidate>, StoreError> {
        let matches_any = self
            .store
            .channel(team_id, channel_id)
            .is_some_and(|channel| names.iter().any(|name| channel.candidate(name).is_some()));
        if !matches_any {
            return Ok(self.store.candidates(team_id, channel_id).to_vec());
        }

        self.store.update_channel(team_id, channel_id, |channel| {
            for candidate in
                channel.candidates.iter_mut().filter(|candidate| names.contains(&candidate.name))
            {
                for group in groups {
                    candidate.groups.remove(group);
                }
            }
            channel.candidates.clone()
        })
    }

    pub fn list_available(
        &self,
        team_id: &TeamId,
        channel_id: &ChannelId,
        asking_user: &CandidateId,
    ) -> Vec<Candidate> {
        available(self.store.candidates(team_id, channel_id), asking_user).cloned().collect()
    }

    pub fn list_available_for_group(
        &self,
        team_id: &TeamId,
        channel_id: &ChannelId,
        asking_user: &CandidateId,
        filter: &GroupFilter,
    ) -> Vec<Candidate> {
        available_for_group(self.store.candidates(team_id, channel_id), asking_user, filter)
            .cloned()
            .collect()
    }

    /// Every group carried by at least one candidate available to the requester.
    pub fn list_groups(
        &self,
        team_id: &TeamId,
        channel_id: &ChannelId,
        asking_user: &CandidateId,
    ) -> BTreeSet<GroupId> {
        available(self.store.candidates(team_id, channel_id), asking_user)
            .flat_map(|candidate| candidate.groups.iter().cloned())
            .collect()
    }

    /// Size of the pool a selection with these parameters would draw from.
    pub fn max_reviewers(
        &self,
        team_id: &TeamId,
        channel_id: &ChannelId,
        asking_user: &CandidateId,
        filter: &GroupFilter,
    ) -> usize {
        available_for_group(self.store.candidates(team_id, channel_id), asking_user, filter).count()
    }
}
