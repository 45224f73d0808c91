//! Fair random reviewer selection.
//!
//! Every channel keeps a rotation exclusion set of the candidates already
//! drawn in the current round. A draw only considers candidates outside that
//! set; once every candidate still eligible for a request has had a turn,
//! those candidates leave the set and a new round starts. The set is shared by
//! all groups and all requesters of the channel, so a pick made for one group
//! also uses up that candidate's turn for every other group it belongs to.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::domain::{CandidateId, ChannelId, GroupFilter, TeamId};
use crate::errors::StoreError;
use crate::registry;
use crate::storage::DocumentStorage;
use crate::store::DocumentStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionRequest {
    pub team_id: TeamId,
    pub channel_id: ChannelId,
    pub asking_user: CandidateId,
    pub count: usize,
    pub group: GroupFilter,
}

/// Outcome of one [`draw`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Draw {
    pub chosen: Vec<CandidateId>,
    /// Number of times the remaining pool had fully cycled and a new round began.
    pub round_resets: usize,
}

/// Picks up to `count` distinct ids from `pool`, honouring and updating the
/// rotation exclusion set `not_eligible`.
///
/// On return `not_eligible` holds the set to persist: the incoming set minus
/// any candidates released by a round reset, plus everything chosen.
pub fn draw<R: Rng + ?Sized>(
    pool: &[CandidateId],
    not_eligible: &mut BTreeSet<CandidateId>,
    count: usize,
    rng: &mut R,
) -> Draw {
    let target = count.min(pool.len());
    let mut outcome = Draw::default();

    while outcome.chosen.len() < target {
        let remaining: Vec<&CandidateId> =
            pool.iter().filter(|id| !outcome.chosen.contains(id)).collect();
        let fresh: Vec<&CandidateId> =
            remaining.iter().copied().filter(|id| !not_eligible.contains(*id)).collect();

        match fresh.choose(rng) {
            Some(&picked) => outcome.chosen.push(picked.clone()),
            None if remaining.is_empty() => break,
            None => {
                for id in &remaining {
                    not_eligible.remove(*id);
                }
                outcome.round_resets += 1;
            }
        }
    }

    not_eligible.extend(outcome.chosen.iter().cloned());
    outcome
}

/// Draws reviewers for channels held in a [`DocumentStore`].
#[derive(Debug)]
pub struct SelectionEngine<R: Rng> {
    rng: R,
}

impl SelectionEngine<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible engine for tests and dry runs.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SelectionEngine<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Selects `request.count` distinct candidates (fewer when the pool is
    /// smaller) and records them in the channel's rotation exclusion set.
    /// An empty result leaves the store untouched.
    pub fn select_candidates<S: DocumentStorage>(
        &mut self,
        store: &mut DocumentStore<S>,
        request: &SelectionRequest,
    ) -> Result<Vec<CandidateId>, StoreError> {
        if request.count == 0 {
            return Ok(Vec::new());
        }

        let pool: Vec<CandidateId> = registry::available_for_group(
            store.candidates(&request.team_id, &request.channel_id),
            &request.asking_user,
            &request.group,
        )
        .map(|candidate| candidate.name.clone())
        .collect();
        if pool.is_empty() {
            debug!(
                event_name = "selection.empty_pool",
                team_id = %request.team_id,
                channel_id = %request.channel_id,
                group = %request.group,
                "no eligible candidates"
            );
            return Ok(Vec::new());
        }

        let mut not_eligible = store.not_eligible_users(&request.team_id, &request.channel_id);
        let outcome = draw(&pool, &mut not_eligible, request.count, &mut self.rng);

        if outcome.round_resets > 0 {
            info!(
                event_name = "selection.round_reset",
                team_id = %request.team_id,
                channel_id = %request.channel_id,
                group = %request.group,
                resets = outcome.round_resets,
                "rotation round restarted"
            );
        }

        store.set_not_eligible_users(&request.team_id, &request.channel_id, not_eligible)?;

        info!(
            event_name = "selection.completed",
            team_id = %request.team_id,
            channel_id = %request.channel_id,
            group = %request.group,
            requested = request.count,
            pool = pool.len(),
            chosen = outcome.chosen.len(),
            "reviewers selected"
        );
        Ok(outcome.chosen)
    }
}
