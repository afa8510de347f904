//! The update validator: a thin policy layer over [`crate::store::Store`].
//! It decides *when* a verified `FinalityUpdate` actually gets committed
//! (immediately, if participation clears the configured eager-commit bar;
//! otherwise held as `best_valid_update` until a timeout tick forces it),
//! and gates sync-committee rotation so a new committee is only installed
//! after the `FinalityUpdate` carrying its Merkle branch has committed.

use crate::committee;
use crate::error::ValidatorError;
use crate::store::Store;
use crate::types::{sync_committee_period, FinalityUpdate, SyncCommittee, SLOTS_PER_SYNC_COMMITTEE_PERIOD};
use crate::verifier;

/// Tunables for the hold-vs-commit policy. Defaults match spec.md's stated
/// defaults: commit eagerly only once a supermajority has signed, and force
/// a commit after one full sync-committee period.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Minimum participation to commit a `FinalityUpdate` immediately
    /// rather than holding it as `best_valid_update`.
    pub eager_commit_participants: usize,
    /// Slots after the held update's attested slot before a `tick` force-
    /// commits it even without a better one ever arriving.
    pub slots_per_period: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            eager_commit_participants: committee::supermajority_threshold(),
            slots_per_period: SLOTS_PER_SYNC_COMMITTEE_PERIOD,
        }
    }
}

/// Wraps a `Store` with the hold/commit and rotation-gating policy. Holds
/// no state of its own beyond configuration — all state lives in the
/// wrapped store, so `UpdateValidator` is as cheap to share as the store
/// itself.
pub struct UpdateValidator<'s> {
    store: &'s Store,
    config: ValidatorConfig,
}

impl<'s> UpdateValidator<'s> {
    pub fn new(store: &'s Store, config: ValidatorConfig) -> Self {
        Self { store, config }
    }

    /// Ingest a `FinalityUpdate`. It is always fully verified (BLS aggregate
    /// + finality branch, via `Store::verify_finality_update`) before either
    /// branch below runs — a peer cannot get an unverified update into
    /// `best_valid_update` by keeping its claimed participation under the
    /// eager-commit bar. If verified participation clears that bar, the
    /// update is committed immediately (and any rotation it carries is
    /// applied once committed and a period boundary has actually been
    /// crossed). Otherwise it's only retained via `ShouldApplyUpdate` +
    /// `SetBestValidUpdate` for a later `tick` to force-commit.
    pub fn ingest_finality_update(&self, update: FinalityUpdate) -> Result<bool, ValidatorError> {
        let participants = self.store.verify_finality_update(&update)?;

        if participants >= self.config.eager_commit_participants {
            self.commit(&update)?;
            return Ok(true);
        }

        if self.store.should_apply_update(&update) {
            tracing::debug!(
                participants,
                required = self.config.eager_commit_participants,
                "holding finality update as best pending, below eager-commit bar"
            );
            self.store.set_best_valid_update(update);
        }
        Ok(false)
    }

    /// Externally-driven timeout tick: if the best held update's attested
    /// header is at least one full period old relative to `current_slot`,
    /// force-commit it even though it never cleared the eager bar.
    pub fn tick(&self, current_slot: u64) -> Result<bool, ValidatorError> {
        let Some(held) = self.store.best_valid_update() else {
            return Ok(false);
        };

        let elapsed = current_slot.saturating_sub(held.attested_header.slot);
        if elapsed < self.config.slots_per_period {
            return Ok(false);
        }

        tracing::info!(
            attested_slot = held.attested_header.slot,
            elapsed,
            "force-committing held update after one full period"
        );
        self.commit(&held)?;
        Ok(true)
    }

    /// Commit `update` to the store and, if it carries a rotation payload
    /// and the attested header's period is one past the committee the
    /// store currently runs, independently verify the rotation branch and
    /// install the new committee. This is the only path in the crate that
    /// calls `Store::set_current_sync_committee` — the store itself never
    /// decides to rotate on its own.
    fn commit(&self, update: &FinalityUpdate) -> Result<(), ValidatorError> {
        self.store.process_finality_update(update)?;

        if let Some(next_committee) = &update.next_sync_committee {
            self.maybe_rotate(update, next_committee)?;
        }

        Ok(())
    }

    fn maybe_rotate(
        &self,
        update: &FinalityUpdate,
        next_committee: &SyncCommittee,
    ) -> Result<(), ValidatorError> {
        let current_committee = self.store.current_sync_committee();
        let attested_period = sync_committee_period(update.attested_header.slot);

        if attested_period != current_committee.period + 1 {
            return Ok(());
        }

        verifier::verify_committee_branch(
            next_committee,
            &update.next_sync_committee_branch,
            &update.attested_header.state_root,
            verifier::NEXT_SYNC_COMMITTEE_GINDEX,
            verifier::NEXT_SYNC_COMMITTEE_DEPTH,
        )
        .map_err(|_| ValidatorError::InvalidRotationBranch)?;

        self.store.set_current_sync_committee(next_committee.clone())?;
        Ok(())
    }
}
