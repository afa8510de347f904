//! The light-client store: the state machine in spec.md's sense. A passive
//! shared object — any number of threads may call into it concurrently — so
//! every mutable field lives behind a single `parking_lot::RwLock`. Reads
//! take the shared lock and return clones; writes take the exclusive lock
//! for the entire validate-then-commit sequence, giving linearizability:
//! observers see the pre- or post-update state, never a partial one.

use parking_lot::RwLock;

use crate::committee;
use crate::error::{StoreError, VerifierError};
use crate::types::{BeaconBlockHeader, FinalityUpdate, LightClientBootstrap, OptimisticUpdate, SyncCommittee};
use crate::verifier;

/// Tracks the one piece of verifier-relevant state the store keeps around
/// outside the committee itself: the most recently trusted header. Kept as
/// a small struct (rather than folded directly into `Inner`) to mirror the
/// `verifier` field spec.md's data model calls out on `LightClientStore` —
/// the verifier functions themselves stay fully stateless.
#[derive(Clone, Debug, Default)]
pub struct Verifier {
    trusted_header: Option<BeaconBlockHeader>,
}

impl Verifier {
    pub fn trusted_header(&self) -> Option<&BeaconBlockHeader> {
        self.trusted_header.as_ref()
    }

    fn set_trusted_header(&mut self, header: BeaconBlockHeader) {
        self.trusted_header = Some(header);
    }
}

struct Inner {
    finalized_header: BeaconBlockHeader,
    optimistic_header: BeaconBlockHeader,
    current_sync_committee: SyncCommittee,
    best_valid_update: Option<FinalityUpdate>,
    verifier: Verifier,
    genesis_validators_root: [u8; 32],
    fork_version: [u8; 4],
}

/// The light-client store. Cheap to clone (an `Arc` internally would be the
/// caller's choice); every method takes `&self` — there is no `&mut self`
/// surface, concurrency is handled entirely by the internal lock.
pub struct Store {
    inner: RwLock<Inner>,
}

impl Store {
    /// `NewLightClientStore(trusted_header, committee)`: both heads start at
    /// the trusted header.
    pub fn new(
        trusted_header: BeaconBlockHeader,
        committee: SyncCommittee,
        genesis_validators_root: [u8; 32],
        fork_version: [u8; 4],
    ) -> Result<Self, StoreError> {
        committee.validate().map_err(VerifierError::from)?;

        let mut verifier = Verifier::default();
        verifier.set_trusted_header(trusted_header.clone());

        tracing::info!(slot = trusted_header.slot, "light client store initialized");

        Ok(Self {
            inner: RwLock::new(Inner {
                finalized_header: trusted_header.clone(),
                optimistic_header: trusted_header,
                current_sync_committee: committee,
                best_valid_update: None,
                verifier,
                genesis_validators_root,
                fork_version,
            }),
        })
    }

    /// Build a store from a `LightClientBootstrap`, the one moment of trust
    /// a caller ever takes on faith directly — the Merkle branch binding
    /// `current_sync_committee` into `header`'s state is still verified
    /// here; only the header/committee pairing itself is assumed honest
    /// (trust-root provisioning is out of this crate's scope).
    pub fn from_bootstrap(
        bootstrap: LightClientBootstrap,
        genesis_validators_root: [u8; 32],
        fork_version: [u8; 4],
    ) -> Result<Self, StoreError> {
        bootstrap
            .current_sync_committee
            .validate()
            .map_err(VerifierError::from)?;

        verifier::verify_committee_branch(
            &bootstrap.current_sync_committee,
            &bootstrap.current_sync_committee_branch,
            &bootstrap.header.state_root,
            verifier::CURRENT_SYNC_COMMITTEE_GINDEX,
            verifier::CURRENT_SYNC_COMMITTEE_DEPTH,
        )?;

        Self::new(
            bootstrap.header,
            bootstrap.current_sync_committee,
            genesis_validators_root,
            fork_version,
        )
    }

    // ---- reads ----

    pub fn finalized_header(&self) -> BeaconBlockHeader {
        self.inner.read().finalized_header.clone()
    }

    pub fn optimistic_header(&self) -> BeaconBlockHeader {
        self.inner.read().optimistic_header.clone()
    }

    pub fn finalized_slot(&self) -> u64 {
        self.inner.read().finalized_header.slot
    }

    pub fn optimistic_slot(&self) -> u64 {
        self.inner.read().optimistic_header.slot
    }

    pub fn current_sync_committee(&self) -> SyncCommittee {
        self.inner.read().current_sync_committee.clone()
    }

    pub fn best_valid_update(&self) -> Option<FinalityUpdate> {
        self.inner.read().best_valid_update.clone()
    }

    pub fn trusted_header(&self) -> Option<BeaconBlockHeader> {
        self.inner.read().verifier.trusted_header().cloned()
    }

    /// `ShouldApplyUpdate`: is `candidate` strictly better than the current
    /// `best_valid_update`? None is always beaten; otherwise compare
    /// finalized slot, then (on a tie) participation. Ties on both criteria
    /// do not replace.
    pub fn should_apply_update(&self, candidate: &FinalityUpdate) -> bool {
        match &self.inner.read().best_valid_update {
            None => true,
            Some(best) => is_better_update(candidate, best),
        }
    }

    // ---- writes ----

    /// `ProcessOptimisticUpdate`: advance the optimistic head only.
    pub fn process_optimistic_update(&self, update: &OptimisticUpdate) -> Result<(), StoreError> {
        let mut inner = self.inner.write();

        if inner.current_sync_committee.pubkeys.is_empty() {
            return Err(StoreError::NoCommittee);
        }

        if update.attested_header.slot <= inner.optimistic_header.slot {
            tracing::debug!(
                update_slot = update.attested_header.slot,
                current_slot = inner.optimistic_header.slot,
                "dropping optimistic update: slot regression"
            );
            return Err(StoreError::SlotRegression {
                head: "optimistic",
                update_slot: update.attested_header.slot,
                current_slot: inner.optimistic_header.slot,
            });
        }

        let participants = verifier::verify_sync_aggregate(
            &update.sync_aggregate,
            &update.attested_header,
            update.signature_slot,
            &inner.current_sync_committee,
            inner.genesis_validators_root,
            inner.fork_version,
        )
        .inspect_err(|err| {
            tracing::warn!(%err, "rejecting optimistic update");
        })?;

        if !committee::is_supermajority(participants) {
            let err = VerifierError::InsufficientParticipation {
                participants,
                required: committee::supermajority_threshold(),
            };
            tracing::warn!(%err, "rejecting optimistic update");
            return Err(err.into());
        }

        inner.optimistic_header = update.attested_header.clone();
        tracing::info!(
            slot = update.attested_header.slot,
            participants,
            "optimistic head advanced"
        );
        Ok(())
    }

    /// Verify a `FinalityUpdate` (BLS aggregate, supermajority, finality
    /// branch) against the currently installed committee, without touching
    /// any store state. Returns the participant count on success.
    ///
    /// This is the check [`Store::process_finality_update`] runs before it
    /// commits, factored out so [`crate::validator`] can run the identical
    /// verification on its hold path — an update must never reach
    /// `set_best_valid_update` unverified, since `best_valid_update` carries
    /// the same "fully signature-verified" invariant as the committed heads.
    pub fn verify_finality_update(&self, update: &FinalityUpdate) -> Result<usize, StoreError> {
        let inner = self.inner.read();
        Self::verify_finality_update_locked(&inner, update)
    }

    fn verify_finality_update_locked(inner: &Inner, update: &FinalityUpdate) -> Result<usize, StoreError> {
        if inner.current_sync_committee.pubkeys.is_empty() {
            return Err(StoreError::NoCommittee);
        }

        if update.next_sync_committee.is_some() && update.next_sync_committee_branch.is_empty() {
            return Err(StoreError::NilInput {
                field: "next_sync_committee_branch",
            });
        }

        if update.attested_header.slot < update.finalized_header.slot {
            return Err(VerifierError::InvalidFinalityOrder {
                attested_slot: update.attested_header.slot,
                finalized_slot: update.finalized_header.slot,
            }
            .into());
        }

        let participants = verifier::verify_sync_aggregate(
            &update.sync_aggregate,
            &update.attested_header,
            update.signature_slot,
            &inner.current_sync_committee,
            inner.genesis_validators_root,
            inner.fork_version,
        )
        .inspect_err(|err| tracing::warn!(%err, "rejecting finality update"))?;

        if !committee::is_supermajority(participants) {
            let err = VerifierError::InsufficientParticipation {
                participants,
                required: committee::supermajority_threshold(),
            };
            tracing::warn!(%err, "rejecting finality update");
            return Err(err.into());
        }

        verifier::verify_finality_proof(
            &update.finalized_header,
            &update.finality_branch,
            &update.attested_header.state_root,
            false,
        )
        .inspect_err(|err| tracing::warn!(%err, "rejecting finality update"))?;

        Ok(participants)
    }

    /// `ProcessFinalityUpdate`: verify the sync aggregate and the finality
    /// Merkle branch, then commit both heads atomically and clear
    /// `best_valid_update`. A rotation payload riding along in `update` is
    /// *not* installed here — see [`crate::validator`], which independently
    /// verifies the rotation branch and calls
    /// [`Store::set_current_sync_committee`] only after this commits.
    pub fn process_finality_update(&self, update: &FinalityUpdate) -> Result<(), StoreError> {
        let mut inner = self.inner.write();

        Self::verify_finality_update_locked(&inner, update)?;

        if update.finalized_header.slot <= inner.finalized_header.slot {
            tracing::debug!(
                update_slot = update.finalized_header.slot,
                current_slot = inner.finalized_header.slot,
                "dropping finality update: slot regression"
            );
            return Err(StoreError::SlotRegression {
                head: "finalized",
                update_slot: update.finalized_header.slot,
                current_slot: inner.finalized_header.slot,
            });
        }

        inner.finalized_header = update.finalized_header.clone();
        inner.optimistic_header = update.attested_header.clone();
        inner.verifier.set_trusted_header(update.finalized_header.clone());
        inner.best_valid_update = None;

        tracing::info!(
            finalized_slot = inner.finalized_header.slot,
            optimistic_slot = inner.optimistic_header.slot,
            "finality update committed"
        );

        Ok(())
    }

    /// `SetCurrentSyncCommittee`: replace the active committee wholesale.
    /// The store trusts its caller here — per spec.md §4.5, the rotation's
    /// Merkle branch is verified independently by the policy layer before
    /// this is ever called, not by the store itself.
    pub fn set_current_sync_committee(&self, committee: SyncCommittee) -> Result<(), StoreError> {
        committee.validate().map_err(VerifierError::from)?;
        let period = committee.period;
        self.inner.write().current_sync_committee = committee;
        tracing::info!(period, "sync committee rotated");
        Ok(())
    }

    /// Retain `update` as the best pending `FinalityUpdate` if it beats
    /// whatever is currently held. No-op if it doesn't.
    pub fn set_best_valid_update(&self, update: FinalityUpdate) {
        let mut inner = self.inner.write();
        let should_replace = match &inner.best_valid_update {
            None => true,
            Some(best) => is_better_update(&update, best),
        };
        if should_replace {
            inner.best_valid_update = Some(update);
        }
    }
}

fn is_better_update(candidate: &FinalityUpdate, best: &FinalityUpdate) -> bool {
    if candidate.finalized_header.slot != best.finalized_header.slot {
        return candidate.finalized_header.slot > best.finalized_header.slot;
    }
    candidate.sync_aggregate.participation_count() > best.sync_aggregate.participation_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bls;
    use crate::error::StoreError;
    use crate::types::{BlsSecretKey, BlsSignature, SyncAggregate, SYNC_COMMITTEE_SIZE};
    use blst::min_pk::SecretKey;
    use std::sync::Arc;

    const GENESIS_VALIDATORS_ROOT: [u8; 32] = [0xaa; 32];
    const FORK_VERSION: [u8; 4] = [0x04, 0x00, 0x00, 0x00];

    fn header(slot: u64) -> BeaconBlockHeader {
        BeaconBlockHeader {
            slot,
            proposer_index: 1,
            parent_root: [0; 32],
            state_root: [0; 32],
            body_root: [0; 32],
        }
    }

    fn real_secret() -> BlsSecretKey {
        let sk = SecretKey::key_gen(&[42u8; 32], &[]).unwrap();
        BlsSecretKey(sk.to_bytes())
    }

    /// A committee where every one of the 512 slots holds the same real
    /// key, so a single signature, aggregated over any subset of bits,
    /// verifies as that key's signature.
    fn test_committee(secret: &BlsSecretKey, period: u64) -> SyncCommittee {
        let pk = bls::pubkey_from_secret(secret).unwrap();
        SyncCommittee {
            pubkeys: vec![pk.clone(); SYNC_COMMITTEE_SIZE],
            aggregate_pubkey: pk,
            period,
        }
    }

    fn bits(count: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; SYNC_COMMITTEE_SIZE / 8];
        for i in 0..count {
            bytes[i / 8] |= 1 << (i % 8);
        }
        bytes
    }

    fn signed_aggregate(
        secret: &BlsSecretKey,
        header: &BeaconBlockHeader,
        participants: usize,
    ) -> SyncAggregate {
        let domain = crate::ssz::compute_domain(
            &crate::types::DOMAIN_SYNC_COMMITTEE,
            &FORK_VERSION,
            &GENESIS_VALIDATORS_ROOT,
        );
        let signing_root = crate::ssz::compute_signing_root(header, &domain);
        let sig = bls::sign(secret, &signing_root).unwrap();
        SyncAggregate {
            committee_bits: bits(participants),
            signature: sig,
        }
    }

    fn new_store(secret: &BlsSecretKey, trusted_slot: u64) -> Store {
        let committee = test_committee(secret, trusted_slot / crate::types::SLOTS_PER_SYNC_COMMITTEE_PERIOD);
        Store::new(
            header(trusted_slot),
            committee,
            GENESIS_VALIDATORS_ROOT,
            FORK_VERSION,
        )
        .unwrap()
    }

    #[test]
    fn scenario_bootstrap_then_optimistic_advance() {
        let secret = real_secret();
        let store = new_store(&secret, 8192);

        let attested = header(8193);
        let aggregate = signed_aggregate(&secret, &attested, SYNC_COMMITTEE_SIZE);
        let update = OptimisticUpdate {
            attested_header: attested,
            sync_aggregate: aggregate,
            signature_slot: 8194,
        };

        store.process_optimistic_update(&update).unwrap();
        assert_eq!(store.optimistic_slot(), 8193);
        assert_eq!(store.finalized_slot(), 8192);
    }

    #[test]
    fn scenario_slot_regression_rejected() {
        let secret = real_secret();
        let store = new_store(&secret, 8192);

        let attested = header(8193);
        let aggregate = signed_aggregate(&secret, &attested, SYNC_COMMITTEE_SIZE);
        store
            .process_optimistic_update(&OptimisticUpdate {
                attested_header: attested,
                sync_aggregate: aggregate,
                signature_slot: 8194,
            })
            .unwrap();

        let regressed = header(8192);
        let aggregate2 = signed_aggregate(&secret, &regressed, SYNC_COMMITTEE_SIZE);
        let result = store.process_optimistic_update(&OptimisticUpdate {
            attested_header: regressed,
            sync_aggregate: aggregate2,
            signature_slot: 8193,
        });
        assert!(matches!(result, Err(StoreError::SlotRegression { .. })));
    }

    #[test]
    fn scenario_insufficient_participation_rejected() {
        let secret = real_secret();
        let store = new_store(&secret, 8192);

        let attested = header(8193);
        let aggregate = signed_aggregate(&secret, &attested, 341);
        let result = store.process_optimistic_update(&OptimisticUpdate {
            attested_header: attested,
            sync_aggregate: aggregate,
            signature_slot: 8194,
        });
        assert!(matches!(
            result,
            Err(StoreError::Verification(VerifierError::InsufficientParticipation { .. }))
        ));
    }

    #[test]
    fn scenario_finality_update_commits_both_heads() {
        let secret = real_secret();
        let store = new_store(&secret, 8192);

        let finalized = header(8200);
        let attested = header(8201);
        let finalized_leaf = crate::ssz::hash_tree_root_header(&finalized);
        let branch = branch_for(finalized_leaf, &attested.state_root, verifier::FINALIZED_ROOT_GINDEX, verifier::FINALIZED_ROOT_DEPTH);
        // Re-derive attested header with the matching state root.
        let mut attested = attested;
        attested.state_root = branch.1;

        let aggregate = signed_aggregate(&secret, &attested, SYNC_COMMITTEE_SIZE);
        let update = FinalityUpdate {
            attested_header: attested.clone(),
            finalized_header: finalized,
            finality_branch: branch.0,
            sync_aggregate: aggregate,
            signature_slot: attested.slot + 1,
            next_sync_committee: None,
            next_sync_committee_branch: vec![],
        };

        store.process_finality_update(&update).unwrap();
        assert_eq!(store.finalized_slot(), 8200);
        assert_eq!(store.optimistic_slot(), 8201);
        assert!(store.best_valid_update().is_none());
    }

    #[test]
    fn scenario_best_update_ranking() {
        let secret = real_secret();
        let store = new_store(&secret, 8192);

        let finalized = header(8200);
        let attested_a = header(8201);
        let attested_b = header(8202);

        let a = FinalityUpdate {
            attested_header: attested_a.clone(),
            finalized_header: finalized.clone(),
            finality_branch: vec![[0u8; 32]; verifier::FINALIZED_ROOT_DEPTH],
            sync_aggregate: signed_aggregate(&secret, &attested_a, 400),
            signature_slot: attested_a.slot + 1,
            next_sync_committee: None,
            next_sync_committee_branch: vec![],
        };
        let b = FinalityUpdate {
            attested_header: attested_b.clone(),
            finalized_header: finalized,
            finality_branch: vec![[0u8; 32]; verifier::FINALIZED_ROOT_DEPTH],
            sync_aggregate: signed_aggregate(&secret, &attested_b, 450),
            signature_slot: attested_b.slot + 1,
            next_sync_committee: None,
            next_sync_committee_branch: vec![],
        };

        store.set_best_valid_update(a.clone());
        assert!(store.should_apply_update(&b));

        store.set_best_valid_update(b.clone());
        assert!(!store.should_apply_update(&a));
    }

    #[test]
    fn from_bootstrap_verifies_committee_branch() {
        let secret = real_secret();
        let committee = test_committee(&secret, 0);
        let mut trusted = header(100);
        let committee_leaf = crate::ssz::hash_tree_root_committee(&committee);
        let (branch, root) = branch_for(
            committee_leaf,
            &[0u8; 32],
            verifier::CURRENT_SYNC_COMMITTEE_GINDEX,
            verifier::CURRENT_SYNC_COMMITTEE_DEPTH,
        );
        trusted.state_root = root;

        let bootstrap = crate::types::LightClientBootstrap {
            header: trusted.clone(),
            current_sync_committee: committee,
            current_sync_committee_branch: branch,
        };

        let store = Store::from_bootstrap(bootstrap, GENESIS_VALIDATORS_ROOT, FORK_VERSION).unwrap();
        assert_eq!(store.finalized_slot(), 100);
        assert_eq!(store.optimistic_slot(), 100);
    }

    #[test]
    fn from_bootstrap_rejects_bad_committee_branch() {
        let secret = real_secret();
        let committee = test_committee(&secret, 0);
        let bootstrap = crate::types::LightClientBootstrap {
            header: header(100),
            current_sync_committee: committee,
            current_sync_committee_branch: vec![[0xaa; 32]; verifier::CURRENT_SYNC_COMMITTEE_DEPTH],
        };

        let result = Store::from_bootstrap(bootstrap, GENESIS_VALIDATORS_ROOT, FORK_VERSION);
        assert!(result.is_err());
    }

    #[test]
    fn scenario_forged_signature_rejected_store_unchanged() {
        let secret = real_secret();
        let store = new_store(&secret, 8192);

        let attested = header(8193);
        let mut aggregate = signed_aggregate(&secret, &attested, SYNC_COMMITTEE_SIZE);
        aggregate.signature = BlsSignature({
            let mut bytes = aggregate.signature.0;
            bytes[0] ^= 0xff;
            bytes
        });

        let result = store.process_optimistic_update(&OptimisticUpdate {
            attested_header: attested,
            sync_aggregate: aggregate,
            signature_slot: 8194,
        });
        assert!(matches!(
            result,
            Err(StoreError::Verification(VerifierError::InvalidSignature))
        ));
        assert_eq!(store.optimistic_slot(), 8192);
    }

    #[test]
    fn scenario_concurrent_writers_exactly_16_commits() {
        let secret = real_secret();
        let store = Arc::new(new_store(&secret, 8192));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                let secret = secret.clone();
                std::thread::spawn(move || {
                    let slot = 8193 + i as u64;
                    let attested = header(slot);
                    let aggregate = signed_aggregate(&secret, &attested, SYNC_COMMITTEE_SIZE);
                    store.process_optimistic_update(&OptimisticUpdate {
                        attested_header: attested,
                        sync_aggregate: aggregate,
                        signature_slot: slot + 1,
                    })
                })
            })
            .collect();

        let commits = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(commits, 16);
        assert_eq!(store.optimistic_slot(), 8193 + 15);
    }

    /// Build a single-sibling-repeated branch and the root it folds to, for
    /// tests that don't care about a realistic tree, only a consistent one.
    fn branch_for(leaf: [u8; 32], _unused: &[u8; 32], gindex: u64, depth: usize) -> (Vec<[u8; 32]>, [u8; 32]) {
        let siblings: Vec<[u8; 32]> = (0..depth).map(|i| [i as u8 + 1; 32]).collect();
        let mut current = leaf;
        for (i, sibling) in siblings.iter().enumerate() {
            current = if (gindex >> i) & 1 == 1 {
                sha256_pair(sibling, &current)
            } else {
                sha256_pair(&current, sibling)
            };
        }
        (siblings, current)
    }

    fn sha256_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(a);
        hasher.update(b);
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }
}
