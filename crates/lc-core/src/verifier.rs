//! The header verifier: the one place signature checks and finality Merkle
//! proofs actually get evaluated. Entirely stateless — every function here
//! borrows the committee or header it needs for the duration of the call
//! and holds nothing across calls. [`crate::store::Store`] owns the
//! long-lived committee and header values; this module never does.

use crate::committee;
use crate::error::VerifierError;
use crate::ssz;
use crate::types::{BeaconBlockHeader, SyncAggregate, SyncCommittee, DOMAIN_SYNC_COMMITTEE};

/// Generalized index and proof depth of `finalized_checkpoint.root` in the
/// beacon state tree (Altair's `FINALIZED_ROOT_INDEX`).
pub const FINALIZED_ROOT_GINDEX: u64 = 105;
pub const FINALIZED_ROOT_DEPTH: usize = 6;

/// Generalized index and proof depth of `next_sync_committee` in the beacon
/// state tree.
pub const NEXT_SYNC_COMMITTEE_GINDEX: u64 = 55;
pub const NEXT_SYNC_COMMITTEE_DEPTH: usize = 5;

/// Generalized index and proof depth of `current_sync_committee` in the
/// beacon state tree — used only during bootstrap.
pub const CURRENT_SYNC_COMMITTEE_GINDEX: u64 = 54;
pub const CURRENT_SYNC_COMMITTEE_DEPTH: usize = 5;

/// Verify a sync aggregate's BLS signature over `attested_header`, signed by
/// `committee`, under the given fork parameters.
///
/// Enforces, in order: aggregate bitvector shape, non-empty participant set,
/// the signature/attested/finalized slot ordering the Altair spec requires
/// (`signature_slot > attested_header.slot`, and the signature's period must
/// be the committee's period or the next one), then the BLS check itself.
/// Returns the participant count on success — per spec.md §4.4, this
/// function does *not* enforce the supermajority threshold; that is a
/// separate, later step the store layer applies only once the signature has
/// verified (spec.md §4.5 step 6), so a non-empty but sub-threshold garbage
/// signature is rejected as `InvalidSignature`, not `InsufficientParticipation`.
pub fn verify_sync_aggregate(
    aggregate: &SyncAggregate,
    attested_header: &BeaconBlockHeader,
    signature_slot: u64,
    committee: &SyncCommittee,
    genesis_validators_root: [u8; 32],
    fork_version: [u8; 4],
) -> Result<usize, VerifierError> {
    committee::validate_aggregate_shape(aggregate)?;
    committee.validate()?;

    if signature_slot <= attested_header.slot {
        return Err(VerifierError::InvalidSlotOrder {
            signature_slot,
            attested_slot: attested_header.slot,
        });
    }

    let signature_period = crate::types::sync_committee_period(signature_slot);
    if signature_period != committee.period && signature_period != committee.period + 1 {
        return Err(VerifierError::SignaturePeriodMismatch {
            signature_slot,
            signature_period,
            committee_period: committee.period,
        });
    }

    let participant_indices = aggregate.participant_indices();
    if participant_indices.is_empty() {
        return Err(VerifierError::InsufficientParticipation {
            participants: 0,
            required: committee::supermajority_threshold(),
        });
    }

    let participants = participant_indices.len();

    let domain = ssz::compute_domain(&DOMAIN_SYNC_COMMITTEE, &fork_version, &genesis_validators_root);
    let signing_root = ssz::compute_signing_root(attested_header, &domain);

    let participant_pubkeys: Vec<_> = participant_indices
        .iter()
        .map(|&i| &committee.pubkeys[i])
        .collect();

    if !crate::bls::fast_aggregate_verify(&participant_pubkeys, &signing_root, &aggregate.signature) {
        return Err(VerifierError::InvalidSignature);
    }

    Ok(participants)
}

/// Verify that `finalized_header` is committed to inside `attested_state_root`
/// via `branch`. An empty branch is accepted only when `allow_empty_branch`
/// is set — the one legitimate case being the initial trusted bootstrap,
/// where there is nothing yet to prove finality against. Every
/// non-bootstrap `FinalityUpdate` must supply a real branch.
pub fn verify_finality_proof(
    finalized_header: &BeaconBlockHeader,
    branch: &[[u8; 32]],
    attested_state_root: &[u8; 32],
    allow_empty_branch: bool,
) -> Result<(), VerifierError> {
    if branch.is_empty() {
        return if allow_empty_branch {
            Ok(())
        } else {
            Err(VerifierError::EmptyFinalityBranch)
        };
    }

    let leaf = ssz::hash_tree_root_header(finalized_header);
    let valid = ssz::verify_merkle_branch(
        &leaf,
        branch,
        FINALIZED_ROOT_DEPTH,
        FINALIZED_ROOT_GINDEX,
        attested_state_root,
    );
    if !valid {
        return Err(VerifierError::InvalidFinalityProof);
    }
    Ok(())
}

/// Verify that `committee` (the next period's) is committed to inside
/// `attested_state_root` via `branch`. Used both for the rotation path
/// ([`crate::validator`]) and for bootstrap's current-committee proof,
/// which calls this with the current-committee gindex/depth instead.
pub fn verify_committee_branch(
    committee: &SyncCommittee,
    branch: &[[u8; 32]],
    attested_state_root: &[u8; 32],
    gindex: u64,
    depth: usize,
) -> Result<(), VerifierError> {
    if branch.is_empty() {
        return Err(VerifierError::InvalidNextSyncCommitteeBranch);
    }
    let leaf = ssz::hash_tree_root_committee(committee);
    let valid = ssz::verify_merkle_branch(&leaf, branch, depth, gindex, attested_state_root);
    if !valid {
        return Err(VerifierError::InvalidNextSyncCommitteeBranch);
    }
    Ok(())
}
