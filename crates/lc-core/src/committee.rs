//! Sync committee accounting: size, participation counting, the
//! supermajority rule, and the Keccak256 bootstrap fingerprint.
//!
//! `committee_root` here is deliberately *not* the SSZ `hash_tree_root` from
//! [`crate::ssz`] — it is a cheap Keccak256 digest used only so an operator
//! can eyeball-compare a bootstrap committee against a published checksum
//! before ever handing it to [`crate::store::Store::new`]. The Merkle
//! branches that cryptographically bind a committee into beacon state use
//! `hash_tree_root_committee` instead.

use tiny_keccak::{Hasher, Keccak};

use crate::error::CommitteeError;
use crate::types::{SyncAggregate, SyncCommittee, MIN_SYNC_COMMITTEE_PARTICIPANTS, SYNC_COMMITTEE_SIZE};

/// Number of committee members — always 512 for Altair and later.
pub const fn size() -> usize {
    SYNC_COMMITTEE_SIZE
}

/// Popcount over a committee's 64-byte bitvector.
pub fn participation_count(bits: &[u8]) -> usize {
    bits.iter().map(|b| b.count_ones() as usize).sum()
}

/// An aggregate is sufficient iff `3 * participants >= 2 * 512` — at least
/// 342 of 512 (two thirds, rounded up).
pub fn is_supermajority(participants: usize) -> bool {
    3 * participants >= 2 * SYNC_COMMITTEE_SIZE
}

/// Keccak256 of the concatenated raw 48-byte pubkeys — a bootstrap
/// fingerprint only, never used inside a Merkle proof.
pub fn committee_root(committee: &SyncCommittee) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    for pk in &committee.pubkeys {
        hasher.update(&pk.0);
    }
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Validate committee shape and sync aggregate bitvector length together —
/// the two checks an ingest path always wants before touching BLS.
pub fn validate_aggregate_shape(aggregate: &SyncAggregate) -> Result<(), CommitteeError> {
    let expected = SYNC_COMMITTEE_SIZE / 8;
    if aggregate.committee_bits.len() != expected {
        return Err(CommitteeError::WrongBitsLength {
            expected,
            got: aggregate.committee_bits.len(),
        });
    }
    Ok(())
}

/// Supermajority threshold, exposed for callers that want to report
/// progress toward it rather than just a pass/fail bool.
pub const fn supermajority_threshold() -> usize {
    MIN_SYNC_COMMITTEE_PARTICIPANTS
}
