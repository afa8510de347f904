//! Error taxonomy, one `thiserror`-derived enum per component. Every variant
//! here corresponds to a failure that is local and recoverable — callers get
//! a typed reason back and the store is left exactly as it was before the
//! call. Nothing in this crate panics on untrusted input.

use thiserror::Error;

/// Errors from the BLS primitive (`crate::bls`).
#[derive(Debug, Error)]
pub enum BlsError {
    #[error("invalid BLS public key encoding at index {index}: {reason}")]
    InvalidPublicKey { index: usize, reason: String },

    #[error("invalid BLS signature encoding: {reason}")]
    InvalidSignature { reason: String },

    #[error("cannot aggregate an empty set of {what}")]
    EmptyAggregation { what: &'static str },

    #[error("BLS aggregation failed: {reason}")]
    AggregationFailed { reason: String },
}

/// Errors from sync committee bookkeeping (`crate::committee`).
#[derive(Debug, Error)]
pub enum CommitteeError {
    #[error("sync committee must have exactly {} members, got {got}", crate::types::SYNC_COMMITTEE_SIZE)]
    WrongSize { got: usize },

    #[error("sync committee bits length mismatch: expected {expected} bytes, got {got}")]
    WrongBitsLength { expected: usize, got: usize },
}

/// Errors from the header verifier (`crate::verifier`).
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error(transparent)]
    Bls(#[from] BlsError),

    #[error(transparent)]
    Committee(#[from] CommitteeError),

    #[error("insufficient sync committee participation: {participants}/{required} required")]
    InsufficientParticipation { participants: usize, required: usize },

    #[error("aggregate BLS signature does not verify against the participating committee")]
    InvalidSignature,

    #[error("signature slot {signature_slot} is not after attested slot {attested_slot}")]
    InvalidSlotOrder {
        signature_slot: u64,
        attested_slot: u64,
    },

    #[error("attested slot {attested_slot} is not after finalized slot {finalized_slot}")]
    InvalidFinalityOrder {
        attested_slot: u64,
        finalized_slot: u64,
    },

    #[error(
        "signature slot {signature_slot} (period {signature_period}) is too far from the \
         committee period {committee_period} it was verified against"
    )]
    SignaturePeriodMismatch {
        signature_slot: u64,
        signature_period: u64,
        committee_period: u64,
    },

    #[error("finality branch does not reconstruct the attested state root")]
    InvalidFinalityProof,

    #[error("finality branch is empty; only the bootstrap header may omit one")]
    EmptyFinalityBranch,

    #[error("next sync committee branch does not reconstruct the attested state root")]
    InvalidNextSyncCommitteeBranch,
}

/// Errors from the store's public surface (`crate::store`).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("required field `{field}` was missing from the update")]
    NilInput { field: &'static str },

    #[error("store has no sync committee installed yet")]
    NoCommittee,

    // `Store::new`/`Store::from_bootstrap` require a trusted header up
    // front, so a constructed `Store` is never in an uninitialized state —
    // this variant exists for parity with the spec's error taxonomy and is
    // the error a host embedding an `Option<Store>` before its own
    // bootstrap completes would reach for.
    #[error("store has not been initialized with a trusted header yet")]
    NotInitialized,

    #[error(
        "update slot {update_slot} does not advance the current {head} head at {current_slot}"
    )]
    SlotRegression {
        head: &'static str,
        update_slot: u64,
        current_slot: u64,
    },

    #[error(transparent)]
    Verification(#[from] VerifierError),
}

/// Errors from the update validator policy layer (`crate::validator`).
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Verification(#[from] VerifierError),

    #[error("rotation committee branch did not verify; refusing to install it")]
    InvalidRotationBranch,
}
