//! # lc-core
//!
//! An Altair-style beacon-chain light client state machine: validate
//! aggregate BLS signatures from a rotating 512-member sync committee and
//! Merkle proofs linking finalized checkpoints to attested headers, without
//! ever downloading or re-executing a full block.
//!
//! This crate contains **no networking, no RPC framing, no bootstrap source
//! selection, and no CLI/config wiring** — it is purely the cryptographic
//! and state-machine core a host process builds a light client around.
//!
//! ## Trust model
//!
//! - [`bls`] / [`ssz`] / [`committee`]: pure, stateless verification
//!   primitives. They never panic on attacker-controlled input.
//! - [`verifier`]: composes the primitives above into the two checks that
//!   actually gate trust — the sync aggregate signature, and the finality
//!   Merkle branch.
//! - [`store`]: the only stateful piece. A [`store::Store`] owns the
//!   current committee and both heads behind a single reader-writer lock,
//!   and is safe to share across threads.
//! - [`validator`]: the hold-vs-commit and rotation-gating policy layered
//!   on top of the store.
//!
//! ## Usage
//!
//! ```ignore
//! use lc_core::store::Store;
//! use lc_core::validator::{UpdateValidator, ValidatorConfig};
//!
//! let store = Store::new(trusted_header, committee, genesis_validators_root, fork_version)?;
//! let validator = UpdateValidator::new(&store, ValidatorConfig::default());
//! validator.ingest_finality_update(update)?;
//! ```

pub mod bls;
pub mod committee;
pub mod error;
pub mod ssz;
pub mod store;
pub mod types;
pub mod validator;
pub mod verifier;

pub use error::{BlsError, CommitteeError, StoreError, ValidatorError, VerifierError};
pub use store::Store;
pub use types::*;
pub use validator::{UpdateValidator, ValidatorConfig};
