//! Wire-format data structures shared by every component: headers, the sync
//! committee, its aggregate signatures, and the three update kinds a store
//! can ingest.

use serde::{Deserialize, Serialize};

/// Number of validators in a beacon chain sync committee.
pub const SYNC_COMMITTEE_SIZE: usize = 512;

/// Number of bytes in a BLS12-381 public key (compressed G1 point).
pub const BLS_PUBKEY_LEN: usize = 48;

/// Number of bytes in a BLS12-381 signature (compressed G2 point).
pub const BLS_SIGNATURE_LEN: usize = 96;

/// Slots per sync committee period (256 epochs * 32 slots/epoch).
pub const SLOTS_PER_SYNC_COMMITTEE_PERIOD: u64 = 8192;

/// Slots per epoch.
pub const SLOTS_PER_EPOCH: u64 = 32;

/// Domain type for sync committee signatures, padded to 32 bytes by
/// [`crate::ssz::compute_domain`].
pub const DOMAIN_SYNC_COMMITTEE: [u8; 4] = [0x07, 0x00, 0x00, 0x00];

/// Minimum number of sync committee participants required for a supermajority
/// (2/3 of 512, rounded up).
pub const MIN_SYNC_COMMITTEE_PARTICIPANTS: usize = 342;

/// Sync committee period that `slot` falls in.
pub fn sync_committee_period(slot: u64) -> u64 {
    slot / SLOTS_PER_SYNC_COMMITTEE_PERIOD
}

/// A BLS12-381 public key (48-byte compressed G1 point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsPublicKey(pub [u8; BLS_PUBKEY_LEN]);

impl Serialize for BlsPublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for BlsPublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl BlsPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_PUBKEY_LEN {
            return Err("invalid BLS public key length");
        }
        let mut arr = [0u8; BLS_PUBKEY_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

/// A BLS12-381 signature (96-byte compressed G2 point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsSignature(pub [u8; BLS_SIGNATURE_LEN]);

impl Serialize for BlsSignature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for BlsSignature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl BlsSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_SIGNATURE_LEN {
            return Err("invalid BLS signature length");
        }
        let mut arr = [0u8; BLS_SIGNATURE_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

/// A BLS12-381 secret key scalar. Test/tooling support only — a production
/// light client never holds one of these.
#[derive(Clone)]
pub struct BlsSecretKey(pub [u8; 32]);

/// An immutable beacon block header. The light client never sees full
/// blocks, only the headers the sync committee attests to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockHeader {
    pub slot: u64,
    pub proposer_index: u64,
    pub parent_root: [u8; 32],
    pub state_root: [u8; 32],
    pub body_root: [u8; 32],
}

/// The rotating 512-member sync committee that co-signs every slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCommittee {
    /// Exactly [`SYNC_COMMITTEE_SIZE`] BLS public keys.
    pub pubkeys: Vec<BlsPublicKey>,
    /// Aggregate of all 512 pubkeys, kept alongside for callers that want a
    /// single-key fast path; verification in this crate always re-aggregates
    /// only the participating subset.
    pub aggregate_pubkey: BlsPublicKey,
    /// Sync committee period this committee serves.
    pub period: u64,
}

impl SyncCommittee {
    /// Reject a committee that wasn't built with exactly 512 members.
    pub fn validate(&self) -> Result<(), crate::error::CommitteeError> {
        if self.pubkeys.len() != SYNC_COMMITTEE_SIZE {
            return Err(crate::error::CommitteeError::WrongSize {
                got: self.pubkeys.len(),
            });
        }
        Ok(())
    }
}

/// The bitfield + aggregate BLS signature a sync committee produces for a
/// given slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAggregate {
    /// 64-byte little-endian bitvector; bit `i` is `bits[i/8] & (1 << i%8)`.
    pub committee_bits: Vec<u8>,
    pub signature: BlsSignature,
}

impl SyncAggregate {
    /// Popcount of the committee bitvector.
    pub fn participation_count(&self) -> usize {
        self.committee_bits
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum()
    }

    pub fn has_participant(&self, index: usize) -> bool {
        if index >= SYNC_COMMITTEE_SIZE {
            return false;
        }
        let byte_index = index / 8;
        let bit_index = index % 8;
        match self.committee_bits.get(byte_index) {
            Some(byte) => (byte >> bit_index) & 1 == 1,
            None => false,
        }
    }

    /// Indices of every committee member that participated, in ascending
    /// order — used to select the pubkeys BLS aggregates over.
    pub fn participant_indices(&self) -> Vec<usize> {
        (0..SYNC_COMMITTEE_SIZE)
            .filter(|&i| self.has_participant(i))
            .collect()
    }
}

/// The lightest-weight update: advances the optimistic head only, no
/// finality proof attached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimisticUpdate {
    pub attested_header: BeaconBlockHeader,
    pub sync_aggregate: SyncAggregate,
    pub signature_slot: u64,
}

/// A finality update: advances both heads, carries the Merkle proof linking
/// `finalized_header` into `attested_header`'s state, and optionally carries
/// the next period's sync committee plus its own Merkle proof.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalityUpdate {
    pub attested_header: BeaconBlockHeader,
    pub finalized_header: BeaconBlockHeader,
    pub finality_branch: Vec<[u8; 32]>,
    pub sync_aggregate: SyncAggregate,
    pub signature_slot: u64,
    /// Present only on updates that cross a sync-committee period boundary.
    pub next_sync_committee: Option<SyncCommittee>,
    pub next_sync_committee_branch: Vec<[u8; 32]>,
}

/// The initial trusted-checkpoint payload a store is bootstrapped from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LightClientBootstrap {
    pub header: BeaconBlockHeader,
    pub current_sync_committee: SyncCommittee,
    pub current_sync_committee_branch: Vec<[u8; 32]>,
}
