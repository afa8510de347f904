//! BLS12-381 min-pk signature primitive, scheme-exact with the Ethereum
//! consensus spec: `BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_`.
//!
//! This module never panics on attacker-controlled input. Bad encodings,
//! infinity points, and empty key sets are all ordinary `Err`/`false`
//! results, not process aborts — a Byzantine peer gets to send us garbage
//! all day without taking the light client down.

use blst::min_pk::{AggregatePublicKey, AggregateSignature, PublicKey, SecretKey, Signature};
use blst::BLST_ERROR;

use crate::error::BlsError;
use crate::types::{BlsPublicKey, BlsSecretKey, BlsSignature};

/// Domain separation tag mandated by the Ethereum consensus spec for sync
/// committee (and all other BLS) signatures.
const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Derive the public key for a secret key. Deterministic.
pub fn pubkey_from_secret(sk: &BlsSecretKey) -> Result<BlsPublicKey, BlsError> {
    let sk = SecretKey::from_bytes(&sk.0).map_err(|e| BlsError::InvalidSignature {
        reason: format!("bad secret key: {e:?}"),
    })?;
    let pk = sk.sk_to_pk();
    BlsPublicKey::from_bytes(&pk.compress()).map_err(|_| BlsError::InvalidPublicKey {
        index: 0,
        reason: "derived key did not round-trip".into(),
    })
}

/// Sign `msg` with `sk`. Test/tooling support only — no production light
/// client path in this crate ever calls this; it exists so the test suite
/// can construct valid aggregates without a network.
pub fn sign(sk: &BlsSecretKey, msg: &[u8]) -> Result<BlsSignature, BlsError> {
    let sk = SecretKey::from_bytes(&sk.0).map_err(|e| BlsError::InvalidSignature {
        reason: format!("bad secret key: {e:?}"),
    })?;
    let sig = sk.sign(msg, DST, &[]);
    BlsSignature::from_bytes(&sig.compress()).map_err(|_| BlsError::InvalidSignature {
        reason: "signature did not round-trip".into(),
    })
}

/// Aggregate N signatures into one. Order-independent.
pub fn aggregate_signatures(sigs: &[BlsSignature]) -> Result<BlsSignature, BlsError> {
    if sigs.is_empty() {
        return Err(BlsError::EmptyAggregation { what: "signatures" });
    }
    let parsed = sigs
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Signature::from_bytes(&s.0).map_err(|e| BlsError::InvalidSignature {
                reason: format!("signature {i}: {e:?}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let refs: Vec<&Signature> = parsed.iter().collect();
    let agg = AggregateSignature::aggregate(&refs, false)
        .map_err(|e| BlsError::AggregationFailed {
            reason: format!("{e:?}"),
        })?
        .to_signature();
    BlsSignature::from_bytes(&agg.compress()).map_err(|_| BlsError::AggregationFailed {
        reason: "aggregate signature did not round-trip".into(),
    })
}

/// Aggregate N public keys into one.
pub fn aggregate_pubkeys(pubkeys: &[BlsPublicKey]) -> Result<BlsPublicKey, BlsError> {
    if pubkeys.is_empty() {
        return Err(BlsError::EmptyAggregation { what: "public keys" });
    }
    let parsed = pubkeys
        .iter()
        .enumerate()
        .map(|(i, pk)| {
            PublicKey::from_bytes(&pk.0).map_err(|e| BlsError::InvalidPublicKey {
                index: i,
                reason: format!("{e:?}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let refs: Vec<&PublicKey> = parsed.iter().collect();
    let agg = AggregatePublicKey::aggregate(&refs, false)
        .map_err(|e| BlsError::AggregationFailed {
            reason: format!("{e:?}"),
        })?
        .to_public_key();
    BlsPublicKey::from_bytes(&agg.compress()).map_err(|_| BlsError::AggregationFailed {
        reason: "aggregate public key did not round-trip".into(),
    })
}

/// Verify that `sig` is a valid aggregate BLS signature over `msg` by every
/// key in `pubkeys`. Returns `false` rather than an error for any
/// cryptographic failure (bad encoding, infinity key, failed pairing) — per
/// the spec, this primitive never throws, it only ever answers yes or no.
pub fn fast_aggregate_verify(pubkeys: &[&BlsPublicKey], msg: &[u8], sig: &BlsSignature) -> bool {
    if pubkeys.is_empty() {
        return false;
    }

    let Ok(sig) = Signature::from_bytes(&sig.0) else {
        return false;
    };

    let parsed: Result<Vec<PublicKey>, _> =
        pubkeys.iter().map(|pk| PublicKey::from_bytes(&pk.0)).collect();
    let Ok(parsed) = parsed else {
        return false;
    };
    let refs: Vec<&PublicKey> = parsed.iter().collect();

    let Ok(agg) = AggregatePublicKey::aggregate(&refs, false) else {
        return false;
    };
    let agg_pk = agg.to_public_key();

    sig.verify(false, msg, DST, &[], &agg_pk, false) == BLST_ERROR::BLST_SUCCESS
}
