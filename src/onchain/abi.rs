//! Prediction-market contract ABI: event topics, function selectors, and the
//! word-level encode/decode helpers shared by the log decoder and the call
//! client.
//!
//! The contract ships no JSON ABI with this tree, so the canonical signatures
//! are pinned here as pre-computed keccak256 hashes and re-derived in tests.

use alloy::primitives::{b256, fixed_bytes, keccak256, Address, Selector, B256, U256};
use thiserror::Error;

// ─── Event topic0 hashes (keccak256 of event signature) ──────────────────────

/// keccak256("BetPlaced(address,uint256,string,uint256)")
pub const BET_PLACED_TOPIC: B256 =
    b256!("02337a2de26093979fec9e25c4d2c7b6a8bd0c2fd9b3214ded831ac4f3d391e7");

// ─── Function selectors (first 4 bytes of keccak256 of the signature) ─────────

/// keccak256("placeBet(uint256,string)")[..4]
pub const PLACE_BET_SELECTOR: Selector = fixed_bytes!("5e8af735");

/// keccak256("resolvePrediction(uint256,string)")[..4]
pub const RESOLVE_PREDICTION_SELECTOR: Selector = fixed_bytes!("f9d20dda");

/// keccak256("claimPayout(uint256)")[..4]
pub const CLAIM_PAYOUT_SELECTOR: Selector = fixed_bytes!("8a69614e");

/// keccak256("userBets(address,uint256)")[..4]
pub const USER_BETS_SELECTOR: Selector = fixed_bytes!("8068aa68");

/// keccak256("predictions(uint256)")[..4]
pub const PREDICTIONS_SELECTOR: Selector = fixed_bytes!("004fbbb0");

/// keccak256("handleExcessFunds(string)")[..4]
pub const HANDLE_EXCESS_FUNDS_SELECTOR: Selector = fixed_bytes!("79ae1dac");

/// Errors raised while decoding event logs or call return data.
#[derive(Debug, Error)]
pub enum AbiError {
    #[error("log missing expected topic {0}")]
    MissingTopic(usize),
    #[error("unexpected event topic {0}")]
    WrongEvent(B256),
    #[error("data too short: {0} bytes")]
    ShortData(usize),
    #[error("dynamic field offset out of bounds")]
    BadOffset,
    #[error("string field is not valid UTF-8")]
    BadUtf8,
    #[error("unrecognised vote {0:?}")]
    UnknownVote(String),
    #[error("integer field exceeds u64 range")]
    OversizedInt,
    #[error("log carries no block position")]
    MissingPosition,
}

/// Compute a function selector from its canonical signature.
pub fn selector(signature: &str) -> Selector {
    let hash = keccak256(signature.as_bytes());
    Selector::from_slice(&hash[..4])
}

// ─── Word-level encoding ──────────────────────────────────────────────────────

/// A uint256 as a single big-endian ABI word.
pub fn word_u256(value: U256) -> [u8; 32] {
    value.to_be_bytes()
}

/// A u64 widened to a uint256 ABI word.
pub fn word_u64(value: u64) -> [u8; 32] {
    word_u256(U256::from(value))
}

/// An address left-padded to a full ABI word.
pub fn word_address(address: Address) -> [u8; 32] {
    B256::left_padding_from(address.as_slice()).0
}

/// Append a dynamic string tail: length word followed by the UTF-8 bytes
/// zero-padded to a word boundary. The caller has already written the offset
/// word into the head.
pub fn append_string_tail(out: &mut Vec<u8>, value: &str) {
    let bytes = value.as_bytes();
    out.extend_from_slice(&word_u64(bytes.len() as u64));
    out.extend_from_slice(bytes);
    let pad = (32 - bytes.len() % 32) % 32;
    out.extend_from_slice(&vec![0u8; pad]);
}

// ─── Word-level decoding ──────────────────────────────────────────────────────

/// Read the `index`-th 32-byte word as a uint256.
pub fn read_u256(data: &[u8], index: usize) -> Result<U256, AbiError> {
    let start = index * 32;
    let end = start + 32;
    if data.len() < end {
        return Err(AbiError::ShortData(data.len()));
    }
    let bytes: [u8; 32] = data[start..end]
        .try_into()
        .map_err(|_| AbiError::ShortData(data.len()))?;
    Ok(U256::from_be_bytes(bytes))
}

/// Read the `index`-th word as a u64, rejecting values that do not fit.
pub fn read_u64(data: &[u8], index: usize) -> Result<u64, AbiError> {
    read_u256(data, index)?
        .try_into()
        .map_err(|_| AbiError::OversizedInt)
}

/// Read the `index`-th word as a solidity bool (zero / non-zero).
pub fn read_bool(data: &[u8], index: usize) -> Result<bool, AbiError> {
    Ok(read_u256(data, index)? != U256::ZERO)
}

/// Follow the dynamic-string offset stored in the `index`-th head word and
/// decode the length-prefixed UTF-8 tail it points at.
pub fn read_string(data: &[u8], index: usize) -> Result<String, AbiError> {
    let offset: usize = read_u256(data, index)?
        .try_into()
        .map_err(|_| AbiError::BadOffset)?;
    let tail = offset.checked_add(32).ok_or(AbiError::BadOffset)?;
    if tail > data.len() {
        return Err(AbiError::BadOffset);
    }
    let len_bytes: [u8; 32] = data[offset..tail]
        .try_into()
        .map_err(|_| AbiError::BadOffset)?;
    let len: usize = U256::from_be_bytes(len_bytes)
        .try_into()
        .map_err(|_| AbiError::BadOffset)?;
    let end = tail.checked_add(len).ok_or(AbiError::BadOffset)?;
    if end > data.len() {
        return Err(AbiError::BadOffset);
    }
    let bytes = &data[tail..end];
    std::str::from_utf8(bytes)
        .map(|s| s.to_string())
        .map_err(|_| AbiError::BadUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_matches_signature_hash() {
        assert_eq!(
            BET_PLACED_TOPIC,
            keccak256(b"BetPlaced(address,uint256,string,uint256)"),
        );
    }

    #[test]
    fn selectors_match_signature_hashes() {
        let checks = [
            ("placeBet(uint256,string)", PLACE_BET_SELECTOR),
            ("resolvePrediction(uint256,string)", RESOLVE_PREDICTION_SELECTOR),
            ("claimPayout(uint256)", CLAIM_PAYOUT_SELECTOR),
            ("userBets(address,uint256)", USER_BETS_SELECTOR),
            ("predictions(uint256)", PREDICTIONS_SELECTOR),
            ("handleExcessFunds(string)", HANDLE_EXCESS_FUNDS_SELECTOR),
        ];
        for (sig, expected) in checks {
            assert_eq!(selector(sig), expected, "selector mismatch for {sig}");
        }
    }

    #[test]
    fn string_tail_pads_to_word_boundary() {
        let mut out = Vec::new();
        append_string_tail(&mut out, "yes");
        assert_eq!(out.len(), 64);
        assert_eq!(read_u256(&out, 0).unwrap(), U256::from(3));
        assert_eq!(&out[32..35], b"yes");
        assert!(out[35..].iter().all(|b| *b == 0));

        // 32-byte strings take a full extra word, no padding
        let mut exact = Vec::new();
        append_string_tail(&mut exact, &"x".repeat(32));
        assert_eq!(exact.len(), 64);
    }

    #[test]
    fn read_string_round_trips() {
        // head word 0 holds the offset (0x20), tail follows
        let mut data = Vec::new();
        data.extend_from_slice(&word_u64(0x20));
        append_string_tail(&mut data, "withdraw");
        assert_eq!(read_string(&data, 0).unwrap(), "withdraw");
    }

    #[test]
    fn read_string_rejects_out_of_bounds_offset() {
        let mut data = Vec::new();
        data.extend_from_slice(&word_u64(0x200));
        assert!(matches!(read_string(&data, 0), Err(AbiError::BadOffset)));
    }

    #[test]
    fn read_string_rejects_length_past_end() {
        let mut data = Vec::new();
        data.extend_from_slice(&word_u64(0x20));
        data.extend_from_slice(&word_u64(500));
        data.extend_from_slice(b"short");
        assert!(matches!(read_string(&data, 0), Err(AbiError::BadOffset)));
    }

    #[test]
    fn read_u64_rejects_oversized_values() {
        let data = word_u256(U256::MAX);
        assert!(matches!(read_u64(&data, 0), Err(AbiError::OversizedInt)));
    }
}
