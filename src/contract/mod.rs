//! Typed client for the prediction-market contract.
//!
//! One method per boundary operation, nothing else: the contract's bet
//! accounting, payout math, and resolution authority all live on-chain.
//! Call data is hand-encoded against the pinned selectors in `onchain::abi`
//! and return data is hand-decoded the same way; the provider is injected
//! once at construction.

use crate::onchain::abi::{self, AbiError};
use crate::onchain::types::Choice;

use alloy::network::TransactionBuilder;
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, Bytes, Selector, B256, U256};
use alloy::providers::{PendingTransactionError, Provider};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::TransportError;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("rpc transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("transaction did not confirm: {0}")]
    Pending(#[from] PendingTransactionError),
    #[error("transaction {0} reverted")]
    Reverted(B256),
    #[error("malformed return data: {0}")]
    Decode(#[from] AbiError),
}

/// A user's standing bet on one market, as the `userBets` getter reports it.
/// An address that never bet decodes as an empty vote and zero amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBet {
    pub choice: Option<Choice>,
    pub amount: U256,
}

impl UserBet {
    pub fn exists(&self) -> bool {
        self.choice.is_some()
    }
}

/// Resolution state of one market, as the `predictions` getter reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionState {
    pub resolved: bool,
    pub result: Option<Choice>,
}

/// Owner-side treasury action accepted by `handleExcessFunds`. Only the
/// withdraw action is known to the ops tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcessAction {
    Withdraw,
}

impl ExcessAction {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for ExcessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Signals emitted by the resolution poll task.
#[derive(Debug, Clone)]
pub enum ResolutionEvent {
    Resolved { market_id: u64, result: Choice },
    PollFailed { reason: String },
}

impl fmt::Display for ResolutionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved { market_id, result } => {
                write!(f, "Resolved(market={market_id}, result={result})")
            }
            Self::PollFailed { reason } => write!(f, "PollFailed({reason})"),
        }
    }
}

/// The prediction-market contract at a fixed address, over any provider.
/// Read-only callers hand in a bare RPC provider; the submitting binaries
/// hand in a wallet-filled one.
pub struct MarketContract<P> {
    provider: P,
    address: Address,
}

impl<P: Provider> MarketContract<P> {
    pub fn new(provider: P, address: Address) -> Self {
        Self { provider, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// `placeBet(uint256,string)` with the stake attached as call value.
    pub async fn place_bet(
        &self,
        market_id: u64,
        choice: Choice,
        stake: U256,
    ) -> Result<B256, ContractError> {
        info!(
            market = market_id,
            choice = %choice,
            stake = %format_ether(stake),
            "submitting placeBet"
        );
        let calldata = calldata_id_string(abi::PLACE_BET_SELECTOR, market_id, choice.as_wire());
        self.submit(calldata, stake).await
    }

    /// `resolvePrediction(uint256,string)`. Owner-only on-chain.
    pub async fn resolve_prediction(
        &self,
        market_id: u64,
        result: Choice,
    ) -> Result<B256, ContractError> {
        info!(market = market_id, result = %result, "submitting resolvePrediction");
        let calldata =
            calldata_id_string(abi::RESOLVE_PREDICTION_SELECTOR, market_id, result.as_wire());
        self.submit(calldata, U256::ZERO).await
    }

    /// `claimPayout(uint256)`.
    pub async fn claim_payout(&self, market_id: u64) -> Result<B256, ContractError> {
        info!(market = market_id, "submitting claimPayout");
        let calldata = calldata_id(abi::CLAIM_PAYOUT_SELECTOR, market_id);
        self.submit(calldata, U256::ZERO).await
    }

    /// `handleExcessFunds(string)`. Owner-only on-chain.
    pub async fn handle_excess_funds(&self, action: ExcessAction) -> Result<B256, ContractError> {
        info!(action = %action, "submitting handleExcessFunds");
        let calldata = calldata_string(abi::HANDLE_EXCESS_FUNDS_SELECTOR, action.as_wire());
        self.submit(calldata, U256::ZERO).await
    }

    /// Read `userBets(address,uint256)`.
    pub async fn user_bets(
        &self,
        user: Address,
        market_id: u64,
    ) -> Result<UserBet, ContractError> {
        let calldata = calldata_address_id(abi::USER_BETS_SELECTOR, user, market_id);
        let data = self.call(calldata).await?;
        Ok(decode_user_bet(&data)?)
    }

    /// Read `predictions(uint256)`.
    pub async fn predictions(&self, market_id: u64) -> Result<PredictionState, ContractError> {
        let calldata = calldata_id(abi::PREDICTIONS_SELECTOR, market_id);
        let data = self.call(calldata).await?;
        Ok(decode_prediction(&data)?)
    }

    /// Whether `user` can expect `claimPayout(market_id)` to pay out.
    ///
    /// The contract exposes no authoritative "is this user owed a payout"
    /// view, so this re-derives entitlement from `userBets` and
    /// `predictions` and can disagree with the contract's own claim check.
    /// Treat it as a gate for interactive flows, never as settlement truth.
    pub async fn payout_claimable(
        &self,
        user: Address,
        market_id: u64,
    ) -> Result<bool, ContractError> {
        let bet = self.user_bets(user, market_id).await?;
        let state = self.predictions(market_id).await?;
        let claimable = entitlement(&bet, &state);
        debug!(
            user = %user,
            market = market_id,
            resolved = state.resolved,
            claimable = claimable,
            "client-side entitlement derivation"
        );
        Ok(claimable)
    }

    async fn call(&self, calldata: Vec<u8>) -> Result<Bytes, ContractError> {
        let tx = TransactionRequest::default()
            .with_to(self.address)
            .with_input(Bytes::from(calldata));
        Ok(self.provider.call(tx).await?)
    }

    async fn submit(&self, calldata: Vec<u8>, value: U256) -> Result<B256, ContractError> {
        let mut tx = TransactionRequest::default()
            .with_to(self.address)
            .with_input(Bytes::from(calldata));
        if value > U256::ZERO {
            tx = tx.with_value(value);
        }
        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        debug!(tx = %tx_hash, "transaction submitted, awaiting receipt");
        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(ContractError::Reverted(tx_hash));
        }
        Ok(tx_hash)
    }
}

/// The client-side entitlement rule: a standing vote on a resolved market
/// matching the recorded result.
fn entitlement(bet: &UserBet, state: &PredictionState) -> bool {
    if !state.resolved {
        return false;
    }
    match (bet.choice, state.result) {
        (Some(vote), Some(result)) => vote == result,
        _ => false,
    }
}

fn decode_user_bet(data: &[u8]) -> Result<UserBet, AbiError> {
    // (string vote, uint256 amount)
    let vote = abi::read_string(data, 0)?;
    let amount = abi::read_u256(data, 1)?;
    let choice = if vote.is_empty() {
        None
    } else {
        Some(vote.parse::<Choice>()?)
    };
    Ok(UserBet { choice, amount })
}

fn decode_prediction(data: &[u8]) -> Result<PredictionState, AbiError> {
    // (bool resolved, string result)
    let resolved = abi::read_bool(data, 0)?;
    let result = abi::read_string(data, 1)?;
    let result = if result.is_empty() {
        None
    } else {
        Some(result.parse::<Choice>()?)
    };
    Ok(PredictionState { resolved, result })
}

fn calldata_id(selector: Selector, market_id: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 32);
    out.extend_from_slice(selector.as_slice());
    out.extend_from_slice(&abi::word_u64(market_id));
    out
}

fn calldata_address_id(selector: Selector, address: Address, market_id: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 64);
    out.extend_from_slice(selector.as_slice());
    out.extend_from_slice(&abi::word_address(address));
    out.extend_from_slice(&abi::word_u64(market_id));
    out
}

fn calldata_id_string(selector: Selector, market_id: u64, value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 96 + value.len());
    out.extend_from_slice(selector.as_slice());
    out.extend_from_slice(&abi::word_u64(market_id));
    // string head slot points past the two head words
    out.extend_from_slice(&abi::word_u64(0x40));
    abi::append_string_tail(&mut out, value);
    out
}

fn calldata_string(selector: Selector, value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 64 + value.len());
    out.extend_from_slice(selector.as_slice());
    out.extend_from_slice(&abi::word_u64(0x20));
    abi::append_string_tail(&mut out, value);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_bet_calldata_layout() {
        let data = calldata_id_string(abi::PLACE_BET_SELECTOR, 7, "yes");
        assert_eq!(&data[..4], abi::PLACE_BET_SELECTOR.as_slice());
        let args = &data[4..];
        assert_eq!(abi::read_u64(args, 0).unwrap(), 7);
        assert_eq!(abi::read_u64(args, 1).unwrap(), 0x40);
        assert_eq!(abi::read_string(args, 1).unwrap(), "yes");
        // selector + two head words + length word + one padded word
        assert_eq!(data.len(), 4 + 32 * 4);
    }

    #[test]
    fn claim_payout_calldata_layout() {
        let data = calldata_id(abi::CLAIM_PAYOUT_SELECTOR, 33);
        assert_eq!(&data[..4], abi::CLAIM_PAYOUT_SELECTOR.as_slice());
        assert_eq!(abi::read_u64(&data[4..], 0).unwrap(), 33);
        assert_eq!(data.len(), 36);
    }

    #[test]
    fn user_bets_calldata_layout() {
        let user = Address::repeat_byte(0x42);
        let data = calldata_address_id(abi::USER_BETS_SELECTOR, user, 5);
        assert_eq!(&data[..4], abi::USER_BETS_SELECTOR.as_slice());
        assert_eq!(&data[4 + 12..4 + 32], user.as_slice());
        assert_eq!(abi::read_u64(&data[4..], 1).unwrap(), 5);
    }

    #[test]
    fn withdraw_calldata_layout() {
        let data = calldata_string(abi::HANDLE_EXCESS_FUNDS_SELECTOR, "withdraw");
        assert_eq!(&data[..4], abi::HANDLE_EXCESS_FUNDS_SELECTOR.as_slice());
        assert_eq!(abi::read_string(&data[4..], 0).unwrap(), "withdraw");
    }

    fn user_bet_return(vote: &str, amount: u64) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&abi::word_u64(0x40));
        data.extend_from_slice(&abi::word_u64(amount));
        abi::append_string_tail(&mut data, vote);
        data
    }

    fn prediction_return(resolved: bool, result: &str) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&abi::word_u64(u64::from(resolved)));
        data.extend_from_slice(&abi::word_u64(0x40));
        abi::append_string_tail(&mut data, result);
        data
    }

    #[test]
    fn decodes_standing_user_bet() {
        let bet = decode_user_bet(&user_bet_return("no", 250)).unwrap();
        assert_eq!(bet.choice, Some(Choice::No));
        assert_eq!(bet.amount, U256::from(250u64));
        assert!(bet.exists());
    }

    #[test]
    fn decodes_absent_user_bet_as_empty() {
        let bet = decode_user_bet(&user_bet_return("", 0)).unwrap();
        assert_eq!(bet.choice, None);
        assert!(!bet.exists());
    }

    #[test]
    fn decodes_resolution_states() {
        let open = decode_prediction(&prediction_return(false, "")).unwrap();
        assert_eq!(
            open,
            PredictionState {
                resolved: false,
                result: None
            }
        );

        let settled = decode_prediction(&prediction_return(true, "yes")).unwrap();
        assert_eq!(
            settled,
            PredictionState {
                resolved: true,
                result: Some(Choice::Yes)
            }
        );
    }

    #[test]
    fn entitlement_truth_table() {
        let yes_bet = UserBet {
            choice: Some(Choice::Yes),
            amount: U256::from(1u64),
        };
        let no_bet = UserBet {
            choice: Some(Choice::No),
            amount: U256::from(1u64),
        };
        let absent = UserBet {
            choice: None,
            amount: U256::ZERO,
        };
        let unresolved = PredictionState {
            resolved: false,
            result: None,
        };
        let resolved_yes = PredictionState {
            resolved: true,
            result: Some(Choice::Yes),
        };

        assert!(!entitlement(&yes_bet, &unresolved));
        assert!(entitlement(&yes_bet, &resolved_yes));
        assert!(!entitlement(&no_bet, &resolved_yes));
        assert!(!entitlement(&absent, &resolved_yes));
    }
}
