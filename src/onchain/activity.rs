//! Recent-activity reconstruction from the ledger's `BetPlaced` log.
//!
//! Public RPC endpoints refuse `eth_getLogs` over wide block ranges, so the
//! scan walks a bounded lookback window in fixed-size sub-ranges and keeps
//! the most recent matches. The whole scan is read-only and carries no state
//! between invocations.

use crate::onchain::abi;
use crate::onchain::ledger::{BlockRange, LedgerError, LedgerReader};
use crate::onchain::types::BetEvent;

use alloy::primitives::Address;
use alloy::rpc::types::Filter;
use tracing::debug;

/// Scan shape: how far back from the tip to look, and how many blocks a
/// single `eth_getLogs` call may cover.
#[derive(Debug, Clone, Copy)]
pub struct QueryWindow {
    /// Blocks per sub-range query.
    pub max_span: u64,
    /// Total blocks scanned back from the tip.
    pub lookback: u64,
}

/// Split an inclusive window into consecutive sub-ranges of at most
/// `max_span` blocks each. Covers the window exactly, no gaps, no overlaps;
/// the last sub-range may be shorter.
pub fn partition(window: BlockRange, max_span: u64) -> Vec<BlockRange> {
    // a zero span would never advance
    let span = max_span.max(1);
    let mut ranges = Vec::with_capacity((window.span() / span + 1) as usize);
    let mut start = window.from;
    while start <= window.to {
        let end = (start + span - 1).min(window.to);
        ranges.push(BlockRange { from: start, to: end });
        start = end + 1;
    }
    ranges
}

/// Outcome of one scan: decoded events oldest-to-newest, plus how many log
/// entries failed to decode and were dropped.
#[derive(Debug, Clone, Default)]
pub struct ActivityScan {
    pub events: Vec<BetEvent>,
    pub skipped: usize,
}

/// Paginated `BetPlaced` scanner over an injected ledger handle.
pub struct ActivityFetcher<L> {
    ledger: L,
    filter: Filter,
    window: QueryWindow,
}

impl<L: LedgerReader> ActivityFetcher<L> {
    pub fn new(ledger: L, market: Address, window: QueryWindow) -> Self {
        let filter = Filter::new()
            .address(market)
            .event_signature(abi::BET_PLACED_TOPIC);
        Self {
            ledger,
            filter,
            window,
        }
    }

    /// Return up to `limit` of the most recent bets within the lookback
    /// window, ordered oldest-to-newest by `(block, log index)`.
    ///
    /// Sub-ranges are queried strictly in ascending order; any sub-range
    /// failure fails the whole scan with nothing returned. Undecodable log
    /// entries are dropped and counted, never fatal. No retries here; the
    /// caller owns retry policy.
    pub async fn recent_bets(&self, limit: usize) -> Result<ActivityScan, LedgerError> {
        let tip = self.ledger.chain_head().await?;
        let from = tip.saturating_sub(self.window.lookback);
        let window = BlockRange { from, to: tip };

        let mut events: Vec<BetEvent> = Vec::new();
        let mut skipped = 0usize;
        for range in partition(window, self.window.max_span) {
            let logs = self.ledger.logs(&self.filter, range).await?;
            debug!(range = %range, logs = logs.len(), "scanned sub-range");
            for log in &logs {
                match BetEvent::decode(log) {
                    Ok(event) => events.push(event),
                    Err(e) => {
                        skipped += 1;
                        debug!(error = %e, block = log.block_number, "skipping undecodable log");
                    }
                }
            }
        }

        // Emission order must hold regardless of provider quirks.
        events.sort_by_key(BetEvent::position);
        if events.len() > limit {
            events.drain(..events.len() - limit);
        }
        Ok(ActivityScan { events, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onchain::types::Choice;

    use alloy::primitives::{Address, B256, U256};
    use alloy::rpc::types::Log;
    use std::sync::Mutex;

    const MARKET: Address = Address::repeat_byte(0xCF);

    fn bet_log(actor: u8, market_id: u64, vote: &str, amount: u64, block: u64, idx: u64) -> Log {
        let mut data = Vec::new();
        data.extend_from_slice(&abi::word_u64(market_id));
        data.extend_from_slice(&abi::word_u64(0x60));
        data.extend_from_slice(&abi::word_u256(U256::from(amount)));
        abi::append_string_tail(&mut data, vote);
        raw_log(actor, data, block, idx)
    }

    fn raw_log(actor: u8, data: Vec<u8>, block: u64, idx: u64) -> Log {
        let actor = Address::repeat_byte(actor);
        Log {
            inner: alloy::primitives::Log::new_unchecked(
                MARKET,
                vec![
                    abi::BET_PLACED_TOPIC,
                    B256::left_padding_from(actor.as_slice()),
                ],
                data.into(),
            ),
            block_hash: None,
            block_number: Some(block),
            block_timestamp: None,
            transaction_hash: Some(B256::repeat_byte(0xAB)),
            transaction_index: None,
            log_index: Some(idx),
            removed: false,
        }
    }

    /// In-memory ledger scripted with a fixed tip and log set. Records every
    /// queried range and can be told to fail the n-th logs call.
    struct StubLedger {
        tip: u64,
        logs: Vec<Log>,
        fail_on_call: Option<usize>,
        calls: Mutex<Vec<BlockRange>>,
    }

    impl StubLedger {
        fn new(tip: u64, logs: Vec<Log>) -> Self {
            Self {
                tip,
                logs,
                fail_on_call: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_at(mut self, call: usize) -> Self {
            self.fail_on_call = Some(call);
            self
        }

        fn recorded_calls(&self) -> Vec<BlockRange> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl LedgerReader for &StubLedger {
        async fn chain_head(&self) -> Result<u64, LedgerError> {
            Ok(self.tip)
        }

        async fn logs(&self, _: &Filter, range: BlockRange) -> Result<Vec<Log>, LedgerError> {
            let call_number = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(range);
                calls.len()
            };
            if self.fail_on_call == Some(call_number) {
                return Err(LedgerError::InvalidUrl("injected failure".to_string()));
            }
            Ok(self
                .logs
                .iter()
                .filter(|log| {
                    let block = log.block_number.unwrap_or(0);
                    block >= range.from && block <= range.to
                })
                .cloned()
                .collect())
        }
    }

    fn fetcher(ledger: &StubLedger, max_span: u64, lookback: u64) -> ActivityFetcher<&StubLedger> {
        ActivityFetcher::new(ledger, MARKET, QueryWindow { max_span, lookback })
    }

    #[test]
    fn partition_covers_window_without_gaps() {
        let window = BlockRange { from: 0, to: 1000 };
        let ranges = partition(window, 50);

        // 1001 blocks at 50 per range
        assert_eq!(ranges.len(), 21);
        assert_eq!(ranges.len() as u64, window.span().div_ceil(50));
        assert_eq!(ranges.first().unwrap().from, 0);
        assert_eq!(ranges.last().unwrap().to, 1000);
        for pair in ranges.windows(2) {
            assert_eq!(pair[1].from, pair[0].to + 1);
        }
        for range in &ranges {
            assert!(range.span() <= 50);
        }
    }

    #[test]
    fn partition_exact_multiple_has_no_runt_range() {
        let ranges = partition(BlockRange { from: 0, to: 99 }, 50);
        assert_eq!(ranges, vec![
            BlockRange { from: 0, to: 49 },
            BlockRange { from: 50, to: 99 },
        ]);
    }

    #[test]
    fn partition_wide_span_yields_single_range() {
        let window = BlockRange { from: 10, to: 19 };
        assert_eq!(partition(window, 50), vec![window]);
    }

    #[tokio::test]
    async fn returns_all_matches_when_under_limit() {
        // 30 bets spread across blocks 0..=1000, well under the limit of 50
        let logs: Vec<Log> = (0..30)
            .map(|i| bet_log(1, 7, "yes", 100 + i, i * 33, 0))
            .collect();
        let ledger = StubLedger::new(1000, logs);
        let scan = fetcher(&ledger, 50, 1000).recent_bets(50).await.unwrap();

        assert_eq!(scan.events.len(), 30);
        assert_eq!(scan.skipped, 0);
        let blocks: Vec<u64> = scan.events.iter().map(|e| e.block_number).collect();
        let expected: Vec<u64> = (0..30).map(|i| i * 33).collect();
        assert_eq!(blocks, expected);

        let first = &scan.events[0];
        assert_eq!(first.market_id, 7);
        assert_eq!(first.choice, Choice::Yes);
        assert_eq!(first.amount, U256::from(100u64));
        assert_eq!(ledger.recorded_calls().len(), 21);
    }

    #[tokio::test]
    async fn clamps_scan_start_to_genesis() {
        let ledger = StubLedger::new(500, vec![bet_log(1, 1, "no", 5, 3, 0)]);
        let scan = fetcher(&ledger, 100, 1000).recent_bets(10).await.unwrap();

        assert_eq!(scan.events.len(), 1);
        let calls = ledger.recorded_calls();
        assert_eq!(calls.first().unwrap().from, 0);
        assert_eq!(calls.last().unwrap().to, 500);
    }

    #[tokio::test]
    async fn keeps_only_the_most_recent_limit() {
        let logs: Vec<Log> = (0..60).map(|i| bet_log(1, 2, "yes", i, 100 + i, 0)).collect();
        let ledger = StubLedger::new(200, logs);
        let scan = fetcher(&ledger, 50, 200).recent_bets(50).await.unwrap();

        assert_eq!(scan.events.len(), 50);
        // the ten oldest fall off the front
        assert_eq!(scan.events.first().unwrap().block_number, 110);
        assert_eq!(scan.events.last().unwrap().block_number, 159);
    }

    #[tokio::test]
    async fn sub_range_failure_fails_the_whole_scan() {
        let logs: Vec<Log> = (0..20).map(|i| bet_log(1, 3, "no", 1, i * 50, 0)).collect();
        // tip 999, lookback 999 -> 1000 blocks -> 20 sub-ranges of 50
        let ledger = StubLedger::new(999, logs).failing_at(3);
        let result = fetcher(&ledger, 50, 999).recent_bets(50).await;

        assert!(result.is_err());
        // scan stopped at the failing range, nothing partial escaped
        assert_eq!(ledger.recorded_calls().len(), 3);
    }

    #[tokio::test]
    async fn returns_fewer_when_matches_are_scarce() {
        let logs: Vec<Log> = (0..10).map(|i| bet_log(2, 4, "yes", 9, i * 10, 0)).collect();
        let ledger = StubLedger::new(1000, logs);
        let scan = fetcher(&ledger, 50, 1000).recent_bets(50).await.unwrap();
        assert_eq!(scan.events.len(), 10);
    }

    #[tokio::test]
    async fn empty_ledger_yields_empty_scan() {
        let ledger = StubLedger::new(1000, Vec::new());
        let scan = fetcher(&ledger, 50, 1000).recent_bets(50).await.unwrap();
        assert!(scan.events.is_empty());
        assert_eq!(scan.skipped, 0);
    }

    #[tokio::test]
    async fn zero_limit_yields_empty_scan() {
        let ledger = StubLedger::new(100, vec![bet_log(1, 1, "yes", 1, 50, 0)]);
        let scan = fetcher(&ledger, 50, 100).recent_bets(0).await.unwrap();
        assert!(scan.events.is_empty());
    }

    #[tokio::test]
    async fn malformed_entries_are_counted_not_fatal() {
        let truncated = raw_log(1, abi::word_u64(5).to_vec(), 40, 0);
        let mut bad_vote_data = Vec::new();
        bad_vote_data.extend_from_slice(&abi::word_u64(5));
        bad_vote_data.extend_from_slice(&abi::word_u64(0x60));
        bad_vote_data.extend_from_slice(&abi::word_u256(U256::from(1u64)));
        abi::append_string_tail(&mut bad_vote_data, "maybe");
        let bad_vote = raw_log(1, bad_vote_data, 41, 0);

        let logs = vec![bet_log(1, 5, "yes", 10, 30, 0), truncated, bad_vote];
        let ledger = StubLedger::new(100, logs);
        let scan = fetcher(&ledger, 50, 100).recent_bets(50).await.unwrap();

        assert_eq!(scan.events.len(), 1);
        assert_eq!(scan.skipped, 2);
    }

    #[tokio::test]
    async fn same_block_events_order_by_log_index() {
        // scripted out of order within block 80
        let logs = vec![
            bet_log(3, 6, "no", 3, 80, 2),
            bet_log(2, 6, "yes", 2, 80, 1),
            bet_log(1, 6, "yes", 1, 79, 9),
        ];
        let ledger = StubLedger::new(100, logs);
        let scan = fetcher(&ledger, 50, 100).recent_bets(10).await.unwrap();

        let positions: Vec<(u64, u64)> = scan.events.iter().map(BetEvent::position).collect();
        assert_eq!(positions, vec![(79, 9), (80, 1), (80, 2)]);
    }
}
