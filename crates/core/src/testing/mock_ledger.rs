//! Mock ledger for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ledger::{
    LedgerError, LedgerEvent, SwapOffer, Ticket, TicketId, TicketLedger, TransactionOutcome,
};

use super::fixtures;

/// A ledger call recorded for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    RequestAccounts,
    TicketPrice,
    ReturnFeePercentage,
    TicketCounter,
    Ticket(TicketId),
    IsTicketAvailable(TicketId),
    TicketNumberByAddress(Address),
    SwapOffer(u64),
    TicketsOwnedBy(Address),
    PurchaseTicket {
        from: Address,
        value: U256,
    },
    ReturnTicket {
        from: Address,
        id: TicketId,
    },
    CreateSwapOffer {
        from: Address,
        from_ticket: TicketId,
        to_ticket: TicketId,
    },
    AcceptSwapOffer {
        from: Address,
        ticket: TicketId,
    },
    LatestBlock,
    Events {
        from_block: u64,
        to_block: u64,
    },
}

impl LedgerCall {
    /// Whether this call submits a transaction.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            LedgerCall::PurchaseTicket { .. }
                | LedgerCall::ReturnTicket { .. }
                | LedgerCall::CreateSwapOffer { .. }
                | LedgerCall::AcceptSwapOffer { .. }
        )
    }
}

#[derive(Debug)]
struct MockState {
    accounts: Vec<Address>,
    ticket_price: U256,
    return_fee_percentage: U256,
    tickets: BTreeMap<u64, Ticket>,
    ticket_numbers: HashMap<Address, u64>,
    swap_offers: Vec<SwapOffer>,
    events: Vec<LedgerEvent>,
    block: u64,
}

/// Mock implementation of the TicketLedger trait.
///
/// Provides controllable behavior for testing:
/// - Records every call for assertions
/// - Holds tickets, swap offers, and address-to-ticket numbers in memory
/// - Writes mutate that state loosely and emit events in a new block
/// - Simulate write failures, slow confirmations, and an unreachable node
///
/// # Example
///
/// ```rust,ignore
/// use ticketswap_core::testing::{fixtures, MockLedger};
///
/// let ledger = MockLedger::new();
/// ledger.add_ticket(fixtures::ticket(7, fixtures::BOB)).await;
///
/// // ... run an orchestrator operation ...
///
/// assert!(ledger.write_calls().await.is_empty());
/// ```
#[derive(Debug)]
pub struct MockLedger {
    state: Arc<RwLock<MockState>>,
    calls: Arc<RwLock<Vec<LedgerCall>>>,
    /// If set, the next write fails with this error.
    next_error: Arc<RwLock<Option<LedgerError>>>,
    /// If set, every read fails as if the node were unreachable.
    read_failure: Arc<RwLock<Option<String>>>,
    /// If set, only ticket listings fail.
    listing_failure: Arc<RwLock<Option<String>>>,
    /// Simulated time between submission and confirmation.
    write_delay: Arc<RwLock<Duration>>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    /// Create a mock with one account (`fixtures::ALICE`), the default ticket
    /// price, and no tickets.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState {
                accounts: vec![fixtures::ALICE],
                ticket_price: fixtures::ticket_price(),
                return_fee_percentage: U256::from(10),
                tickets: BTreeMap::new(),
                ticket_numbers: HashMap::new(),
                swap_offers: Vec::new(),
                events: Vec::new(),
                block: 1,
            })),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            read_failure: Arc::new(RwLock::new(None)),
            listing_failure: Arc::new(RwLock::new(None)),
            write_delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub async fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.write().await.accounts = accounts;
    }

    pub async fn set_ticket_price(&self, price: U256) {
        self.state.write().await.ticket_price = price;
    }

    /// Insert a ticket and record it as its owner's ticket number.
    pub async fn add_ticket(&self, ticket: Ticket) {
        let mut state = self.state.write().await;
        state.ticket_numbers.insert(ticket.owner, ticket.id.0);
        state.tickets.insert(ticket.id.0, ticket);
    }

    /// Override what `getTicketNumberByAddress` returns for `address`.
    pub async fn set_ticket_number(&self, address: Address, number: u64) {
        self.state
            .write()
            .await
            .ticket_numbers
            .insert(address, number);
    }

    pub async fn add_swap_offer(&self, offer: SwapOffer) {
        self.state.write().await.swap_offers.push(offer);
    }

    /// Configure the next write to fail with the given error.
    pub async fn set_next_error(&self, error: LedgerError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every read fail with `ConnectionFailed`, or clear with `None`.
    pub async fn set_read_failure(&self, message: Option<&str>) {
        *self.read_failure.write().await = message.map(str::to_string);
    }

    /// Make `tickets_owned_by` fail while every other call still succeeds.
    pub async fn set_listing_failure(&self, message: Option<&str>) {
        *self.listing_failure.write().await = message.map(str::to_string);
    }

    /// Delay every write by `delay` before it confirms.
    pub async fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.write().await = delay;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<LedgerCall> {
        self.calls.read().await.clone()
    }

    /// Get only the recorded writes.
    pub async fn write_calls(&self) -> Vec<LedgerCall> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.is_write())
            .cloned()
            .collect()
    }

    /// Clear recorded calls.
    pub async fn clear_recorded_calls(&self) {
        self.calls.write().await.clear();
    }

    pub async fn tickets(&self) -> Vec<Ticket> {
        self.state.read().await.tickets.values().cloned().collect()
    }

    pub async fn swap_offers(&self) -> Vec<SwapOffer> {
        self.state.read().await.swap_offers.clone()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn record(&self, call: LedgerCall) {
        self.calls.write().await.push(call);
    }

    async fn read(&self, call: LedgerCall) -> Result<(), LedgerError> {
        self.record(call).await;
        match self.read_failure.read().await.as_ref() {
            Some(message) => Err(LedgerError::ConnectionFailed(message.clone())),
            None => Ok(()),
        }
    }

    /// Record a write, apply the configured delay and error, then mine a block.
    async fn write<F>(&self, call: LedgerCall, apply: F) -> Result<TransactionOutcome, LedgerError>
    where
        F: FnOnce(&mut MockState, u64),
    {
        self.record(call).await;

        let delay = *self.write_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let mut state = self.state.write().await;
        state.block += 1;
        let block = state.block;
        apply(&mut *state, block);

        Ok(TransactionOutcome {
            tx_hash: B256::left_padding_from(&block.to_be_bytes()),
            block_number: Some(block),
        })
    }
}

#[async_trait]
impl TicketLedger for MockLedger {
    fn name(&self) -> &str {
        "mock"
    }

    fn contract_address(&self) -> Address {
        fixtures::CONTRACT
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, LedgerError> {
        self.read(LedgerCall::RequestAccounts).await?;
        Ok(self.state.read().await.accounts.clone())
    }

    async fn ticket_price(&self) -> Result<U256, LedgerError> {
        self.read(LedgerCall::TicketPrice).await?;
        Ok(self.state.read().await.ticket_price)
    }

    async fn return_fee_percentage(&self) -> Result<U256, LedgerError> {
        self.read(LedgerCall::ReturnFeePercentage).await?;
        Ok(self.state.read().await.return_fee_percentage)
    }

    async fn ticket_counter(&self) -> Result<u64, LedgerError> {
        self.read(LedgerCall::TicketCounter).await?;
        Ok(self
            .state
            .read()
            .await
            .tickets
            .keys()
            .next_back()
            .copied()
            .unwrap_or(0))
    }

    async fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, LedgerError> {
        self.read(LedgerCall::Ticket(id)).await?;
        Ok(self.state.read().await.tickets.get(&id.0).cloned())
    }

    async fn is_ticket_available(&self, id: TicketId) -> Result<bool, LedgerError> {
        self.read(LedgerCall::IsTicketAvailable(id)).await?;
        Ok(self
            .state
            .read()
            .await
            .tickets
            .get(&id.0)
            .is_some_and(|t| t.is_available))
    }

    async fn ticket_number_by_address(&self, address: Address) -> Result<u64, LedgerError> {
        self.read(LedgerCall::TicketNumberByAddress(address)).await?;
        Ok(self
            .state
            .read()
            .await
            .ticket_numbers
            .get(&address)
            .copied()
            .unwrap_or(0))
    }

    async fn swap_offer(&self, index: u64) -> Result<SwapOffer, LedgerError> {
        self.read(LedgerCall::SwapOffer(index)).await?;
        let state = self.state.read().await;
        usize::try_from(index)
            .ok()
            .and_then(|i| state.swap_offers.get(i))
            .cloned()
            .ok_or_else(|| LedgerError::call("swapOffers", "execution reverted"))
    }

    async fn tickets_owned_by(&self, owner: Address) -> Result<Vec<Ticket>, LedgerError> {
        self.read(LedgerCall::TicketsOwnedBy(owner)).await?;
        if let Some(message) = self.listing_failure.read().await.as_ref() {
            return Err(LedgerError::ConnectionFailed(message.clone()));
        }
        Ok(self
            .state
            .read()
            .await
            .tickets
            .values()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect())
    }

    async fn purchase_ticket(
        &self,
        from: Address,
        value: U256,
    ) -> Result<TransactionOutcome, LedgerError> {
        self.write(LedgerCall::PurchaseTicket { from, value }, |state, block| {
            let count = if state.ticket_price.is_zero() {
                1
            } else {
                u64::try_from(value / state.ticket_price).unwrap_or(1).max(1)
            };
            let price = state.ticket_price;
            for _ in 0..count {
                let id = state.tickets.keys().next_back().copied().unwrap_or(0) + 1;
                state.tickets.insert(
                    id,
                    Ticket {
                        id: TicketId(id),
                        owner: from,
                        is_available: false,
                        price,
                    },
                );
                state.ticket_numbers.insert(from, id);
                state.events.push(LedgerEvent::TicketPurchased {
                    buyer: from,
                    ticket_id: TicketId(id),
                    block_number: Some(block),
                });
            }
        })
        .await
    }

    async fn return_ticket(
        &self,
        from: Address,
        id: TicketId,
    ) -> Result<TransactionOutcome, LedgerError> {
        self.write(LedgerCall::ReturnTicket { from, id }, |state, block| {
            let price = state.ticket_price;
            if let Some(ticket) = state.tickets.get_mut(&id.0) {
                ticket.owner = Address::ZERO;
                ticket.is_available = true;
            }
            state.ticket_numbers.remove(&from);
            let fee = price * state.return_fee_percentage / U256::from(100);
            state.events.push(LedgerEvent::TicketReturned {
                seller: from,
                ticket_id: id,
                refund_amount: price - fee,
                block_number: Some(block),
            });
        })
        .await
    }

    async fn create_swap_offer(
        &self,
        from: Address,
        from_ticket: TicketId,
        to_ticket: TicketId,
    ) -> Result<TransactionOutcome, LedgerError> {
        let call = LedgerCall::CreateSwapOffer {
            from,
            from_ticket,
            to_ticket,
        };
        self.write(call, |state, block| {
            let to = state
                .tickets
                .get(&to_ticket.0)
                .map(|t| t.owner)
                .unwrap_or(Address::ZERO);
            state.swap_offers.push(SwapOffer {
                from,
                to,
                from_ticket_id: from_ticket,
                to_ticket_id: to_ticket,
                is_active: true,
            });
            state.events.push(LedgerEvent::SwapOfferCreated {
                from,
                to,
                from_ticket_id: from_ticket,
                to_ticket_id: to_ticket,
                block_number: Some(block),
            });
        })
        .await
    }

    async fn accept_swap_offer(
        &self,
        from: Address,
        ticket: TicketId,
    ) -> Result<TransactionOutcome, LedgerError> {
        self.write(LedgerCall::AcceptSwapOffer { from, ticket }, |state, block| {
            let Some(offer) = state
                .swap_offers
                .iter_mut()
                .find(|o| o.is_active && o.to_ticket_id == ticket)
            else {
                return;
            };
            offer.is_active = false;
            let offer = offer.clone();

            if let Some(t) = state.tickets.get_mut(&offer.from_ticket_id.0) {
                t.owner = offer.to;
            }
            if let Some(t) = state.tickets.get_mut(&offer.to_ticket_id.0) {
                t.owner = offer.from;
            }
            state.events.push(LedgerEvent::SwapOfferAccepted {
                from: offer.from,
                to: offer.to,
                from_ticket_id: offer.from_ticket_id,
                to_ticket_id: offer.to_ticket_id,
                block_number: Some(block),
            });
        })
        .await
    }

    async fn latest_block(&self) -> Result<u64, LedgerError> {
        self.read(LedgerCall::LatestBlock).await?;
        Ok(self.state.read().await.block)
    }

    async fn events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.read(LedgerCall::Events {
            from_block,
            to_block,
        })
        .await?;
        Ok(self
            .state
            .read()
            .await
            .events
            .iter()
            .filter(|e| {
                let block = match e {
                    LedgerEvent::TicketPurchased { block_number, .. }
                    | LedgerEvent::TicketReturned { block_number, .. }
                    | LedgerEvent::SwapOfferCreated { block_number, .. }
                    | LedgerEvent::SwapOfferAccepted { block_number, .. } => *block_number,
                };
                block.is_some_and(|b| (from_block..=to_block).contains(&b))
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_purchase_creates_tickets_from_value() {
        let ledger = MockLedger::new();
        let price = fixtures::ticket_price();

        ledger
            .purchase_ticket(fixtures::ALICE, price * U256::from(2))
            .await
            .unwrap();

        let owned = ledger.tickets_owned_by(fixtures::ALICE).await.unwrap();
        assert_eq!(owned.len(), 2);
        assert_eq!(ledger.ticket_counter().await.unwrap(), 2);
        assert_eq!(
            ledger.ticket_number_by_address(fixtures::ALICE).await.unwrap(),
            2
        );
        assert_eq!(ledger.events(0, 100).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_next_error_applies_once() {
        let ledger = MockLedger::new();
        ledger
            .set_next_error(LedgerError::Reverted("0xdead".to_string()))
            .await;

        assert!(ledger
            .return_ticket(fixtures::ALICE, TicketId(1))
            .await
            .is_err());
        assert!(ledger
            .return_ticket(fixtures::ALICE, TicketId(1))
            .await
            .is_ok());
        assert_eq!(ledger.write_calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_read_failure() {
        let ledger = MockLedger::new();
        ledger.set_read_failure(Some("network down")).await;

        let err = ledger.ticket_price().await.unwrap_err();
        assert!(matches!(err, LedgerError::ConnectionFailed(_)));

        ledger.set_read_failure(None).await;
        assert!(ledger.ticket_price().await.is_ok());
    }

    #[tokio::test]
    async fn test_listing_failure_only_affects_listings() {
        let ledger = MockLedger::new();
        ledger.set_listing_failure(Some("indexer down")).await;

        assert!(ledger.tickets_owned_by(fixtures::ALICE).await.is_err());
        assert!(ledger.request_accounts().await.is_ok());
    }

    #[tokio::test]
    async fn test_accept_swaps_owners() {
        let ledger = MockLedger::new();
        ledger.add_ticket(fixtures::ticket(1, fixtures::ALICE)).await;
        ledger.add_ticket(fixtures::ticket(2, fixtures::BOB)).await;

        ledger
            .create_swap_offer(fixtures::ALICE, TicketId(1), TicketId(2))
            .await
            .unwrap();
        ledger
            .accept_swap_offer(fixtures::BOB, TicketId(2))
            .await
            .unwrap();

        let tickets = ledger.tickets().await;
        assert_eq!(tickets[0].owner, fixtures::BOB);
        assert_eq!(tickets[1].owner, fixtures::ALICE);
        assert!(!ledger.swap_offers().await[0].is_active);
    }
}
