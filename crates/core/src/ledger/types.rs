//! Types for the ledger boundary.

use std::fmt;

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("{method} failed: {message}")]
    CallFailed {
        method: &'static str,
        message: String,
    },

    #[error("Transaction {0} reverted")]
    Reverted(String),

    #[error("Confirmation timed out after {0}s")]
    ConfirmationTimeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LedgerError {
    pub fn call(method: &'static str, message: impl fmt::Display) -> Self {
        LedgerError::CallFailed {
            method,
            message: message.to_string(),
        }
    }
}

/// On-ledger ticket identifier. Issued tickets start at 1; 0 means "none".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub u64);

impl TicketId {
    pub fn as_u256(self) -> U256 {
        U256::from(self.0)
    }
}

impl TryFrom<U256> for TicketId {
    type Error = LedgerError;

    fn try_from(value: U256) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(TicketId)
            .map_err(|_| LedgerError::InvalidResponse(format!("ticket id {value} overflows u64")))
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Projection of a ticket as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub owner: Address,
    pub is_available: bool,
    /// Price in wei.
    #[serde(with = "wei")]
    pub price: U256,
}

/// A swap offer record read from `swapOffers(index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOffer {
    pub from: Address,
    pub to: Address,
    pub from_ticket_id: TicketId,
    pub to_ticket_id: TicketId,
    pub is_active: bool,
}

/// Contract-level constants and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub address: Address,
    #[serde(with = "wei")]
    pub ticket_price: U256,
    pub return_fee_percentage: u64,
    pub ticket_counter: u64,
}

/// Result of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub tx_hash: B256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

/// Events emitted by the TicketSale contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    TicketPurchased {
        buyer: Address,
        ticket_id: TicketId,
        block_number: Option<u64>,
    },
    TicketReturned {
        seller: Address,
        ticket_id: TicketId,
        #[serde(with = "wei")]
        refund_amount: U256,
        block_number: Option<u64>,
    },
    SwapOfferCreated {
        from: Address,
        to: Address,
        from_ticket_id: TicketId,
        to_ticket_id: TicketId,
        block_number: Option<u64>,
    },
    SwapOfferAccepted {
        from: Address,
        to: Address,
        from_ticket_id: TicketId,
        to_ticket_id: TicketId,
        block_number: Option<u64>,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::TicketPurchased { .. } => "ticket_purchased",
            LedgerEvent::TicketReturned { .. } => "ticket_returned",
            LedgerEvent::SwapOfferCreated { .. } => "swap_offer_created",
            LedgerEvent::SwapOfferAccepted { .. } => "swap_offer_accepted",
        }
    }

    /// Whether the event changes what `account` owns.
    pub fn involves(&self, account: Address) -> bool {
        match self {
            LedgerEvent::TicketPurchased { buyer, .. } => *buyer == account,
            LedgerEvent::TicketReturned { seller, .. } => *seller == account,
            LedgerEvent::SwapOfferCreated { from, to, .. }
            | LedgerEvent::SwapOfferAccepted { from, to, .. } => {
                *from == account || *to == account
            }
        }
    }
}

/// The external ledger as seen through the wallet provider.
///
/// Reads go straight to the node. Writes are signed for `from`, submitted, and
/// resolve once the transaction is mined; a reverted receipt is an error.
#[async_trait]
pub trait TicketLedger: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Address of the bound contract.
    fn contract_address(&self) -> Address;

    /// Accounts the wallet provider can sign for.
    async fn request_accounts(&self) -> Result<Vec<Address>, LedgerError>;

    /// `TICKET_PRICE()`
    async fn ticket_price(&self) -> Result<U256, LedgerError>;

    /// `RETURN_FEE_PERCENTAGE()`
    async fn return_fee_percentage(&self) -> Result<U256, LedgerError>;

    /// `ticketCounter()`
    async fn ticket_counter(&self) -> Result<u64, LedgerError>;

    /// `tickets(id)`; `None` when the record's `exists` flag is false.
    async fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, LedgerError>;

    /// `isTicketAvailable(id)`
    async fn is_ticket_available(&self, id: TicketId) -> Result<bool, LedgerError>;

    /// `getTicketNumberByAddress(address)`; 0 when the address holds no ticket.
    async fn ticket_number_by_address(&self, address: Address) -> Result<u64, LedgerError>;

    /// `swapOffers(index)`
    async fn swap_offer(&self, index: u64) -> Result<SwapOffer, LedgerError>;

    /// Every existing ticket currently owned by `owner`.
    async fn tickets_owned_by(&self, owner: Address) -> Result<Vec<Ticket>, LedgerError>;

    /// `purchaseTicket()` with `value` wei attached.
    async fn purchase_ticket(
        &self,
        from: Address,
        value: U256,
    ) -> Result<TransactionOutcome, LedgerError>;

    /// `returnTicket(id)`
    async fn return_ticket(
        &self,
        from: Address,
        id: TicketId,
    ) -> Result<TransactionOutcome, LedgerError>;

    /// `createSwapOffer(fromTicketId, toTicketId)`
    async fn create_swap_offer(
        &self,
        from: Address,
        from_ticket: TicketId,
        to_ticket: TicketId,
    ) -> Result<TransactionOutcome, LedgerError>;

    /// `acceptSwapOffer(ticketId)`
    async fn accept_swap_offer(
        &self,
        from: Address,
        ticket: TicketId,
    ) -> Result<TransactionOutcome, LedgerError>;

    /// Latest mined block number.
    async fn latest_block(&self) -> Result<u64, LedgerError>;

    /// Contract events mined in `from_block..=to_block`.
    async fn events(&self, from_block: u64, to_block: u64)
        -> Result<Vec<LedgerEvent>, LedgerError>;
}

/// Scan `tickets(1..=ticketCounter)` and keep the ones owned by `owner`.
///
/// The contract exposes no per-owner listing, so the projection is rebuilt from
/// the public `tickets` mapping. At most `max_scan` ids are read, `concurrency`
/// at a time.
pub async fn scan_tickets_owned_by<L: TicketLedger + ?Sized>(
    ledger: &L,
    owner: Address,
    max_scan: u64,
    concurrency: usize,
) -> Result<Vec<Ticket>, LedgerError> {
    let counter = ledger.ticket_counter().await?;
    let last = counter.min(max_scan);
    if counter > max_scan {
        tracing::warn!(
            "ticketCounter is {} but only the first {} tickets are scanned",
            counter,
            max_scan
        );
    }

    let tickets: Vec<Option<Ticket>> = stream::iter(1..=last)
        .map(|id| ledger.ticket(TicketId(id)))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    Ok(tickets
        .into_iter()
        .flatten()
        .filter(|ticket| ticket.owner == owner)
        .collect())
}

/// Serialize wei amounts as decimal strings.
pub(crate) mod wei {
    use std::str::FromStr;

    use alloy::primitives::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_str(&raw).map_err(de::Error::custom)
    }
}
