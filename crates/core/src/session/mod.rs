//! Session state: connected account, last outcome, offer state, and the local
//! ticket projection.
//!
//! Only the orchestrator writes a [`Session`]; everything else reads
//! [`SessionSnapshot`]s.

mod status;

pub use status::{RenderedStatus, Status, StatusKind};

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::Ticket;

/// Lifecycle of the swap offer created from this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferState {
    /// No offer submitted, or the last submission failed.
    #[default]
    None,
    /// Offer confirmed on the ledger, waiting for an accept attempt.
    Pending,
    /// An accept attempt has been made since the offer.
    Resolved,
}

impl OfferState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferState::None => "none",
            OfferState::Pending => "pending",
            OfferState::Resolved => "resolved",
        }
    }
}

/// Mutable session owned by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct Session {
    account: Option<Address>,
    status: Status,
    status_updated_at: Option<DateTime<Utc>>,
    offer: OfferState,
    tickets: Vec<Ticket>,
    tickets_refreshed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn offer(&self) -> OfferState {
        self.offer
    }

    pub fn offer_pending(&self) -> bool {
        self.offer == OfferState::Pending
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    /// Adopt `account`. Switching to a different account drops the previous
    /// account's projection.
    pub fn set_account(&mut self, account: Address) {
        if self.account != Some(account) {
            self.tickets.clear();
            self.tickets_refreshed_at = None;
        }
        self.account = Some(account);
    }

    /// Replace the status; the newest outcome always wins.
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.status_updated_at = Some(Utc::now());
    }

    pub fn set_offer(&mut self, offer: OfferState) {
        self.offer = offer;
    }

    /// Replace the whole projection with what the ledger reported.
    pub fn replace_tickets(&mut self, tickets: Vec<Ticket>) {
        self.tickets = tickets;
        self.tickets_refreshed_at = Some(Utc::now());
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            account: self.account,
            status: self.status.clone(),
            status_updated_at: self.status_updated_at,
            offer: self.offer,
            offer_pending: self.offer_pending(),
            tickets: self.tickets.clone(),
            tickets_refreshed_at: self.tickets_refreshed_at,
        }
    }
}

/// Read-only copy of the session for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub account: Option<Address>,
    pub status: Status,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub offer: OfferState,
    pub offer_pending: bool,
    pub tickets: Vec<Ticket>,
    pub tickets_refreshed_at: Option<DateTime<Utc>>,
}
