//! Transaction orchestrator implementation.
//!
//! Every operation validates its input before touching the ledger, submits at
//! most one transaction, and folds the outcome into the session status. Writes
//! are serialized and bounded by the confirmation timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::{Address, U256};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::ledger::{
    ContractInfo, LedgerError, SwapOffer, Ticket, TicketId, TicketLedger, TransactionOutcome,
};
use crate::metrics;
use crate::session::{OfferState, Session, SessionSnapshot, Status};

use super::config::OrchestratorConfig;
use super::input::{parse_address, parse_ticket_count, parse_ticket_id, SwapTarget};
use super::types::{Operation, OrchestratorError, OrchestratorStatus};

pub const OWNERSHIP_ERROR: &str = "Error: You can only refund tickets you own.";
pub const COUNT_ERROR: &str = "Ticket count must be a positive integer";

/// The transaction orchestrator: the only writer of the session.
pub struct TransactionOrchestrator {
    config: OrchestratorConfig,
    ledger: Option<Arc<dyn TicketLedger>>,
    session: Arc<RwLock<Session>>,
    // Held from submission until the write is mined or times out.
    submit_lock: Mutex<()>,
}

impl TransactionOrchestrator {
    /// Create a new orchestrator. `ledger` is `None` when no wallet provider
    /// is configured.
    pub fn new(config: OrchestratorConfig, ledger: Option<Arc<dyn TicketLedger>>) -> Self {
        Self {
            config,
            ledger,
            session: Arc::new(RwLock::new(Session::new())),
            submit_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn has_wallet_provider(&self) -> bool {
        self.ledger.is_some()
    }

    /// Copy of the current session.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.read().await.snapshot()
    }

    pub async fn connected_account(&self) -> Option<Address> {
        self.session.read().await.account()
    }

    pub async fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            wallet_provider: self.ledger.is_some(),
            ledger: self.ledger.as_ref().map(|l| l.name().to_string()),
            write_in_flight: self.submit_lock.try_lock().is_err(),
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Request accounts from the wallet provider and adopt the first one.
    pub async fn connect(&self) -> Status {
        let started = Instant::now();
        let result = self.try_connect().await;
        self.finish(Operation::Connect, started, result, |_, _| {})
            .await
    }

    /// Buy `count` tickets at the ledger's current unit price.
    pub async fn purchase(&self, count: u64) -> Status {
        let started = Instant::now();
        let result = self.try_purchase(count).await;
        self.finish(Operation::Purchase, started, result, |_, _| {})
            .await
    }

    /// Buy tickets given the count as entered by the user.
    ///
    /// Anything that is not a positive whole number is rejected before the
    /// ledger is touched.
    pub async fn purchase_input(&self, count: &str) -> Status {
        let started = Instant::now();
        let result = match parse_ticket_count(count) {
            Some(count) => self.try_purchase(count).await,
            None => Err(OrchestratorError::validation(COUNT_ERROR)),
        };
        self.finish(Operation::Purchase, started, result, |_, _| {})
            .await
    }

    /// Return a ticket owned by the connected account.
    pub async fn refund(&self, ticket: &str) -> Status {
        let started = Instant::now();
        let result = self.try_refund(ticket).await;
        self.finish(Operation::Refund, started, result, |_, _| {})
            .await
    }

    /// Report the ticket number held by `address`.
    pub async fn lookup_by_address(&self, address: &str) -> Status {
        let started = Instant::now();
        let result = self.try_lookup(address).await;
        self.finish(Operation::Lookup, started, result, |_, _| {})
            .await
    }

    /// Offer to swap `from_ticket` for `to_ticket`.
    ///
    /// Success leaves the offer pending; any failure resets it.
    pub async fn create_swap_offer(&self, from_ticket: &str, to_ticket: &str) -> Status {
        let started = Instant::now();
        let result = self.try_create_swap_offer(from_ticket, to_ticket).await;
        self.finish(
            Operation::CreateSwapOffer,
            started,
            result,
            |session, ok| {
                session.set_offer(if ok {
                    OfferState::Pending
                } else {
                    OfferState::None
                });
            },
        )
        .await
    }

    /// Accept the swap offer for a ticket, given its number or its holder's
    /// address.
    ///
    /// Any attempt resolves a pending offer.
    pub async fn accept_swap_offer(&self, input: &str) -> Status {
        let started = Instant::now();
        let result = self.try_accept_swap_offer(input).await;
        self.finish(
            Operation::AcceptSwapOffer,
            started,
            result,
            |session, ok| {
                if ok || session.offer_pending() {
                    session.set_offer(OfferState::Resolved);
                }
            },
        )
        .await
    }

    /// Replace the ticket projection with the ledger's tickets for `owner`.
    ///
    /// Only the connected account's tickets are ever projected; a refresh for
    /// any other address, or one overtaken by an account switch, is dropped.
    /// Failures are logged only; the projection and status are left as they
    /// were. Returns whether the projection was replaced.
    pub async fn refresh_tickets(&self, owner: Address) -> bool {
        let Some(ledger) = &self.ledger else {
            debug!("No wallet provider, skipping ticket refresh");
            return false;
        };
        if self.connected_account().await != Some(owner) {
            debug!("Skipping ticket refresh for {}: not the connected account", owner);
            return false;
        }

        match ledger.tickets_owned_by(owner).await {
            Ok(tickets) => {
                let mut session = self.session.write().await;
                if session.account() != Some(owner) {
                    debug!("Discarding tickets for {}: account changed during refresh", owner);
                    return false;
                }
                debug!("Refreshed {} tickets for {}", tickets.len(), owner);
                session.replace_tickets(tickets);
                metrics::TICKET_REFRESHES
                    .with_label_values(&["success"])
                    .inc();
                true
            }
            Err(e) => {
                warn!("Failed to refresh tickets for {}: {}", owner, e);
                metrics::TICKET_REFRESHES
                    .with_label_values(&["failed"])
                    .inc();
                false
            }
        }
    }

    /// Refresh the projection for the connected account, if any.
    pub async fn refresh_connected(&self) -> bool {
        match self.connected_account().await {
            Some(account) => self.refresh_tickets(account).await,
            None => false,
        }
    }

    // =========================================================================
    // Read-only views
    // =========================================================================

    pub async fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, OrchestratorError> {
        Ok(self.ledger()?.ticket(id).await?)
    }

    pub async fn is_ticket_available(&self, id: TicketId) -> Result<bool, OrchestratorError> {
        Ok(self.ledger()?.is_ticket_available(id).await?)
    }

    pub async fn swap_offer(&self, index: u64) -> Result<SwapOffer, OrchestratorError> {
        Ok(self.ledger()?.swap_offer(index).await?)
    }

    pub async fn contract_info(&self) -> Result<ContractInfo, OrchestratorError> {
        let ledger = self.ledger()?;
        let (ticket_price, fee, ticket_counter) = tokio::try_join!(
            ledger.ticket_price(),
            ledger.return_fee_percentage(),
            ledger.ticket_counter(),
        )?;

        let return_fee_percentage = u64::try_from(fee).map_err(|_| {
            LedgerError::InvalidResponse(format!("RETURN_FEE_PERCENTAGE out of range: {}", fee))
        })?;

        Ok(ContractInfo {
            address: ledger.contract_address(),
            ticket_price,
            return_fee_percentage,
            ticket_counter,
        })
    }

    // =========================================================================
    // Operation bodies
    // =========================================================================

    async fn try_connect(&self) -> Result<Status, OrchestratorError> {
        let ledger = self.ledger()?;
        let accounts = ledger.request_accounts().await?;
        let account = accounts.first().copied().ok_or_else(|| {
            LedgerError::InvalidResponse("wallet provider returned no accounts".to_string())
        })?;

        self.session.write().await.set_account(account);
        info!("Connected account {}", account);

        self.refresh_tickets(account).await;
        Ok(Status::success(format!("Connected to wallet {}", account)))
    }

    async fn try_purchase(&self, count: u64) -> Result<Status, OrchestratorError> {
        if count == 0 {
            return Err(OrchestratorError::validation(COUNT_ERROR));
        }
        let (ledger, account) = self.writer().await?;

        let price = ledger.ticket_price().await?;
        let total = price.checked_mul(U256::from(count)).ok_or_else(|| {
            OrchestratorError::validation(format!(
                "Total cost of {} tickets at {} wei overflows",
                count, price
            ))
        })?;

        debug!(
            "Purchasing {} ticket(s) for {} at {} wei each, {} wei total",
            count, account, price, total
        );
        self.submit(ledger.purchase_ticket(account, total)).await?;
        metrics::PURCHASED_TICKETS.inc_by(count);

        self.refresh_tickets(account).await;
        Ok(Status::success(format!(
            "Successfully purchased {} ticket(s)!",
            count
        )))
    }

    async fn try_refund(&self, ticket: &str) -> Result<Status, OrchestratorError> {
        let id = parse_ticket_id(ticket)
            .ok_or_else(|| OrchestratorError::validation("Please enter a valid ticket number"))?;
        let (ledger, account) = self.writer().await?;

        // A ticket that does not exist has no owner to match.
        let owner = ledger.ticket(id).await?.map(|t| t.owner);
        if owner != Some(account) {
            debug!(
                "Refusing refund of ticket {}: owner {:?}, connected {}",
                id, owner, account
            );
            return Err(OrchestratorError::validation(OWNERSHIP_ERROR));
        }

        self.submit(ledger.return_ticket(account, id)).await?;

        self.refresh_tickets(account).await;
        Ok(Status::success("Ticket refunded successfully!"))
    }

    async fn try_lookup(&self, input: &str) -> Result<Status, OrchestratorError> {
        let address = parse_address(input)
            .ok_or_else(|| OrchestratorError::validation("Invalid wallet address"))?;
        let ledger = self.ledger()?;

        let number = ledger.ticket_number_by_address(address).await?;
        let shown = input.trim();
        if number > 0 {
            Ok(Status::success(format!(
                "Ticket Number for {}: {}",
                shown, number
            )))
        } else {
            Ok(Status::success(format!("No tickets found for {}", shown)))
        }
    }

    async fn try_create_swap_offer(
        &self,
        from_ticket: &str,
        to_ticket: &str,
    ) -> Result<Status, OrchestratorError> {
        if from_ticket.trim().is_empty() || to_ticket.trim().is_empty() {
            return Err(OrchestratorError::validation(
                "Please enter both ticket numbers",
            ));
        }
        let (from_id, to_id) = parse_ticket_id(from_ticket)
            .zip(parse_ticket_id(to_ticket))
            .ok_or_else(|| {
                OrchestratorError::validation("Ticket numbers must be positive integers")
            })?;
        let (ledger, account) = self.writer().await?;

        self.submit(ledger.create_swap_offer(account, from_id, to_id))
            .await?;
        info!(
            "Swap offer created by {}: ticket {} for ticket {}",
            account, from_id, to_id
        );

        self.refresh_tickets(account).await;
        Ok(Status::pending("Swap Offer Created! Status: Pending"))
    }

    async fn try_accept_swap_offer(&self, input: &str) -> Result<Status, OrchestratorError> {
        let target = SwapTarget::parse(input)?;
        let (ledger, account) = self.writer().await?;

        let ticket = match target {
            SwapTarget::ByTicketId(id) => id,
            SwapTarget::ByAddress(holder) => {
                // An address holding nothing resolves to 0; the ledger decides.
                let number = ledger.ticket_number_by_address(holder).await?;
                debug!("Resolved {} to ticket {}", holder, number);
                TicketId(number)
            }
        };

        self.submit(ledger.accept_swap_offer(account, ticket))
            .await?;

        self.refresh_tickets(account).await;
        Ok(Status::success("Swap Offer Accepted Successfully!"))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn ledger(&self) -> Result<&Arc<dyn TicketLedger>, OrchestratorError> {
        self.ledger
            .as_ref()
            .ok_or(OrchestratorError::NoWalletProvider)
    }

    /// Ledger and connected account for a write.
    async fn writer(&self) -> Result<(&Arc<dyn TicketLedger>, Address), OrchestratorError> {
        let ledger = self.ledger()?;
        let account = self
            .session
            .read()
            .await
            .account()
            .ok_or(OrchestratorError::NotConnected)?;
        Ok((ledger, account))
    }

    /// Run one write under the submission lock and the confirmation timeout.
    async fn submit<F>(&self, write: F) -> Result<TransactionOutcome, OrchestratorError>
    where
        F: Future<Output = Result<TransactionOutcome, LedgerError>>,
    {
        let _guard = self.submit_lock.lock().await;
        let secs = self.config.confirmation_timeout_secs;

        match tokio::time::timeout(Duration::from_secs(secs), write).await {
            Ok(outcome) => Ok(outcome?),
            Err(_) => {
                metrics::CONFIRMATION_TIMEOUTS.inc();
                Err(LedgerError::ConfirmationTimeout(secs).into())
            }
        }
    }

    /// Record metrics and write the outcome into the session.
    async fn finish<F>(
        &self,
        operation: Operation,
        started: Instant,
        result: Result<Status, OrchestratorError>,
        update: F,
    ) -> Status
    where
        F: FnOnce(&mut Session, bool),
    {
        metrics::OPERATION_DURATION
            .with_label_values(&[operation.as_str()])
            .observe(started.elapsed().as_secs_f64());

        let ok = result.is_ok();
        // Writes rejected locally never reached the ledger.
        if operation.is_write() {
            let outcome = match &result {
                Ok(_) => Some("confirmed"),
                Err(e) if !e.is_local() => Some("failed"),
                Err(_) => None,
            };
            if let Some(outcome) = outcome {
                metrics::TRANSACTIONS_TOTAL
                    .with_label_values(&[operation.as_str(), outcome])
                    .inc();
            }
        }
        let status = match result {
            Ok(status) => {
                metrics::OPERATIONS_TOTAL
                    .with_label_values(&[operation.as_str(), "success"])
                    .inc();
                status
            }
            Err(e) => {
                metrics::OPERATIONS_TOTAL
                    .with_label_values(&[operation.as_str(), e.kind()])
                    .inc();
                if e.is_local() {
                    debug!("{} rejected: {}", operation.as_str(), e);
                } else {
                    warn!("{} failed: {}", operation.as_str(), e);
                }
                failure_status(operation, &e)
            }
        };

        let mut session = self.session.write().await;
        update(&mut session, ok);
        session.set_status(status.clone());
        status
    }
}

/// Status for a failed operation. Ledger failures carry the operation's prefix;
/// local rejections are shown as-is.
fn failure_status(operation: Operation, error: &OrchestratorError) -> Status {
    match error {
        OrchestratorError::Ledger(e) => {
            Status::error(format!("{}: {}", operation.failure_prefix(), e))
        }
        other => Status::error(other.to_string()),
    }
}
