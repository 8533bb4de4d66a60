//! JSON-RPC ledger backed by alloy's sol-generated contract bindings.

use std::str::FromStr;

use alloy::contract::Error as ContractError;
use alloy::network::{Ethereum, EthereumWallet};
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::RpcError;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::LedgerConfig;

use super::contract::ITicketSale;
use super::types::scan_tickets_owned_by;
use super::{
    LedgerError, LedgerEvent, SwapOffer, Ticket, TicketId, TicketLedger, TransactionOutcome,
};

/// Ledger client for a deployed TicketSale contract.
///
/// With `private_key` configured, transactions are signed in-process.
/// Otherwise they are handed to the node (`eth_sendTransaction`) and signed by
/// one of its managed accounts.
pub struct AlloyLedger {
    provider: DynProvider,
    contract: ITicketSale::ITicketSaleInstance<DynProvider>,
    local_signer: Option<Address>,
    max_ticket_scan: u64,
    read_concurrency: usize,
}

impl AlloyLedger {
    pub fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let rpc_url = url::Url::parse(&config.rpc_url)
            .map_err(|e| LedgerError::Configuration(format!("invalid rpc_url: {}", e)))?;
        let contract_address = Address::from_str(&config.contract_address).map_err(|e| {
            LedgerError::Configuration(format!("invalid contract_address: {}", e))
        })?;

        let (provider, local_signer) = match &config.private_key {
            Some(key) => {
                let signer = PrivateKeySigner::from_str(key).map_err(|_| {
                    LedgerError::Configuration("invalid private_key".to_string())
                })?;
                let address = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(rpc_url)
                    .erased();
                (provider, Some(address))
            }
            None => (ProviderBuilder::new().connect_http(rpc_url).erased(), None),
        };

        let contract = ITicketSale::new(contract_address, provider.clone());

        info!(
            "Ledger bound to TicketSale at {} ({})",
            contract_address,
            if local_signer.is_some() {
                "local signer"
            } else {
                "node accounts"
            }
        );

        Ok(Self {
            provider,
            contract,
            local_signer,
            max_ticket_scan: config.max_ticket_scan,
            read_concurrency: config.read_concurrency,
        })
    }

    /// Wait for the receipt and turn a failed status into an error.
    async fn confirm(
        method: &'static str,
        pending: PendingTransactionBuilder<Ethereum>,
    ) -> Result<TransactionOutcome, LedgerError> {
        let tx_hash = *pending.tx_hash();
        debug!("{} sent as {}, waiting for receipt", method, tx_hash);

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| LedgerError::call(method, format!("receipt unavailable: {e}")))?;

        if !receipt.status() {
            return Err(LedgerError::Reverted(tx_hash.to_string()));
        }

        info!(
            "{} confirmed: tx={} block={:?}",
            method, tx_hash, receipt.block_number
        );

        Ok(TransactionOutcome {
            tx_hash,
            block_number: receipt.block_number,
        })
    }
}

/// Map a contract error, separating an unreachable node from a failed call.
fn contract_error(method: &'static str) -> impl FnOnce(ContractError) -> LedgerError {
    move |e| match e {
        ContractError::TransportError(RpcError::Transport(kind)) => {
            LedgerError::ConnectionFailed(kind.to_string())
        }
        other => LedgerError::call(method, other),
    }
}

fn to_u64(method: &'static str, value: U256) -> Result<u64, LedgerError> {
    u64::try_from(value)
        .map_err(|_| LedgerError::InvalidResponse(format!("{method} returned {value}, overflows u64")))
}

#[async_trait]
impl TicketLedger for AlloyLedger {
    fn name(&self) -> &str {
        "json_rpc"
    }

    fn contract_address(&self) -> Address {
        *self.contract.address()
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, LedgerError> {
        if let Some(address) = self.local_signer {
            return Ok(vec![address]);
        }

        self.provider.get_accounts().await.map_err(|e| match e {
            RpcError::Transport(kind) => LedgerError::ConnectionFailed(kind.to_string()),
            other => LedgerError::call("eth_accounts", other),
        })
    }

    async fn ticket_price(&self) -> Result<U256, LedgerError> {
        self.contract
            .TICKET_PRICE()
            .call()
            .await
            .map_err(contract_error("TICKET_PRICE"))
    }

    async fn return_fee_percentage(&self) -> Result<U256, LedgerError> {
        self.contract
            .RETURN_FEE_PERCENTAGE()
            .call()
            .await
            .map_err(contract_error("RETURN_FEE_PERCENTAGE"))
    }

    async fn ticket_counter(&self) -> Result<u64, LedgerError> {
        let counter = self
            .contract
            .ticketCounter()
            .call()
            .await
            .map_err(contract_error("ticketCounter"))?;
        to_u64("ticketCounter", counter)
    }

    async fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, LedgerError> {
        let record = self
            .contract
            .tickets(id.as_u256())
            .call()
            .await
            .map_err(contract_error("tickets"))?;

        if !record.exists {
            return Ok(None);
        }

        Ok(Some(Ticket {
            id,
            owner: record.owner,
            is_available: record.isAvailable,
            price: record.price,
        }))
    }

    async fn is_ticket_available(&self, id: TicketId) -> Result<bool, LedgerError> {
        self.contract
            .isTicketAvailable(id.as_u256())
            .call()
            .await
            .map_err(contract_error("isTicketAvailable"))
    }

    async fn ticket_number_by_address(&self, address: Address) -> Result<u64, LedgerError> {
        let number = self
            .contract
            .getTicketNumberByAddress(address)
            .call()
            .await
            .map_err(contract_error("getTicketNumberByAddress"))?;
        to_u64("getTicketNumberByAddress", number)
    }

    async fn swap_offer(&self, index: u64) -> Result<SwapOffer, LedgerError> {
        let offer = self
            .contract
            .swapOffers(U256::from(index))
            .call()
            .await
            .map_err(contract_error("swapOffers"))?;

        Ok(SwapOffer {
            from: offer.from,
            to: offer.to,
            from_ticket_id: TicketId::try_from(offer.fromTicketId)?,
            to_ticket_id: TicketId::try_from(offer.toTicketId)?,
            is_active: offer.isActive,
        })
    }

    async fn tickets_owned_by(&self, owner: Address) -> Result<Vec<Ticket>, LedgerError> {
        scan_tickets_owned_by(self, owner, self.max_ticket_scan, self.read_concurrency).await
    }

    async fn purchase_ticket(
        &self,
        from: Address,
        value: U256,
    ) -> Result<TransactionOutcome, LedgerError> {
        let pending = self
            .contract
            .purchaseTicket()
            .from(from)
            .value(value)
            .send()
            .await
            .map_err(contract_error("purchaseTicket"))?;
        Self::confirm("purchaseTicket", pending).await
    }

    async fn return_ticket(
        &self,
        from: Address,
        id: TicketId,
    ) -> Result<TransactionOutcome, LedgerError> {
        let pending = self
            .contract
            .returnTicket(id.as_u256())
            .from(from)
            .send()
            .await
            .map_err(contract_error("returnTicket"))?;
        Self::confirm("returnTicket", pending).await
    }

    async fn create_swap_offer(
        &self,
        from: Address,
        from_ticket: TicketId,
        to_ticket: TicketId,
    ) -> Result<TransactionOutcome, LedgerError> {
        let pending = self
            .contract
            .createSwapOffer(from_ticket.as_u256(), to_ticket.as_u256())
            .from(from)
            .send()
            .await
            .map_err(contract_error("createSwapOffer"))?;
        Self::confirm("createSwapOffer", pending).await
    }

    async fn accept_swap_offer(
        &self,
        from: Address,
        ticket: TicketId,
    ) -> Result<TransactionOutcome, LedgerError> {
        let pending = self
            .contract
            .acceptSwapOffer(ticket.as_u256())
            .from(from)
            .send()
            .await
            .map_err(contract_error("acceptSwapOffer"))?;
        Self::confirm("acceptSwapOffer", pending).await
    }

    async fn latest_block(&self) -> Result<u64, LedgerError> {
        self.provider.get_block_number().await.map_err(|e| match e {
            RpcError::Transport(kind) => LedgerError::ConnectionFailed(kind.to_string()),
            other => LedgerError::call("eth_blockNumber", other),
        })
    }

    async fn events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut events = Vec::new();

        let purchased = self
            .contract
            .TicketPurchased_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(contract_error("TicketPurchased logs"))?;
        for (event, log) in purchased {
            events.push(LedgerEvent::TicketPurchased {
                buyer: event.buyer,
                ticket_id: TicketId::try_from(event.ticketId)?,
                block_number: log.block_number,
            });
        }

        let returned = self
            .contract
            .TicketReturned_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(contract_error("TicketReturned logs"))?;
        for (event, log) in returned {
            events.push(LedgerEvent::TicketReturned {
                seller: event.seller,
                ticket_id: TicketId::try_from(event.ticketId)?,
                refund_amount: event.refundAmount,
                block_number: log.block_number,
            });
        }

        let created = self
            .contract
            .SwapOfferCreated_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(contract_error("SwapOfferCreated logs"))?;
        for (event, log) in created {
            events.push(LedgerEvent::SwapOfferCreated {
                from: event.from,
                to: event.to,
                from_ticket_id: TicketId::try_from(event.fromTicketId)?,
                to_ticket_id: TicketId::try_from(event.toTicketId)?,
                block_number: log.block_number,
            });
        }

        let accepted = self
            .contract
            .SwapOfferAccepted_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(contract_error("SwapOfferAccepted logs"))?;
        for (event, log) in accepted {
            events.push(LedgerEvent::SwapOfferAccepted {
                from: event.from,
                to: event.to,
                from_ticket_id: TicketId::try_from(event.fromTicketId)?,
                to_ticket_id: TicketId::try_from(event.toTicketId)?,
                block_number: log.block_number,
            });
        }

        events.sort_by_key(|event| match event {
            LedgerEvent::TicketPurchased { block_number, .. }
            | LedgerEvent::TicketReturned { block_number, .. }
            | LedgerEvent::SwapOfferCreated { block_number, .. }
            | LedgerEvent::SwapOfferAccepted { block_number, .. } => *block_number,
        });

        Ok(events)
    }
}
