//! Parsing of user-supplied addresses and ticket numbers.

use std::str::FromStr;

use alloy::primitives::Address;
use serde::Serialize;

use crate::ledger::TicketId;

use super::types::OrchestratorError;

/// Parse a ledger address.
///
/// Accepts 40 hex digits with an optional `0x` prefix. All-lowercase and
/// all-uppercase forms are accepted as-is; mixed case must match the EIP-55
/// checksum.
pub fn parse_address(input: &str) -> Option<Address> {
    let input = input.trim();
    let hex = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);

    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let address = Address::from_str(hex).ok()?;

    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        let checksummed = address.to_checksum(None);
        if checksummed.get(2..) != Some(hex) {
            return None;
        }
    }

    Some(address)
}

/// Parse a positive decimal ticket number.
pub fn parse_ticket_id(input: &str) -> Option<TicketId> {
    let input = input.trim();
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match input.parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(id) => Some(TicketId(id)),
    }
}

/// Parse a positive whole ticket count.
pub fn parse_ticket_count(input: &str) -> Option<u64> {
    parse_ticket_id(input).map(|id| id.0)
}

/// What an accept request refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum SwapTarget {
    /// The ticket currently held by this address.
    ByAddress(Address),
    /// A ticket number given directly.
    ByTicketId(TicketId),
}

impl SwapTarget {
    pub fn parse(input: &str) -> Result<Self, OrchestratorError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(OrchestratorError::validation(
                "Please enter a ticket number or wallet address",
            ));
        }

        if let Some(address) = parse_address(input) {
            return Ok(SwapTarget::ByAddress(address));
        }

        parse_ticket_id(input)
            .map(SwapTarget::ByTicketId)
            .ok_or_else(|| {
                OrchestratorError::validation(format!(
                    "'{}' is neither a wallet address nor a ticket number",
                    input
                ))
            })
    }
}
