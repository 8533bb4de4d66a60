pub mod auth;
pub mod config;
pub mod ledger;
pub mod metrics;
pub mod orchestrator;
pub mod session;
pub mod testing;

pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Identity, NoneAuthenticator,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    LedgerConfig, SanitizedConfig,
};
pub use ledger::{
    AlloyLedger, ContractInfo, LedgerError, LedgerEvent, SwapOffer, Ticket, TicketId,
    TicketLedger,
};
pub use orchestrator::{
    EventWatcher, OrchestratorConfig, OrchestratorError, SwapTarget, TransactionOrchestrator,
    WatcherConfig,
};
pub use session::{OfferState, SessionSnapshot, Status, StatusKind};
