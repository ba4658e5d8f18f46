pub mod config;
pub mod context_assembly;
pub mod entitlement;
pub mod error;
pub mod game_log_fetch;
pub mod http_client;
pub mod inference;
pub mod manual_entry;
pub mod matchup_load;
pub mod parlay;
pub mod prompt;
pub mod prop_derive;
pub mod roster_fetch;
pub mod session;
pub mod stat_normalize;
pub mod state;

pub use error::{ErrorKind, PropError, Result};
