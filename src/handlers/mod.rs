//! Handlers module
//!
//! Gateway operations. Each handler ensures a valid upstream token before
//! issuing its calls through the retrying transport.

mod commands;
mod lookup_handler;
mod transactions_handler;
mod users_handler;

pub use commands::*;
pub use lookup_handler::LookupHandler;
pub use transactions_handler::TransactionAggregator;
pub use users_handler::ListUsersHandler;
