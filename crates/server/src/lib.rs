//! The txplain server.
//!
//! Serves tagged transactions and simulations over HTTP, and explanations through a WebSocket
//! chat session:
//!
//! - `GET /tx/{txhash}` answers with the tagged, USD valued transaction
//! - `GET /simulate` answers with a simulated tagged transaction
//! - `GET /ws` opens a chat session: send a transaction hash, receive its explanation

pub mod error;

mod core;
mod interfaces;

// re-export the public interface
pub use core::{router, serve, AppState, DEFAULT_HOST, DEFAULT_PORT};
pub use interfaces::{ServeArgs, ServeArgsBuilder};
