//! A Rust library for driving multi-step transaction workflows on the XRP Ledger.
//!
//! The crate wraps a node's JSON-RPC interface behind small collaborator
//! traits and builds a fail-fast workflow coordinator on top of them.
//! Transactions are signed in process with Ed25519 keys; seeds never leave it
//! unless a signing node is configured explicitly.
//!
//! # Key Components
//!
//! *   [`transaction`]: Typed `AccountSet`, `TrustSet` and `Payment` transactions,
//!     validated when they are built.
//! *   [`workflow`]: The sequential coordinator. Each step is autofilled, signed,
//!     submitted and confirmed before the next one starts; the first failure
//!     aborts the rest.
//! *   [`rpc::RpcClient`]: The JSON-RPC node client implementing the collaborator
//!     traits in [`client`].
//! *   [`signer`]: [`signer::LocalSigner`], the default, and the opt-in
//!     [`signer::NodeSigner`].
//! *   [`workers`] / [`listener`]: A ledger-close subscription delivered over a
//!     channel.
pub mod client;
mod codec;
/// Defines configuration structures for the connector.
pub mod config;
/// Result code parsing and classification.
pub mod engine_result;
pub mod error;
/// Events produced by the ledger subscription.
pub mod events;
mod keys;
/// The consumer side of a ledger-close subscription.
pub mod listener;
pub mod rpc;
/// `TransactionSigner` implementations.
pub mod signer;
pub mod transaction;
pub mod types;
/// Wallets and the faucet client.
pub mod wallet;
/// The background worker that produces ledger-close events.
pub mod workers;
pub mod workflow;

pub use engine_result::{EngineResult, ResultClass};
pub use error::{ConnectorError, TransactionError};
pub use workflow::{run_workflow, Step, WorkflowCoordinator, WorkflowError, WorkflowResult};
