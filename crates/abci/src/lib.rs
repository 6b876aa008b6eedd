//! # Forge Core ABCI
//!
//! Request/response bridge between the staging subsystem and the external
//! blockchain application. The application is treated as a remote oracle:
//! it receives validity probes (`CheckTx`), executions (`DeliverTx`), and
//! commits, and answers with coded responses.
//!
//! This crate provides:
//! - **Request/response types** - [`Request`], [`Response`] and friends
//! - **[`ReqRes`]** - A paired request/response holder with exactly-once
//!   per-request callback delivery
//! - **[`Client`]** - The asynchronous client trait; responses are
//!   delivered in request order
//! - **[`LocalClient`]** - An in-process client running the application on
//!   a dedicated dispatch thread
//! - **[`MockClient`]** - A scripted client for failure-injection tests
//! - **[`KvStoreApp`]** - A minimal in-memory application for tests
//!
//! ## Ordering
//!
//! The global response callback fires once for every response the
//! application actually delivers, in the order the requests were enqueued.
//! A dropped response simply never fires; callers must not assume the Nth
//! response belongs to the Nth request.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod app;
pub mod client;
pub mod kvstore;
pub mod local;
pub mod mock;
pub mod reqres;
pub mod types;

pub use app::Application;
pub use client::{Client, ClientError, ResponseCallback};
pub use kvstore::KvStoreApp;
pub use local::LocalClient;
pub use mock::MockClient;
pub use reqres::ReqRes;
pub use types::{
    CheckTxKind, Request, RequestCheckTx, RequestDeliverTx, Response, ResponseCheckTx,
    ResponseCommit, ResponseDeliverTx, CODE_TYPE_OK,
};

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
