//! Client interface to the external application.

use crate::reqres::ReqRes;
use crate::types::{
    Request, RequestCheckTx, RequestDeliverTx, Response, ResponseCommit, ResponseDeliverTx,
};
use std::sync::Arc;

/// Callback invoked for every response the application delivers, in the
/// order the corresponding requests were enqueued.
pub type ResponseCallback = Arc<dyn Fn(&Request, &Response) + Send + Sync>;

/// Errors surfaced by a client.
///
/// Transport errors are fatal to the current operation but not to the
/// process; callers consult [`Client::error`] before enqueuing more work.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The client has been stopped and accepts no further requests
    #[error("client is stopped")]
    Stopped,

    /// The transport to the application failed
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Asynchronous bridge to the application.
///
/// Async methods return once the request is enqueued; the response arrives
/// later on the client's dispatch thread, which runs the global response
/// callback and then the request's own callback. Sync methods block for the
/// round trip.
pub trait Client: Send + Sync {
    /// Enqueues a validity probe. The returned [`ReqRes`] resolves when the
    /// application answers.
    fn check_tx_async(&self, req: RequestCheckTx) -> Arc<ReqRes>;

    /// Enqueues a drain marker. Its response signals that every request
    /// enqueued before it has been processed.
    fn flush_async(&self) -> Arc<ReqRes>;

    /// Executes a transaction and blocks for the verdict.
    fn deliver_tx_sync(&self, req: RequestDeliverTx) -> Result<ResponseDeliverTx, ClientError>;

    /// Commits application state and blocks for the state hash.
    fn commit_sync(&self) -> Result<ResponseCommit, ClientError>;

    /// Blocks until every previously enqueued request has been processed.
    fn flush_sync(&self) -> Result<(), ClientError>;

    /// Installs the global response callback. Fires once per delivered
    /// response; dropped responses never fire it.
    fn set_response_callback(&self, cb: ResponseCallback);

    /// Last transport error, if any.
    fn error(&self) -> Option<ClientError>;

    /// Stops the client. Outstanding requests are abandoned and later
    /// async calls surface [`ClientError::Stopped`] via [`Client::error`].
    fn stop(&self);
}
