//! In-process client with a dedicated dispatch thread.
//!
//! Requests are queued FIFO; the dispatch thread computes each response
//! against the wrapped [`Application`] and delivers callbacks in request
//! order. A slow application therefore backpressures admission through the
//! queue rather than blocking submitters on execution.

use crate::app::Application;
use crate::client::{Client, ClientError, ResponseCallback};
use crate::reqres::ReqRes;
use crate::types::{
    Request, RequestCheckTx, RequestDeliverTx, Response, ResponseCommit, ResponseDeliverTx,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::thread;
use tracing::trace;

/// Client that runs the application on a local dispatch thread.
pub struct LocalClient {
    queue: Mutex<Option<Sender<Arc<ReqRes>>>>,
    callback: Arc<RwLock<Option<ResponseCallback>>>,
    error: Mutex<Option<ClientError>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl LocalClient {
    /// Creates a client around an application and starts its dispatch
    /// thread.
    pub fn new(app: Arc<dyn Application>) -> Self {
        let (tx, rx) = unbounded::<Arc<ReqRes>>();
        let callback = Arc::new(RwLock::new(None));
        let cb = Arc::clone(&callback);
        let handle = thread::spawn(move || dispatch_loop(app, rx, cb));

        Self {
            queue: Mutex::new(Some(tx)),
            callback,
            error: Mutex::new(None),
            handle: Mutex::new(Some(handle)),
        }
    }

    fn enqueue(&self, reqres: &Arc<ReqRes>) -> Result<(), ClientError> {
        let queue = self.queue.lock();
        let sender = queue.as_ref().ok_or(ClientError::Stopped)?;
        sender
            .send(Arc::clone(reqres))
            .map_err(|_| ClientError::Stopped)
    }

    fn enqueue_async(&self, request: Request) -> Arc<ReqRes> {
        let reqres = Arc::new(ReqRes::new(request));
        if let Err(err) = self.enqueue(&reqres) {
            *self.error.lock() = Some(err);
        }
        reqres
    }

    fn round_trip(&self, request: Request) -> Result<Response, ClientError> {
        let reqres = Arc::new(ReqRes::new(request));
        self.enqueue(&reqres)?;
        Ok(reqres.wait())
    }
}

impl Client for LocalClient {
    fn check_tx_async(&self, req: RequestCheckTx) -> Arc<ReqRes> {
        self.enqueue_async(Request::CheckTx(req))
    }

    fn flush_async(&self) -> Arc<ReqRes> {
        self.enqueue_async(Request::Flush)
    }

    fn deliver_tx_sync(&self, req: RequestDeliverTx) -> Result<ResponseDeliverTx, ClientError> {
        match self.round_trip(Request::DeliverTx(req))? {
            Response::DeliverTx(res) => Ok(res),
            other => Err(ClientError::Transport(format!(
                "unexpected response to DeliverTx: {:?}",
                other
            ))),
        }
    }

    fn commit_sync(&self) -> Result<ResponseCommit, ClientError> {
        match self.round_trip(Request::Commit)? {
            Response::Commit(res) => Ok(res),
            other => Err(ClientError::Transport(format!(
                "unexpected response to Commit: {:?}",
                other
            ))),
        }
    }

    fn flush_sync(&self) -> Result<(), ClientError> {
        self.round_trip(Request::Flush).map(|_| ())
    }

    fn set_response_callback(&self, cb: ResponseCallback) {
        *self.callback.write() = Some(cb);
    }

    fn error(&self) -> Option<ClientError> {
        self.error.lock().clone()
    }

    fn stop(&self) {
        // Dropping the sender ends the dispatch loop once the queue drains.
        self.queue.lock().take();
        *self.error.lock() = Some(ClientError::Stopped);
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}

fn dispatch_loop(
    app: Arc<dyn Application>,
    rx: Receiver<Arc<ReqRes>>,
    callback: Arc<RwLock<Option<ResponseCallback>>>,
) {
    for reqres in rx.iter() {
        let response = match reqres.request() {
            Request::CheckTx(req) => Response::CheckTx(app.check_tx(req)),
            Request::DeliverTx(req) => Response::DeliverTx(app.deliver_tx(req)),
            Request::Commit => Response::Commit(app.commit()),
            Request::Flush => Response::Flush,
        };
        reqres.set_response(response.clone());

        let cb = callback.read().clone();
        if let Some(cb) = cb {
            cb(reqres.request(), &response);
        }
        reqres.invoke_callback();
    }
    trace!("dispatch thread exiting");
}
