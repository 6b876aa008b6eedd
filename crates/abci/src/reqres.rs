//! Paired request/response holder.
//!
//! A [`ReqRes`] is created when a request is enqueued and owns it until the
//! response arrives. The caller may attach a per-request callback before or
//! after the response is known; the callback fires exactly once, and never
//! fires if the application drops the response.

use crate::types::{Request, Response};
use parking_lot::{Condvar, Mutex};

type ReqResCallback = Box<dyn FnOnce(&Response) + Send>;

/// A single in-flight request and, eventually, its response.
pub struct ReqRes {
    request: Request,
    state: Mutex<State>,
    done: Condvar,
}

#[derive(Default)]
struct State {
    response: Option<Response>,
    callback: Option<ReqResCallback>,
    fired: bool,
}

impl ReqRes {
    /// Creates a holder for a request with no response yet.
    pub fn new(request: Request) -> Self {
        Self {
            request,
            state: Mutex::new(State::default()),
            done: Condvar::new(),
        }
    }

    /// The request this holder was created for.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The response, if it has arrived.
    pub fn response(&self) -> Option<Response> {
        self.state.lock().response.clone()
    }

    /// Attaches the per-request callback.
    ///
    /// If the response is already known and the callback has not fired yet,
    /// it fires immediately on the calling thread. Otherwise it is stored
    /// and fires when [`invoke_callback`](Self::invoke_callback) runs.
    pub fn set_callback(&self, cb: impl FnOnce(&Response) + Send + 'static) {
        let mut st = self.state.lock();
        if st.fired {
            return;
        }
        match st.response.clone() {
            Some(response) => {
                st.fired = true;
                drop(st);
                cb(&response);
            }
            None => st.callback = Some(Box::new(cb)),
        }
    }

    /// Records the response and wakes any [`wait`](Self::wait)ers. The
    /// first response wins; later calls are ignored. Does not fire the
    /// per-request callback.
    pub fn set_response(&self, response: Response) {
        let mut st = self.state.lock();
        if st.response.is_none() {
            st.response = Some(response);
            self.done.notify_all();
        }
    }

    /// Fires the per-request callback if the response is known and a
    /// callback is attached. Idempotent: repeated calls are no-ops once the
    /// callback has fired.
    pub fn invoke_callback(&self) {
        let mut st = self.state.lock();
        if st.fired || st.callback.is_none() {
            return;
        }
        if let Some(response) = st.response.clone() {
            st.fired = true;
            let cb = st.callback.take();
            drop(st);
            if let Some(cb) = cb {
                cb(&response);
            }
        }
    }

    /// Blocks until the response is set and returns a clone of it.
    pub fn wait(&self) -> Response {
        let mut st = self.state.lock();
        loop {
            if let Some(response) = &st.response {
                return response.clone();
            }
            self.done.wait(&mut st);
        }
    }
}
