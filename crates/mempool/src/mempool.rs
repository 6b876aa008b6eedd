//! General mempool.
//!
//! Admits transactions through the application's CheckTx, buffers them in
//! insertion order, reaps them under byte/gas budgets for block proposals,
//! and rechecks the survivors after every committed block.
//!
//! ## Locking
//!
//! One mutex protects the ordered list, the key index, the seen-key cache,
//! and the byte counter. It is held across the cache probe during admission
//! and across the append in the response callback, so concurrent
//! submitters cannot jointly exceed the capacity quotas. The mutex is
//! never held across a client call: admission enqueues the app probe after
//! unlocking, and the response lands on the client's dispatch thread.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use forgecore_abci::{
    CheckTxKind, Client, Request, RequestCheckTx, Response, ResponseCheckTx, ResponseDeliverTx,
};
use forgecore_types::{Tx, TxKey};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::cache::TxCache;
use crate::clist::TxList;
use crate::config::MempoolConfig;
use crate::error::MempoolError;
use crate::filter::{PostCheckFn, PreCheckFn};
use crate::metrics::Metrics;
use crate::notify::TxsAvailableNotifier;
use crate::tx::{MempoolTx, TxInfo};
use crate::Result;

/// Callback handed to [`Mempool::check_tx`], invoked with the application's
/// response on the client's dispatch thread.
pub type CheckTxCallback = Box<dyn FnOnce(&ResponseCheckTx) + Send>;

/// The general transaction pool.
///
/// Cheap to clone; all clones share state. Safe to use from many producer
/// threads (peer reactor, RPC) and one consumer (the proposer).
#[derive(Clone)]
pub struct Mempool {
    shared: Arc<Shared>,
}

struct Shared {
    config: MempoolConfig,
    client: Arc<dyn Client>,
    metrics: Metrics,
    state: Mutex<State>,
}

struct State {
    txs: TxList<MempoolTx>,
    cache: TxCache,
    size_bytes: u64,
    height: u64,
    rechecking: usize,
    notifier: TxsAvailableNotifier,
    txs_wait: (Sender<()>, Receiver<()>),
    pre_check: Option<PreCheckFn>,
    post_check: Option<PostCheckFn>,
}

impl State {
    fn check_capacity(&self, config: &MempoolConfig, tx_len: usize) -> Result<()> {
        if self.txs.len() + 1 > config.size
            || self.size_bytes + tx_len as u64 > config.max_txs_bytes
        {
            return Err(MempoolError::MempoolIsFull {
                num_txs: self.txs.len(),
                max_txs: config.size,
                txs_bytes: self.size_bytes,
                max_txs_bytes: config.max_txs_bytes,
            });
        }
        Ok(())
    }

    fn post_check_passes(&self, tx: &Tx, res: &ResponseCheckTx) -> bool {
        match &self.post_check {
            Some(post) => post(tx, res).is_ok(),
            None => true,
        }
    }
}

impl Mempool {
    /// Creates a mempool bound to an application client at the given start
    /// height. Installs the client's global response callback, which this
    /// mempool uses to process recheck responses.
    pub fn new(
        config: MempoolConfig,
        client: Arc<dyn Client>,
        height: u64,
        metrics: Metrics,
    ) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                txs: TxList::new(),
                cache: TxCache::new(config.cache_size),
                size_bytes: 0,
                height,
                rechecking: 0,
                notifier: TxsAvailableNotifier::new(),
                txs_wait: bounded(1),
                pre_check: None,
                post_check: None,
            }),
            config,
            client: Arc::clone(&client),
            metrics,
        });

        let weak = Arc::downgrade(&shared);
        client.set_response_callback(Arc::new(move |req, res| {
            if let Some(shared) = weak.upgrade() {
                handle_global_response(&shared, req, res);
            }
        }));

        Self { shared }
    }

    /// Admits a transaction.
    ///
    /// Runs the synchronous gates (size, capacity, precheck, cache), then
    /// enqueues the application probe and returns. The admission outcome
    /// lands on the client's dispatch thread, where `response_cb` (if any)
    /// is invoked with the application's response.
    pub fn check_tx(
        &self,
        tx: Tx,
        response_cb: Option<CheckTxCallback>,
        tx_info: TxInfo,
    ) -> Result<()> {
        let shared = &self.shared;
        let tx_len = tx.len();
        if tx_len > shared.config.max_tx_bytes {
            return Err(MempoolError::TxTooLarge {
                max: shared.config.max_tx_bytes,
                actual: tx_len,
            });
        }

        let key = tx.key();
        {
            let mut st = shared.state.lock();
            st.check_capacity(&shared.config, tx_len)?;

            if let Some(pre) = &st.pre_check {
                pre(&tx).map_err(MempoolError::PreCheck)?;
            }

            if let Some(err) = shared.client.error() {
                return Err(MempoolError::AppConnection(err.to_string()));
            }

            if !st.cache.push(key) {
                // Tag the live entry so the reactor will not gossip the tx
                // back to this sender.
                if let Some(entry) = st.txs.get_mut(&key) {
                    entry.add_sender(tx_info.sender_id);
                }
                return Err(MempoolError::TxInCache);
            }
        }

        trace!(key = %key, sender = tx_info.sender_id, "dispatching tx for validation");
        let reqres = shared.client.check_tx_async(RequestCheckTx {
            tx: tx.clone(),
            kind: CheckTxKind::New,
        });

        let weak = Arc::downgrade(shared);
        let sender_id = tx_info.sender_id;
        reqres.set_callback(move |res| {
            if let Response::CheckTx(res) = res {
                if let Some(shared) = weak.upgrade() {
                    handle_new_tx_response(&shared, &tx, sender_id, res);
                }
                if let Some(cb) = response_cb {
                    cb(res);
                }
            }
        });

        Ok(())
    }

    /// Collects transactions for the next block proposal, walking the pool
    /// in insertion order and stopping at the first transaction that would
    /// overflow the byte budget (wire size) or the gas budget. Negative
    /// budgets mean unlimited. Non-destructive and idempotent.
    pub fn reap_max_bytes_max_gas(&self, max_bytes: i64, max_gas: i64) -> Vec<Tx> {
        let st = self.shared.state.lock();
        let mut total_bytes: i64 = 0;
        let mut total_gas: i64 = 0;
        let mut reaped = Vec::new();

        for (_, entry) in st.txs.iter() {
            let wire = entry.tx.wire_size() as i64;
            if max_bytes > -1 && total_bytes + wire > max_bytes {
                break;
            }
            let new_gas = total_gas.saturating_add(entry.gas_wanted);
            if max_gas > -1 && new_gas > max_gas {
                break;
            }
            total_bytes += wire;
            total_gas = new_gas;
            reaped.push(entry.tx.clone());
        }
        reaped
    }

    /// Collects up to `max` transactions in insertion order; negative means
    /// all. Non-destructive.
    pub fn reap_max_txs(&self, max: i64) -> Vec<Tx> {
        let st = self.shared.state.lock();
        let limit = if max < 0 { st.txs.len() } else { max as usize };
        st.txs
            .iter()
            .take(limit)
            .map(|(_, entry)| entry.tx.clone())
            .collect()
    }

    /// Applies a committed block.
    ///
    /// Advances the height, re-arms the availability latch, swaps the
    /// admission filters if new ones are supplied, marks committed txs as
    /// seen (or forgets failed ones, per the cache policy), removes
    /// committed entries from the pool, and dispatches a recheck of every
    /// survivor. Recheck responses are processed asynchronously; they must
    /// complete before the next update.
    pub fn update(
        &self,
        height: u64,
        txs: &[Tx],
        responses: &[ResponseDeliverTx],
        pre_check: Option<PreCheckFn>,
        post_check: Option<PostCheckFn>,
    ) -> Result<()> {
        if txs.len() != responses.len() {
            return Err(MempoolError::ResponseMismatch {
                txs: txs.len(),
                responses: responses.len(),
            });
        }

        let shared = &self.shared;
        let mut recheck_txs = Vec::new();
        {
            let mut st = shared.state.lock();
            st.height = height;
            st.notifier.reset();
            if let Some(pre) = pre_check {
                st.pre_check = Some(pre);
            }
            if let Some(post) = post_check {
                st.post_check = Some(post);
            }

            for (tx, res) in txs.iter().zip(responses) {
                let key = tx.key();
                if res.is_ok() {
                    // Committed txs count as seen even if this node never
                    // admitted them.
                    st.cache.push(key);
                } else if !shared.config.keep_invalid_txs_in_cache {
                    st.cache.remove(&key);
                }
                if let Some(entry) = st.txs.remove(&key) {
                    st.size_bytes -= entry.tx.len() as u64;
                }
            }
            shared.metrics.size.set(st.txs.len() as i64);

            if !st.txs.is_empty() {
                if shared.config.recheck {
                    st.rechecking = st.txs.len();
                    recheck_txs = st.txs.iter().map(|(_, e)| e.tx.clone()).collect();
                    debug!(height, count = recheck_txs.len(), "rechecking surviving txs");
                } else {
                    st.notifier.notify();
                }
            }
        }

        if !recheck_txs.is_empty() {
            for tx in recheck_txs {
                shared.client.check_tx_async(RequestCheckTx {
                    tx,
                    kind: CheckTxKind::Recheck,
                });
            }
            shared.client.flush_async();
        }
        Ok(())
    }

    /// Removes a transaction by key.
    pub fn remove_tx_by_key(&self, key: &TxKey) -> Result<()> {
        let mut st = self.shared.state.lock();
        match st.txs.remove(key) {
            Some(entry) => {
                st.size_bytes -= entry.tx.len() as u64;
                self.shared.metrics.size.set(st.txs.len() as i64);
                Ok(())
            }
            None => Err(MempoolError::NoSuchTx(*key)),
        }
    }

    /// Drops every held transaction and every cached key. The height is
    /// not advanced.
    pub fn flush(&self) {
        let mut st = self.shared.state.lock();
        st.txs.clear();
        st.cache.reset();
        st.size_bytes = 0;
        st.rechecking = 0;
        self.shared.metrics.size.set(0);
    }

    /// Blocks until every outstanding application request has been
    /// processed.
    pub fn flush_app_conn(&self) -> Result<()> {
        self.shared
            .client
            .flush_sync()
            .map_err(|err| MempoolError::AppConnection(err.to_string()))
    }

    /// Number of transactions held.
    pub fn size(&self) -> usize {
        self.shared.state.lock().txs.len()
    }

    /// Total bytes of all held transactions.
    pub fn size_bytes(&self) -> u64 {
        self.shared.state.lock().size_bytes
    }

    /// Last block height observed by [`update`](Self::update).
    pub fn height(&self) -> u64 {
        self.shared.state.lock().height
    }

    /// The first transaction in reap order, if any.
    pub fn txs_front(&self) -> Option<MempoolTx> {
        self.shared
            .state
            .lock()
            .txs
            .front()
            .map(|(_, entry)| entry.clone())
    }

    /// Channel that receives an edge when the pool transitions from empty
    /// to non-empty; the gossip reactor parks on this instead of polling.
    pub fn txs_wait_chan(&self) -> Receiver<()> {
        self.shared.state.lock().txs_wait.1.clone()
    }

    /// Turns on the per-height availability signal. Must be called before
    /// [`txs_available`](Self::txs_available) returns a receiver.
    pub fn enable_txs_available(&self) {
        self.shared.state.lock().notifier.enable();
    }

    /// Receiver firing once per height at which at least one transaction
    /// was admitted; `None` until enabled.
    pub fn txs_available(&self) -> Option<Receiver<()>> {
        self.shared.state.lock().notifier.receiver()
    }
}

/// Outcome handling for a first-time CheckTx response. Runs on the
/// client's dispatch thread.
fn handle_new_tx_response(shared: &Arc<Shared>, tx: &Tx, sender_id: u16, res: &ResponseCheckTx) {
    let key = tx.key();
    let mut st = shared.state.lock();

    if res.is_ok() && st.post_check_passes(tx, res) {
        // In-flight admissions share the quota; re-verify now that the
        // response has arrived.
        if st.check_capacity(&shared.config, tx.len()).is_err() {
            st.cache.remove(&key);
            shared.metrics.failed_txs.inc();
            warn!(key = %key, "mempool filled up while tx was in flight, dropping");
            return;
        }
        if st.txs.contains(&key) {
            return;
        }
        let was_empty = st.txs.is_empty();
        let entry = MempoolTx::new(tx.clone(), res.gas_wanted, st.height, sender_id);
        st.txs.push_back(key, entry);
        st.size_bytes += tx.len() as u64;
        shared.metrics.size.set(st.txs.len() as i64);
        shared.metrics.tx_size_bytes.observe(tx.wire_size() as f64);
        debug!(
            key = %key,
            height = st.height,
            total = st.txs.len(),
            "admitted tx"
        );
        st.notifier.notify();
        if was_empty {
            let _ = st.txs_wait.0.try_send(());
        }
    } else {
        debug!(key = %key, code = res.code, log = %res.log, "app rejected tx");
        if !shared.config.keep_invalid_txs_in_cache {
            st.cache.remove(&key);
        }
        shared.metrics.failed_txs.inc();
    }
}

/// Recheck responses arrive through the client's global callback, tagged
/// by request kind. Eviction is keyed on the response's own transaction,
/// never on response position, so a dropped response leaves its entry
/// untouched.
fn handle_global_response(shared: &Arc<Shared>, req: &Request, res: &Response) {
    if let (Request::CheckTx(req), Response::CheckTx(res)) = (req, res) {
        if req.kind == CheckTxKind::Recheck {
            handle_recheck_response(shared, &req.tx, res);
        }
    }
}

fn handle_recheck_response(shared: &Arc<Shared>, tx: &Tx, res: &ResponseCheckTx) {
    let key = tx.key();
    let mut st = shared.state.lock();

    if !(res.is_ok() && st.post_check_passes(tx, res)) {
        if let Some(entry) = st.txs.remove(&key) {
            st.size_bytes -= entry.tx.len() as u64;
            shared.metrics.size.set(st.txs.len() as i64);
            shared.metrics.failed_txs.inc();
            debug!(key = %key, code = res.code, "evicting tx that failed recheck");
        }
        if !shared.config.keep_invalid_txs_in_cache {
            st.cache.remove(&key);
        }
    }

    if st.rechecking > 0 {
        st.rechecking -= 1;
        if st.rechecking == 0 {
            shared.metrics.recheck_times.inc();
            debug!(height = st.height, remaining = st.txs.len(), "recheck done");
            if !st.txs.is_empty() {
                st.notifier.notify();
            }
        }
    }
}
