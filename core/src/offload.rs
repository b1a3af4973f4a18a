//! Offload coordinator — KPI aggregation on a background worker.
//!
//! RULE: The worker shares no memory with the foreground. Requests and
//! responses cross the thread boundary as JSON text, so every payload is
//! a copy.
//!
//! Protocol (one JSON object per message):
//!   → {"type":"compute","seq":N,"rows":[...],"filters":{...}}
//!   → {"type":"shutdown"}
//!   ← {"seq":N,"count":..,"churn":..,"avgMonthly":..}
//!
//! Every request carries a monotonically increasing `seq`. A response is
//! surfaced only if its `seq` is the latest one issued; anything older was
//! superseded by a newer filter change and is dropped.

use crate::{
    aggregate::{kpi_summary, KpiSummary},
    customer::{CustomerCollection, CustomerRecord},
    error::{AnalyticsError, AnalyticsResult},
    filter::{filter, FilterCriteria},
    types::RequestSeq,
};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffloadRequest {
    pub seq:     RequestSeq,
    pub rows:    CustomerCollection,
    pub filters: FilterCriteria,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffloadResponse {
    pub seq:  RequestSeq,
    #[serde(flatten)]
    pub kpis: KpiSummary,
}

/// What the worker reads.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WorkerMessage {
    Compute(OffloadRequest),
    Shutdown,
}

/// What the foreground writes. Borrows the rows so submitting does not
/// clone the collection before serializing it.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutgoingMessage<'a> {
    Compute {
        seq:     RequestSeq,
        rows:    &'a [CustomerRecord],
        filters: &'a FilterCriteria,
    },
    Shutdown,
}

/// Worker-side computation: filter, then count / churn / average.
pub fn handle_request(request: &OffloadRequest) -> OffloadResponse {
    let subset = filter(&request.rows, &request.filters);
    OffloadResponse {
        seq:  request.seq,
        kpis: kpi_summary(&subset),
    }
}

fn worker_loop(inbox: Receiver<String>, outbox: Sender<String>) {
    while let Ok(raw) = inbox.recv() {
        let message: WorkerMessage = match serde_json::from_str(&raw) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("offload: worker ignored malformed message: {e}");
                continue;
            }
        };

        match message {
            WorkerMessage::Shutdown => break,
            WorkerMessage::Compute(request) => {
                let response = handle_request(&request);
                let encoded = match serde_json::to_string(&response) {
                    Ok(s) => s,
                    Err(e) => {
                        log::warn!("offload: cannot encode response seq={}: {e}", request.seq);
                        continue;
                    }
                };
                if outbox.send(encoded).is_err() {
                    break; // foreground gone
                }
            }
        }
    }
    log::debug!("offload: worker exiting");
}

// ── Coordinator ──────────────────────────────────────────────────────────────

pub struct OffloadCoordinator {
    requests:    Sender<String>,
    responses:   Receiver<String>,
    worker:      Option<JoinHandle<()>>,
    latest_seq:  RequestSeq,
    current:     Option<KpiSummary>,
    /// Sequence number `current` answers.
    current_seq: RequestSeq,
}

impl OffloadCoordinator {
    /// Start the background worker thread.
    pub fn spawn() -> AnalyticsResult<Self> {
        let (request_tx, request_rx) = mpsc::channel::<String>();
        let (response_tx, response_rx) = mpsc::channel::<String>();

        let worker = thread::Builder::new()
            .name("churn-offload".into())
            .spawn(move || worker_loop(request_rx, response_tx))?;

        Ok(Self {
            requests:    request_tx,
            responses:   response_rx,
            worker:      Some(worker),
            latest_seq:  0,
            current:     None,
            current_seq: 0,
        })
    }

    /// Queue a recomputation for `filters`. Returns the request's sequence
    /// number; every earlier outstanding request becomes stale.
    pub fn submit(
        &mut self,
        rows: &[CustomerRecord],
        filters: &FilterCriteria,
    ) -> AnalyticsResult<RequestSeq> {
        let seq = self.latest_seq + 1;
        let payload = serde_json::to_string(&OutgoingMessage::Compute { seq, rows, filters })?;
        self.requests
            .send(payload)
            .map_err(|_| AnalyticsError::WorkerDisconnected)?;
        self.latest_seq = seq;
        log::debug!("offload: submitted seq={seq} rows={}", rows.len());
        Ok(seq)
    }

    pub fn latest_seq(&self) -> RequestSeq {
        self.latest_seq
    }

    /// Most recent KPIs accepted from the worker, if any.
    pub fn current(&self) -> Option<KpiSummary> {
        self.current
    }

    /// Sequence number of the request `current()` answers.
    pub fn current_seq(&self) -> Option<RequestSeq> {
        self.current.map(|_| self.current_seq)
    }

    /// Decode one response and keep it only if it answers the latest request.
    fn accept(&mut self, raw: &str) -> AnalyticsResult<bool> {
        let response: OffloadResponse = serde_json::from_str(raw)?;
        if response.seq != self.latest_seq {
            log::warn!(
                "offload: dropped stale response seq={} (latest={})",
                response.seq, self.latest_seq
            );
            return Ok(false);
        }
        self.current = Some(response.kpis);
        self.current_seq = response.seq;
        Ok(true)
    }

    /// Drain whatever the worker has delivered without blocking.
    /// Returns the KPIs for the latest request once they have arrived.
    pub fn poll(&mut self) -> AnalyticsResult<Option<KpiSummary>> {
        let mut fresh = false;
        loop {
            match self.responses.try_recv() {
                Ok(raw) => fresh |= self.accept(&raw)?,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Err(AnalyticsError::WorkerDisconnected),
            }
        }
        Ok(if fresh { self.current } else { None })
    }

    /// Block until the latest request is answered or `timeout` elapses.
    /// Returns at once if it already has been.
    /// Stale responses arriving meanwhile are discarded.
    pub fn wait_current(&mut self, timeout: Duration) -> AnalyticsResult<Option<KpiSummary>> {
        if self.latest_seq > 0 && self.current_seq == self.latest_seq {
            return Ok(self.current);
        }
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.responses.recv_timeout(remaining) {
                Ok(raw) => {
                    if self.accept(&raw)? {
                        return Ok(self.current);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(AnalyticsError::WorkerDisconnected)
                }
            }
        }
    }
}

impl Drop for OffloadCoordinator {
    fn drop(&mut self) {
        if let Ok(msg) = serde_json::to_string(&OutgoingMessage::Shutdown) {
            let _ = self.requests.send(msg);
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}
