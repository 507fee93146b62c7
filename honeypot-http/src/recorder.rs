use crate::extract::VisitReport;
use honeypot_core::{IpResolver, LogEntry, RequestFacts};
use honeypot_store::VisitStore;
use http::{HeaderMap, header};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Resolves the visitor address, builds the [`LogEntry`], and hands it to the
/// store on a detached task.
pub struct Recorder {
    store: Arc<dyn VisitStore>,
    resolver: IpResolver,
    summary_chars: usize,
    in_flight: Arc<InFlight>,
}

/// Count of appends spawned but not yet finished.
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight count when the append task ends, however it ends.
struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
    fn new(in_flight: &Arc<InFlight>) -> Self {
        in_flight.count.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(in_flight))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_one();
        }
    }
}

impl Recorder {
    pub fn new(store: Arc<dyn VisitStore>, resolver: IpResolver, summary_chars: usize) -> Self {
        Self {
            store,
            resolver,
            summary_chars,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Appends spawned and not yet completed.
    pub fn pending(&self) -> usize {
        self.in_flight.count.load(Ordering::Acquire)
    }

    pub fn store(&self) -> &Arc<dyn VisitStore> {
        &self.store
    }

    /// Build the entry for this request.
    pub fn capture(
        &self,
        report: VisitReport,
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
    ) -> LogEntry {
        let facts = RequestFacts {
            body_ip: report.ip.as_deref(),
            headers,
            peer,
        };
        let resolved = self.resolver.resolve(&facts);
        let entry = LogEntry::capture(
            resolved.value,
            header_text(headers, header::USER_AGENT.as_str()),
            header_text(headers, header::REFERER.as_str())
                .or_else(|| header_text(headers, "referrer")),
            report.url,
        );
        info!(ip = %entry.ip, source = resolved.source, "{}", entry.summary(self.summary_chars));
        entry
    }

    /// Capture and persist. The append runs on its own task; callers may
    /// drop the handle; failures are only logged.
    pub fn record(
        &self,
        report: VisitReport,
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
    ) -> JoinHandle<()> {
        let entry = self.capture(report, headers, peer);
        let store = Arc::clone(&self.store);
        let guard = InFlightGuard::new(&self.in_flight);
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = store.append(&entry).await {
                error!(error = %e, store = %store.describe(), "Error writing to log file");
            }
        })
    }
}

impl Recorder {
    /// Wait for every spawned append to finish, up to `timeout`. Called once
    /// the listener has stopped so queued writes are not lost at exit.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let wait = async {
            while self.pending() > 0 {
                self.in_flight.idle.notified().await;
            }
        };
        match tokio::time::timeout(timeout, wait).await {
            Ok(()) => true,
            Err(_) => {
                warn!(pending = self.pending(), "Gave up waiting for pending appends");
                false
            }
        }
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .filter(|v| !v.is_empty())
}
