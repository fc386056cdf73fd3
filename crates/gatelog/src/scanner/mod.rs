//! The QR ingest loop.
//!
//! A scan session consumes detections in arrival order, debounces repeated
//! codes by value and elapsed time, and writes one access event per
//! accepted detection. The debounce state is explicit and owned by the
//! session, scoped to its lifetime.

pub mod frame;

use std::io::BufRead;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::event::AccessEvent;
use crate::storage::Storage;

pub use frame::{BoundingBox, Detection, Frame, QrDetector};

/// Duplicate suppression by code value and elapsed time.
///
/// A payload is accepted iff it differs from the last accepted code or the
/// cooldown has elapsed since the last acceptance. State only advances via
/// [`Debounce::mark_accepted`], so a failed insert leaves the window open
/// for an immediate retry of the same code.
#[derive(Debug, Clone)]
pub struct Debounce {
    cooldown: Duration,
    last_code: Option<String>,
    last_accepted: Option<Instant>,
}

impl Debounce {
    /// Create a debounce window with the given cooldown.
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_code: None,
            last_accepted: None,
        }
    }

    /// The configured cooldown.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Whether a payload seen at `now` should be accepted.
    #[must_use]
    pub fn should_accept(&self, payload: &str, now: Instant) -> bool {
        match (&self.last_code, self.last_accepted) {
            (Some(last_code), Some(last_accepted)) => {
                payload != last_code || now.saturating_duration_since(last_accepted) > self.cooldown
            }
            // Nothing accepted yet.
            _ => true,
        }
    }

    /// Record an accepted payload.
    pub fn mark_accepted(&mut self, payload: &str, now: Instant) {
        self.last_code = Some(payload.to_string());
        self.last_accepted = Some(now);
    }
}

/// The transient status shown to the operator after the latest attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    /// The last accepted code was stored.
    Saved {
        /// The stored code value.
        code: String,
    },
    /// The last insert attempt failed.
    Failed {
        /// The error text.
        message: String,
    },
}

impl ScanStatus {
    /// Whether the status reports success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Saved { code } => write!(f, "Saved: {code}"),
            Self::Failed { message } => write!(f, "{message}"),
        }
    }
}

/// What a single observed detection resulted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The payload was accepted and stored under the given event id.
    Inserted {
        /// Assigned access-log id.
        id: i64,
    },
    /// The payload was suppressed by the debounce window.
    Suppressed,
    /// The frame carried no decoded payload.
    NoDetection,
    /// The insert failed; the error text is in the session status.
    InsertFailed,
}

/// One camera session's ingest state.
#[derive(Debug)]
pub struct ScanSession<'a> {
    storage: &'a Storage,
    debounce: Debounce,
    status: Option<ScanStatus>,
    accepted: u64,
}

impl<'a> ScanSession<'a> {
    /// Create a session writing to `storage` with the given cooldown.
    #[must_use]
    pub fn new(storage: &'a Storage, cooldown: Duration) -> Self {
        Self {
            storage,
            debounce: Debounce::new(cooldown),
            status: None,
            accepted: 0,
        }
    }

    /// The status of the most recent attempt, if any.
    #[must_use]
    pub fn status(&self) -> Option<&ScanStatus> {
        self.status.as_ref()
    }

    /// Accepted detections so far.
    #[must_use]
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Process one detection.
    ///
    /// Accepted payloads trigger exactly one insert attempt. On success the
    /// debounce state advances; on failure it does not, so the same payload
    /// retries on the next frame if it is still seen. Insert failures are
    /// captured in the session status rather than propagated.
    pub fn observe(&mut self, detection: &Detection, now: Instant) -> ScanOutcome {
        let Some(payload) = detection.payload.as_deref() else {
            return ScanOutcome::NoDetection;
        };

        if !self.debounce.should_accept(payload, now) {
            debug!("Suppressed repeat of current code within cooldown");
            return ScanOutcome::Suppressed;
        }

        let event = AccessEvent::qr(payload);
        match self.storage.insert_event(&event) {
            Ok(id) => {
                self.debounce.mark_accepted(payload, now);
                self.accepted += 1;
                self.status = Some(ScanStatus::Saved {
                    code: payload.to_string(),
                });
                ScanOutcome::Inserted { id }
            }
            Err(err) => {
                self.status = Some(ScanStatus::Failed {
                    message: err.to_string(),
                });
                ScanOutcome::InsertFailed
            }
        }
    }

    /// Consume detections until the source closes its channel.
    ///
    /// Detections are handled strictly in arrival order with one insert
    /// attempt in flight at a time. Returns the accepted count.
    pub async fn run(&mut self, mut rx: mpsc::Receiver<Detection>) -> u64 {
        while let Some(detection) = rx.recv().await {
            match self.observe(&detection, Instant::now()) {
                ScanOutcome::Inserted { id } => {
                    info!("Saved code as access event {id}");
                }
                ScanOutcome::InsertFailed => {
                    if let Some(status) = &self.status {
                        warn!("Insert failed: {status}");
                    }
                }
                ScanOutcome::Suppressed | ScanOutcome::NoDetection => {}
            }
        }
        self.accepted
    }
}

/// A source of decoded detections.
///
/// The source owns its own thread or callback mechanism and delivers
/// detections through the channel until it ends, then drops the sender.
pub trait DetectionSource: Send {
    /// The name of this source (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Start delivering detections through `tx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails to start.
    fn start(&mut self, tx: mpsc::Sender<Detection>) -> Result<()>;
}

/// Reads one decoded payload per line from standard input.
///
/// A blank line stands for a frame with no decode; end of input closes the
/// channel. This drives the ingest loop without a camera attached.
#[derive(Debug, Default)]
pub struct StdinSource;

impl StdinSource {
    /// Create a stdin-backed detection source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DetectionSource for StdinSource {
    fn name(&self) -> &'static str {
        "stdin"
    }

    fn start(&mut self, tx: mpsc::Sender<Detection>) -> Result<()> {
        std::thread::Builder::new()
            .name("gatelog-stdin".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    let trimmed = line.trim();
                    let detection = if trimmed.is_empty() {
                        Detection::none()
                    } else {
                        Detection::decoded(trimmed)
                    };
                    if tx.blocking_send(detection).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| Error::source_start("stdin", e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cooldown() -> Duration {
        Duration::from_secs(2)
    }

    #[test]
    fn test_debounce_first_payload_accepted() {
        let debounce = Debounce::new(cooldown());
        assert!(debounce.should_accept("A", Instant::now()));
    }

    #[test]
    fn test_debounce_sequence_matches_cooldown_rule() {
        // Codes A,A,B at t=0,1,3 with a 2s cooldown: accepts A@0 and B@3.
        let t0 = Instant::now();
        let mut debounce = Debounce::new(cooldown());

        assert!(debounce.should_accept("A", t0));
        debounce.mark_accepted("A", t0);

        assert!(!debounce.should_accept("A", t0 + Duration::from_secs(1)));
        assert!(debounce.should_accept("B", t0 + Duration::from_secs(3)));
    }

    #[test]
    fn test_debounce_same_code_after_cooldown() {
        let t0 = Instant::now();
        let mut debounce = Debounce::new(cooldown());
        debounce.mark_accepted("A", t0);

        // Exactly at the cooldown boundary is still suppressed.
        assert!(!debounce.should_accept("A", t0 + Duration::from_secs(2)));
        assert!(debounce.should_accept("A", t0 + Duration::from_millis(2001)));
    }

    #[test]
    fn test_debounce_different_code_inside_cooldown() {
        let t0 = Instant::now();
        let mut debounce = Debounce::new(cooldown());
        debounce.mark_accepted("A", t0);

        assert!(debounce.should_accept("B", t0 + Duration::from_millis(100)));
    }

    #[test]
    fn test_session_observe_inserts_and_suppresses() {
        let storage = Storage::open_in_memory().unwrap();
        let mut session = ScanSession::new(&storage, cooldown());
        let t0 = Instant::now();

        let first = session.observe(&Detection::decoded("A"), t0);
        assert!(matches!(first, ScanOutcome::Inserted { .. }));

        let repeat = session.observe(&Detection::decoded("A"), t0 + Duration::from_secs(1));
        assert_eq!(repeat, ScanOutcome::Suppressed);

        let other = session.observe(&Detection::decoded("B"), t0 + Duration::from_secs(3));
        assert!(matches!(other, ScanOutcome::Inserted { .. }));

        assert_eq!(session.accepted(), 2);
        assert_eq!(storage.count_events().unwrap(), 2);
    }

    #[test]
    fn test_session_no_detection_is_inert() {
        let storage = Storage::open_in_memory().unwrap();
        let mut session = ScanSession::new(&storage, cooldown());

        let outcome = session.observe(&Detection::none(), Instant::now());
        assert_eq!(outcome, ScanOutcome::NoDetection);
        assert!(session.status().is_none());
        assert_eq!(storage.count_events().unwrap(), 0);
    }

    #[test]
    fn test_session_status_after_save() {
        let storage = Storage::open_in_memory().unwrap();
        let mut session = ScanSession::new(&storage, cooldown());

        session.observe(&Detection::decoded("GATE-1"), Instant::now());

        let status = session.status().unwrap();
        assert!(status.is_ok());
        assert_eq!(status.to_string(), "Saved: GATE-1");
    }

    #[test]
    fn test_session_bounds_only_detection_records_nothing() {
        // A located region without a decoded payload has no data consequence.
        let storage = Storage::open_in_memory().unwrap();
        let mut session = ScanSession::new(&storage, cooldown());

        let detection = Detection::none().with_bounds(BoundingBox::new(vec![(0, 0), (5, 5)]));
        let outcome = session.observe(&detection, Instant::now());

        assert_eq!(outcome, ScanOutcome::NoDetection);
        assert_eq!(storage.count_events().unwrap(), 0);
    }

    #[test]
    fn test_run_consumes_in_arrival_order() {
        let storage = Storage::open_in_memory().unwrap();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        let accepted = runtime.block_on(async {
            let (tx, rx) = mpsc::channel(8);
            tx.send(Detection::decoded("A")).await.unwrap();
            tx.send(Detection::decoded("A")).await.unwrap();
            tx.send(Detection::none()).await.unwrap();
            tx.send(Detection::decoded("B")).await.unwrap();
            drop(tx);

            let mut session = ScanSession::new(&storage, cooldown());
            session.run(rx).await
        });

        // The immediate repeat of A is inside the cooldown window.
        assert_eq!(accepted, 2);

        let events = storage.recent_events(10).unwrap();
        let codes: Vec<_> = events.iter().map(|e| e.code_value.as_str()).collect();
        assert!(codes.contains(&"A"));
        assert!(codes.contains(&"B"));
    }

    #[test]
    fn test_scan_status_display() {
        let saved = ScanStatus::Saved {
            code: "X".to_string(),
        };
        assert_eq!(saved.to_string(), "Saved: X");
        assert!(saved.is_ok());

        let failed = ScanStatus::Failed {
            message: "database query failed: disk I/O error".to_string(),
        };
        assert!(!failed.is_ok());
        assert!(failed.to_string().contains("disk I/O error"));
    }

    #[test]
    fn test_stdin_source_name() {
        assert_eq!(StdinSource::new().name(), "stdin");
    }
}
