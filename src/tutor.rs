//! Debounced background worker for explanations.
//!
//! Explanation services are slow compared with the optics core, and inputs
//! change many times per second while a slider moves. The tutor coalesces
//! those changes and keeps at most one explainer call in flight.
//!
//! The worker provides:
//! - Debouncing: a request is explained only after a quiet interval
//! - Superseding: a newer request abandons the call in flight, whose late
//!   answer is never published
//! - Degradation: a failed or timed-out call publishes [`FALLBACK_MESSAGE`]
//!
//! The worker communicates over `crossbeam_channel` channels and stops when
//! the [`Tutor`] handle is dropped.
//!
//! # Explainer Calls
//!
//! All explainer calls run one at a time on a single `tutor-call` thread.
//! Calls queued behind a slow one are collapsed to the latest, so a hanging
//! explainer holds one thread no matter how often requests are superseded.
//! Requests made meanwhile time out and receive the fallback.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{after, select, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::explain::{ExplainRequest, Explainer, Unavailable, FALLBACK_MESSAGE};

/// Timing of the tutor worker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TutorSettings {
    /// Quiet interval before a request is explained.
    pub debounce_ms: u64,
    /// Longest wait for an explainer answer.
    pub timeout_ms: u64,
}

impl Default for TutorSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 1500,
            timeout_ms: 10_000,
        }
    }
}

impl TutorSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Longest wait for the explanation of a single request, fallback included.
    pub fn max_wait(&self) -> Duration {
        self.debounce() + self.timeout() + PUBLISH_GRACE
    }
}

/// Slack for the worker to publish a fallback once its deadline has passed.
const PUBLISH_GRACE: Duration = Duration::from_millis(500);

/// Where the text of an [`Explanation`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Source {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub request: ExplainRequest,
    pub text: String,
    pub source: Source,
}

impl Explanation {
    fn fallback(request: ExplainRequest) -> Self {
        Self {
            request,
            text: FALLBACK_MESSAGE.to_string(),
            source: Source::Fallback,
        }
    }
}

/// Handle of the explanation worker thread.
pub struct Tutor {
    requests: Option<Sender<ExplainRequest>>,
    explanations: Receiver<Explanation>,
    worker: Option<JoinHandle<()>>,
}

impl Tutor {
    /// Starts the worker thread around `explainer`.
    pub fn spawn(explainer: Arc<dyn Explainer>, settings: TutorSettings) -> std::io::Result<Self> {
        let (request_tx, request_rx) = unbounded();
        let (explanation_tx, explanation_rx) = unbounded();
        let (call_tx, call_rx) = unbounded();
        let (reply_tx, reply_rx) = unbounded();

        // never joined: it may be stuck in an explainer, and it exits after
        // its current call once the worker is gone
        thread::Builder::new()
            .name("tutor-call".to_string())
            .spawn(move || answer_calls(explainer, call_rx, reply_tx))?;

        let calls = Caller {
            calls: call_tx,
            replies: reply_rx,
            next_id: 0,
        };
        let worker = thread::Builder::new()
            .name("tutor".to_string())
            .spawn(move || run(calls, settings, request_rx, explanation_tx))?;

        Ok(Self {
            requests: Some(request_tx),
            explanations: explanation_rx,
            worker: Some(worker),
        })
    }

    /// Submits a request without blocking. Replaces any request that has not
    /// been answered yet.
    pub fn request(&self, request: ExplainRequest) {
        let sent = self
            .requests
            .as_ref()
            .map(|requests| requests.send(request).is_ok())
            .unwrap_or(false);
        if !sent {
            warn!("tutor worker has stopped, request dropped");
        }
    }

    /// Published explanations, in the order they were produced.
    pub fn explanations(&self) -> &Receiver<Explanation> {
        &self.explanations
    }
}

impl Drop for Tutor {
    fn drop(&mut self) {
        // closing the request channel stops the worker
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("tutor worker panicked");
            }
        }
    }
}

struct Call {
    id: u64,
    request: ExplainRequest,
}

struct Reply {
    id: u64,
    answer: Result<String, Unavailable>,
}

/// Worker side of the call thread.
struct Caller {
    calls: Sender<Call>,
    replies: Receiver<Reply>,
    next_id: u64,
}

impl Caller {
    /// Queues a call and returns its id, or `None` if the call thread is gone.
    fn start(&mut self, request: &ExplainRequest) -> Option<u64> {
        self.next_id += 1;
        let call = Call {
            id: self.next_id,
            request: request.clone(),
        };
        self.calls.send(call).ok().map(|_| self.next_id)
    }
}

/// Body of the call thread: answers the latest queued call, one at a time.
fn answer_calls(explainer: Arc<dyn Explainer>, calls: Receiver<Call>, replies: Sender<Reply>) {
    while let Ok(call) = calls.recv() {
        // calls queued behind a slow one are already superseded
        let call = calls.try_iter().last().unwrap_or(call);
        let answer = explainer.explain(&call.request);
        if replies.send(Reply { id: call.id, answer }).is_err() {
            return;
        }
    }
}

enum Outcome {
    Answered(Option<Result<String, Unavailable>>),
    Superseded(Option<ExplainRequest>),
    TimedOut,
}

fn run(
    mut caller: Caller,
    settings: TutorSettings,
    requests: Receiver<ExplainRequest>,
    explanations: Sender<Explanation>,
) {
    let mut pending: Option<ExplainRequest> = None;

    loop {
        let mut request = match pending.take() {
            Some(request) => request,
            None => match requests.recv() {
                Ok(request) => request,
                Err(_) => return,
            },
        };

        // debounce: keep the latest request until the inputs settle
        loop {
            match requests.recv_timeout(settings.debounce()) {
                Ok(newer) => request = newer,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }

        debug!(
            "tutor: explaining theta_i = {} deg, tir = {}",
            request.incident_angle_deg, request.total_internal_reflection
        );
        let Some(id) = caller.start(&request) else {
            warn!("tutor: explainer call thread has stopped");
            if explanations.send(Explanation::fallback(request)).is_err() {
                return;
            }
            continue;
        };
        let deadline = after(settings.timeout());

        let outcome = loop {
            // replies to superseded calls map to None and are skipped
            let outcome = select! {
                recv(caller.replies) -> reply => match reply {
                    Ok(reply) if reply.id == id => Some(Outcome::Answered(Some(reply.answer))),
                    Ok(_) => None,
                    Err(_) => Some(Outcome::Answered(None)),
                },
                recv(requests) -> newer => Some(Outcome::Superseded(newer.ok())),
                recv(deadline) -> _ => Some(Outcome::TimedOut),
            };
            if let Some(outcome) = outcome {
                break outcome;
            }
        };

        let explanation = match outcome {
            Outcome::Answered(Some(Ok(text))) => Explanation {
                request,
                text,
                source: Source::Generated,
            },
            Outcome::Answered(Some(Err(error))) => {
                warn!("tutor: {}", error);
                Explanation::fallback(request)
            }
            Outcome::Answered(None) => {
                warn!("tutor: explainer call ended without an answer");
                Explanation::fallback(request)
            }
            Outcome::Superseded(Some(newer)) => {
                debug!("tutor: call superseded by a newer request");
                pending = Some(newer);
                continue;
            }
            Outcome::Superseded(None) => return,
            Outcome::TimedOut => {
                warn!("tutor: explainer timed out after {} ms", settings.timeout_ms);
                Explanation::fallback(request)
            }
        };

        if explanations.send(explanation).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;
    use crate::explain::LocalExplainer;
    use crate::medium::{AIR, GLASS};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WAIT: Duration = Duration::from_secs(5);

    fn fast() -> TutorSettings {
        TutorSettings {
            debounce_ms: 30,
            timeout_ms: 2_000,
        }
    }

    fn request(angle: f64) -> ExplainRequest {
        let geometry = engine::compute(angle, AIR.refractive_index, GLASS.refractive_index).unwrap();
        ExplainRequest::from_geometry(&AIR, &GLASS, &geometry)
    }

    /// Counts calls and sleeps for `delay` on the given angle.
    struct Scripted {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
        slow_angle: Option<f64>,
        delay: Duration,
        fail: bool,
    }

    impl Scripted {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
                slow_angle: None,
                delay: Duration::ZERO,
                fail: false,
            }
        }
    }

    impl Explainer for Scripted {
        fn explain(&self, request: &ExplainRequest) -> Result<String, Unavailable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
            if self.slow_angle.map_or(true, |a| a == request.incident_angle_deg) {
                thread::sleep(self.delay);
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail {
                return Err(Unavailable("offline".to_string()));
            }
            Ok(format!("angle {}", request.incident_angle_deg))
        }
    }

    #[test]
    fn explains_single_request() {
        let tutor = Tutor::spawn(Arc::new(LocalExplainer), fast()).unwrap();
        tutor.request(request(45.0));
        let explanation = tutor.explanations().recv_timeout(WAIT).unwrap();
        assert_eq!(explanation.source, Source::Generated);
        assert_eq!(
            explanation.text,
            LocalExplainer.explain(&request(45.0)).unwrap()
        );
    }

    #[test]
    fn burst_is_coalesced() {
        let explainer = Arc::new(Scripted::new());
        let settings = TutorSettings {
            debounce_ms: 100,
            timeout_ms: 2_000,
        };
        let tutor = Tutor::spawn(explainer.clone(), settings).unwrap();
        for angle in [10.0, 20.0, 30.0, 40.0, 50.0] {
            tutor.request(request(angle));
        }
        let explanation = tutor.explanations().recv_timeout(WAIT).unwrap();
        assert_eq!(explanation.text, "angle 50");
        assert_eq!(explanation.request.incident_angle_deg, 50.0);
        assert!(tutor
            .explanations()
            .recv_timeout(Duration::from_millis(300))
            .is_err());
        assert_eq!(explainer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_degrades_to_fallback() {
        let explainer = Scripted {
            fail: true,
            ..Scripted::new()
        };
        let tutor = Tutor::spawn(Arc::new(explainer), fast()).unwrap();
        tutor.request(request(30.0));
        let explanation = tutor.explanations().recv_timeout(WAIT).unwrap();
        assert_eq!(explanation.source, Source::Fallback);
        assert_eq!(explanation.text, FALLBACK_MESSAGE);
    }

    #[test]
    fn timeout_degrades_to_fallback() {
        let explainer = Scripted {
            delay: Duration::from_millis(1_000),
            ..Scripted::new()
        };
        let settings = TutorSettings {
            debounce_ms: 10,
            timeout_ms: 50,
        };
        let tutor = Tutor::spawn(Arc::new(explainer), settings).unwrap();
        tutor.request(request(30.0));
        let explanation = tutor.explanations().recv_timeout(WAIT).unwrap();
        assert_eq!(explanation.source, Source::Fallback);
        assert_eq!(explanation.request.incident_angle_deg, 30.0);
    }

    #[test]
    fn newer_request_supersedes_call_in_flight() {
        let explainer = Scripted {
            slow_angle: Some(10.0),
            delay: Duration::from_millis(400),
            ..Scripted::new()
        };
        let tutor = Tutor::spawn(Arc::new(explainer), fast()).unwrap();
        tutor.request(request(10.0));
        // let the debounce expire so the slow call is in flight
        thread::sleep(Duration::from_millis(150));
        tutor.request(request(20.0));

        let explanation = tutor.explanations().recv_timeout(WAIT).unwrap();
        assert_eq!(explanation.text, "angle 20");
        assert!(tutor
            .explanations()
            .recv_timeout(Duration::from_millis(600))
            .is_err());
    }

    #[test]
    fn slow_calls_run_one_at_a_time() {
        let explainer = Arc::new(Scripted {
            delay: Duration::from_millis(300),
            ..Scripted::new()
        });
        let tutor = Tutor::spawn(explainer.clone(), fast()).unwrap();
        for angle in [10.0, 20.0, 30.0] {
            tutor.request(request(angle));
            thread::sleep(Duration::from_millis(100));
        }

        let explanation = tutor.explanations().recv_timeout(WAIT).unwrap();
        assert_eq!(explanation.text, "angle 30");
        assert_eq!(explainer.peak_in_flight.load(Ordering::SeqCst), 1);
        // the call for 20 was queued behind 10 and collapsed into 30
        assert_eq!(explainer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn max_wait_covers_fallback() {
        let explainer = Scripted {
            delay: Duration::from_millis(2_000),
            ..Scripted::new()
        };
        let settings = TutorSettings {
            debounce_ms: 100,
            timeout_ms: 200,
        };
        assert!(settings.max_wait() > settings.debounce() + settings.timeout());
        let tutor = Tutor::spawn(Arc::new(explainer), settings).unwrap();
        tutor.request(request(30.0));
        let explanation = tutor
            .explanations()
            .recv_timeout(settings.max_wait())
            .unwrap();
        assert_eq!(explanation.source, Source::Fallback);
        assert_eq!(explanation.text, FALLBACK_MESSAGE);
    }

    #[test]
    fn drop_stops_worker() {
        let tutor = Tutor::spawn(Arc::new(LocalExplainer), fast()).unwrap();
        tutor.request(request(45.0));
        drop(tutor);
    }
}
