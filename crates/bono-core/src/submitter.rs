//! Risk submission with a single in-flight guard.
//!
//! Every call to [`Submitter::submit`] takes a new ticket. Starting a
//! submission supersedes whichever one was in flight: when the older
//! response eventually arrives it is dropped and the caller gets
//! `BonoError::Superseded`. The displayed result therefore always belongs to
//! the most recently started submission, whatever order responses finish in.
//!
//! The underlying request is not aborted; only its effect is discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use bono_contracts::{
    api::{RiskRequest, ShapPlotRequest, SitePlots},
    error::{BonoError, BonoResult},
    patient::PatientRecord,
    risk::{FractureSite, RiskHorizon, RiskResult},
};

use crate::traits::ScoringBackend;

/// The notification shown for any network or server failure.
pub const FAILURE_NOTICE: &str = "Could not calculate the fracture risk. Please try again.";

/// Whether and how to fetch SHAP explanations after a successful risk call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExplainMode {
    #[default]
    None,
    /// One `getShapPlot` request per site.
    PerSite,
    /// One `getShapPlots` request for all sites.
    Batch,
}

/// Where the submission pipeline currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting { ticket: u64 },
    Succeeded { ticket: u64 },
    Failed { ticket: u64 },
}

/// The outcome of a submission that was still current when it finished.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub ticket: u64,
    pub result: RiskResult,
    /// Present when explanations were requested and fetched.
    pub plots: Option<SitePlots>,
    /// Why explanations are missing, when they were requested but failed.
    pub explanation_error: Option<String>,
}

#[derive(Debug, Default)]
struct View {
    status: SubmissionStatus,
    current: Option<Submission>,
    notice: Option<String>,
}

/// Submits patient records and owns the result on display.
pub struct Submitter {
    backend: Box<dyn ScoringBackend>,
    latest: AtomicU64,
    view: Mutex<View>,
}

impl Submitter {
    pub fn new(backend: Box<dyn ScoringBackend>) -> Self {
        Self {
            backend,
            latest: AtomicU64::new(0),
            view: Mutex::new(View::default()),
        }
    }

    /// Submit `record` for `horizon`, superseding any submission in flight.
    ///
    /// On success the returned `Submission` has replaced the displayed one.
    /// On a network or server failure the previous result stays on display,
    /// the generic failure notice is set, and the error is returned.
    pub fn submit(
        &self,
        record: &PatientRecord,
        horizon: RiskHorizon,
        explain: ExplainMode,
    ) -> BonoResult<Submission> {
        let request_id = Uuid::new_v4();
        // Ticket and status change together so an older submission can
        // never mark itself in flight after a newer one.
        let ticket = {
            let mut view = self.view();
            let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            view.status = SubmissionStatus::Submitting { ticket };
            view.notice = None;
            ticket
        };
        info!(ticket, %request_id, horizon = horizon.years(), "submitting risk request");

        let request = RiskRequest {
            risk_horizon: horizon,
            patient_data: record.clone(),
        };

        let response = match self.backend.risk(&request) {
            Ok(response) => response,
            Err(e) => return Err(self.fail(ticket, e)),
        };
        if !self.is_current(ticket) {
            debug!(ticket, %request_id, "risk response arrived after a newer submission; dropping");
            return Err(BonoError::Superseded { ticket });
        }

        let result = RiskResult {
            risks: response.risks,
            horizon,
            request_id,
            received_at: Utc::now(),
        };

        let (plots, explanation_error) = match self.explain(&request, explain) {
            Ok(plots) => (plots, None),
            Err(e) => {
                warn!(ticket, %request_id, error = %e, "explanation fetch failed; keeping risk result");
                (None, Some(e.to_string()))
            }
        };

        let submission = Submission {
            ticket,
            result,
            plots,
            explanation_error,
        };

        let mut view = self.view();
        // Checked under the lock so a newer submission can only publish
        // after this one.
        if !self.is_current(ticket) {
            debug!(ticket, %request_id, "submission superseded while explaining; dropping");
            return Err(BonoError::Superseded { ticket });
        }
        view.status = SubmissionStatus::Succeeded { ticket };
        view.current = Some(submission.clone());
        info!(
            ticket,
            %request_id,
            vertebral = submission.result.risks.vertebral,
            hip = submission.result.risks.hip,
            any = submission.result.risks.any,
            "risk result replaced"
        );
        Ok(submission)
    }

    /// Drop whatever is in flight. Its response will be discarded.
    pub fn cancel(&self) {
        let mut view = self.view();
        let superseded = self.latest.fetch_add(1, Ordering::SeqCst);
        if matches!(view.status, SubmissionStatus::Submitting { .. }) {
            view.status = SubmissionStatus::Idle;
        }
        debug!(superseded, "cancelled in-flight submission");
    }

    pub fn status(&self) -> SubmissionStatus {
        self.view().status
    }

    /// The result currently on display.
    pub fn current(&self) -> Option<Submission> {
        self.view().current.clone()
    }

    /// The notification to show the user, if the last submission failed.
    pub fn notice(&self) -> Option<String> {
        self.view().notice.clone()
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    fn fail(&self, ticket: u64, error: BonoError) -> BonoError {
        let mut view = self.view();
        if !self.is_current(ticket) {
            debug!(ticket, error = %error, "stale submission failed; ignoring");
            return BonoError::Superseded { ticket };
        }
        warn!(ticket, error = %error, "risk submission failed");
        view.status = SubmissionStatus::Failed { ticket };
        view.notice = Some(FAILURE_NOTICE.to_string());
        error
    }

    fn explain(&self, request: &RiskRequest, mode: ExplainMode) -> BonoResult<Option<SitePlots>> {
        match mode {
            ExplainMode::None => Ok(None),
            ExplainMode::Batch => self.backend.shap_plots(request).map(Some),
            ExplainMode::PerSite => {
                let fetch = |site: FractureSite| {
                    self.backend.shap_plot(&ShapPlotRequest {
                        risk_horizon: request.risk_horizon,
                        patient_data: request.patient_data.clone(),
                        fx_type: site,
                    })
                };
                Ok(Some(SitePlots {
                    vertebral: fetch(FractureSite::Vertebral)?,
                    hip: fetch(FractureSite::Hip)?,
                    any: fetch(FractureSite::Any)?,
                }))
            }
        }
    }

    fn view(&self) -> MutexGuard<'_, View> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::{channel, Receiver, Sender};
    use std::sync::{Arc, Mutex};
    use std::thread;

    use bono_contracts::{
        api::{RiskRequest, RiskResponse, ShapPlot, ShapPlotRequest, SitePlots},
        error::{BonoError, BonoResult},
        patient::PatientRecord,
        risk::{FractureSite, RiskHorizon, SiteRisks},
    };

    use crate::traits::ScoringBackend;

    use super::{ExplainMode, SubmissionStatus, Submitter, FAILURE_NOTICE};

    // ── Mock helpers ─────────────────────────────────────────────────────────

    fn horizon(years: u8) -> RiskHorizon {
        RiskHorizon::new(years).unwrap()
    }

    /// Risks derived from the horizon so tests can tell responses apart.
    fn risks_for(h: RiskHorizon) -> SiteRisks {
        let y = f64::from(h.years());
        SiteRisks { vertebral: y, hip: y / 10.0, any: y * 2.0 }
    }

    fn plot(tag: &str) -> ShapPlot {
        ShapPlot(format!("plot-{tag}"))
    }

    #[derive(Default)]
    struct MockBackend {
        fail_risk: Arc<AtomicBool>,
        fail_plots: bool,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScoringBackend for MockBackend {
        fn risk(&self, request: &RiskRequest) -> BonoResult<RiskResponse> {
            self.calls.lock().unwrap().push("risk".to_string());
            if self.fail_risk.load(Ordering::SeqCst) {
                return Err(BonoError::Server {
                    status: 500,
                    detail: "Internal server error during risk calculation".to_string(),
                });
            }
            Ok(RiskResponse {
                message: Some("Risk score successfully calculated.".to_string()),
                risks: risks_for(request.risk_horizon),
            })
        }

        fn shap_plot(&self, request: &ShapPlotRequest) -> BonoResult<ShapPlot> {
            self.calls.lock().unwrap().push(format!("shap:{}", request.fx_type));
            if self.fail_plots {
                return Err(BonoError::Transport { reason: "connection reset".to_string() });
            }
            Ok(plot(request.fx_type.as_str()))
        }

        fn shap_plots(&self, _request: &RiskRequest) -> BonoResult<SitePlots> {
            self.calls.lock().unwrap().push("shap:batch".to_string());
            if self.fail_plots {
                return Err(BonoError::Transport { reason: "connection reset".to_string() });
            }
            Ok(SitePlots { vertebral: plot("v"), hip: plot("h"), any: plot("a") })
        }
    }

    /// Holds every 1-year request until released, so a later submission can
    /// overtake it.
    struct GatedBackend {
        entered: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    impl ScoringBackend for GatedBackend {
        fn risk(&self, request: &RiskRequest) -> BonoResult<RiskResponse> {
            if request.risk_horizon.years() == 1 {
                self.entered.lock().unwrap().send(()).unwrap();
                self.release.lock().unwrap().recv().unwrap();
            }
            Ok(RiskResponse { message: None, risks: risks_for(request.risk_horizon) })
        }

        fn shap_plot(&self, _request: &ShapPlotRequest) -> BonoResult<ShapPlot> {
            Ok(plot("x"))
        }

        fn shap_plots(&self, _request: &RiskRequest) -> BonoResult<SitePlots> {
            Ok(SitePlots { vertebral: plot("v"), hip: plot("h"), any: plot("a") })
        }
    }

    // ── Test cases ────────────────────────────────────────────────────────────

    /// A successful response is displayed exactly as returned.
    #[test]
    fn test_success_populates_result_verbatim() {
        let submitter = Submitter::new(Box::new(MockBackend::default()));
        assert_eq!(submitter.status(), SubmissionStatus::Idle);

        let submission = submitter
            .submit(&PatientRecord::default(), horizon(3), ExplainMode::None)
            .unwrap();

        assert_eq!(submission.result.risks, SiteRisks { vertebral: 3.0, hip: 0.3, any: 6.0 });
        assert_eq!(submission.result.horizon, horizon(3));
        assert!(submission.plots.is_none());
        assert_eq!(submitter.current().unwrap(), submission);
        assert_eq!(submitter.status(), SubmissionStatus::Succeeded { ticket: 1 });
        assert!(submitter.notice().is_none());
    }

    /// Resubmitting replaces the result wholesale.
    #[test]
    fn test_resubmission_replaces_result() {
        let submitter = Submitter::new(Box::new(MockBackend::default()));
        submitter.submit(&PatientRecord::default(), horizon(2), ExplainMode::None).unwrap();
        submitter.submit(&PatientRecord::default(), horizon(5), ExplainMode::None).unwrap();

        let current = submitter.current().unwrap();
        assert_eq!(current.ticket, 2);
        assert_eq!(current.result.risks.vertebral, 5.0);
    }

    /// A failed call keeps the previous result and raises the generic notice.
    #[test]
    fn test_failure_sets_notice_and_keeps_previous_result() {
        let fail_risk = Arc::new(AtomicBool::new(false));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let submitter = Submitter::new(Box::new(MockBackend {
            fail_risk: fail_risk.clone(),
            calls: calls.clone(),
            ..Default::default()
        }));
        let first = submitter
            .submit(&PatientRecord::default(), horizon(2), ExplainMode::None)
            .unwrap();

        fail_risk.store(true, Ordering::SeqCst);
        let err = submitter
            .submit(&PatientRecord::default(), horizon(5), ExplainMode::Batch)
            .unwrap_err();

        assert!(matches!(err, BonoError::Server { status: 500, .. }));
        assert_eq!(submitter.status(), SubmissionStatus::Failed { ticket: 2 });
        assert_eq!(submitter.notice().as_deref(), Some(FAILURE_NOTICE));
        assert_eq!(submitter.current().unwrap(), first);
        // Single attempt each, and no explanation call after a failed risk call.
        assert_eq!(*calls.lock().unwrap(), vec!["risk", "risk"]);

        // The next successful submission clears the notice.
        fail_risk.store(false, Ordering::SeqCst);
        submitter.submit(&PatientRecord::default(), horizon(5), ExplainMode::None).unwrap();
        assert!(submitter.notice().is_none());
    }

    #[test]
    fn test_per_site_explanations_fetch_each_site() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let submitter = Submitter::new(Box::new(MockBackend { calls: calls.clone(), ..Default::default() }));

        let submission = submitter
            .submit(&PatientRecord::default(), horizon(2), ExplainMode::PerSite)
            .unwrap();

        let plots = submission.plots.unwrap();
        assert_eq!(plots.get(FractureSite::Hip), &plot("hip"));
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["risk", "shap:vertebral", "shap:hip", "shap:any"]
        );
    }

    #[test]
    fn test_batch_explanations() {
        let submitter = Submitter::new(Box::new(MockBackend::default()));
        let submission = submitter
            .submit(&PatientRecord::default(), horizon(2), ExplainMode::Batch)
            .unwrap();
        assert_eq!(submission.plots.unwrap().any, plot("a"));
    }

    /// Explanations are supplementary: their failure must not discard the risk.
    #[test]
    fn test_explanation_failure_keeps_risk() {
        let submitter = Submitter::new(Box::new(MockBackend { fail_plots: true, ..Default::default() }));
        let submission = submitter
            .submit(&PatientRecord::default(), horizon(4), ExplainMode::PerSite)
            .unwrap();

        assert!(submission.plots.is_none());
        assert!(submission.explanation_error.unwrap().contains("connection reset"));
        assert_eq!(submitter.current().unwrap().result.risks.vertebral, 4.0);
        assert!(submitter.notice().is_none());
    }

    /// The core ordering guarantee: a submission started earlier but finishing
    /// later never overwrites the newer result.
    #[test]
    fn test_stale_response_never_overwrites_newer_result() {
        let (entered_tx, entered_rx) = channel();
        let (release_tx, release_rx) = channel();
        let submitter = Arc::new(Submitter::new(Box::new(GatedBackend {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        })));

        let slow = {
            let submitter = submitter.clone();
            thread::spawn(move || {
                submitter.submit(&PatientRecord::default(), horizon(1), ExplainMode::None)
            })
        };

        // Wait until the slow submission holds ticket 1 and is in the backend.
        entered_rx.recv().unwrap();

        let fast = submitter
            .submit(&PatientRecord::default(), horizon(6), ExplainMode::None)
            .unwrap();
        assert_eq!(fast.ticket, 2);

        release_tx.send(()).unwrap();
        let stale = slow.join().unwrap();

        assert!(matches!(stale, Err(BonoError::Superseded { ticket: 1 })));
        let current = submitter.current().unwrap();
        assert_eq!(current.ticket, 2);
        assert_eq!(current.result.risks.vertebral, 6.0);
        assert_eq!(submitter.status(), SubmissionStatus::Succeeded { ticket: 2 });
    }

    #[test]
    fn test_cancel_discards_in_flight_response() {
        let (entered_tx, entered_rx) = channel();
        let (release_tx, release_rx) = channel();
        let submitter = Arc::new(Submitter::new(Box::new(GatedBackend {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        })));

        let in_flight = {
            let submitter = submitter.clone();
            thread::spawn(move || {
                submitter.submit(&PatientRecord::default(), horizon(1), ExplainMode::None)
            })
        };
        entered_rx.recv().unwrap();

        submitter.cancel();
        assert_eq!(submitter.status(), SubmissionStatus::Idle);

        release_tx.send(()).unwrap();
        assert!(matches!(in_flight.join().unwrap(), Err(BonoError::Superseded { .. })));
        assert!(submitter.current().is_none());
        assert_eq!(submitter.status(), SubmissionStatus::Idle);
    }

    /// However overlapping submissions interleave, once they have all
    /// returned the newest one owns the status.
    #[test]
    fn test_concurrent_submissions_never_leave_status_submitting() {
        const THREADS: u64 = 4;
        for _ in 0..500 {
            let submitter = Arc::new(Submitter::new(Box::new(MockBackend::default())));
            let handles: Vec<_> = (0..THREADS)
                .map(|i| {
                    let submitter = submitter.clone();
                    thread::spawn(move || {
                        let years = u8::try_from(i % 7 + 1).unwrap();
                        submitter.submit(&PatientRecord::default(), horizon(years), ExplainMode::None)
                    })
                })
                .collect();
            for handle in handles {
                let _ = handle.join().unwrap();
            }

            assert_eq!(submitter.status(), SubmissionStatus::Succeeded { ticket: THREADS });
            assert_eq!(submitter.current().unwrap().ticket, THREADS);
            assert!(submitter.notice().is_none());
        }
    }
}
