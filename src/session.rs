//! One drawing session: the surface, the label table, the prediction panel
//! state and the classify scheduling, owned in one place and driven by
//! explicit calls from the UI loop.
//!
//! The session never runs the model itself. [`Session::poll`] hands out a
//! [`ClassifyRequest`] when a debounced classify pass is due, and the caller
//! feeds the answer back through [`Session::complete`]. At most one request is
//! in flight; results are applied in the order they arrive.

use crate::error::Result;
use crate::preprocess::preprocess;
use crate::presenter::{ModelStatus, PredictionView, present};
use crate::ranking::rank;
use crate::surface::{DrawingSurface, InputEvent, SurfaceGeometry, SurfaceOutcome};
use crate::types::Grid;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Delay between releasing a stroke and classifying it.
pub const STROKE_END_DEBOUNCE: Duration = Duration::from_millis(300);
/// Delay between an undo and re-classifying what is left.
pub const UNDO_DEBOUNCE: Duration = Duration::from_millis(100);

/// A classify pass the caller should run.
#[derive(Debug)]
pub struct ClassifyRequest {
    pub seq: u64,
    pub grid: Grid,
    /// Taken before preprocessing, so reported timings cover the whole pass.
    pub started: Instant,
}

/// The settled result of a [`ClassifyRequest`].
#[derive(Debug)]
pub struct ClassifyOutcome {
    pub seq: u64,
    pub elapsed: Duration,
    pub result: Result<Vec<f32>>,
}

pub struct Session {
    surface: DrawingSurface,
    labels: Vec<String>,
    top_k: usize,
    status: ModelStatus,
    view: PredictionView,
    due: Option<Instant>,
    in_flight: Option<u64>,
    next_seq: u64,
}

impl Session {
    pub fn new(geometry: SurfaceGeometry, labels: Vec<String>, top_k: usize) -> Self {
        Self {
            surface: DrawingSurface::new(geometry),
            labels,
            top_k,
            status: ModelStatus::Loading,
            view: PredictionView::idle(),
            due: None,
            in_flight: None,
            next_seq: 0,
        }
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn view(&self) -> &PredictionView {
        &self.view
    }

    pub fn status(&self) -> ModelStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ModelStatus) {
        self.status = status;
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn set_labels(&mut self, labels: Vec<String>) {
        self.labels = labels;
    }

    /// When the next classify pass becomes due, if one is scheduled.
    pub fn due_at(&self) -> Option<Instant> {
        self.due
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// Feed one input event. A stroke that ends with content on the surface
    /// schedules a classify pass.
    pub fn handle_input(&mut self, event: &InputEvent, now: Instant) -> SurfaceOutcome {
        let outcome = self.surface.handle(event);
        if let SurfaceOutcome::Ended { .. } = outcome {
            if !self.surface.store().is_empty() {
                self.due = Some(now + STROKE_END_DEBOUNCE);
            }
        }
        outcome
    }

    /// Remove the last stroke. Re-classifies what is left, or resets the
    /// panel when nothing is left.
    pub fn undo(&mut self, now: Instant) -> bool {
        if !self.surface.undo() {
            return false;
        }
        info!(remaining = self.surface.store().len(), "undo stroke");
        if self.surface.store().is_empty() {
            self.due = None;
            self.view = PredictionView::idle();
        } else {
            self.due = Some(now + UNDO_DEBOUNCE);
        }
        true
    }

    /// Wipe strokes, surface and panel. A request already in flight is
    /// abandoned, not cancelled.
    pub fn clear(&mut self) {
        self.surface.clear();
        self.view = PredictionView::idle();
        self.due = None;
        self.in_flight = None;
        info!("canvas cleared");
    }

    /// Hand out the classify pass if it is due and nothing is in flight.
    ///
    /// A due pass is dropped when the model is not ready or the surface is
    /// empty by then; a preprocess failure shows the error row instead.
    pub fn poll(&mut self, now: Instant) -> Option<ClassifyRequest> {
        let due = self.due?;
        if now < due || self.in_flight.is_some() {
            return None;
        }
        self.due = None;

        if self.status != ModelStatus::Ready {
            debug!("classify pass skipped: model not ready");
            return None;
        }
        if self.surface.store().is_empty() {
            return None;
        }

        let started = Instant::now();
        let grid = match preprocess(self.surface.framebuffer()) {
            Ok(grid) => grid,
            Err(e) => {
                error!("prediction error: {e}");
                self.view = PredictionView::error();
                return None;
            }
        };
        let stats = grid.stats();
        debug!(min = stats.min, max = stats.max, mean = stats.mean, "input grid");

        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight = Some(seq);
        Some(ClassifyRequest { seq, grid, started })
    }

    /// Apply a settled classify pass. The last one to arrive wins the panel.
    pub fn complete(&mut self, outcome: ClassifyOutcome) {
        if self.in_flight == Some(outcome.seq) {
            self.in_flight = None;
        }
        if self.surface.store().is_empty() {
            debug!(seq = outcome.seq, "dropping result for an empty surface");
            return;
        }

        match outcome.result {
            Ok(probabilities) => {
                let ranked = rank(&probabilities, &self.labels, self.top_k);
                info!(
                    seq = outcome.seq,
                    ms = outcome.elapsed.as_millis() as u64,
                    "prediction done, top: {:?}",
                    ranked.iter().take(3).map(|p| (&p.label, p.confidence)).collect::<Vec<_>>()
                );
                self.view = present(&ranked, outcome.elapsed);
            }
            Err(e) => {
                error!(seq = outcome.seq, "prediction error: {e}");
                self.view = PredictionView::error();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::presenter::{EMPTY_TEXT, ERROR_LABEL, IDLE_TEXT};
    use crate::surface::ClientPoint;

    fn session() -> Session {
        let labels = ["cat", "dog", "sun"].iter().map(|s| s.to_string()).collect();
        let mut s = Session::new(SurfaceGeometry::square(0.0, 0.0, 280.0, 280.0), labels, 3);
        s.set_status(ModelStatus::Ready);
        s
    }

    fn stroke(s: &mut Session, y: f32, now: Instant) {
        s.handle_input(&InputEvent::PointerDown(ClientPoint::new(20.0, y)), now);
        s.handle_input(&InputEvent::PointerMove(ClientPoint::new(200.0, y)), now);
        s.handle_input(&InputEvent::PointerUp, now);
    }

    fn ok(seq: u64, probs: &[f32]) -> ClassifyOutcome {
        ClassifyOutcome { seq, elapsed: Duration::from_millis(4), result: Ok(probs.to_vec()) }
    }

    #[test]
    fn stroke_end_is_debounced() {
        let t0 = Instant::now();
        let mut s = session();
        stroke(&mut s, 50.0, t0);
        assert!(s.poll(t0).is_none());
        assert!(s.poll(t0 + Duration::from_millis(299)).is_none());
        let req = s.poll(t0 + STROKE_END_DEBOUNCE).unwrap();
        assert_eq!(req.seq, 0);
        assert!(req.grid.stats().max > 0.3);
        assert!(s.poll(t0 + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn request_clock_starts_before_preprocessing() {
        let t0 = Instant::now();
        let mut s = session();
        stroke(&mut s, 50.0, t0);
        let before = Instant::now();
        let req = s.poll(t0 + STROKE_END_DEBOUNCE).unwrap();
        let after = Instant::now();
        assert!(req.started >= before && req.started <= after);
    }

    #[test]
    fn one_request_in_flight_at_a_time() {
        let t0 = Instant::now();
        let mut s = session();
        stroke(&mut s, 50.0, t0);
        let first = s.poll(t0 + STROKE_END_DEBOUNCE).unwrap();

        stroke(&mut s, 120.0, t0 + Duration::from_millis(310));
        let later = t0 + Duration::from_secs(2);
        assert!(s.poll(later).is_none(), "second request must wait");
        assert!(s.due_at().is_some());

        s.complete(ok(first.seq, &[0.1, 0.8, 0.1]));
        let second = s.poll(later).unwrap();
        assert_eq!(second.seq, 1);
    }

    #[test]
    fn completed_prediction_is_ranked_and_labelled() {
        let t0 = Instant::now();
        let mut s = session();
        stroke(&mut s, 50.0, t0);
        let req = s.poll(t0 + STROKE_END_DEBOUNCE).unwrap();
        s.complete(ok(req.seq, &[0.1, 0.85, 0.05]));

        let view = s.view();
        assert_eq!(view.items[0].label, "Dog");
        assert_eq!(view.items.len(), 3);
        assert_eq!(s.in_flight(), None);
    }

    #[test]
    fn nothing_confident_shows_placeholder() {
        let t0 = Instant::now();
        let mut s = session();
        stroke(&mut s, 50.0, t0);
        let req = s.poll(t0 + STROKE_END_DEBOUNCE).unwrap();
        s.complete(ok(req.seq, &[0.0005, 0.0, 0.0]));
        assert_eq!(s.view().placeholder, Some(EMPTY_TEXT));
    }

    #[test]
    fn inference_error_shows_error_row_and_keeps_drawing_usable() {
        let t0 = Instant::now();
        let mut s = session();
        stroke(&mut s, 50.0, t0);
        stroke(&mut s, 100.0, t0);
        let req = s.poll(t0 + STROKE_END_DEBOUNCE).unwrap();
        s.complete(ClassifyOutcome {
            seq: req.seq,
            elapsed: Duration::ZERO,
            result: Err(Error::Inference("runtime fell over".into())),
        });
        assert_eq!(s.view().items[0].label, ERROR_LABEL);

        assert!(s.undo(t0));
        assert_eq!(s.surface().store().len(), 1);
        assert!(s.poll(t0 + UNDO_DEBOUNCE).is_some());
    }

    #[test]
    fn undo_to_empty_resets_panel() {
        let t0 = Instant::now();
        let mut s = session();
        stroke(&mut s, 50.0, t0);
        let req = s.poll(t0 + STROKE_END_DEBOUNCE).unwrap();
        s.complete(ok(req.seq, &[0.9, 0.05, 0.05]));

        assert!(s.undo(t0 + Duration::from_secs(1)));
        assert_eq!(s.view().placeholder, Some(IDLE_TEXT));
        assert!(s.due_at().is_none());
        assert!(!s.undo(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn not_ready_drops_the_pass() {
        let t0 = Instant::now();
        let mut s = session();
        s.set_status(ModelStatus::Loading);
        stroke(&mut s, 50.0, t0);
        assert!(s.poll(t0 + STROKE_END_DEBOUNCE).is_none());
        assert!(s.due_at().is_none());
        s.set_status(ModelStatus::Ready);
        assert!(s.poll(t0 + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn tap_only_stroke_still_schedules() {
        let t0 = Instant::now();
        let mut s = session();
        s.handle_input(&InputEvent::PointerDown(ClientPoint::new(20.0, 20.0)), t0);
        s.handle_input(&InputEvent::PointerUp, t0);
        assert!(s.poll(t0 + STROKE_END_DEBOUNCE).is_some());
    }

    #[test]
    fn last_completion_wins_when_requests_overlap() {
        let t0 = Instant::now();
        let mut s = session();
        stroke(&mut s, 50.0, t0);
        let stale = s.poll(t0 + STROKE_END_DEBOUNCE).unwrap();

        // Clearing abandons the first request, so a second one can start.
        s.clear();
        stroke(&mut s, 150.0, t0 + Duration::from_secs(1));
        let fresh = s.poll(t0 + Duration::from_secs(2)).unwrap();
        assert_ne!(stale.seq, fresh.seq);

        s.complete(ok(fresh.seq, &[0.9, 0.05, 0.05]));
        assert_eq!(s.view().items[0].label, "Cat");
        s.complete(ok(stale.seq, &[0.05, 0.05, 0.9]));
        assert_eq!(s.view().items[0].label, "Sun");
    }

    #[test]
    fn result_after_clear_is_dropped() {
        let t0 = Instant::now();
        let mut s = session();
        stroke(&mut s, 50.0, t0);
        let req = s.poll(t0 + STROKE_END_DEBOUNCE).unwrap();
        s.clear();
        s.complete(ok(req.seq, &[0.9, 0.05, 0.05]));
        assert_eq!(s.view(), &PredictionView::idle());
    }
}
