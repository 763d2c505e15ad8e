//! services/study/src/driver/controller.rs
//!
//! Connects parsed commands to the study session engine and turns the
//! engine's results into protocol events.

use crate::adapters::ChannelNotifier;
use crate::driver::protocol::{Command, Event};
use futures::future::join_all;
use std::sync::Arc;
use study_core::domain::{DeckDetail, GestureVector, StudyMode};
use study_core::ports::{Notice, ReviewService};
use study_core::session::{
    Cursor, GestureOutcome, RateOutcome, SessionError, Step, StudySessionEngine,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Drags shorter than this on both axes count as a tap.
const TAP_SLOP: f64 = 10.0;

fn is_tap(vector: GestureVector) -> bool {
    vector.delta_x.abs() < TAP_SLOP && vector.delta_y.abs() < TAP_SLOP
}

/// Owns one engine and everything needed to report on it.
pub struct StudyController {
    engine: StudySessionEngine,
    notices: UnboundedReceiver<Notice>,
    pending: Vec<JoinHandle<()>>,
}

impl StudyController {
    pub fn new(reviews: Arc<dyn ReviewService>) -> Self {
        let (notifier, notices) = ChannelNotifier::new();
        let engine = StudySessionEngine::new(reviews).with_notifier(Arc::new(notifier));
        Self {
            engine,
            notices,
            pending: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_active()
    }

    /// Starts a session over `deck`. An empty queue yields a notice and no session.
    pub fn start(&mut self, deck: DeckDetail, mode: StudyMode) -> Vec<Event> {
        let mut events = Vec::new();
        match self.engine.start(deck.cards, mode) {
            Ok(session) => {
                events.push(Event::SessionStarted {
                    session_id: session.id(),
                    deck: deck.title,
                    mode: mode.to_string(),
                    total: session.queue().len(),
                });
                self.push_current(&mut events);
            }
            Err(e) => debug!("Session not started: {}", e),
        }
        self.collect_notices(&mut events);
        events
    }

    /// Applies one command and reports what happened.
    pub fn handle(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        let result = match command {
            Command::Flip => self.flip(&mut events),
            Command::Rate(rating) => self
                .engine
                .rate(rating)
                .map(|outcome| self.push_rated(outcome, &mut events)),
            Command::Next => self
                .engine
                .advance()
                .map(|step| self.push_step(step, &mut events)),
            // A tap turns the card over in either direction.
            Command::Swipe(vector) if is_tap(vector) => self.flip(&mut events),
            Command::Swipe(vector) => self.swipe(vector, &mut events),
            Command::Quit => {
                if let Some(summary) = self.engine.quit() {
                    events.push(Event::session_ended(&summary));
                }
                Ok(())
            }
        };

        match result {
            Ok(()) => {}
            // Already reported through the notifier.
            Err(SessionError::NotFlipped) | Err(SessionError::EmptyQueue) => {}
            Err(e) => events.push(Event::Error {
                message: e.to_string(),
            }),
        }
        self.collect_notices(&mut events);
        self.pending.retain(|handle| !handle.is_finished());
        events
    }

    /// Waits for review submissions that are still in flight.
    pub async fn drain(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return;
        }
        debug!(count = pending.len(), "Waiting for review submissions");
        for result in join_all(pending).await {
            if let Err(e) = result {
                warn!("Review submission task failed: {}", e);
            }
        }
    }

    fn flip(&mut self, events: &mut Vec<Event>) -> Result<(), SessionError> {
        let flipped = self.engine.flip()?;
        let back = match self.engine.current()? {
            Cursor::Card(card) if flipped => Some(card.back.clone()),
            _ => None,
        };
        events.push(Event::Flipped { back });
        Ok(())
    }

    fn swipe(
        &mut self,
        vector: GestureVector,
        events: &mut Vec<Event>,
    ) -> Result<(), SessionError> {
        match self.engine.apply_gesture(vector)? {
            GestureOutcome::Ignored => {
                debug!(dx = vector.delta_x, dy = vector.delta_y, "Gesture ignored");
            }
            GestureOutcome::Rated(outcome) => self.push_rated(outcome, events),
            GestureOutcome::Advanced(step) => self.push_step(step, events),
        }
        Ok(())
    }

    fn push_rated(&mut self, outcome: RateOutcome, events: &mut Vec<Event>) {
        events.push(Event::Rated {
            card_id: outcome.card_id.0,
            rating: outcome.rating.to_string(),
            quality: outcome.quality.map(|q| q.value()),
        });
        self.pending.extend(outcome.submission);
        self.push_step(outcome.step, events);
    }

    fn push_step(&self, step: Step, events: &mut Vec<Event>) {
        match step {
            Step::Next => self.push_current(events),
            Step::Complete(summary) => events.push(Event::session_ended(&summary)),
        }
    }

    fn push_current(&self, events: &mut Vec<Event>) {
        let Some(session) = self.engine.session() else {
            return;
        };
        if let Cursor::Card(card) = session.current() {
            let progress = session.progress();
            events.push(Event::CardShown {
                position: progress.position,
                total: progress.total,
                percent: progress.percent,
                front: card.front.clone(),
            });
        }
    }

    fn collect_notices(&mut self, events: &mut Vec<Event>) {
        while let Ok(notice) = self.notices.try_recv() {
            events.push(Event::Notice {
                message: notice.message(),
            });
        }
    }
}
