//! crates/study_core/src/session.rs
//!
//! The study session engine: queue construction, the card cursor, flipping,
//! rating and gesture handling for one session over one deck.
//!
//! `SessionState` holds everything a session knows about itself and is owned
//! by the engine. The engine adds the side effects on top of it: review
//! submissions go out as detached Tokio tasks whose outcome is only logged,
//! and notices go to the optional notifier.

use crate::domain::{
    Card, CardId, GestureVector, Progress, Quality, Rating, RatingTally, SessionSummary,
    StudyMode,
};
use crate::gesture::{interpret_gesture, GestureIntent};
use crate::ports::{Notice, Notifier, PortError, ReviewService};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

//=========================================================================================
// Errors
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No cards to study")]
    EmptyQueue,
    #[error("The card must be flipped before it can be rated")]
    NotFlipped,
    #[error("No study session is active")]
    NoActiveSession,
    #[error("Failed to submit review for card {card_id}: {source}")]
    ReviewSubmitFailed {
        card_id: CardId,
        #[source]
        source: PortError,
    },
}

//=========================================================================================
// SessionState
//=========================================================================================

/// What the session currently points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor<'a> {
    Card(&'a Card),
    Complete,
}

/// The state of one study session.
///
/// The queue is fixed at construction; only the cursor and the flip flag move.
#[derive(Debug, Clone)]
pub struct SessionState {
    id: Uuid,
    mode: StudyMode,
    queue: Vec<Card>,
    position: usize,
    is_flipped: bool,
    ratings: RatingTally,
    submitted: usize,
    started_at: DateTime<Utc>,
}

impl SessionState {
    /// Builds the queue for `mode` and positions the cursor on its first card.
    ///
    /// Spaced sessions take the due subset in deck order; free sessions take a
    /// uniform shuffle of the whole deck.
    pub fn new<R>(cards: Vec<Card>, mode: StudyMode, rng: &mut R) -> Result<Self, SessionError>
    where
        R: Rng + ?Sized,
    {
        let queue = match mode {
            StudyMode::Spaced => cards.into_iter().filter(|card| card.is_due).collect(),
            StudyMode::Free => {
                let mut queue = cards;
                queue.shuffle(rng);
                queue
            }
        };

        if queue.is_empty() {
            return Err(SessionError::EmptyQueue);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            mode,
            queue,
            position: 0,
            is_flipped: false,
            ratings: RatingTally::default(),
            submitted: 0,
            started_at: Utc::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    pub fn queue(&self) -> &[Card] {
        &self.queue
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_flipped(&self) -> bool {
        self.is_flipped
    }

    pub fn is_complete(&self) -> bool {
        self.position >= self.queue.len()
    }

    pub fn current(&self) -> Cursor<'_> {
        match self.queue.get(self.position) {
            Some(card) => Cursor::Card(card),
            None => Cursor::Complete,
        }
    }

    pub fn progress(&self) -> Progress {
        Progress::new(self.position, self.queue.len())
    }

    /// Toggles the flip flag and returns the new value.
    pub fn flip(&mut self) -> bool {
        self.is_flipped = !self.is_flipped;
        self.is_flipped
    }

    /// Moves to the next card, showing its front.
    pub fn advance(&mut self) {
        self.position = (self.position + 1).min(self.queue.len());
        self.is_flipped = false;
    }

    pub fn summary(&self, completed: bool) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            mode: self.mode,
            total: self.queue.len(),
            reviewed: self.position,
            ratings: self.ratings,
            submitted: self.submitted,
            completed,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

//=========================================================================================
// Engine Results
//=========================================================================================

/// Where the cursor ended up after moving.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Next,
    Complete(SessionSummary),
}

impl Step {
    pub fn is_complete(&self) -> bool {
        matches!(self, Step::Complete(_))
    }
}

/// Result of rating the current card.
#[derive(Debug)]
pub struct RateOutcome {
    pub card_id: CardId,
    pub rating: Rating,
    /// Set only when the rating was sent upstream.
    pub quality: Option<Quality>,
    /// The in-flight submission. Dropping it does not cancel the task.
    pub submission: Option<JoinHandle<()>>,
    pub step: Step,
}

/// Result of applying a gesture.
#[derive(Debug)]
pub enum GestureOutcome {
    Ignored,
    Rated(RateOutcome),
    Advanced(Step),
}

//=========================================================================================
// StudySessionEngine
//=========================================================================================

/// Drives at most one study session at a time.
pub struct StudySessionEngine {
    reviews: Arc<dyn ReviewService>,
    notifier: Option<Arc<dyn Notifier>>,
    session: Option<SessionState>,
}

impl StudySessionEngine {
    pub fn new(reviews: Arc<dyn ReviewService>) -> Self {
        Self {
            reviews,
            notifier: None,
            session: None,
        }
    }

    /// Wires in a notifier for user-facing notices.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a new session, discarding any previous one.
    pub fn start(
        &mut self,
        cards: Vec<Card>,
        mode: StudyMode,
    ) -> Result<&SessionState, SessionError> {
        self.start_with_rng(cards, mode, &mut rand::thread_rng())
    }

    /// Like [`start`](Self::start), shuffling free sessions with the given RNG.
    pub fn start_with_rng<R>(
        &mut self,
        cards: Vec<Card>,
        mode: StudyMode,
        rng: &mut R,
    ) -> Result<&SessionState, SessionError>
    where
        R: Rng + ?Sized,
    {
        if let Some(previous) = self.session.take() {
            debug!(session_id = %previous.id, "Discarding previous session");
        }

        match SessionState::new(cards, mode, rng) {
            Ok(state) => {
                info!(
                    session_id = %state.id,
                    %mode,
                    cards = state.queue.len(),
                    "Study session started"
                );
                Ok(&*self.session.insert(state))
            }
            Err(e) => {
                info!(%mode, "Nothing to study");
                post(&self.notifier, Notice::NothingToStudy);
                Err(e)
            }
        }
    }

    pub fn current(&self) -> Result<Cursor<'_>, SessionError> {
        self.session
            .as_ref()
            .map(SessionState::current)
            .ok_or(SessionError::NoActiveSession)
    }

    pub fn flip(&mut self) -> Result<bool, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoActiveSession)?;
        Ok(session.flip())
    }

    /// Moves past the current card. Returns the engine to idle after the last one.
    pub fn advance(&mut self) -> Result<Step, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoActiveSession)?;
        session.advance();
        if !session.is_complete() {
            return Ok(Step::Next);
        }

        let summary = session.summary(true);
        self.session = None;
        info!(
            session_id = %summary.session_id,
            reviewed = summary.reviewed,
            submitted = summary.submitted,
            "Study session complete"
        );
        post(
            &self.notifier,
            Notice::SessionComplete {
                reviewed: summary.reviewed,
            },
        );
        Ok(Step::Complete(summary))
    }

    /// Rates the current card and moves on.
    ///
    /// In spaced mode the rating is submitted upstream in the background; a
    /// failed submission is logged and never holds the session back.
    pub fn rate(&mut self, rating: Rating) -> Result<RateOutcome, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoActiveSession)?;
        if !session.is_flipped {
            post(&self.notifier, Notice::FlipFirst);
            return Err(SessionError::NotFlipped);
        }

        let card_id = match session.current() {
            Cursor::Card(card) => card.id,
            Cursor::Complete => return Err(SessionError::NoActiveSession),
        };
        session.ratings.record(rating);

        let (quality, submission) = match session.mode {
            StudyMode::Spaced => {
                let quality = rating.quality();
                let handle = spawn_review(Arc::clone(&self.reviews), session.id, card_id, quality);
                if handle.is_some() {
                    session.submitted += 1;
                }
                (Some(quality), handle)
            }
            StudyMode::Free => (None, None),
        };

        let step = self.advance()?;
        Ok(RateOutcome {
            card_id,
            rating,
            quality,
            submission,
            step,
        })
    }

    /// Interprets a finished drag and applies it to the session.
    pub fn apply_gesture(&mut self, vector: GestureVector) -> Result<GestureOutcome, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NoActiveSession)?;
        let intent = interpret_gesture(vector, session.is_flipped).for_mode(session.mode);

        match intent {
            GestureIntent::None => Ok(GestureOutcome::Ignored),
            GestureIntent::Advance => Ok(GestureOutcome::Advanced(self.advance()?)),
            GestureIntent::Rate(rating) => Ok(GestureOutcome::Rated(self.rate(rating)?)),
        }
    }

    /// Discards the current session, if any.
    pub fn quit(&mut self) -> Option<SessionSummary> {
        let session = self.session.take()?;
        info!(session_id = %session.id, reviewed = session.position, "Study session quit");
        Some(session.summary(false))
    }
}

fn post(notifier: &Option<Arc<dyn Notifier>>, notice: Notice) {
    if let Some(notifier) = notifier {
        notifier.notify(&notice);
    }
}

/// Sends one review in the background. The result is only ever logged.
fn spawn_review(
    reviews: Arc<dyn ReviewService>,
    session_id: Uuid,
    card_id: CardId,
    quality: Quality,
) -> Option<JoinHandle<()>> {
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(%session_id, %card_id, "No async runtime to submit review on: {}", e);
            return None;
        }
    };

    Some(runtime.spawn(async move {
        match reviews.submit_review(card_id, quality).await {
            Ok(()) => debug!(%session_id, %card_id, quality = quality.value(), "Review submitted"),
            Err(source) => {
                let err = SessionError::ReviewSubmitFailed { card_id, source };
                warn!(%session_id, "{}", err);
            }
        }
    }))
}
