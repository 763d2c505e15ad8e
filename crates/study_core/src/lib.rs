pub mod domain;
pub mod gesture;
pub mod ports;
pub mod session;

pub use domain::{
    Card, CardId, DeckDetail, DeckId, DeckListing, DeckStats, DeckSummary, GestureVector, NewCard,
    NewDeck, Progress, Quality, Rating, RatingTally, SessionSummary, StudyMode,
};
pub use gesture::{interpret_gesture, GestureIntent};
pub use ports::{DeckService, Notice, Notifier, PortError, PortResult, ReviewService};
pub use session::{
    Cursor, GestureOutcome, RateOutcome, SessionError, SessionState, Step, StudySessionEngine,
};
