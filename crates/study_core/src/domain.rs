//! crates/study_core/src/domain.rs
//!
//! Defines the pure, core data structures for the study client.
//! These structs are independent of any HTTP client or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Identifiers
//=========================================================================================

/// Identifier of a card, assigned by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardId(pub i64);

/// Identifier of a deck, assigned by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeckId(pub i64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

//=========================================================================================
// Cards and Decks
//=========================================================================================

/// A single flashcard. Immutable from the client's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub front: String,
    pub back: String,
    /// Computed by the server's scheduler.
    pub is_due: bool,
}

/// Counters shown on the deck detail page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeckStats {
    pub new: u32,
    pub due: u32,
    pub total: u32,
}

/// A deck as it appears in the deck list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckSummary {
    pub id: DeckId,
    pub title: String,
    pub card_count: u32,
    pub is_public: bool,
    /// Only present for decks owned by someone else.
    pub author_name: Option<String>,
}

/// The two sections of the deck list: the user's own decks and shared ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckListing {
    pub my_decks: Vec<DeckSummary>,
    pub public_decks: Vec<DeckSummary>,
}

/// A deck with its full card list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckDetail {
    pub id: DeckId,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub is_own: bool,
    pub stats: DeckStats,
    pub cards: Vec<Card>,
}

impl DeckDetail {
    /// The due subset of the deck, in deck order.
    pub fn due_cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(|card| card.is_due)
    }
}

/// Payload for creating or updating a deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeck {
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
}

/// Payload for adding a card to a deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub front: String,
    pub back: String,
}

//=========================================================================================
// Study Modes and Ratings
//=========================================================================================

/// How a study session picks and treats its cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudyMode {
    /// Only due cards, ratings are sent to the scheduler.
    Spaced,
    /// Every card in random order, ratings are discarded.
    Free,
}

impl fmt::Display for StudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudyMode::Spaced => f.write_str("spaced"),
            StudyMode::Free => f.write_str("free"),
        }
    }
}

impl FromStr for StudyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spaced" => Ok(StudyMode::Spaced),
            "free" | "practice" => Ok(StudyMode::Free),
            other => Err(format!("unknown study mode '{}'", other)),
        }
    }
}

/// The user's self-assessment after seeing the back of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rating {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Looks up a rating by its button ordinal (1..=4).
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Maps the rating onto the scheduler's SM-2 quality scale.
    pub fn quality(self) -> Quality {
        match self {
            Rating::Again => Quality(1),
            Rating::Hard => Quality(2),
            Rating::Good => Quality(4),
            Rating::Easy => Quality(5),
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        };
        f.write_str(label)
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "again" => Ok(Rating::Again),
            "hard" => Ok(Rating::Hard),
            "good" => Ok(Rating::Good),
            "easy" => Ok(Rating::Easy),
            other => other
                .parse::<u8>()
                .ok()
                .and_then(Rating::from_ordinal)
                .ok_or_else(|| format!("unknown rating '{}'", other)),
        }
    }
}

/// SM-2 review quality (0..=5) as understood by the upstream scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Quality(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

//=========================================================================================
// Gestures
//=========================================================================================

/// Displacement of a completed drag, sampled between touch start and touch end.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureVector {
    pub delta_x: f64,
    pub delta_y: f64,
}

impl GestureVector {
    pub fn new(delta_x: f64, delta_y: f64) -> Self {
        Self { delta_x, delta_y }
    }
}

//=========================================================================================
// Session Reporting
//=========================================================================================

/// Position indicator for the card currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 1-based position of the current card.
    pub position: usize,
    pub total: usize,
    pub percent: u8,
}

impl Progress {
    pub fn new(index: usize, total: usize) -> Self {
        let position = (index + 1).min(total);
        let percent = if total == 0 {
            100
        } else {
            ((position as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            position,
            total,
            percent,
        }
    }
}

/// Per-rating counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingTally {
    pub again: u32,
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}

impl RatingTally {
    pub fn record(&mut self, rating: Rating) {
        match rating {
            Rating::Again => self.again += 1,
            Rating::Hard => self.hard += 1,
            Rating::Good => self.good += 1,
            Rating::Easy => self.easy += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.again + self.hard + self.good + self.easy
    }
}

/// What is left of a session once it completes or is quit.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub mode: StudyMode,
    pub total: usize,
    /// Cards the user moved past, rated or not.
    pub reviewed: usize,
    pub ratings: RatingTally,
    /// Review submissions dispatched upstream.
    pub submitted: usize,
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_table() {
        let table: Vec<u8> = Rating::ALL.iter().map(|r| r.quality().value()).collect();
        assert_eq!(table, vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_rating_parsing() {
        assert_eq!("Good".parse::<Rating>(), Ok(Rating::Good));
        assert_eq!("4".parse::<Rating>(), Ok(Rating::Easy));
        assert!("0".parse::<Rating>().is_err());
        assert!("meh".parse::<Rating>().is_err());
        assert_eq!(Rating::from_ordinal(2), Some(Rating::Hard));
        assert_eq!(Rating::Hard.ordinal(), 2);
    }

    #[test]
    fn test_study_mode_parsing() {
        assert_eq!("spaced".parse::<StudyMode>(), Ok(StudyMode::Spaced));
        assert_eq!(" FREE ".parse::<StudyMode>(), Ok(StudyMode::Free));
        assert!("cram".parse::<StudyMode>().is_err());
    }

    #[test]
    fn test_progress() {
        let first = Progress::new(0, 4);
        assert_eq!((first.position, first.total, first.percent), (1, 4, 25));
        assert_eq!(Progress::new(2, 3).percent, 100);
        assert_eq!(Progress::new(0, 3).percent, 33);
    }

    #[test]
    fn test_quality_bounds() {
        assert!(Quality::new(5).is_some());
        assert!(Quality::new(6).is_none());
    }

    #[test]
    fn test_due_cards_keep_order() {
        let card = |id, is_due| Card {
            id: CardId(id),
            front: format!("q{}", id),
            back: format!("a{}", id),
            is_due,
        };
        let deck = DeckDetail {
            id: DeckId(1),
            title: "Latin".into(),
            description: None,
            is_public: false,
            is_own: true,
            stats: DeckStats::default(),
            cards: vec![card(3, true), card(1, false), card(2, true)],
        };
        let ids: Vec<i64> = deck.due_cards().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![3, 2]);
    }
}
