//! crates/study_core/src/ports.rs
//!
//! Defines the service contracts (traits) the study client depends on.
//! The remote deck/card API and the user-facing notifier live behind these
//! traits so the session engine never touches HTTP or a terminal directly.

use async_trait::async_trait;
use crate::domain::{CardId, DeckDetail, DeckId, DeckListing, NewCard, NewDeck, Quality};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., HTTP, decoding).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DeckService: Send + Sync {
    // --- Reading ---
    async fn list_decks(&self) -> PortResult<DeckListing>;

    async fn get_deck(&self, deck_id: DeckId) -> PortResult<DeckDetail>;

    // --- Deck Management ---
    /// Creates a deck and returns the id the server assigned to it.
    async fn create_deck(&self, deck: &NewDeck) -> PortResult<DeckId>;

    async fn update_deck(&self, deck_id: DeckId, deck: &NewDeck) -> PortResult<()>;

    async fn delete_deck(&self, deck_id: DeckId) -> PortResult<()>;

    // --- Card Management ---
    async fn add_card(&self, deck_id: DeckId, card: &NewCard) -> PortResult<()>;

    async fn delete_card(&self, card_id: CardId) -> PortResult<()>;
}

#[async_trait]
pub trait ReviewService: Send + Sync {
    /// Records one review of a card with the given SM-2 quality.
    async fn submit_review(&self, card_id: CardId, quality: Quality) -> PortResult<()>;
}

//=========================================================================================
// Optional Capabilities
//=========================================================================================

/// A user-facing message the engine wants surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A session was requested but the queue came out empty.
    NothingToStudy,
    /// A rating arrived before the card was flipped.
    FlipFirst,
    /// The last card of the queue was passed.
    SessionComplete { reviewed: usize },
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::NothingToStudy => "No cards available to study".to_string(),
            Notice::FlipFirst => "Flip the card first".to_string(),
            Notice::SessionComplete { reviewed } => {
                format!("Study session complete ({} cards)", reviewed)
            }
        }
    }
}

/// Surfaces notices to the user. Supplied at construction, may be absent.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}
