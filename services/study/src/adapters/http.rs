//! services/study/src/adapters/http.rs
//!
//! This module contains the HTTP adapter for the L8teStudy deck/card API.
//! It implements the `DeckService` and `ReviewService` ports from the `core` crate.

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use study_core::domain::{
    Card, CardId, DeckDetail, DeckId, DeckListing, DeckStats, DeckSummary, NewCard, NewDeck,
    Quality,
};
use study_core::ports::{DeckService, PortError, PortResult, ReviewService};
use tracing::{debug, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that talks to the deck/card REST API over HTTP.
#[derive(Clone)]
pub struct HttpStudyApi {
    client: Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl HttpStudyApi {
    /// Creates a new `HttpStudyApi` rooted at `base_url` (e.g. `http://host/api`).
    pub fn new(base_url: &str, session_cookie: Option<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("l8testudy-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url, session_cookie))
    }

    /// Creates an adapter around an existing `reqwest::Client`.
    pub fn with_client(client: Client, base_url: &str, session_cookie: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_cookie,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.session_cookie {
            Some(cookie) => builder.header(header::COOKIE, format!("session={}", cookie)),
            None => builder,
        }
    }

    /// Sends the request and turns transport failures and non-2xx statuses into `PortError`s.
    async fn send(&self, builder: RequestBuilder, what: &str) -> PortResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(%status, "{} rejected by API", what);
        Err(status_error(status, what, &body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> PortResult<T> {
        self.send(builder, what)
            .await?
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Invalid {} response: {}", what, e)))
    }

    /// Sends a deck-management request and checks its `{success, error}` envelope.
    async fn send_command(&self, builder: RequestBuilder, what: &str) -> PortResult<ResultRecord> {
        let record: ResultRecord = self.send_json(builder, what).await?;
        record.check(what)
    }
}

fn status_error(status: StatusCode, what: &str, body: &str) -> PortError {
    match status {
        StatusCode::NOT_FOUND => PortError::NotFound(what.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
        _ => {
            let detail = serde_json::from_str::<ResultRecord>(body)
                .ok()
                .and_then(|record| record.error)
                .unwrap_or_else(|| body.trim().to_string());
            PortError::Unexpected(format!("{} failed with {}: {}", what, status, detail))
        }
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct DeckListRecord {
    #[serde(default)]
    my_decks: Vec<DeckSummaryRecord>,
    #[serde(default)]
    public_decks: Vec<DeckSummaryRecord>,
}
impl DeckListRecord {
    fn to_domain(self) -> DeckListing {
        DeckListing {
            my_decks: self.my_decks.into_iter().map(DeckSummaryRecord::to_domain).collect(),
            public_decks: self
                .public_decks
                .into_iter()
                .map(DeckSummaryRecord::to_domain)
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct DeckSummaryRecord {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    card_count: u32,
    #[serde(default)]
    is_public: bool,
    #[serde(default)]
    author_name: Option<String>,
}
impl DeckSummaryRecord {
    fn to_domain(self) -> DeckSummary {
        DeckSummary {
            id: DeckId(self.id),
            title: self.title,
            card_count: self.card_count,
            is_public: self.is_public,
            author_name: self.author_name,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct StatsRecord {
    new: u32,
    due: u32,
    total: u32,
}

#[derive(Deserialize)]
struct CardRecord {
    id: i64,
    #[serde(default)]
    front: String,
    #[serde(default)]
    back: String,
    #[serde(default)]
    is_due: bool,
}
impl CardRecord {
    fn to_domain(self) -> Card {
        Card {
            id: CardId(self.id),
            front: self.front,
            back: self.back,
            is_due: self.is_due,
        }
    }
}

#[derive(Deserialize)]
struct DeckDetailRecord {
    id: i64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    is_public: bool,
    #[serde(default)]
    is_own: bool,
    #[serde(default)]
    stats: StatsRecord,
    #[serde(default)]
    cards: Vec<CardRecord>,
}
impl DeckDetailRecord {
    fn to_domain(self) -> DeckDetail {
        DeckDetail {
            id: DeckId(self.id),
            title: self.title,
            description: self.description.filter(|d| !d.trim().is_empty()),
            is_public: self.is_public,
            is_own: self.is_own,
            stats: DeckStats {
                new: self.stats.new,
                due: self.stats.due,
                total: self.stats.total,
            },
            cards: self.cards.into_iter().map(CardRecord::to_domain).collect(),
        }
    }
}

/// The envelope every deck-management endpoint answers with.
#[derive(Deserialize, Debug)]
struct ResultRecord {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    id: Option<i64>,
}
impl ResultRecord {
    fn check(self, what: &str) -> PortResult<Self> {
        if self.success {
            return Ok(self);
        }
        let reason = self
            .error
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "no reason given".to_string());
        warn!(%reason, "{} refused by API", what);
        Err(PortError::Unexpected(format!("{} refused: {}", what, reason)))
    }
}

#[derive(Serialize)]
struct DeckPayload<'a> {
    title: &'a str,
    description: &'a str,
    is_public: bool,
}
impl<'a> From<&'a NewDeck> for DeckPayload<'a> {
    fn from(deck: &'a NewDeck) -> Self {
        Self {
            title: &deck.title,
            description: deck.description.as_deref().unwrap_or(""),
            is_public: deck.is_public,
        }
    }
}

#[derive(Serialize)]
struct CardPayload<'a> {
    front: &'a str,
    back: &'a str,
}

#[derive(Serialize)]
struct ReviewPayload {
    quality: u8,
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl DeckService for HttpStudyApi {
    async fn list_decks(&self) -> PortResult<DeckListing> {
        let record: DeckListRecord = self
            .send_json(self.request(Method::GET, "/decks"), "List decks")
            .await?;
        Ok(record.to_domain())
    }

    async fn get_deck(&self, deck_id: DeckId) -> PortResult<DeckDetail> {
        let path = format!("/decks/{}", deck_id);
        let record: DeckDetailRecord = self
            .send_json(self.request(Method::GET, &path), "Load deck")
            .await?;
        Ok(record.to_domain())
    }

    async fn create_deck(&self, deck: &NewDeck) -> PortResult<DeckId> {
        let builder = self
            .request(Method::POST, "/decks")
            .json(&DeckPayload::from(deck));
        let record = self.send_command(builder, "Create deck").await?;
        let deck_id = record
            .id
            .map(DeckId)
            .ok_or_else(|| PortError::Unexpected("Create deck returned no id".to_string()))?;
        debug!(%deck_id, "Deck created");
        Ok(deck_id)
    }

    async fn update_deck(&self, deck_id: DeckId, deck: &NewDeck) -> PortResult<()> {
        let path = format!("/decks/{}", deck_id);
        let builder = self.request(Method::PUT, &path).json(&DeckPayload::from(deck));
        self.send_command(builder, "Update deck").await?;
        Ok(())
    }

    async fn delete_deck(&self, deck_id: DeckId) -> PortResult<()> {
        let path = format!("/decks/{}/delete", deck_id);
        self.send_command(self.request(Method::DELETE, &path), "Delete deck")
            .await?;
        Ok(())
    }

    async fn add_card(&self, deck_id: DeckId, card: &NewCard) -> PortResult<()> {
        let path = format!("/decks/{}/cards", deck_id);
        let builder = self.request(Method::POST, &path).json(&CardPayload {
            front: &card.front,
            back: &card.back,
        });
        self.send_command(builder, "Add card").await?;
        debug!(%deck_id, "Card added");
        Ok(())
    }

    async fn delete_card(&self, card_id: CardId) -> PortResult<()> {
        let path = format!("/cards/{}", card_id);
        self.send_command(self.request(Method::DELETE, &path), "Delete card")
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ReviewService for HttpStudyApi {
    async fn submit_review(&self, card_id: CardId, quality: Quality) -> PortResult<()> {
        let path = format!("/cards/{}/review", card_id);
        let builder = self.request(Method::POST, &path).json(&ReviewPayload {
            quality: quality.value(),
        });
        self.send(builder, "Submit review").await?;
        Ok(())
    }
}
