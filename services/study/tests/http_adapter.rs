//! Runs the HTTP adapter against an in-process mock of the deck/card API.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use study_core::domain::{CardId, DeckId, NewCard, NewDeck, Rating, StudyMode};
use study_core::ports::{DeckService, PortError, ReviewService};
use study_core::Quality;
use study_lib::adapters::HttpStudyApi;
use study_lib::driver::{Command, Event, StudyController};

const COOKIE: &str = "secret-session";

#[derive(Default)]
struct Recorded {
    reviews: Vec<(i64, Value)>,
    created_decks: Vec<Value>,
    updated_decks: Vec<(i64, Value)>,
    deleted_decks: Vec<i64>,
    added_cards: Vec<(i64, Value)>,
    deleted_cards: Vec<i64>,
}

type Shared = Arc<Mutex<Recorded>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("session={}", COOKIE))
}

async fn list_decks(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({
        "my_decks": [{"id": 1, "title": "Capitals", "card_count": 3, "is_public": false}],
        "public_decks": [{"id": 2, "title": "Elements", "card_count": 118,
                          "is_public": true, "author_name": "Marie"}]
    })))
}

async fn get_deck(Path(id): Path<i64>) -> Result<Json<Value>, StatusCode> {
    if id != 1 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({
        "id": 1,
        "title": "Capitals",
        "description": "European capitals",
        "is_public": false,
        "is_own": true,
        "stats": {"new": 1, "due": 2, "total": 3},
        "cards": [
            {"id": 11, "front": "France", "back": "Paris", "is_due": true},
            {"id": 12, "front": "Spain", "back": "Madrid", "is_due": false},
            {"id": 13, "front": "Italy", "back": "Rome", "is_due": true}
        ]
    })))
}

/// Deck 2 belongs to someone else; the API refuses to touch it.
const FOREIGN_DECK: i64 = 2;

fn envelope(deck_id: i64) -> Json<Value> {
    if deck_id == FOREIGN_DECK {
        Json(json!({"success": false, "error": "Keine Berechtigung"}))
    } else {
        Json(json!({"success": true}))
    }
}

async fn create_deck(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    state.lock().unwrap().created_decks.push(body);
    Json(json!({"success": true, "id": 77}))
}

async fn update_deck(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.lock().unwrap().updated_decks.push((id, body));
    envelope(id)
}

async fn delete_deck(State(state): State<Shared>, Path(id): Path<i64>) -> Json<Value> {
    state.lock().unwrap().deleted_decks.push(id);
    envelope(id)
}

async fn add_card(
    State(state): State<Shared>,
    Path(deck_id): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.lock().unwrap().added_cards.push((deck_id, body));
    envelope(deck_id)
}

async fn delete_card(State(state): State<Shared>, Path(id): Path<i64>) -> Json<Value> {
    state.lock().unwrap().deleted_cards.push(id);
    Json(json!({"success": true}))
}

async fn review(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> StatusCode {
    state.lock().unwrap().reviews.push((id, body));
    if id == 500 {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn spawn_server() -> (String, Shared) {
    let state = Shared::default();
    let app = Router::new()
        .route("/api/decks", get(list_decks).post(create_deck))
        .route("/api/decks/{id}", get(get_deck).put(update_deck))
        .route("/api/decks/{id}/delete", delete(delete_deck))
        .route("/api/decks/{id}/cards", post(add_card))
        .route("/api/cards/{id}", delete(delete_card))
        .route("/api/cards/{id}/review", post(review))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api", addr), state)
}

fn make_api(base_url: &str) -> HttpStudyApi {
    HttpStudyApi::new(base_url, Some(COOKIE.to_string())).unwrap()
}

#[tokio::test]
async fn test_list_decks_sends_session_cookie() {
    let (base_url, _) = spawn_server().await;

    let listing = make_api(&base_url).list_decks().await.unwrap();
    assert_eq!(listing.my_decks.len(), 1);
    assert_eq!(listing.public_decks[0].author_name.as_deref(), Some("Marie"));

    let anonymous = HttpStudyApi::new(&base_url, None).unwrap();
    assert!(matches!(
        anonymous.list_decks().await,
        Err(PortError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_get_deck() {
    let (base_url, _) = spawn_server().await;
    let api = make_api(&base_url);

    let deck = api.get_deck(DeckId(1)).await.unwrap();
    assert_eq!(deck.title, "Capitals");
    assert_eq!(deck.description.as_deref(), Some("European capitals"));
    assert_eq!((deck.stats.new, deck.stats.due, deck.stats.total), (1, 2, 3));
    let due: Vec<i64> = deck.due_cards().map(|c| c.id.0).collect();
    assert_eq!(due, vec![11, 13]);

    assert!(matches!(
        api.get_deck(DeckId(9)).await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_submit_review_body() {
    let (base_url, state) = spawn_server().await;
    let api = make_api(&base_url);

    api.submit_review(CardId(11), Rating::Good.quality()).await.unwrap();
    let failed = api
        .submit_review(CardId(500), Quality::new(1).unwrap())
        .await;
    assert!(matches!(failed, Err(PortError::Unexpected(_))));

    let recorded = state.lock().unwrap();
    assert_eq!(recorded.reviews[0], (11, json!({"quality": 4})));
    assert_eq!(recorded.reviews[1], (500, json!({"quality": 1})));
}

#[tokio::test]
async fn test_deck_management() {
    let (base_url, state) = spawn_server().await;
    let api = make_api(&base_url);

    let deck = NewDeck {
        title: "Rivers".into(),
        description: Some("Longest rivers".into()),
        is_public: true,
    };
    assert_eq!(api.create_deck(&deck).await.unwrap(), DeckId(77));

    api.update_deck(DeckId(77), &deck).await.unwrap();
    let card = NewCard {
        front: "Egypt".into(),
        back: "Nile".into(),
    };
    api.add_card(DeckId(77), &card).await.unwrap();
    api.delete_card(CardId(501)).await.unwrap();
    api.delete_deck(DeckId(77)).await.unwrap();

    let recorded = state.lock().unwrap();
    assert_eq!(
        recorded.created_decks[0],
        json!({"title": "Rivers", "description": "Longest rivers", "is_public": true})
    );
    assert_eq!(recorded.updated_decks[0].0, 77);
    assert_eq!(
        recorded.added_cards[0],
        (77, json!({"front": "Egypt", "back": "Nile"}))
    );
    assert_eq!(recorded.deleted_cards, vec![501]);
    assert_eq!(recorded.deleted_decks, vec![77]);
}

#[tokio::test]
async fn test_refused_changes_are_errors() {
    let (base_url, state) = spawn_server().await;
    let api = make_api(&base_url);
    let foreign = DeckId(FOREIGN_DECK);

    let deck = NewDeck {
        title: "Hijacked".into(),
        description: None,
        is_public: false,
    };
    let refused = api.update_deck(foreign, &deck).await;
    assert!(matches!(
        refused,
        Err(PortError::Unexpected(msg)) if msg.contains("Keine Berechtigung")
    ));

    let card = NewCard {
        front: "Q".into(),
        back: "A".into(),
    };
    assert!(api.add_card(foreign, &card).await.is_err());
    assert!(api.delete_deck(foreign).await.is_err());

    // The requests reached the server; only the envelope said no.
    let recorded = state.lock().unwrap();
    assert_eq!(recorded.updated_decks.len(), 1);
    assert_eq!(recorded.deleted_decks, vec![FOREIGN_DECK]);
}

#[tokio::test]
async fn test_unreachable_api() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = make_api(&format!("http://{}/api", addr));
    assert!(matches!(
        api.list_decks().await,
        Err(PortError::Unexpected(_))
    ));
}

#[tokio::test]
async fn test_spaced_session_against_api() {
    let (base_url, state) = spawn_server().await;
    let api = Arc::new(make_api(&base_url));
    let deck = api.get_deck(DeckId(1)).await.unwrap();

    let mut controller = StudyController::new(api.clone());
    let events = controller.start(deck, StudyMode::Spaced);
    assert!(matches!(&events[0], Event::SessionStarted { total: 2, .. }));

    controller.handle(Command::Flip);
    controller.handle(Command::Rate(Rating::Hard));
    controller.handle(Command::Flip);
    let events = controller.handle(Command::Rate(Rating::Easy));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::SessionEnded { completed: true, .. })));

    controller.drain().await;
    let mut reviews = state.lock().unwrap().reviews.clone();
    reviews.sort_by_key(|(id, _)| *id);
    assert_eq!(
        reviews,
        vec![(11, json!({"quality": 2})), (13, json!({"quality": 5}))]
    );
}

#[tokio::test]
async fn test_free_session_against_api_submits_nothing() {
    let (base_url, state) = spawn_server().await;
    let api = Arc::new(make_api(&base_url));
    let deck = api.get_deck(DeckId(1)).await.unwrap();

    let mut controller = StudyController::new(api.clone());
    let events = controller.start(deck, StudyMode::Free);
    assert!(matches!(&events[0], Event::SessionStarted { total: 3, .. }));

    while controller.is_active() {
        controller.handle(Command::Flip);
        controller.handle(Command::Rate(Rating::Good));
    }
    controller.drain().await;
    assert!(state.lock().unwrap().reviews.is_empty());
}
