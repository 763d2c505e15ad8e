//! services/study/src/bin/study.rs

use clap::{Parser, Subcommand};
use std::sync::Arc;
use study_core::domain::{CardId, DeckDetail, DeckId, DeckListing, NewCard, NewDeck, StudyMode};
use study_core::ports::DeckService;
use study_lib::{
    adapters::HttpStudyApi,
    config::Config,
    driver::{run_session, write_events, OutputFormat, StudyController},
    error::ClientError,
};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "study", version, about = "Study L8teStudy flashcard decks from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List your decks and the public ones
    Decks,
    /// Show a deck's stats and cards
    Show { deck: i64 },
    /// Run a study session over a deck
    Study {
        deck: i64,
        /// `spaced` (due cards, scheduled) or `free` (all cards, shuffled)
        #[arg(long, default_value = "spaced")]
        mode: StudyMode,
        /// Emit events as JSON lines instead of text
        #[arg(long)]
        json: bool,
    },
    /// Create a new deck
    NewDeck {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        public: bool,
    },
    /// Update a deck's title, description and visibility
    EditDeck {
        deck: i64,
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        public: bool,
    },
    /// Delete a deck with all its cards
    DeleteDeck { deck: i64 },
    /// Add a card to a deck
    AddCard { deck: i64, front: String, back: String },
    /// Delete a single card
    DeleteCard { card: i64 },
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!(api = %config.api_url, "Configuration loaded");

    // --- 2. Initialize the API Adapter ---
    let api = Arc::new(HttpStudyApi::new(&config.api_url, config.session_cookie.clone())?);

    // --- 3. Dispatch ---
    match cli.command {
        Commands::Decks => print_listing(&api.list_decks().await?),
        Commands::Show { deck } => print_deck(&api.get_deck(DeckId(deck)).await?),
        Commands::Study { deck, mode, json } => {
            let deck = api.get_deck(DeckId(deck)).await?;
            let format = if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            };

            let mut controller = StudyController::new(api.clone());
            let mut stdout = tokio::io::stdout();
            let events = controller.start(deck, mode);
            write_events(&mut stdout, &events, format).await?;

            let stdin = BufReader::new(tokio::io::stdin());
            run_session(&mut controller, stdin, &mut stdout, format).await?;
        }
        Commands::NewDeck {
            title,
            description,
            public,
        } => {
            let deck = NewDeck {
                title,
                description,
                is_public: public,
            };
            let deck_id = api.create_deck(&deck).await?;
            println!("Created deck {} ({})", deck_id, deck.title);
        }
        Commands::EditDeck {
            deck,
            title,
            description,
            public,
        } => {
            let update = NewDeck {
                title,
                description,
                is_public: public,
            };
            api.update_deck(DeckId(deck), &update).await?;
            println!("Updated deck {}", deck);
        }
        Commands::DeleteDeck { deck } => {
            api.delete_deck(DeckId(deck)).await?;
            println!("Deleted deck {}", deck);
        }
        Commands::AddCard { deck, front, back } => {
            api.add_card(DeckId(deck), &NewCard { front, back }).await?;
            println!("Added card to deck {}", deck);
        }
        Commands::DeleteCard { card } => {
            api.delete_card(CardId(card)).await?;
            println!("Deleted card {}", card);
        }
    }

    Ok(())
}

fn print_listing(listing: &DeckListing) {
    println!("My decks");
    if listing.my_decks.is_empty() {
        println!("  (no decks yet)");
    }
    for deck in &listing.my_decks {
        let visibility = if deck.is_public { ", public" } else { "" };
        println!("  {:>5}  {} ({} cards{})", deck.id, deck.title, deck.card_count, visibility);
    }

    if !listing.public_decks.is_empty() {
        println!("Public decks");
        for deck in &listing.public_decks {
            let author = deck.author_name.as_deref().unwrap_or("unknown");
            println!("  {:>5}  {} ({} cards, by {})", deck.id, deck.title, deck.card_count, author);
        }
    }
}

fn print_deck(deck: &DeckDetail) {
    println!("{} [{}]", deck.title, deck.id);
    if let Some(description) = &deck.description {
        println!("{}", description);
    }
    println!(
        "new {}  due {}  total {}",
        deck.stats.new, deck.stats.due, deck.stats.total
    );
    for card in &deck.cards {
        let front: String = card.front.chars().take(60).collect();
        let ellipsis = if card.front.chars().count() > 60 { "..." } else { "" };
        let due = if card.is_due { "  (due)" } else { "" };
        println!("  {:>5}  {}{}{}", card.id, front, ellipsis, due);
    }
}
