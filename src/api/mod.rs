pub mod auth;
mod cards;
mod decks;
pub mod error;
mod validation;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Deck and card routes authenticate through the AuthUser extractor
    let deck_routes = Router::new()
        .route("/deck/add", post(decks::create_deck))
        .route("/deck/list", get(decks::list_decks))
        .route("/deck/update", patch(decks::update_deck))
        .route("/deck/delete", delete(decks::delete_deck));

    let card_routes = Router::new()
        .route("/card/add", post(cards::create_card))
        .route("/card/list", post(cards::list_cards))
        .route("/card/update", patch(cards::update_card))
        .route("/card/delete", delete(cards::delete_card))
        .route("/card/review", post(cards::review_card));

    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes)
        .merge(deck_routes)
        .merge(card_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
