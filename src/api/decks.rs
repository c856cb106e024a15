//! Deck CRUD endpoints, scoped to the authenticated owner.
//!
//! Ownership and existence failures are indistinguishable on the wire:
//! both surface as the same 404. Mutations are a single conditional
//! statement scoped by owner, so a concurrent delete cannot slip between
//! an existence check and the write.

use axum::{extract::State, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    self, CreateDeckRequest, Deck, DeckResponse, DeleteDeckRequest, GuidTable, UpdateDeckRequest,
};
use crate::AppState;

use super::auth::AuthUser;
use super::error::ApiError;
use super::validation::validate_deck_name;

/// Create a new deck
///
/// POST /deck/add
pub async fn create_deck(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateDeckRequest>,
) -> Result<&'static str, ApiError> {
    if let Err(e) = validate_deck_name(&req.deck_name) {
        return Err(ApiError::validation_field("deckName", e));
    }

    let guid = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO decks (guid, user_id, deck_name, card_count, created_at) VALUES (?, ?, ?, 0, ?)",
    )
    .bind(&guid)
    .bind(user.id)
    .bind(&req.deck_name)
    .bind(&now)
    .execute(&state.db)
    .await?;

    tracing::info!(username = %user.username, deck = %guid, "Deck created");

    Ok("Deck created")
}

/// List the caller's decks in creation order
///
/// GET /deck/list
pub async fn list_decks(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<DeckResponse>>, ApiError> {
    let decks = sqlx::query_as::<_, Deck>("SELECT * FROM decks WHERE user_id = ? ORDER BY id")
        .bind(user.id)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(decks.into_iter().map(DeckResponse::from).collect()))
}

/// Rename a deck
///
/// PATCH /deck/update
pub async fn update_deck(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<UpdateDeckRequest>,
) -> Result<&'static str, ApiError> {
    let deck_id = db::resolve_id(&state.db, GuidTable::Decks, req.deck_id, req.deck_guid.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("Deck ID/GUID missing or it doesn't exist"))?;

    if let Some(ref name) = req.deck_name {
        if let Err(e) = validate_deck_name(name) {
            return Err(ApiError::validation_field("deckName", e));
        }
    }

    let result = sqlx::query(
        "UPDATE decks SET deck_name = COALESCE(?, deck_name) WHERE id = ? AND user_id = ?",
    )
    .bind(&req.deck_name)
    .bind(deck_id)
    .bind(user.id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Deck with this ID/GUID doesn't exist"));
    }

    Ok("Deck updated")
}

/// Delete a deck and, through the schema cascade, its cards
///
/// DELETE /deck/delete
pub async fn delete_deck(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<DeleteDeckRequest>,
) -> Result<&'static str, ApiError> {
    let deck_id = db::resolve_id(&state.db, GuidTable::Decks, req.deck_id, req.deck_guid.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("Deck ID/GUID missing or it doesn't exist"))?;

    let result = sqlx::query("DELETE FROM decks WHERE id = ? AND user_id = ?")
        .bind(deck_id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Deck with this ID/GUID doesn't exist"));
    }

    tracing::info!(username = %user.username, deck_id, "Deck deleted");

    Ok("Deck deleted")
}
