//! Card CRUD and review endpoints, scoped to the owning user and deck.
//!
//! A card's review state is only ever changed through the review policy;
//! front/back edits leave it untouched. The deck's denormalized
//! `card_count` follows card inserts and deletes.

use axum::{extract::State, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    self, Card, CardListResponse, CardResponse, CreateCardRequest, DeleteCardRequest, GuidTable,
    ListCardsRequest, ReviewCardRequest, ReviewCardResponse, UpdateCardRequest,
};
use crate::review::ReviewState;
use crate::AppState;

use super::auth::AuthUser;
use super::error::ApiError;
use super::validation::validate_card_text;

/// Resolve a deck identifier and confirm the caller owns the deck.
///
/// Both an unresolvable identifier and someone else's deck produce the
/// same not-found error.
async fn resolve_owned_deck(
    state: &AppState,
    user: &AuthUser,
    deck_id: Option<i64>,
    deck_guid: Option<&str>,
) -> Result<i64, ApiError> {
    let deck_id = db::resolve_id(&state.db, GuidTable::Decks, deck_id, deck_guid)
        .await?
        .ok_or_else(|| ApiError::not_found("Deck ID/GUID missing or it doesn't exist"))?;

    let owned: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM decks WHERE id = ? AND user_id = ?")
            .bind(deck_id)
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;

    match owned {
        Some((id,)) => Ok(id),
        None => Err(ApiError::not_found("Deck ID/GUID missing or it doesn't exist")),
    }
}

/// Add a card to a deck
///
/// POST /card/add
pub async fn create_card(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateCardRequest>,
) -> Result<&'static str, ApiError> {
    if let Err(e) = validate_card_text(&req.card_front, "cardFront") {
        return Err(ApiError::validation_field("cardFront", e));
    }
    if let Err(e) = validate_card_text(&req.card_back, "cardBack") {
        return Err(ApiError::validation_field("cardBack", e));
    }

    let deck_id = resolve_owned_deck(&state, &user, req.deck_id, req.deck_guid.as_deref()).await?;

    let guid = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    // New cards start at the beginning of the learning ladder
    let fresh = ReviewState::new_card();
    sqlx::query(
        r#"
        INSERT INTO cards (
            guid, user_id, deck_id, card_front, card_back,
            last_review, next_review, cur_interval, learning_step, status,
            created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(user.id)
    .bind(deck_id)
    .bind(req.card_front.unwrap_or_default())
    .bind(req.card_back.unwrap_or_default())
    .bind(fresh.last_review)
    .bind(fresh.next_review)
    .bind(fresh.cur_interval)
    .bind(fresh.learning_step)
    .bind(fresh.status.as_str())
    .bind(&now)
    .execute(&state.db)
    .await?;

    sqlx::query("UPDATE decks SET card_count = card_count + 1 WHERE id = ?")
        .bind(deck_id)
        .execute(&state.db)
        .await?;

    tracing::info!(username = %user.username, deck_id, card = %guid, "Card created");

    Ok("Card created")
}

/// List a deck's cards in creation order
///
/// POST /card/list
pub async fn list_cards(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ListCardsRequest>,
) -> Result<Json<CardListResponse>, ApiError> {
    let deck_id = resolve_owned_deck(&state, &user, req.deck_id, req.deck_guid.as_deref()).await?;

    let cards = sqlx::query_as::<_, Card>(
        "SELECT * FROM cards WHERE deck_id = ? AND user_id = ? ORDER BY id",
    )
    .bind(deck_id)
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    let now = chrono::Utc::now().timestamp();
    let data = cards
        .into_iter()
        .map(|card| CardResponse::from_card(card, now))
        .collect();

    Ok(Json(CardListResponse { data }))
}

/// Edit a card's front and/or back text
///
/// PATCH /card/update
pub async fn update_card(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<UpdateCardRequest>,
) -> Result<&'static str, ApiError> {
    let card_id = db::resolve_id(&state.db, GuidTable::Cards, req.card_id, req.card_guid.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("Card ID/GUID missing or it doesn't exist"))?;

    if let Err(e) = validate_card_text(&req.card_front, "cardFront") {
        return Err(ApiError::validation_field("cardFront", e));
    }
    if let Err(e) = validate_card_text(&req.card_back, "cardBack") {
        return Err(ApiError::validation_field("cardBack", e));
    }

    // Only the supplied fields change; review state is never touched here
    let result = sqlx::query(
        r#"
        UPDATE cards SET
            card_front = COALESCE(?, card_front),
            card_back = COALESCE(?, card_back)
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&req.card_front)
    .bind(&req.card_back)
    .bind(card_id)
    .bind(user.id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Card with this ID/GUID doesn't exist"));
    }

    Ok("Card updated")
}

/// Delete a card and decrement its deck's card count
///
/// DELETE /card/delete
pub async fn delete_card(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<DeleteCardRequest>,
) -> Result<&'static str, ApiError> {
    let card_id = db::resolve_id(&state.db, GuidTable::Cards, req.card_id, req.card_guid.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("Card ID/GUID missing or it doesn't exist"))?;

    // The read only learns the deck id; the conditional delete decides
    let card: Option<(i64,)> =
        sqlx::query_as("SELECT deck_id FROM cards WHERE id = ? AND user_id = ?")
            .bind(card_id)
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;

    let (deck_id,) = card.ok_or_else(|| ApiError::not_found("Card with this ID/GUID doesn't exist"))?;

    let result = sqlx::query("DELETE FROM cards WHERE id = ? AND user_id = ?")
        .bind(card_id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Card with this ID/GUID doesn't exist"));
    }

    sqlx::query("UPDATE decks SET card_count = card_count - 1 WHERE id = ? AND card_count > 0")
        .bind(deck_id)
        .execute(&state.db)
        .await?;

    tracing::info!(username = %user.username, card_id, "Card deleted");

    Ok("Card deleted")
}

/// Record a study answer and advance the card's review state
///
/// POST /card/review
pub async fn review_card(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ReviewCardRequest>,
) -> Result<Json<ReviewCardResponse>, ApiError> {
    let card_id = db::resolve_id(&state.db, GuidTable::Cards, req.card_id, req.card_guid.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("Card ID/GUID missing or it doesn't exist"))?;

    let card: Option<Card> = sqlx::query_as("SELECT * FROM cards WHERE id = ? AND user_id = ?")
        .bind(card_id)
        .bind(user.id)
        .fetch_optional(&state.db)
        .await?;

    let card = card.ok_or_else(|| ApiError::not_found("Card with this ID/GUID doesn't exist"))?;

    let now = chrono::Utc::now().timestamp();
    let next = state.review.next_state(&card.review_state(), req.answer, now);

    let result = sqlx::query(
        r#"
        UPDATE cards SET
            status = ?,
            learning_step = ?,
            cur_interval = ?,
            last_review = ?,
            next_review = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(next.status.as_str())
    .bind(next.learning_step)
    .bind(next.cur_interval)
    .bind(next.last_review)
    .bind(next.next_review)
    .bind(card_id)
    .bind(user.id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Card with this ID/GUID doesn't exist"));
    }

    Ok(Json(ReviewCardResponse::new(card.guid, next)))
}
