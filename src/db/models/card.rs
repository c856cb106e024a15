//! Card model and DTOs, including the persisted review state.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::review::{Answer, CardStatus, ReviewState};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Card {
    pub id: i64,
    pub guid: String,
    pub user_id: i64,
    pub deck_id: i64,
    pub card_front: String,
    pub card_back: String,
    pub last_review: i64,
    pub next_review: i64,
    pub cur_interval: i64,
    pub learning_step: i64,
    pub status: String,
    pub created_at: String,
}

impl Card {
    /// The card's spaced-repetition state as a value the review policy
    /// can operate on. An unrecognized status column falls back to
    /// LEARNING rather than failing the request.
    pub fn review_state(&self) -> ReviewState {
        ReviewState {
            status: CardStatus::parse(&self.status).unwrap_or(CardStatus::Learning),
            learning_step: self.learning_step,
            cur_interval: self.cur_interval,
            last_review: self.last_review,
            next_review: self.next_review,
        }
    }
}

/// Card as exposed to clients. `due` is computed against the server
/// clock at response time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardResponse {
    pub guid: String,
    pub card_front: String,
    pub card_back: String,
    pub last_review: i64,
    pub next_review: i64,
    pub cur_interval: i64,
    pub learning_step: i64,
    pub status: String,
    pub due: bool,
}

impl CardResponse {
    pub fn from_card(card: Card, now: i64) -> Self {
        let due = card.review_state().is_due(now);
        Self {
            guid: card.guid,
            card_front: card.card_front,
            card_back: card.card_back,
            last_review: card.last_review,
            next_review: card.next_review,
            cur_interval: card.cur_interval,
            learning_step: card.learning_step,
            status: card.status,
            due,
        }
    }
}

/// Envelope for card list responses.
#[derive(Debug, Serialize)]
pub struct CardListResponse {
    pub data: Vec<CardResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    pub deck_id: Option<i64>,
    pub deck_guid: Option<String>,
    pub card_front: Option<String>,
    pub card_back: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCardsRequest {
    pub deck_id: Option<i64>,
    pub deck_guid: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardRequest {
    pub card_id: Option<i64>,
    pub card_guid: Option<String>,
    pub card_front: Option<String>,
    pub card_back: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCardRequest {
    pub card_id: Option<i64>,
    pub card_guid: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCardRequest {
    pub card_id: Option<i64>,
    pub card_guid: Option<String>,
    pub answer: Answer,
}

/// Review state returned after studying a card.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCardResponse {
    pub guid: String,
    pub status: String,
    pub learning_step: i64,
    pub cur_interval: i64,
    pub last_review: i64,
    pub next_review: i64,
}

impl ReviewCardResponse {
    pub fn new(guid: String, state: ReviewState) -> Self {
        Self {
            guid,
            status: state.status.as_str().to_string(),
            learning_step: state.learning_step,
            cur_interval: state.cur_interval,
            last_review: state.last_review,
            next_review: state.next_review,
        }
    }
}
