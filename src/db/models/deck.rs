//! Deck model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Deck {
    pub id: i64,
    pub guid: String,
    pub user_id: i64,
    pub deck_name: String,
    pub card_count: i64,
    pub created_at: String,
}

/// Deck as exposed to clients; internal ids stay private.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckResponse {
    pub guid: String,
    pub deck_name: String,
    pub card_count: i64,
}

impl From<Deck> for DeckResponse {
    fn from(deck: Deck) -> Self {
        Self {
            guid: deck.guid,
            deck_name: deck.deck_name,
            card_count: deck.card_count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeckRequest {
    pub deck_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeckRequest {
    pub deck_id: Option<i64>,
    pub deck_guid: Option<String>,
    pub deck_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDeckRequest {
    pub deck_id: Option<i64>,
    pub deck_guid: Option<String>,
}
