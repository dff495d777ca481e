//! Wire types for the flashcard API. Field names follow the API's camelCase
//! JSON; timestamps stay as strings since the harness never computes on them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct DeckCreateRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Default, Serialize)]
pub struct DeckUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub card_count: Option<u32>,
    #[serde(default)]
    pub due_card_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardCreateRequest {
    pub front: String,
    pub back: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Serialize)]
pub struct CardUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub review_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: String,
    #[serde(default)]
    pub deck_id: Option<String>,
    #[serde(default)]
    pub cards_studied: Option<u32>,
    #[serde(default)]
    pub cards_correct: Option<u32>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CardRef {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardReviewRequest {
    pub card: CardRef,
    /// Recall quality on the API's 0-5 scale.
    pub result: u8,
    pub time_spent_seconds: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSessionRequest {
    pub cards_reviewed: u32,
    pub correct_responses: u32,
    pub incorrect_responses: u32,
    pub total_time_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStatistics {
    #[serde(default)]
    pub completed_sessions: Option<u32>,
    #[serde(default)]
    pub total_cards_studied: Option<u32>,
    #[serde(default)]
    pub current_streak: Option<u32>,
}
