//! Typed client for the flashcard API under test.

pub mod types;

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{HarnessError, Result};
use types::{
    AuthTokens, Card, CardCreateRequest, CardReviewRequest, CardUpdateRequest,
    CompleteSessionRequest, Deck, DeckCreateRequest, DeckUpdateRequest, LoginRequest,
    RefreshRequest, SignupRequest, StudySession, StudyStatistics, UserProfile,
    VerifyEmailRequest,
};

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Option<AuthTokens>,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            tokens: None,
        }
    }

    pub fn tokens(&self) -> Option<&AuthTokens> {
        self.tokens.as_ref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.tokens {
            Some(tokens) => request.bearer_auth(&tokens.access_token),
            None => request,
        }
    }

    async fn execute(
        &self,
        context: &'static str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(context, %status, "api call");
        if status.is_success() {
            Ok(response)
        } else {
            Err(HarnessError::UnexpectedStatus {
                context,
                status,
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    async fn json<T: DeserializeOwned>(
        &self,
        context: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        Ok(self.execute(context, request).await?.json().await?)
    }

    /// Polls until the API answers HTTP at all. Any status counts as ready,
    /// only connection failures are retried.
    pub async fn wait_until_ready(&self, attempts: usize, delay: Duration) -> Result<()> {
        let url = self.url("/health");
        for attempt in 0..attempts {
            match self.http.get(&url).send().await {
                Ok(_) => return Ok(()),
                Err(err) => debug!(attempt = attempt + 1, %err, "api not reachable yet"),
            }
            if attempt + 1 < attempts {
                sleep(delay).await;
            }
        }
        Err(HarnessError::ServiceNotReady { attempts, url })
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<serde_json::Value> {
        self.json("signup", self.http.post(self.url("/auth/signup")).json(request))
            .await
    }

    pub async fn verify_email(&self, token: &str) -> Result<serde_json::Value> {
        let request = VerifyEmailRequest {
            token: token.to_string(),
        };
        self.json(
            "verify-email",
            self.http.post(self.url("/auth/verify-email")).json(&request),
        )
        .await
    }

    /// Logs in and stores the returned tokens for subsequent calls.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<AuthTokens> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let tokens: AuthTokens = self
            .json("login", self.http.post(self.url("/auth/login")).json(&request))
            .await?;
        self.tokens = Some(tokens.clone());
        Ok(tokens)
    }

    /// Exchanges the stored refresh token for a fresh token pair.
    pub async fn refresh(&mut self) -> Result<AuthTokens> {
        let refresh_token = match &self.tokens {
            Some(tokens) => tokens.refresh_token.clone(),
            None => {
                return Err(HarnessError::Check(
                    "refresh called before login".to_string(),
                ))
            }
        };
        let request = RefreshRequest { refresh_token };
        let tokens: AuthTokens = self
            .json(
                "refresh",
                self.http.post(self.url("/auth/refresh")).json(&request),
            )
            .await?;
        self.tokens = Some(tokens.clone());
        Ok(tokens)
    }

    pub async fn logout(&mut self) -> Result<()> {
        // Take the pair first, then attach the bearer from the taken value:
        // the store is already empty by the time the request is built.
        if let Some(AuthTokens {
            access_token,
            refresh_token,
            ..
        }) = self.tokens.take()
        {
            let request = RefreshRequest { refresh_token };
            self.execute(
                "logout",
                self.http
                    .post(self.url("/auth/logout"))
                    .bearer_auth(&access_token)
                    .json(&request),
            )
            .await?;
        }
        Ok(())
    }

    pub async fn profile(&self) -> Result<UserProfile> {
        self.json("profile", self.authed(self.http.get(self.url("/auth/profile"))))
            .await
    }

    pub async fn create_deck(&self, request: &DeckCreateRequest) -> Result<Deck> {
        self.json(
            "create deck",
            self.authed(self.http.post(self.url("/decks")).json(request)),
        )
        .await
    }

    pub async fn decks(&self) -> Result<Vec<Deck>> {
        self.json("list decks", self.authed(self.http.get(self.url("/decks"))))
            .await
    }

    pub async fn deck(&self, deck_id: &str) -> Result<Deck> {
        self.json(
            "get deck",
            self.authed(self.http.get(self.url(&format!("/decks/{deck_id}")))),
        )
        .await
    }

    pub async fn update_deck(&self, deck_id: &str, request: &DeckUpdateRequest) -> Result<Deck> {
        self.json(
            "update deck",
            self.authed(
                self.http
                    .put(self.url(&format!("/decks/{deck_id}")))
                    .json(request),
            ),
        )
        .await
    }

    pub async fn delete_deck(&self, deck_id: &str) -> Result<()> {
        self.execute(
            "delete deck",
            self.authed(self.http.delete(self.url(&format!("/decks/{deck_id}")))),
        )
        .await?;
        Ok(())
    }

    pub async fn create_card(&self, deck_id: &str, request: &CardCreateRequest) -> Result<Card> {
        self.json(
            "create card",
            self.authed(
                self.http
                    .post(self.url(&format!("/decks/{deck_id}/cards")))
                    .json(request),
            ),
        )
        .await
    }

    pub async fn cards(&self, deck_id: &str) -> Result<Vec<Card>> {
        self.json(
            "list cards",
            self.authed(self.http.get(self.url(&format!("/decks/{deck_id}/cards")))),
        )
        .await
    }

    pub async fn card(&self, deck_id: &str, card_id: &str) -> Result<Card> {
        self.json(
            "get card",
            self.authed(
                self.http
                    .get(self.url(&format!("/decks/{deck_id}/cards/{card_id}"))),
            ),
        )
        .await
    }

    pub async fn update_card(
        &self,
        deck_id: &str,
        card_id: &str,
        request: &CardUpdateRequest,
    ) -> Result<Card> {
        self.json(
            "update card",
            self.authed(
                self.http
                    .put(self.url(&format!("/decks/{deck_id}/cards/{card_id}")))
                    .json(request),
            ),
        )
        .await
    }

    pub async fn delete_card(&self, deck_id: &str, card_id: &str) -> Result<()> {
        self.execute(
            "delete card",
            self.authed(
                self.http
                    .delete(self.url(&format!("/decks/{deck_id}/cards/{card_id}"))),
            ),
        )
        .await?;
        Ok(())
    }

    pub async fn start_study_session(&self, deck_id: &str) -> Result<StudySession> {
        self.json(
            "start study session",
            self.authed(self.http.post(self.url(&format!("/study/start/{deck_id}")))),
        )
        .await
    }

    pub async fn cards_due(&self, deck_id: &str) -> Result<Vec<Card>> {
        self.json(
            "cards due",
            self.authed(
                self.http
                    .get(self.url(&format!("/study/cards-due/{deck_id}"))),
            ),
        )
        .await
    }

    pub async fn submit_review(
        &self,
        session_id: &str,
        request: &CardReviewRequest,
    ) -> Result<serde_json::Value> {
        self.json(
            "submit review",
            self.authed(
                self.http
                    .post(self.url(&format!("/study/sessions/{session_id}/review")))
                    .json(request),
            ),
        )
        .await
    }

    pub async fn complete_study_session(
        &self,
        session_id: &str,
        request: &CompleteSessionRequest,
    ) -> Result<StudySession> {
        self.json(
            "complete study session",
            self.authed(
                self.http
                    .post(self.url(&format!("/study/sessions/{session_id}/complete")))
                    .json(request),
            ),
        )
        .await
    }

    pub async fn study_session(&self, session_id: &str) -> Result<StudySession> {
        self.json(
            "get study session",
            self.authed(
                self.http
                    .get(self.url(&format!("/study/sessions/{session_id}"))),
            ),
        )
        .await
    }

    pub async fn study_sessions(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<StudySession>> {
        let mut request = self.http.get(self.url("/study/sessions"));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }
        self.json("list study sessions", self.authed(request)).await
    }

    pub async fn study_statistics(&self) -> Result<StudyStatistics> {
        self.json(
            "study statistics",
            self.authed(self.http.get(self.url("/study/statistics"))),
        )
        .await
    }
}
