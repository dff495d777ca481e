//! The end-to-end scenario: signup through email verification, deck and card
//! CRUD, a study cycle, token refresh, and cleanup. Every step talks to the
//! API over HTTP only, the same way the frontend does.

use std::io::{self, Write};
use std::time::Duration;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::time::sleep;
use uuid::Uuid;

use crate::api::types::{
    CardCreateRequest, CardRef, CardReviewRequest, CardUpdateRequest, CompleteSessionRequest,
    DeckCreateRequest, DeckUpdateRequest, SignupRequest,
};
use crate::api::ApiClient;
use crate::config::Config;
use crate::error::{HarnessError, Result};
use crate::mailhog::MailhogClient;

const READY_ATTEMPTS: usize = 30;
const READY_DELAY: Duration = Duration::from_millis(500);
const MAIL_POLL_ATTEMPTS: usize = 10;
const MAIL_POLL_DELAY: Duration = Duration::from_millis(500);

const SAMPLE_CARDS: &[(&str, &str)] = &[
    ("What is the capital of France?", "Paris"),
    ("2 + 2", "4"),
    ("The chemical symbol for gold", "Au"),
];

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Unique throwaway account per run so repeated runs never collide.
pub fn generate_credentials() -> Credentials {
    let tag = Uuid::new_v4().simple().to_string();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    Credentials {
        username: format!("tester_{}", &tag[..8]),
        email: format!("tester+{}@example.com", &tag[..12]),
        password: format!("Ab1!{suffix}"),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_credentials() -> Result<Credentials> {
    Ok(Credentials {
        username: prompt("Username: ")?,
        email: prompt("Email: ")?,
        password: prompt("Password: ")?,
    })
}

fn step(label: &str) {
    println!("\n==> {label}");
}

fn ensure(condition: bool, message: impl Into<String>) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(HarnessError::Check(message.into()))
    }
}

pub async fn run(config: &Config) -> Result<()> {
    let credentials = if config.auto {
        generate_credentials()
    } else {
        prompt_credentials()?
    };
    run_with(config, credentials).await
}

pub async fn run_with(config: &Config, credentials: Credentials) -> Result<()> {
    let http = reqwest::Client::new();
    let mut api = ApiClient::new(http.clone(), config.base_url());
    let mailhog = MailhogClient::new(http, config.mailhog_url());

    step("Waiting for the API to come up");
    api.wait_until_ready(READY_ATTEMPTS, READY_DELAY).await?;

    step(&format!("Registering {}", credentials.email));
    api.signup(&SignupRequest {
        username: credentials.username.clone(),
        email: credentials.email.clone(),
        password: credentials.password.clone(),
    })
    .await?;

    if config.wait_email_seconds > 0 {
        println!(
            "Waiting {}s for the verification email to arrive...",
            config.wait_email_seconds
        );
        sleep(Duration::from_secs(config.wait_email_seconds)).await;
    }

    step("Obtaining the verification token");
    let token = if config.auto_verify {
        mailhog
            .wait_for_verification_token(&credentials.email, MAIL_POLL_ATTEMPTS, MAIL_POLL_DELAY)
            .await?
    } else {
        println!(
            "Open {} and find the verification email for {}",
            config.mailhog_url(),
            credentials.email
        );
        prompt("Verification token: ")?
    };

    step("Verifying the email address");
    api.verify_email(&token).await?;

    step("Logging in");
    api.login(&credentials.username, &credentials.password)
        .await?;
    let profile = api.profile().await?;
    ensure(
        profile.email.eq_ignore_ascii_case(&credentials.email),
        format!(
            "profile email {} does not match registered {}",
            profile.email, credentials.email
        ),
    )?;
    println!("Logged in as {} ({})", profile.username, profile.id);

    step("Creating a deck");
    let deck = api
        .create_deck(&DeckCreateRequest {
            name: "Smoke Test Deck".to_string(),
            description: "Created by flashcard-smoke".to_string(),
        })
        .await?;
    println!("Created deck {}", deck.id);

    let decks = api.decks().await?;
    ensure(
        decks.iter().any(|d| d.id == deck.id),
        "new deck missing from deck listing",
    )?;

    let fetched = api.deck(&deck.id).await?;
    ensure(fetched.id == deck.id, "deck fetch returned a different deck")?;

    api.update_deck(
        &deck.id,
        &DeckUpdateRequest {
            description: Some("Updated by flashcard-smoke".to_string()),
            ..Default::default()
        },
    )
    .await?;

    step("Creating cards");
    let mut card_ids = Vec::new();
    for (front, back) in SAMPLE_CARDS {
        let card = api
            .create_card(
                &deck.id,
                &CardCreateRequest {
                    front: (*front).to_string(),
                    back: (*back).to_string(),
                    notes: None,
                    tags: Some(vec!["smoke".to_string()]),
                },
            )
            .await?;
        card_ids.push(card.id);
    }
    println!("Created {} cards", card_ids.len());

    let cards = api.cards(&deck.id).await?;
    ensure(!cards.is_empty(), "card listing came back empty")?;

    let first = api.card(&deck.id, &card_ids[0]).await?;
    ensure(first.id == card_ids[0], "card fetch returned a different card")?;

    api.update_card(
        &deck.id,
        &card_ids[0],
        &CardUpdateRequest {
            notes: Some("Remember this one".to_string()),
            ..Default::default()
        },
    )
    .await?;

    step("Running a study session");
    let session = api.start_study_session(&deck.id).await?;
    let due = api.cards_due(&deck.id).await?;
    println!("Session {} with {} cards due", session.id, due.len());

    let mut correct = 0u32;
    let mut incorrect = 0u32;
    for (index, card) in due.iter().enumerate() {
        // Alternate good and poor recall so both branches get exercised.
        let result = if index % 2 == 0 { 5 } else { 2 };
        if result >= 3 {
            correct += 1;
        } else {
            incorrect += 1;
        }
        api.submit_review(
            &session.id,
            &CardReviewRequest {
                card: CardRef {
                    id: card.id.clone(),
                },
                result,
                time_spent_seconds: 3,
            },
        )
        .await?;
    }

    let reviewed = correct + incorrect;
    api.complete_study_session(
        &session.id,
        &CompleteSessionRequest {
            cards_reviewed: reviewed,
            correct_responses: correct,
            incorrect_responses: incorrect,
            total_time_seconds: u64::from(reviewed) * 3,
        },
    )
    .await?;

    api.study_session(&session.id).await?;
    let sessions = api.study_sessions(Some(10), None).await?;
    ensure(
        sessions.iter().any(|s| s.id == session.id),
        "completed session missing from session listing",
    )?;
    let statistics = api.study_statistics().await?;
    if let Some(sessions) = statistics.completed_sessions {
        println!("Completed sessions on record: {sessions}");
    }

    step("Refreshing the access token");
    api.refresh().await?;
    // The refreshed token must still be accepted.
    api.profile().await?;

    step("Cleaning up");
    for card_id in &card_ids {
        api.delete_card(&deck.id, card_id).await?;
    }
    api.delete_deck(&deck.id).await?;
    api.logout().await?;

    println!("\nAll steps completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_credentials_are_unique() {
        let a = generate_credentials();
        let b = generate_credentials();
        assert_ne!(a.email, b.email);
        assert_ne!(a.username, b.username);
    }

    #[test]
    fn generated_password_mixes_character_classes() {
        let credentials = generate_credentials();
        let password = &credentials.password;
        assert!(password.len() >= 8);
        assert!(password.chars().any(|c| c.is_ascii_uppercase()));
        assert!(password.chars().any(|c| c.is_ascii_digit()));
        assert!(password.contains('!'));
    }

    #[test]
    fn generated_email_is_a_plus_alias() {
        let credentials = generate_credentials();
        assert!(credentials.email.starts_with("tester+"));
        assert!(credentials.email.ends_with("@example.com"));
    }
}
