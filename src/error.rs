use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{context} returned {status}: {body}")]
    UnexpectedStatus {
        context: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("service not ready after {attempts} attempts at {url}")]
    ServiceNotReady { attempts: usize, url: String },

    #[error("verification email for {email} not found after {attempts} attempts")]
    VerificationEmailNotFound { email: String, attempts: usize },

    #[error("unexpected MailHog payload: {0}")]
    MailFormat(String),

    #[error("failed to read operator input: {0}")]
    Input(#[from] std::io::Error),

    #[error("check failed: {0}")]
    Check(String),
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
