use std::env;

use flashcard_smoke::{config::Config, flow};

/// Runs the whole harness against a real local stack (API + MailHog up,
/// e.g. via docker compose). Disabled by default to keep `cargo test`
/// fast and reliable.
#[tokio::test]
async fn live_stack_smoke() {
    let run = env::var("RUN_LIVE_SMOKE")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if !run {
        eprintln!("skipping live_stack_smoke (set RUN_LIVE_SMOKE=1 to enable)");
        return;
    }

    let config = Config {
        api_host: env::var("SMOKE_API_HOST").unwrap_or_else(|_| "localhost".to_string()),
        port: env::var("SMOKE_API_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3001),
        mailhog_host: env::var("SMOKE_MAILHOG_HOST").unwrap_or_else(|_| "localhost".to_string()),
        mailhog_port: env::var("SMOKE_MAILHOG_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8025),
        wait_email_seconds: 2,
        auto: true,
        auto_verify: true,
    };

    flow::run(&config).await.expect("live smoke flow failed");
}
