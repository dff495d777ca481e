use clap::Parser;
use flashcard_smoke::{cli::Cli, config::Config, flow};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug shows every HTTP call and MailHog poll.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from(Cli::parse());
    println!("Using API at {}", config.base_url());
    println!("Using MailHog at {}", config.mailhog_url());

    flow::run(&config).await?;
    Ok(())
}
