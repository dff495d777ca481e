use clap::Parser;

/// Exercise the flashcard API end to end in a Docker environment.
#[derive(Parser, Debug)]
#[command(name = "flashcard-smoke", version, about)]
pub struct Cli {
    /// API server port
    #[arg(long, default_value_t = 3001)]
    pub port: u16,

    /// MailHog web UI port
    #[arg(long, default_value_t = 8025)]
    pub mailhog_port: u16,

    /// MailHog host (default suits the Docker network)
    #[arg(long, default_value = "mailhog")]
    pub mailhog_host: String,

    /// API host (default suits the Docker network)
    #[arg(long, default_value = "api")]
    pub api_host: String,

    /// Seconds to wait for emails to arrive before polling MailHog
    #[arg(long = "wait-email", default_value_t = 5)]
    pub wait_email: u64,

    /// Run in automated mode with minimal user input
    #[arg(long)]
    pub auto: bool,

    /// Automatically extract the verification token from MailHog (requires --auto)
    #[arg(long, requires = "auto")]
    pub auto_verify: bool,
}
