use crate::cli::Cli;

/// Resolved run configuration. Built once at startup from the parsed
/// command line and passed by reference to everything downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub mailhog_port: u16,
    pub mailhog_host: String,
    pub api_host: String,
    pub wait_email_seconds: u64,
    pub auto: bool,
    pub auto_verify: bool,
}

impl Config {
    /// Base URL of the API under test.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.api_host, self.port)
    }

    /// Base URL of the MailHog web UI.
    pub fn mailhog_url(&self) -> String {
        format!("http://{}:{}", self.mailhog_host, self.mailhog_port)
    }

    /// MailHog v2 message-listing endpoint.
    pub fn mailhog_api_url(&self) -> String {
        format!("{}/api/v2/messages", self.mailhog_url())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3001,
            mailhog_port: 8025,
            mailhog_host: "mailhog".to_string(),
            api_host: "api".to_string(),
            wait_email_seconds: 5,
            auto: false,
            auto_verify: false,
        }
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            port: cli.port,
            mailhog_port: cli.mailhog_port,
            mailhog_host: cli.mailhog_host,
            api_host: cli.api_host,
            wait_email_seconds: cli.wait_email,
            auto: cli.auto,
            auto_verify: cli.auto_verify,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Config {
        let argv = std::iter::once("flashcard-smoke").chain(args.iter().copied());
        Config::from(Cli::try_parse_from(argv).expect("args should parse"))
    }

    #[test]
    fn defaults_match_documented_values() {
        assert_eq!(parse(&[]), Config::default());
    }

    #[test]
    fn default_urls() {
        let config = parse(&[]);
        assert_eq!(config.base_url(), "http://api:3001");
        assert_eq!(config.mailhog_url(), "http://mailhog:8025");
        assert_eq!(
            config.mailhog_api_url(),
            "http://mailhog:8025/api/v2/messages"
        );
    }

    #[rstest]
    #[case(&["--port", "9000"], 9000)]
    #[case(&["--port", "1"], 1)]
    #[case(&["--port", "65535"], 65535)]
    fn port_flag_is_parsed(#[case] args: &[&str], #[case] expected: u16) {
        assert_eq!(parse(args).port, expected);
    }

    #[test]
    fn all_flags_override_defaults() {
        let config = parse(&[
            "--port",
            "9000",
            "--mailhog-port",
            "8026",
            "--mailhog-host",
            "localhost",
            "--api-host",
            "localhost",
            "--wait-email",
            "10",
            "--auto",
            "--auto-verify",
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.mailhog_port, 8026);
        assert_eq!(config.mailhog_host, "localhost");
        assert_eq!(config.api_host, "localhost");
        assert_eq!(config.wait_email_seconds, 10);
        assert!(config.auto);
        assert!(config.auto_verify);
    }

    #[test]
    fn custom_host_and_port_change_base_url() {
        let config = parse(&["--port", "9000", "--api-host", "localhost"]);
        assert_eq!(config.base_url(), "http://localhost:9000");
    }

    #[rstest]
    #[case(&["--port", "abc"])]
    #[case(&["--port", ""])]
    #[case(&["--mailhog-port", "not-a-number"])]
    #[case(&["--wait-email", "5s"])]
    fn malformed_integer_is_a_usage_error(#[case] args: &[&str]) {
        let argv = std::iter::once("flashcard-smoke").chain(args.iter().copied());
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn auto_verify_requires_auto() {
        let err = Cli::try_parse_from(["flashcard-smoke", "--auto-verify"])
            .expect_err("--auto-verify alone must be rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn auto_verify_with_auto_is_accepted() {
        let config = parse(&["--auto", "--auto-verify"]);
        assert!(config.auto && config.auto_verify);
    }
}
