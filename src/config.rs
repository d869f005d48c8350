// src/config.rs
use crate::constants::{
    DAYS_PER_MONTH, DEFAULT_POSTED_CACHE_PATH, DIGEST_MAX_AGE_DAYS, DIGEST_MIN_AGE_DAYS,
    NOTION_REQUEST_INTERVAL, NOVELTY_MIN_AGE_DAYS, STALE_DEFAULT_MONTHS,
};
use crate::error::AppError;
use crate::error_recovery::{Backoff, RetryPolicy};
use crate::filter::VisibilityPolicy;
use crate::types::{ApiKey, NotionId, SlackToken, ValidatedUrl, ValidationError};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    #[command(subcommand)]
    pub command: Command,

    /// Root page URL or ID (defaults to ROOT_PAGE_ID)
    #[arg(long, global = true)]
    pub root: Option<String>,

    /// Abort the run after this many seconds (defaults to MAX_RUNTIME_SECS)
    #[arg(long, global = true)]
    pub max_runtime: Option<u64>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Announce newly published pages, one message each
    Announce(AnnounceArgs),
    /// Post one digest of pages created inside a window
    Digest(DigestArgs),
    /// Report pages nobody has edited for a long time
    Stale(StaleArgs),
    /// Measure the Russian/English composition of every page
    Languages(LanguagesArgs),
    /// List the parts of the tree the integration cannot read
    Diagnose(DiagnoseArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AnnounceArgs {
    /// Print the messages instead of posting them; the cache is not touched
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Minimum page age in days before announcing
    #[arg(long, default_value_t = NOVELTY_MIN_AGE_DAYS)]
    pub min_age_days: i64,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DigestArgs {
    #[arg(long, default_value_t = DIGEST_MIN_AGE_DAYS)]
    pub min_age_days: i64,

    #[arg(long, default_value_t = DIGEST_MAX_AGE_DAYS)]
    pub max_age_days: i64,

    /// Also write the listed pages as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Print the digest instead of posting it
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

/// Where the stale report gets its page list.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSource {
    /// Walk the whole tree under the root
    #[default]
    Tree,
    /// Search the workspace and keep the root's direct sub-pages
    Search,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StaleArgs {
    /// Staleness threshold in 30-day months (defaults to MONTHS_THRESHOLD, else 12)
    #[arg(long)]
    pub months: Option<i64>,

    #[arg(long, default_value = "stale_pages.csv")]
    pub csv: PathBuf,

    /// Append a markdown summary here (defaults to GITHUB_STEP_SUMMARY)
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Post the stale-page count to the webhook
    #[arg(long, default_value_t = false)]
    pub notify: bool,

    /// Link to the full report included in the posted count
    #[arg(long)]
    pub artifact_url: Option<String>,

    /// Upload the CSV to SLACK_CHANNEL with SLACK_BOT_TOKEN
    #[arg(long, default_value_t = false)]
    pub upload: bool,

    #[arg(long, value_enum, default_value_t = PageSource::Tree)]
    pub source: PageSource,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LanguagesArgs {
    #[arg(long, default_value = "notion_language_percentages.csv")]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DiagnoseArgs {
    /// Diagnose this page instead of the root
    #[arg(long)]
    pub page: Option<String>,
}

/// Resolved run configuration, validated before any request is made.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub api_key: ApiKey,
    pub root: NotionId,
    pub webhook: Option<ValidatedUrl>,
    pub slack_channel: Option<String>,
    pub slack_token: Option<SlackToken>,
    pub cache_path: PathBuf,
    pub visibility: VisibilityPolicy,
    pub retry: RetryPolicy,
    pub request_interval: Duration,
    pub deadline: Option<Duration>,
    pub stale_months: i64,
    pub step_summary: Option<PathBuf>,
}

impl RelayConfig {
    /// Resolves the configuration from CLI input and the process environment.
    pub fn resolve(cli: &CommandLineInput) -> Result<Self, AppError> {
        Self::resolve_with(cli, |name| std::env::var(name).ok())
    }

    /// Resolves the configuration with `env` standing in for the environment.
    pub fn resolve_with(
        cli: &CommandLineInput,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let env = |name: &str| env(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = env("NOTION_TOKEN")
            .or_else(|| env("NOTION_API_KEY"))
            .ok_or_else(|| {
                AppError::MissingConfiguration(
                    "NOTION_TOKEN environment variable not set".to_string(),
                )
            })?;
        let api_key = ApiKey::new(api_key)?;

        let root = cli.root.clone().or_else(|| env("ROOT_PAGE_ID")).ok_or_else(|| {
            AppError::MissingConfiguration(
                "no root page: pass --root or set ROOT_PAGE_ID".to_string(),
            )
        })?;
        let root = NotionId::parse(&root)?;

        let webhook = env("SLACK_WEBHOOK_URL")
            .map(|u| ValidatedUrl::parse(&u))
            .transpose()?;
        let slack_token = env("SLACK_BOT_TOKEN").map(SlackToken::new).transpose()?;

        let visibility = match env("VISIBILITY_POLICY") {
            Some(v) => v.parse()?,
            None => VisibilityPolicy::default(),
        };

        let request_interval = match env("NOTION_REQUEST_INTERVAL_MS") {
            Some(ms) => Duration::from_millis(parse_number("NOTION_REQUEST_INTERVAL_MS", &ms)?),
            None => NOTION_REQUEST_INTERVAL,
        };

        let mut retry = RetryPolicy::default();
        if let Some(attempts) = env("NOTION_MAX_RETRIES") {
            let n = parse_number("NOTION_MAX_RETRIES", &attempts)?;
            retry.max_attempts = u32::try_from(n)
                .map_err(|_| ValidationError::InvalidThreshold {
                    value: format!("NOTION_MAX_RETRIES={}", attempts),
                    reason: "too large".to_string(),
                })?
                .max(1);
        }
        if let Some(backoff) = env("RETRY_BACKOFF") {
            retry.backoff = match backoff.to_lowercase().as_str() {
                "linear" => Backoff::Linear,
                "exponential" => Backoff::Exponential,
                _ => {
                    return Err(ValidationError::InvalidThreshold {
                        value: backoff,
                        reason: "expected 'linear' or 'exponential'".to_string(),
                    }
                    .into())
                }
            };
        }

        let deadline = match cli.max_runtime {
            Some(secs) => Some(Duration::from_secs(secs)),
            None => env("MAX_RUNTIME_SECS")
                .map(|s| parse_number("MAX_RUNTIME_SECS", &s).map(Duration::from_secs))
                .transpose()?,
        };

        let stale_months = match &cli.command {
            Command::Stale(StaleArgs {
                months: Some(months),
                ..
            }) => *months,
            _ => match env("MONTHS_THRESHOLD") {
                Some(m) => parse_number("MONTHS_THRESHOLD", &m)? as i64,
                None => STALE_DEFAULT_MONTHS,
            },
        };
        if stale_months <= 0 {
            return Err(ValidationError::InvalidThreshold {
                value: stale_months.to_string(),
                reason: "months must be positive".to_string(),
            }
            .into());
        }

        let step_summary = match &cli.command {
            Command::Stale(StaleArgs {
                summary: Some(path),
                ..
            }) => Some(path.clone()),
            _ => env("GITHUB_STEP_SUMMARY").map(PathBuf::from),
        };

        Ok(RelayConfig {
            api_key,
            root,
            webhook,
            slack_channel: env("SLACK_CHANNEL"),
            slack_token,
            cache_path: env("POSTED_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_POSTED_CACHE_PATH)),
            visibility,
            retry,
            request_interval,
            deadline,
            stale_months,
            step_summary,
        })
    }

    /// The staleness threshold in days.
    pub fn stale_days(&self) -> i64 {
        self.stale_months * DAYS_PER_MONTH
    }

    pub fn require_webhook(&self) -> Result<&ValidatedUrl, AppError> {
        self.webhook.as_ref().ok_or_else(|| {
            AppError::MissingConfiguration(
                "SLACK_WEBHOOK_URL environment variable not set".to_string(),
            )
        })
    }

    /// Bot token and channel, both needed for file uploads.
    pub fn require_uploader(&self) -> Result<(&SlackToken, &str), AppError> {
        let token = self.slack_token.as_ref().ok_or_else(|| {
            AppError::MissingConfiguration("SLACK_BOT_TOKEN environment variable not set".to_string())
        })?;
        let channel = self.slack_channel.as_deref().ok_or_else(|| {
            AppError::MissingConfiguration("SLACK_CHANNEL environment variable not set".to_string())
        })?;
        Ok((token, channel))
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64, ValidationError> {
    value
        .parse::<u64>()
        .map_err(|e| ValidationError::InvalidThreshold {
            value: format!("{}={}", name, value),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const KEY: &str = "secret_abcdefghijklmnopqrstuvwxyz";
    const ROOT: &str = "550e8400e29b41d4a716446655440000";

    fn cli(args: &[&str]) -> CommandLineInput {
        let mut argv = vec!["notion2slack"];
        argv.extend_from_slice(args);
        CommandLineInput::try_parse_from(argv).unwrap()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn minimal_environment_resolves_with_defaults() {
        let config = RelayConfig::resolve_with(
            &cli(&["announce"]),
            env_of(&[("NOTION_TOKEN", KEY), ("ROOT_PAGE_ID", ROOT)]),
        )
        .unwrap();

        assert_eq!(config.root.as_str(), ROOT);
        assert_eq!(config.cache_path, PathBuf::from(DEFAULT_POSTED_CACHE_PATH));
        assert_eq!(config.visibility, VisibilityPolicy::RequirePublicUrl);
        assert_eq!(config.request_interval, NOTION_REQUEST_INTERVAL);
        assert_eq!(config.stale_months, 12);
        assert_eq!(config.stale_days(), 360);
        assert!(config.webhook.is_none());
        assert!(config.deadline.is_none());
    }

    #[test]
    fn missing_token_is_a_configuration_error() {
        let err = RelayConfig::resolve_with(&cli(&["digest"]), env_of(&[("ROOT_PAGE_ID", ROOT)]))
            .unwrap_err();
        assert!(matches!(err, AppError::MissingConfiguration(_)));
    }

    #[test]
    fn root_flag_overrides_environment() {
        let other = "https://www.notion.so/acme/Team-Home-11111111222233334444555555555555";
        let config = RelayConfig::resolve_with(
            &cli(&["--root", other, "diagnose"]),
            env_of(&[("NOTION_API_KEY", KEY), ("ROOT_PAGE_ID", ROOT)]),
        )
        .unwrap();
        assert_eq!(config.root.as_str(), "11111111222233334444555555555555");
    }

    #[test]
    fn stale_months_prefer_flag_then_environment() {
        let env = [("NOTION_TOKEN", KEY), ("ROOT_PAGE_ID", ROOT), ("MONTHS_THRESHOLD", "6")];
        let from_env = RelayConfig::resolve_with(&cli(&["stale"]), env_of(&env)).unwrap();
        assert_eq!(from_env.stale_days(), 180);

        let from_flag =
            RelayConfig::resolve_with(&cli(&["stale", "--months", "3"]), env_of(&env)).unwrap();
        assert_eq!(from_flag.stale_days(), 90);

        let zero = RelayConfig::resolve_with(&cli(&["stale", "--months", "0"]), env_of(&env));
        assert!(zero.is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let base = [("NOTION_TOKEN", KEY), ("ROOT_PAGE_ID", ROOT)];
        for (name, value) in [
            ("SLACK_WEBHOOK_URL", "ftp://hooks"),
            ("SLACK_BOT_TOKEN", "abc"),
            ("VISIBILITY_POLICY", "sometimes"),
            ("NOTION_REQUEST_INTERVAL_MS", "fast"),
            ("RETRY_BACKOFF", "random"),
            ("NOTION_MAX_RETRIES", "4294967296"),
        ] {
            let mut env = base.to_vec();
            env.push((name, value));
            assert!(
                RelayConfig::resolve_with(&cli(&["announce"]), env_of(&env)).is_err(),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn retry_attempts_stay_at_least_one() {
        let config = RelayConfig::resolve_with(
            &cli(&["announce"]),
            env_of(&[
                ("NOTION_TOKEN", KEY),
                ("ROOT_PAGE_ID", ROOT),
                ("NOTION_MAX_RETRIES", "0"),
            ]),
        )
        .unwrap();
        assert_eq!(config.retry.max_attempts, 1);

        let err = RelayConfig::resolve_with(
            &cli(&["announce"]),
            env_of(&[
                ("NOTION_TOKEN", KEY),
                ("ROOT_PAGE_ID", ROOT),
                ("NOTION_MAX_RETRIES", "4294967296"),
            ]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("NOTION_MAX_RETRIES"));
    }

    #[test]
    fn uploads_need_token_and_channel() {
        let config = RelayConfig::resolve_with(
            &cli(&["stale", "--upload"]),
            env_of(&[
                ("NOTION_TOKEN", KEY),
                ("ROOT_PAGE_ID", ROOT),
                ("SLACK_BOT_TOKEN", "xoxb-1-2"),
            ]),
        )
        .unwrap();
        assert!(config.require_uploader().is_err());
        assert!(config.require_webhook().is_err());
    }

    #[test]
    fn subcommand_flags_parse() {
        match cli(&["stale", "--source", "search", "--notify", "--artifact-url", "https://ci/1"]).command {
            Command::Stale(args) => {
                assert_eq!(args.source, PageSource::Search);
                assert!(args.notify);
                assert_eq!(args.artifact_url.as_deref(), Some("https://ci/1"));
                assert_eq!(args.csv, PathBuf::from("stale_pages.csv"));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(matches!(
            cli(&["announce", "--dry-run"]).command,
            Command::Announce(AnnounceArgs { dry_run: true, min_age_days: 7 })
        ));
    }
}
