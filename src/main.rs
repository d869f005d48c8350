// src/main.rs
use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion2slack::api::NotionHttpClient;
use notion2slack::config::{Command, CommandLineInput, RelayConfig};
use notion2slack::constants::SLACK_POST_INTERVAL;
use notion2slack::output::{deliver, DeliveryTarget, OutputPlan};
use notion2slack::pipeline::{self, AnnounceOptions, RunContext};
use notion2slack::posted_cache::PostedCache;
use notion2slack::reports;
use notion2slack::slack::{ChatRelay, FileUploader, WebhookRelay};
use notion2slack::types::NotionId;
use notion2slack::AppError;
use std::fs;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_file_path = std::env::temp_dir().join("notion2slack.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Runs the plan and fails if any part of it failed.
fn deliver_all(plan: OutputPlan) -> Result<(), AppError> {
    if plan.is_empty() {
        return Ok(());
    }
    let report = deliver(plan);
    if report.is_success() {
        Ok(())
    } else {
        Err(AppError::DeliveryFailed {
            failures: report.failed.into_iter().map(|(_, e)| e).collect(),
        })
    }
}

fn webhook_relay(config: &RelayConfig) -> Result<WebhookRelay, AppError> {
    WebhookRelay::new(config.require_webhook()?.clone(), config.slack_channel.clone())
}

async fn execute(command: &Command, config: &RelayConfig) -> Result<(), AppError> {
    let repo = NotionHttpClient::new(&config.api_key, config.retry.clone(), config.request_interval)?;
    let ctx = RunContext {
        root: config.root.clone(),
        now: Utc::now(),
        deadline: config.deadline,
    };

    match command {
        Command::Announce(args) => {
            let mut cache = PostedCache::load(&config.cache_path)?;
            let options = AnnounceOptions {
                min_age_days: args.min_age_days,
                visibility: config.visibility,
                post_interval: SLACK_POST_INTERVAL,
            };

            let outcome = if args.dry_run {
                let outcome = pipeline::preview_announcements(&repo, &cache, &ctx, &options).await?;
                let plan = outcome.messages.iter().fold(OutputPlan::new(), |plan, message| {
                    plan.with_operation(DeliveryTarget::PrintToStdout {
                        content: format!("{}\n\n", message.text),
                    })
                });
                deliver_all(plan)?;
                outcome
            } else {
                let relay = webhook_relay(config)?;
                pipeline::announce(&repo, &relay, &mut cache, &ctx, &options).await?
            };
            println!(
                "📣 {} eligible, {} announced, {} failed.",
                outcome.eligible.len(),
                outcome.posted.len(),
                outcome.failed.len()
            );
        }

        Command::Digest(args) => {
            let outcome = if args.dry_run {
                let outcome =
                    pipeline::digest(&repo, &ctx, args.min_age_days, args.max_age_days).await?;
                deliver_all(OutputPlan::new().with_operation(DeliveryTarget::PrintToStdout {
                    content: format!("{}\n", outcome.message.text),
                }))?;
                outcome
            } else {
                let relay = webhook_relay(config)?;
                pipeline::digest_and_post(&repo, &relay, &ctx, args.min_age_days, args.max_age_days)
                    .await?
            };

            if let Some(path) = &args.csv {
                deliver_all(OutputPlan::new().with_operation(DeliveryTarget::WriteFile {
                    path: path.clone(),
                    content: reports::digest_csv(&outcome.pages)?,
                }))?;
            }
            println!("🆕 {} pages in the digest.", outcome.pages.len());
        }

        Command::Stale(args) => {
            let outcome =
                pipeline::stale(&repo, &ctx, config.stale_days(), args.source).await?;
            let (csv, summary) = pipeline::stale_files(&outcome, config.stale_months, ctx.now)?;

            let mut plan = OutputPlan::new().with_operation(DeliveryTarget::WriteFile {
                path: args.csv.clone(),
                content: csv.clone(),
            });
            if let Some(path) = &config.step_summary {
                plan = plan.with_operation(DeliveryTarget::AppendFile {
                    path: path.clone(),
                    content: summary,
                });
            }
            deliver_all(plan)?;

            if args.notify {
                match pipeline::stale_notice(
                    &outcome,
                    config.stale_months,
                    args.artifact_url.as_deref(),
                )? {
                    Some(message) => webhook_relay(config)?.post(&message).await?,
                    None => log::info!("No stale pages; nothing to post"),
                }
            }

            if args.upload {
                let (token, channel) = config.require_uploader()?;
                let filename = args
                    .csv
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "stale_pages.csv".to_string());
                let comment = format!(
                    "📄 {} pages not edited in {} months",
                    outcome.stale.len(),
                    config.stale_months
                );
                FileUploader::new(token.clone())?
                    .upload(&filename, csv.into_bytes(), channel, &comment)
                    .await?;
            }

            println!(
                "📄 {} of {} pages are stale. Report: {}",
                outcome.stale.len(),
                outcome.total_scanned,
                args.csv.display()
            );
        }

        Command::Languages(args) => {
            let rows = pipeline::languages(&repo, &ctx).await?;
            deliver_all(OutputPlan::new().with_operation(DeliveryTarget::WriteFile {
                path: args.output.clone(),
                content: reports::language_csv(&rows)?,
            }))?;
            println!("🌐 Measured {} pages. Report: {}", rows.len(), args.output.display());
        }

        Command::Diagnose(args) => {
            let page = match &args.page {
                Some(page) => NotionId::parse(page)?,
                None => config.root.clone(),
            };
            let diagnoses = pipeline::diagnose(&repo, &page).await?;
            deliver_all(OutputPlan::new().with_operation(DeliveryTarget::PrintToStdout {
                content: pipeline::render_diagnosis(&page, &diagnoses),
            }))?;
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose).context("could not initialize logging")?;

    let config = RelayConfig::resolve(&cli)?;

    execute(&cli.command, &config).await?;

    Ok(())
}
