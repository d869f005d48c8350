// src/pipeline.rs
//! One function per report: discover pages, resolve facts, filter, and
//! hand the result to a relay or to the output plan.
//!
//! Everything external comes in as a trait object or a value, so each report
//! runs unchanged against the in-memory repository and relay in tests.

use crate::api::NotionRepository;
use crate::config::PageSource;
use crate::error::AppError;
use crate::facts::UserDirectory;
use crate::filter::{PageFilter, VisibilityPolicy};
use crate::formatting::{self, StaleSummary, TemplateSet};
use crate::model::{Page, PageSummary, Parent};
use crate::posted_cache::PostedCache;
use crate::reports::{self, LanguageRow, WordCounts};
use crate::slack::{ChatMessage, ChatRelay};
use crate::types::NotionId;
use crate::walker::{AccessGap, GapReason, Separator, TreeWalker, WalkOptions};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Settings shared by every report.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub root: NotionId,
    pub now: DateTime<Utc>,
    pub deadline: Option<Duration>,
}

/// Every page under the root, in discovery order.
pub async fn discover_pages<R: NotionRepository + ?Sized>(
    repo: &R,
    ctx: &RunContext,
) -> Result<Vec<Page>, AppError> {
    let walker = TreeWalker::new(repo, WalkOptions::pages().with_deadline(ctx.deadline));
    let report = walker.walk(&ctx.root).await?;
    if !report.gaps.is_empty() {
        log::warn!(
            "{} parts of the tree could not be read; run `diagnose` for details",
            report.gaps.len()
        );
    }
    log::info!("Discovered {} pages under {}", report.pages.len(), ctx.root);
    Ok(report.into_pages())
}

// ---------------------------------------------------------------------------
// announce
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AnnounceOptions {
    pub min_age_days: i64,
    pub visibility: VisibilityPolicy,
    /// Pause between consecutive posts.
    pub post_interval: Duration,
}

#[derive(Debug, Default)]
pub struct AnnounceOutcome {
    pub eligible: Vec<PageSummary>,
    /// Rendered messages, in posting order.
    pub messages: Vec<ChatMessage>,
    pub posted: Vec<NotionId>,
    pub failed: Vec<(NotionId, String)>,
}

/// Finds the pages due for announcement and renders their messages without
/// posting anything or touching the cache.
pub async fn preview_announcements<R: NotionRepository + ?Sized>(
    repo: &R,
    cache: &PostedCache,
    ctx: &RunContext,
    options: &AnnounceOptions,
) -> Result<AnnounceOutcome, AppError> {
    let templates = TemplateSet::new()?;
    let filter = PageFilter::Novelty {
        min_age_days: options.min_age_days,
        visibility: options.visibility,
    };

    let candidates: Vec<Page> = discover_pages(repo, ctx)
        .await?
        .into_iter()
        .filter(|p| filter.is_eligible(p, Some(cache), ctx.now))
        .collect();
    let eligible = UserDirectory::new(repo).summarize_all(candidates).await;
    log::info!("{} pages to announce", eligible.len());

    let messages = eligible
        .iter()
        .map(|summary| formatting::announcement(&templates, summary))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AnnounceOutcome {
        eligible,
        messages,
        ..AnnounceOutcome::default()
    })
}

/// Announces every eligible page once. A failed post is logged and skipped;
/// successful posts are added to the cache, which is saved at the end.
pub async fn announce<R, C>(
    repo: &R,
    relay: &C,
    cache: &mut PostedCache,
    ctx: &RunContext,
    options: &AnnounceOptions,
) -> Result<AnnounceOutcome, AppError>
where
    R: NotionRepository + ?Sized,
    C: ChatRelay + ?Sized,
{
    let mut outcome = preview_announcements(repo, cache, ctx, options).await?;

    for (index, (summary, message)) in outcome.eligible.iter().zip(&outcome.messages).enumerate() {
        if index > 0 && !options.post_interval.is_zero() {
            tokio::time::sleep(options.post_interval).await;
        }

        match relay.post(message).await {
            Ok(()) => {
                log::info!("Announced \"{}\"", summary.title());
                cache.insert(summary.id().clone());
                outcome.posted.push(summary.id().clone());
            }
            Err(e) => {
                log::error!("Could not announce \"{}\": {}", summary.title(), e);
                outcome.failed.push((summary.id().clone(), e.to_string()));
            }
        }
    }

    if !outcome.posted.is_empty() {
        cache.save()?;
    }
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// digest
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct DigestOutcome {
    pub pages: Vec<PageSummary>,
    pub message: ChatMessage,
}

/// Builds the digest of pages created inside the window.
pub async fn digest<R: NotionRepository + ?Sized>(
    repo: &R,
    ctx: &RunContext,
    min_age_days: i64,
    max_age_days: i64,
) -> Result<DigestOutcome, AppError> {
    let templates = TemplateSet::new()?;
    let filter = PageFilter::CreationWindow {
        min_age_days,
        max_age_days,
    };

    let pages: Vec<Page> = discover_pages(repo, ctx)
        .await?
        .into_iter()
        .filter(|p| filter.is_eligible(p, None, ctx.now))
        .collect();
    let pages = UserDirectory::new(repo).summarize_all(pages).await;
    let message = formatting::digest(&templates, &pages, min_age_days, max_age_days)?;

    Ok(DigestOutcome { pages, message })
}

/// Posts the digest, or an error notice when building it failed. The
/// original error is returned either way.
pub async fn digest_and_post<R, C>(
    repo: &R,
    relay: &C,
    ctx: &RunContext,
    min_age_days: i64,
    max_age_days: i64,
) -> Result<DigestOutcome, AppError>
where
    R: NotionRepository + ?Sized,
    C: ChatRelay + ?Sized,
{
    match digest(repo, ctx, min_age_days, max_age_days).await {
        Ok(outcome) => {
            relay.post(&outcome.message).await?;
            log::info!("Posted digest of {} pages", outcome.pages.len());
            Ok(outcome)
        }
        Err(e) => {
            log::error!("Digest failed: {}", e);
            let notice = TemplateSet::new()
                .and_then(|t| formatting::error_notice(&t, &e.to_string()));
            match notice {
                Ok(notice) => {
                    if let Err(post_error) = relay.post(&notice).await {
                        log::error!("Could not post the error notice: {}", post_error);
                    }
                }
                Err(render_error) => log::error!("Could not render the error notice: {}", render_error),
            }
            Err(e)
        }
    }
}

// ---------------------------------------------------------------------------
// stale
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct StaleOutcome {
    pub total_scanned: usize,
    /// Oldest edit first.
    pub stale: Vec<PageSummary>,
}

/// Pages not edited for `min_age_days`, oldest first.
pub async fn stale<R: NotionRepository + ?Sized>(
    repo: &R,
    ctx: &RunContext,
    min_age_days: i64,
    source: PageSource,
) -> Result<StaleOutcome, AppError> {
    let pages = match source {
        PageSource::Tree => discover_pages(repo, ctx).await?,
        PageSource::Search => direct_subpages(repo, &ctx.root).await?,
    };
    let total_scanned = pages.len();

    let filter = PageFilter::Staleness { min_age_days };
    let candidates: Vec<Page> = pages
        .into_iter()
        .filter(|p| filter.is_eligible(p, None, ctx.now))
        .collect();
    let mut stale = UserDirectory::new(repo).summarize_all(candidates).await;
    reports::sort_oldest_first(&mut stale);

    log::info!("{} of {} pages are stale", stale.len(), total_scanned);
    Ok(StaleOutcome {
        total_scanned,
        stale,
    })
}

/// Pages found by workspace search whose parent is `root`.
async fn direct_subpages<R: NotionRepository + ?Sized>(
    repo: &R,
    root: &NotionId,
) -> Result<Vec<Page>, AppError> {
    let pages = repo.all_pages().await?;
    log::info!("Search returned {} pages", pages.len());
    Ok(pages
        .into_iter()
        .filter(|p| p.parent.page_id() == Some(root))
        .collect())
}

/// The CSV and, when requested, the markdown summary of a stale report.
pub fn stale_files(
    outcome: &StaleOutcome,
    months: i64,
    now: DateTime<Utc>,
) -> Result<(String, String), AppError> {
    let templates = TemplateSet::new()?;
    let csv = reports::stale_csv(&outcome.stale, now)?;
    let summary = formatting::stale_summary(
        &templates,
        &StaleSummary {
            total_scanned: outcome.total_scanned,
            stale: &outcome.stale,
            months,
            now,
        },
    )?;
    Ok((csv, summary))
}

/// The count message posted after a stale report, if any pages are stale.
pub fn stale_notice(
    outcome: &StaleOutcome,
    months: i64,
    artifact_url: Option<&str>,
) -> Result<Option<ChatMessage>, AppError> {
    if outcome.stale.is_empty() {
        return Ok(None);
    }
    let templates = TemplateSet::new()?;
    formatting::stale_count(&templates, outcome.stale.len(), months, artifact_url).map(Some)
}

// ---------------------------------------------------------------------------
// languages
// ---------------------------------------------------------------------------

/// Language composition of the root and every page under it, sorted by
/// English share then Russian share. A page whose blocks cannot be read is
/// left out.
pub async fn languages<R: NotionRepository + ?Sized>(
    repo: &R,
    ctx: &RunContext,
) -> Result<Vec<LanguageRow>, AppError> {
    let walker = TreeWalker::new(
        repo,
        WalkOptions::pages().with_root().with_deadline(ctx.deadline),
    );
    let pages = walker.walk(&ctx.root).await?.into_pages();
    log::info!("Measuring language of {} pages", pages.len());

    let text_walker = TreeWalker::new(repo, WalkOptions::page_text(Separator::Space));
    let mut users = UserDirectory::new(repo);
    let mut rows = Vec::with_capacity(pages.len());

    for page in pages {
        let report = match text_walker.walk(&page.id).await {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Skipping \"{}\": {}", page.title, e);
                continue;
            }
        };
        let counts = WordCounts::of_blocks(report.branch_texts.iter().map(String::as_str));
        log::debug!(
            "\"{}\": {} Russian, {} English words",
            page.title,
            counts.russian,
            counts.english
        );
        rows.push(LanguageRow {
            author: users.author_of(&page).await,
            title: page.title,
            url: page.url,
            share: counts.share(),
        });
    }

    reports::sort_rows(&mut rows);
    Ok(rows)
}

// ---------------------------------------------------------------------------
// diagnose
// ---------------------------------------------------------------------------

/// An unreadable part of a page, with the page to share when it is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    pub gap: AccessGap,
    /// URL of the page holding an inaccessible synced original.
    pub share_page: Option<String>,
}

/// Walks the blocks of `page` (sub-pages excluded) and explains every gap.
pub async fn diagnose<R: NotionRepository + ?Sized>(
    repo: &R,
    page: &NotionId,
) -> Result<Vec<Diagnosis>, AppError> {
    let options = WalkOptions {
        collect_text: false,
        ..WalkOptions::page_text(Separator::Space)
    };
    let report = TreeWalker::new(repo, options).walk(page).await?;

    let mut diagnoses = Vec::with_capacity(report.gaps.len());
    for gap in report.gaps {
        let share_page = match gap.reason {
            GapReason::SyncedOriginalInaccessible => repo
                .retrieve_block(&gap.node_id)
                .await
                .ok()
                .and_then(|block| match block.parent {
                    Some(Parent::Page { page_id }) => Some(page_id.web_url()),
                    _ => None,
                }),
            _ => None,
        };
        diagnoses.push(Diagnosis { gap, share_page });
    }
    Ok(diagnoses)
}

/// Human-readable diagnosis report.
pub fn render_diagnosis(page: &NotionId, diagnoses: &[Diagnosis]) -> String {
    let mut out = format!("Diagnosis of {}\n", page);
    if diagnoses.is_empty() {
        out.push_str("✔ Every block is readable by the integration.\n");
        return out;
    }
    for diagnosis in diagnoses {
        out.push_str(&format!(" - {}\n", diagnosis.gap));
        if let Some(url) = &diagnosis.share_page {
            out.push_str(&format!("   Page: {} (share this page with the integration)\n", url));
        }
    }
    out
}
