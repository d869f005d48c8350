// src/filter.rs
//! Which pages a report is about.
//!
//! All predicates are pure: the same pages, cache and clock always give the
//! same answer.

use crate::model::{Page, PageSummary};
use crate::posted_cache::PostedCache;
use crate::types::ValidationError;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::str::FromStr;

/// When a page counts as public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityPolicy {
    /// Only pages published to the web (they carry a public URL).
    #[default]
    RequirePublicUrl,
    /// Published pages, plus pages whose status is public/published or that
    /// have no status at all.
    PublicUnlessMarkedOtherwise,
}

impl VisibilityPolicy {
    pub fn is_visible(&self, page: &Page) -> bool {
        if page.has_public_url() {
            return true;
        }
        match self {
            VisibilityPolicy::RequirePublicUrl => false,
            VisibilityPolicy::PublicUnlessMarkedOtherwise => match &page.status {
                Some(status) => {
                    let status = status.trim().to_lowercase();
                    status == "public" || status == "published"
                }
                None => true,
            },
        }
    }
}

impl FromStr for VisibilityPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public-url" | "require-public-url" => Ok(VisibilityPolicy::RequirePublicUrl),
            "status" | "public-by-default" => Ok(VisibilityPolicy::PublicUnlessMarkedOtherwise),
            other => Err(ValidationError::InvalidThreshold {
                value: other.to_string(),
                reason: "expected 'public-url' or 'status'".to_string(),
            }),
        }
    }
}

impl fmt::Display for VisibilityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisibilityPolicy::RequirePublicUrl => write!(f, "public-url"),
            VisibilityPolicy::PublicUnlessMarkedOtherwise => write!(f, "status"),
        }
    }
}

/// A report's eligibility rule. Ages are whole days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFilter {
    /// Old enough since creation, visible, and not announced before.
    Novelty {
        min_age_days: i64,
        visibility: VisibilityPolicy,
    },
    /// Created between exactly `max_age_days` and `min_age_days` ago, inclusive.
    CreationWindow { min_age_days: i64, max_age_days: i64 },
    /// Not edited for at least `min_age_days`.
    Staleness { min_age_days: i64 },
}

impl PageFilter {
    /// `cache` only matters for `Novelty`; without one nothing counts as posted.
    pub fn is_eligible(&self, page: &Page, cache: Option<&PostedCache>, now: DateTime<Utc>) -> bool {
        match self {
            PageFilter::Novelty {
                min_age_days,
                visibility,
            } => {
                page.age_days(now) >= *min_age_days
                    && visibility.is_visible(page)
                    && !cache.is_some_and(|c| c.contains(&page.id))
            }
            PageFilter::CreationWindow {
                min_age_days,
                max_age_days,
            } => {
                let newest = now - Duration::days(*min_age_days);
                let oldest = now - Duration::days(*max_age_days);
                oldest <= page.created_time && page.created_time <= newest
            }
            PageFilter::Staleness { min_age_days } => page.days_since_edit(now) >= *min_age_days,
        }
    }

    /// The eligible summaries, in input order.
    pub fn select(
        &self,
        pages: &[PageSummary],
        cache: Option<&PostedCache>,
        now: DateTime<Utc>,
    ) -> Vec<PageSummary> {
        pages
            .iter()
            .filter(|s| self.is_eligible(&s.page, cache, now))
            .cloned()
            .collect()
    }
}
