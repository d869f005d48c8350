// src/api/pagination.rs
//! Draining cursor-paginated endpoints.

use crate::constants::NOTION_API_PAGE_SIZE;
use crate::error::AppError;
use serde::Deserialize;

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Paginated<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> Paginated<T> {
    /// A final page.
    pub fn last(results: Vec<T>) -> Self {
        Self {
            results,
            next_cursor: None,
            has_more: false,
        }
    }

    /// A page followed by more results at `cursor`.
    pub fn more(results: Vec<T>, cursor: impl Into<String>) -> Self {
        Self {
            results,
            next_cursor: Some(cursor.into()),
            has_more: true,
        }
    }
}

/// Page size requested from every listing endpoint.
pub fn page_size() -> u32 {
    NOTION_API_PAGE_SIZE as u32
}

/// Fetches every page of a listing and returns the concatenated results.
///
/// Stops when the remote reports `has_more = false`, when it reports more
/// results but sends no cursor, or after `max_pages` pages.
pub async fn collect_all<T, F, Fut>(mut fetch: F, max_pages: Option<u32>) -> Result<Vec<T>, AppError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<Paginated<T>, AppError>>,
{
    let mut all_items = Vec::new();
    let mut cursor = None;
    let mut pages_fetched = 0u32;

    loop {
        if let Some(max) = max_pages {
            if pages_fetched >= max {
                log::debug!("Reached maximum page limit: {}", max);
                break;
            }
        }

        let response = fetch(cursor).await?;

        let has_more = response.has_more;
        cursor = response.next_cursor;
        all_items.extend(response.results);
        pages_fetched += 1;

        if has_more && cursor.is_none() {
            log::warn!("Listing reported more results without a cursor; treating as complete");
        }
        if !has_more || cursor.is_none() {
            break;
        }
    }

    Ok(all_items)
}
