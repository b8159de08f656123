// src/ingest/paginate.rs
//! Page loop shared by the paginated adapters.

use std::future::Future;

use crate::error::Result;
use crate::ingest::types::{FetchOutcome, Posting, SourceKind};
use crate::watermark::Watermark;

/// How a paginated source decides to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Results are sorted newest first: stop at the first page with nothing
    /// newer than the watermark.
    EarlyExit,
    /// Walk until an empty page, the last page or the page cap.
    Exhaustive,
}

/// One decoded page.
#[derive(Debug, Default)]
pub struct Page {
    /// Postings with a parseable date, before any filtering.
    pub postings: Vec<Posting>,
    /// Items in the raw response, including ones dropped while decoding.
    pub raw_count: usize,
    /// The upstream says there is nothing after this page.
    pub last_page: bool,
}

/// Keep postings strictly newer than the watermark that pass `keep`.
pub fn select_fresh<F>(postings: Vec<Posting>, watermark: &Watermark, keep: F) -> Vec<Posting>
where
    F: Fn(&Posting) -> bool,
{
    postings
        .into_iter()
        .filter(|p| watermark.is_newer(&p.published_at) && keep(p))
        .collect()
}

/// Fetch pages `0..max_pages` and accumulate fresh postings.
///
/// A page error ends the loop; postings collected from earlier pages are
/// returned alongside it.
pub async fn collect_pages<K, F, Fut>(
    source: SourceKind,
    policy: Pagination,
    max_pages: u32,
    watermark: &Watermark,
    keep: K,
    mut fetch_page: F,
) -> FetchOutcome
where
    K: Fn(&Posting) -> bool,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page>>,
{
    let mut out = FetchOutcome::default();

    for page in 0..max_pages {
        let batch = match fetch_page(page).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(source = %source, page, error = %e, "page fetch failed, keeping earlier pages");
                out.errors.push(e);
                return out;
            }
        };

        if batch.raw_count == 0 {
            tracing::debug!(source = %source, page, "empty page, stopping");
            return out;
        }

        // an undated page says nothing about what follows it
        let stale = !batch.postings.is_empty()
            && batch
                .postings
                .iter()
                .all(|p| !watermark.is_newer(&p.published_at));
        if policy == Pagination::EarlyExit && stale {
            tracing::info!(source = %source, page, "page holds nothing newer than the watermark, stopping");
            return out;
        }

        let before = out.postings.len();
        out.postings
            .extend(select_fresh(batch.postings, watermark, &keep));
        tracing::debug!(
            source = %source,
            page,
            raw = batch.raw_count,
            accepted = out.postings.len() - before,
            "page processed"
        );

        if batch.last_page {
            return out;
        }
    }

    tracing::debug!(source = %source, max_pages, "page cap reached");
    out
}
