//! Paginated lookups that resolve a filter to exactly one record.

use std::future::Future;

use tracing::debug;

use crate::context::Context;
use crate::error::ProviderError;
use crate::filter::{FilterSpec, Flatten};

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// Cursor for the next page; `None` at the end of the listing.
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Build a page, treating an empty cursor as the end of the listing.
    pub fn new(items: Vec<T>, next_cursor: impl Into<String>) -> Self {
        let next_cursor = next_cursor.into();
        Self {
            items,
            next_cursor: if next_cursor.is_empty() {
                None
            } else {
                Some(next_cursor)
            },
        }
    }

    /// A final page.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }
}

/// Visit every page of a listing, handing each page's records to `visit`.
///
/// A failed fetch aborts the walk with [`ProviderError::Fetch`].
async fn walk_pages<T, F, Fut, V>(ctx: &Context, mut fetch: F, mut visit: V) -> Result<(), ProviderError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ProviderError>>,
    V: FnMut(Vec<T>) -> Result<(), ProviderError>,
{
    let mut cursor: Option<String> = None;
    let mut page_number = 1usize;
    loop {
        ctx.check()?;
        let page = ctx
            .run(fetch(cursor.take()))
            .await
            .map_err(|err| ProviderError::fetch(format!("listing page {page_number}"), err))?;

        debug!(page = page_number, records = page.items.len(), "Fetched page");
        visit(page.items)?;

        match page.next_cursor {
            Some(next) => {
                cursor = Some(next);
                page_number += 1;
            },
            None => return Ok(()),
        }
    }
}

/// Collect every record of a listing.
pub async fn list_all<T, F, Fut>(ctx: &Context, fetch: F) -> Result<Vec<T>, ProviderError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ProviderError>>,
{
    let mut all = Vec::new();
    walk_pages(ctx, fetch, |items| {
        all.extend(items);
        Ok(())
    })
    .await?;
    Ok(all)
}

/// Collect every record of a listing that satisfies `spec`.
///
/// Every page is visited, even after a match has been found.
pub async fn collect_matches<T, F, Fut>(
    ctx: &Context,
    spec: &FilterSpec,
    fetch: F,
) -> Result<Vec<T>, ProviderError>
where
    T: Flatten,
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ProviderError>>,
{
    let mut matches = Vec::new();
    walk_pages(ctx, fetch, |items| {
        for item in items {
            if spec.matches(&item.flatten()?) {
                matches.push(item);
            }
        }
        Ok(())
    })
    .await?;
    Ok(matches)
}

/// Reduce accumulated matches to the single expected record.
pub fn exactly_one<T>(mut matches: Vec<T>) -> Result<T, ProviderError> {
    match matches.len() {
        0 => Err(ProviderError::NotFound("no results were found".to_string())),
        1 => Ok(matches.remove(0)),
        count => Err(ProviderError::AmbiguousResult { count }),
    }
}

/// Resolve `spec` against a paginated listing to exactly one record.
///
/// Zero matches is [`ProviderError::NotFound`], more than one is
/// [`ProviderError::AmbiguousResult`]. No partial result is returned when a
/// page fails to load.
pub async fn run_lookup<T, F, Fut>(ctx: &Context, spec: &FilterSpec, fetch: F) -> Result<T, ProviderError>
where
    T: Flatten,
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ProviderError>>,
{
    let matches = collect_matches(ctx, spec, fetch).await?;
    debug!(matches = matches.len(), "Lookup finished");
    exactly_one(matches)
}
