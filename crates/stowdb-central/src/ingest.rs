//! The boundary with the page fetcher and the page parser.
//!
//! The fetcher hands over `(url, category, page source)` triples, which are
//! stored as [`RawSiteData`]; the parser reads back the raw pages whose
//! category holds wearable items.

use stowdb_core::error::Error;
use stowdb_core::{Filters, Session};
use tracing::{debug, info};

use crate::constants::{WEARABLE_CATEGORIES, normalize_category};
use crate::records::RawSiteData;

/// A fetched page: its URL, its category and its HTML source.
pub type PageTriple = (String, String, String);

/// Store fetched pages, replacing any earlier copy of the same URL.
///
/// Categories are normalized to their plural spelling when recognized and
/// kept verbatim otherwise. Returns the number of pages stored.
pub fn ingest_pages<I>(session: &Session<'_>, pages: I) -> Result<usize, Error>
where
    I: IntoIterator<Item = PageTriple>,
{
    let mut stored = 0;
    for (page_url, category, page_source) in pages {
        let category = match normalize_category(&category) {
            Some(plural) => plural.to_string(),
            None => {
                debug!(url = %page_url, category = %category, "unrecognized category");
                category
            }
        };
        session.save(&RawSiteData {
            page_url,
            category,
            page_source: Some(page_source),
        })?;
        stored += 1;
    }
    info!(pages = stored, "ingested pages");
    Ok(stored)
}

/// Raw pages whose category holds wearable items.
pub fn pending_wearables(session: &Session<'_>) -> Result<Vec<RawSiteData>, Error> {
    session
        .select::<RawSiteData>()
        .filter("category__in", WEARABLE_CATEGORIES)
        .execute()
}

/// Number of raw pages per category, for every category with at least one.
pub fn category_counts(session: &Session<'_>) -> Result<Vec<(&'static str, u64)>, Error> {
    let mut counts = Vec::new();
    for category in crate::constants::CATEGORIES {
        let count = session.count::<RawSiteData>(Filters::new().with("category", category))?;
        if count > 0 {
            counts.push((category, count));
        }
    }
    Ok(counts)
}
