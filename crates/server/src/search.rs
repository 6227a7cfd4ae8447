use common::MediaItem;
use library::{Catalog, Query};
use rand::Rng;
use time::{Date, Month};

const RECENT_MONTHS: usize = 6;

/// What a search request resolved to: the query actually run and its hits.
pub struct SearchOutcome<'a> {
    pub query: String,
    pub items: Vec<&'a MediaItem>,
}

/// Runs `raw` against `catalog`. With `fallback` set, a blank query first
/// looks for items added in the last six months, and a blank query with no
/// recent items or a lone `?` searches for the folder of a random item.
pub fn search_catalog<'a, R: Rng>(
    catalog: &'a Catalog,
    raw: &str,
    fallback: bool,
    today: Date,
    rng: &mut R,
) -> SearchOutcome<'a> {
    let trimmed = raw.trim();
    if !fallback || !(trimmed.is_empty() || trimmed == "?") {
        return run(catalog, raw.to_string());
    }

    if trimmed.is_empty() {
        for query in recent_month_queries(today) {
            let outcome = run(catalog, query);
            if !outcome.items.is_empty() {
                return outcome;
            }
        }
    }

    match random_folder_query(catalog, rng) {
        Some(query) => run(catalog, query),
        None => SearchOutcome {
            query: trimmed.to_string(),
            items: Vec::new(),
        },
    }
}

fn run(catalog: &Catalog, query: String) -> SearchOutcome<'_> {
    let items = catalog.search(&Query::parse(&query));
    SearchOutcome { query, items }
}

/// `added:YYYY-MM-` for the month of `today` and the five before it.
pub fn recent_month_queries(today: Date) -> Vec<String> {
    let mut year = today.year();
    let mut month = today.month();
    let mut queries = Vec::with_capacity(RECENT_MONTHS);
    for _ in 0..RECENT_MONTHS {
        queries.push(format!("added:{:04}-{:02}-", year, u8::from(month)));
        if month == Month::January {
            year -= 1;
        }
        month = month.previous();
    }
    queries
}

/// Last word of a random item's folder name. Items at the root have no
/// folder and yield `None`.
fn random_folder_query<R: Rng>(catalog: &Catalog, rng: &mut R) -> Option<String> {
    if catalog.is_empty() {
        return None;
    }
    let item = &catalog.items()[rng.random_range(0..catalog.len())];
    item.parent_folder()?
        .split_whitespace()
        .last()
        .map(str::to_string)
}
