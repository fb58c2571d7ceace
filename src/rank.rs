//! Merger/ranker - one ordered list out of the singles and albums runs.
//!
//! The sort key is (calendar date, weighted score), both descending. The
//! date is parsed from the scraped text against an assumed year supplied
//! at merge time; it exists only for the sort and is never stored on the
//! release. Listing pages carry no year, so runs that straddle New Year
//! should pass the year the scraped pages actually cover.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::extract::Release;

/// Parse a listing date like "Jan 5" against the assumed year.
fn parse_release_date(text: &str, year: i32) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{} {}", text, year), "%b %d %Y").ok()
}

/// Combine the albums and singles collections (albums first) and sort by
/// recency, then weighted score. The sort is stable: equal keys keep the
/// concatenation order. Releases whose date fails to parse sort last.
pub fn merge_and_rank(albums: Vec<Release>, singles: Vec<Release>, year: i32) -> Vec<Release> {
    let mut combined = albums;
    combined.extend(singles);

    let mut keyed: Vec<(Option<NaiveDate>, Release)> = combined
        .into_iter()
        .map(|r| (parse_release_date(&r.date, year), r))
        .collect();

    // Descending on both; None dates compare below every Some.
    keyed.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| b.1.weighted.partial_cmp(&a.1.weighted).unwrap_or(Ordering::Equal))
    });

    keyed.into_iter().map(|(_, r)| r).collect()
}
