//! Record extractor - turns listing blocks into filtered, scored releases.
//!
//! A listing block only becomes a [`Release`] after passing the vote-count
//! and rating gates; album blocks additionally expand into their top tracks
//! via the detail page. The weighted-score gate runs last, over the already
//! expanded set.

use crate::fetch::PageFetcher;
use crate::listing::{self, ListingBlock};
use crate::scoring::{weighted_score, GLOBAL_AVG, SMOOTHING};

/// Which listing a page came from. Albums expand into per-track releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Singles,
    Albums,
}

/// What a release track belongs to. Standalone tracks have no album name;
/// the display string for those is the literal "Single".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseKind {
    Single,
    Album { name: String },
}

/// A normalized, gate-passing release. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    /// Textual release date as scraped, e.g. "Jan 5".
    pub date: String,
    pub title: String,
    pub artist: String,
    pub kind: ReleaseKind,
    /// User rating on the 0-100 scale.
    pub rating: u32,
    pub votes: u32,
    /// Smoothed 0-10 score, 2-decimal rounding.
    pub weighted: f64,
}

impl Release {
    /// Grouping label for display: the album name, or "Single".
    pub fn grouping(&self) -> &str {
        match &self.kind {
            ReleaseKind::Single => "Single",
            ReleaseKind::Album { name } => name,
        }
    }
}

/// Inclusion gates. The release-level gates apply to the user rating entry;
/// the track-level gates apply per row of an album's detail page.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub min_votes: u32,
    pub min_rating: u32,
    pub min_weighted: f64,
    pub track_min_rating: u32,
    pub track_min_votes: u32,
    pub top_songs_keep: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            min_votes: 7,
            min_rating: 76,
            min_weighted: 7.5,
            track_min_rating: 75,
            track_min_votes: 5,
            top_songs_keep: 3,
        }
    }
}

/// Extract all qualifying releases from one page's listing blocks.
///
/// Album detail pages are fetched through `fetcher`; a failed or empty
/// detail fetch skips that one album and the extraction continues.
pub fn extract_page(
    blocks: &[ListingBlock],
    kind: ListingKind,
    thresholds: &Thresholds,
    fetcher: &mut dyn PageFetcher,
) -> Vec<Release> {
    let mut releases = Vec::new();

    for block in blocks {
        // Zero entries means no community data yet. With two entries the
        // first is the critic score; the user entry is always last.
        let user = match block.ratings.last() {
            Some(entry) => *entry,
            None => continue,
        };

        // Undated releases are not placed on the calendar yet.
        let date = match &block.date {
            Some(d) => d.clone(),
            None => continue,
        };

        if user.votes < thresholds.min_votes || user.score < thresholds.min_rating {
            continue;
        }

        match kind {
            ListingKind::Singles => {
                releases.push(Release {
                    date,
                    title: block.title.clone(),
                    artist: block.artist.clone(),
                    kind: ReleaseKind::Single,
                    rating: user.score,
                    votes: user.votes,
                    weighted: weighted_score(user.score, user.votes, GLOBAL_AVG, SMOOTHING),
                });
            }
            ListingKind::Albums => {
                expand_album(block, &date, thresholds, fetcher, &mut releases);
            }
        }
    }

    // Final gate, after album expansion: individual track scores can fall
    // below the cut even when the album-level rating passed.
    releases.retain(|r| r.weighted >= thresholds.min_weighted);
    releases
}

/// Fetch an album's detail page and emit its top qualifying tracks.
///
/// How many tracks survive depends on the mean rating of the qualifying
/// set: below 82 only the best one, 82 to just under 84 the best two,
/// from 84 up the configured `top_songs_keep`. Ties keep detail-page order.
fn expand_album(
    block: &ListingBlock,
    date: &str,
    thresholds: &Thresholds,
    fetcher: &mut dyn PageFetcher,
    releases: &mut Vec<Release>,
) {
    let url = match &block.detail_url {
        Some(u) => u,
        None => return,
    };

    let resp = match fetcher.fetch(url) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("  skipping album \"{}\": {}", block.title, e);
            return;
        }
    };
    if !resp.is_ok() {
        eprintln!("  skipping album \"{}\": HTTP {}", block.title, resp.status);
        return;
    }

    let tracks = listing::parse_album_tracks(&resp.body);
    if tracks.is_empty() {
        return;
    }

    let mut qualifying: Vec<_> = tracks
        .iter()
        .filter(|t| t.rating >= thresholds.track_min_rating && t.votes >= thresholds.track_min_votes)
        .collect();
    if qualifying.is_empty() {
        return;
    }

    let mean =
        qualifying.iter().map(|t| t.rating as f64).sum::<f64>() / qualifying.len() as f64;
    let keep = if mean < 82.0 {
        1
    } else if mean < 84.0 {
        2
    } else {
        thresholds.top_songs_keep
    };

    // Stable sort: equal ratings keep their detail-page order.
    qualifying.sort_by(|a, b| b.rating.cmp(&a.rating));

    for track in qualifying.into_iter().take(keep) {
        releases.push(Release {
            date: date.to_string(),
            title: track.title.clone(),
            artist: block.artist.clone(),
            kind: ReleaseKind::Album { name: block.title.clone() },
            rating: track.rating,
            votes: track.votes,
            // Each track is scored from its own rating and votes, not the album's.
            weighted: weighted_score(track.rating, track.votes, GLOBAL_AVG, SMOOTHING),
        });
    }
}
