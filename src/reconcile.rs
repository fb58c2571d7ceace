//! Playlist reconciler - diffs the ranked list against remote membership.
//!
//! Two stages, cheapest first. Stage A fetches the playlist once and drops
//! candidates whose title is already on it, before any search call. Stage B
//! resolves each survivor to a catalog track and adds it unless its id is
//! already in the confirmed set, which is seeded from Stage A's fetch and
//! grows as additions succeed, so one run never adds the same track twice.
//!
//! Every candidate ends in exactly one state: title-filtered, not-found,
//! already-present, or added.

use std::collections::HashSet;
use std::error::Error;

use crate::extract::Release;
use crate::spotify::PlaylistStore;

/// What happened to the ranked candidates in one reconciliation pass.
/// `added` preserves the input ranking order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub added: Vec<Release>,
    pub title_filtered: usize,
    pub not_found: usize,
    pub already_present: usize,
}

impl SyncReport {
    pub fn total_dropped(&self) -> usize {
        self.title_filtered + self.not_found + self.already_present
    }
}

/// Add every ranked release that is not already on the playlist.
pub fn sync_playlist(
    store: &mut dyn PlaylistStore,
    playlist_id: &str,
    ranked: &[Release],
) -> Result<SyncReport, Box<dyn Error>> {
    let membership = store.list_tracks(playlist_id)?;

    let existing_titles: HashSet<&str> =
        membership.iter().map(|e| e.title.as_str()).collect();
    let mut confirmed_uris: HashSet<String> =
        membership.iter().map(|e| e.uri.clone()).collect();

    let mut report = SyncReport::default();

    // Stage A: coarse title prefilter, no remote calls per candidate.
    let candidates: Vec<&Release> = ranked
        .iter()
        .filter(|r| {
            let present = existing_titles.contains(r.title.as_str());
            if present {
                report.title_filtered += 1;
            }
            !present
        })
        .collect();

    // Stage B: resolve and add.
    for release in candidates {
        let track = match store.search_track(&release.artist, &release.title)? {
            Some(t) => t,
            None => {
                println!("Could not find '{} - {}' on Spotify.", release.artist, release.title);
                report.not_found += 1;
                continue;
            }
        };

        if confirmed_uris.contains(&track.uri) {
            // Resolved to a track this run already confirmed. Common when a
            // single and its album cut both chart in the same window.
            report.already_present += 1;
            continue;
        }

        store.add_track(playlist_id, &track.uri)?;
        println!("Added '{} - {}' to the playlist.", release.artist, release.title);
        confirmed_uris.insert(track.uri);
        report.added.push(release.clone());
    }

    Ok(report)
}

/// Unconditional wipe: remove every track currently on the playlist.
/// Returns how many were removed. Not part of the per-run sync path.
pub fn clear_playlist(
    store: &mut dyn PlaylistStore,
    playlist_id: &str,
) -> Result<usize, Box<dyn Error>> {
    let membership = store.list_tracks(playlist_id)?;
    if membership.is_empty() {
        return Ok(0);
    }

    let uris: Vec<String> = membership.into_iter().map(|e| e.uri).collect();
    let count = uris.len();
    store.remove_tracks(playlist_id, &uris)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Release, ReleaseKind};
    use crate::spotify::{PlaylistEntry, TrackRef};

    /// In-memory playlist store recording call counts.
    struct MockStore {
        playlist: Vec<PlaylistEntry>,
        /// catalog: (artist, title) -> uri
        catalog: Vec<(String, String, String)>,
        search_calls: usize,
        add_calls: usize,
    }

    impl MockStore {
        fn new(playlist: Vec<PlaylistEntry>) -> Self {
            MockStore { playlist, catalog: Vec::new(), search_calls: 0, add_calls: 0 }
        }

        fn with_catalog(mut self, entries: &[(&str, &str, &str)]) -> Self {
            self.catalog = entries
                .iter()
                .map(|(a, t, u)| (a.to_string(), t.to_string(), u.to_string()))
                .collect();
            self
        }
    }

    impl PlaylistStore for MockStore {
        fn list_tracks(&mut self, _playlist_id: &str) -> Result<Vec<PlaylistEntry>, Box<dyn Error>> {
            Ok(self.playlist.clone())
        }

        fn search_track(
            &mut self,
            artist: &str,
            title: &str,
        ) -> Result<Option<TrackRef>, Box<dyn Error>> {
            self.search_calls += 1;
            Ok(self
                .catalog
                .iter()
                .find(|(a, t, _)| a == artist && t == title)
                .map(|(a, t, u)| TrackRef {
                    uri: u.clone(),
                    name: t.clone(),
                    artist: a.clone(),
                }))
        }

        fn add_track(&mut self, _playlist_id: &str, uri: &str) -> Result<(), Box<dyn Error>> {
            self.add_calls += 1;
            self.playlist.push(PlaylistEntry { uri: uri.to_string(), title: String::new() });
            Ok(())
        }

        fn remove_tracks(
            &mut self,
            _playlist_id: &str,
            uris: &[String],
        ) -> Result<(), Box<dyn Error>> {
            self.playlist.retain(|e| !uris.contains(&e.uri));
            Ok(())
        }
    }

    fn release(artist: &str, title: &str) -> Release {
        Release {
            date: "Jan 5".to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            kind: ReleaseKind::Single,
            rating: 85,
            votes: 100,
            weighted: 8.1,
        }
    }

    #[test]
    fn test_title_match_dropped_before_search() {
        let mut store = MockStore::new(vec![PlaylistEntry {
            uri: "spotify:track:1".to_string(),
            title: "Known Song".to_string(),
        }]);
        let ranked = vec![release("A", "Known Song")];

        let report = sync_playlist(&mut store, "pl", &ranked).unwrap();
        assert_eq!(report.title_filtered, 1);
        assert!(report.added.is_empty());
        // the whole point of Stage A: no search was issued
        assert_eq!(store.search_calls, 0);
    }

    #[test]
    fn test_not_found_dropped() {
        let mut store = MockStore::new(Vec::new());
        let ranked = vec![release("A", "Obscure Song")];

        let report = sync_playlist(&mut store, "pl", &ranked).unwrap();
        assert_eq!(report.not_found, 1);
        assert!(report.added.is_empty());
        assert_eq!(store.add_calls, 0);
    }

    #[test]
    fn test_duplicate_resolution_adds_once() {
        // Two releases resolving to the same catalog track: one add call,
        // the second is dropped as already present.
        let mut store = MockStore::new(Vec::new()).with_catalog(&[
            ("A", "Song", "spotify:track:42"),
            ("A", "Song (Album Version)", "spotify:track:42"),
        ]);
        let ranked = vec![release("A", "Song"), release("A", "Song (Album Version)")];

        let report = sync_playlist(&mut store, "pl", &ranked).unwrap();
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.already_present, 1);
        assert_eq!(store.add_calls, 1);
        assert_eq!(store.search_calls, 2);
    }

    #[test]
    fn test_uri_already_on_playlist_not_readded() {
        let mut store = MockStore::new(vec![PlaylistEntry {
            uri: "spotify:track:7".to_string(),
            title: "Different Display Title".to_string(),
        }])
        .with_catalog(&[("A", "Song", "spotify:track:7")]);
        let ranked = vec![release("A", "Song")];

        // Title differs so Stage A passes it, but the resolved uri is
        // already in the confirmed set.
        let report = sync_playlist(&mut store, "pl", &ranked).unwrap();
        assert_eq!(report.already_present, 1);
        assert_eq!(store.add_calls, 0);
    }

    #[test]
    fn test_added_preserves_ranking_order() {
        let mut store = MockStore::new(Vec::new()).with_catalog(&[
            ("A", "First", "spotify:track:1"),
            ("B", "Second", "spotify:track:2"),
            ("C", "Third", "spotify:track:3"),
        ]);
        let ranked = vec![
            release("A", "First"),
            release("B", "Second"),
            release("C", "Third"),
        ];

        let report = sync_playlist(&mut store, "pl", &ranked).unwrap();
        let titles: Vec<&str> = report.added.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_clear_playlist() {
        let mut store = MockStore::new(vec![
            PlaylistEntry { uri: "spotify:track:1".to_string(), title: "A".to_string() },
            PlaylistEntry { uri: "spotify:track:2".to_string(), title: "B".to_string() },
        ]);
        assert_eq!(clear_playlist(&mut store, "pl").unwrap(), 2);
        assert!(store.playlist.is_empty());
        // second wipe is a no-op
        assert_eq!(clear_playlist(&mut store, "pl").unwrap(), 0);
    }

    // ── End to end: scrape -> rank -> reconcile ──────────────────────────────

    mod end_to_end {
        use super::*;
        use crate::extract::{ListingKind, Thresholds};
        use crate::fetch::{PageFetcher, PageResponse};
        use crate::rank::merge_and_rank;
        use crate::walker::scrape_pages;
        use std::collections::HashMap;

        struct MapFetcher {
            pages: HashMap<String, String>,
        }

        impl PageFetcher for MapFetcher {
            fn fetch(&mut self, url: &str) -> Result<PageResponse, Box<dyn Error>> {
                match self.pages.get(url) {
                    Some(body) => Ok(PageResponse { status: 200, body: body.clone() }),
                    None => Ok(PageResponse { status: 404, body: String::new() }),
                }
            }
        }

        const SINGLES_PAGE: &str = r#"
            <div class="albumBlock">
                <div class="date">Jan 9</div>
                <div class="artistTitle">Fresh Artist</div>
                <div class="albumTitle">Hot Single</div>
                <div class="ratingRowContainer"><div class="ratingRow">
                    <div class="rating">88</div>
                    <div class="ratingText">user score</div>
                    <div class="ratingText">(150)</div>
                </div></div>
            </div>
            <div class="albumBlock">
                <div class="date">Jan 8</div>
                <div class="artistTitle">Niche Artist</div>
                <div class="albumTitle">Too Few Votes</div>
                <div class="ratingRowContainer"><div class="ratingRow">
                    <div class="rating">92</div>
                    <div class="ratingText">user score</div>
                    <div class="ratingText">(3)</div>
                </div></div>
            </div>
        "#;

        const ALBUMS_PAGE: &str = r#"
            <div class="albumBlock">
                <a href="/album/77-band-lp.php"><img src="c.jpg"></a>
                <div class="date">Jan 2</div>
                <div class="artistTitle">Album Band</div>
                <div class="albumTitle">Strong LP</div>
                <div class="ratingRowContainer"><div class="ratingRow">
                    <div class="rating">84</div>
                    <div class="ratingText">user score</div>
                    <div class="ratingText">(90)</div>
                </div></div>
            </div>
        "#;

        const DETAIL_PAGE: &str = r#"
            <table class="trackListTable">
                <tr><td class="trackTitle"><a href="/s/1">Lead Cut</a></td>
                    <td class="trackRating"><span title="80 Ratings">81</span></td></tr>
                <tr><td class="trackTitle"><a href="/s/2">Deep Cut</a></td>
                    <td class="trackRating"><span title="60 Ratings">79</span></td></tr>
            </table>
        "#;

        #[test]
        fn test_pipeline_scrape_rank_sync() {
            let mut pages = HashMap::new();
            pages.insert("https://s.example/1/".to_string(), SINGLES_PAGE.to_string());
            pages.insert("https://a.example/1/".to_string(), ALBUMS_PAGE.to_string());
            pages.insert(
                "https://www.albumoftheyear.org/album/77-band-lp.php".to_string(),
                DETAIL_PAGE.to_string(),
            );
            let mut fetcher = MapFetcher { pages };

            let thresholds = Thresholds { min_weighted: 7.5, ..Thresholds::default() };
            let singles = scrape_pages(
                &mut fetcher, "https://s.example/", 1, 1, ListingKind::Singles, &thresholds,
            );
            let albums = scrape_pages(
                &mut fetcher, "https://a.example/", 1, 1, ListingKind::Albums, &thresholds,
            );

            // one single passed the vote gate; the album has two qualifying
            // tracks but their mean (80) selects the single-best-track branch
            assert_eq!(singles.len(), 1);
            assert_eq!(albums.len(), 1);

            let ranked = merge_and_rank(albums, singles, 2026);
            assert_eq!(ranked.len(), 2);
            // Jan 9 single outranks the Jan 2 album track
            assert_eq!(ranked[0].title, "Hot Single");
            assert_eq!(ranked[1].title, "Lead Cut");

            let mut store = MockStore::new(Vec::new()).with_catalog(&[
                ("Fresh Artist", "Hot Single", "spotify:track:s1"),
                ("Album Band", "Lead Cut", "spotify:track:a1"),
            ]);
            let report = sync_playlist(&mut store, "pl", &ranked).unwrap();

            assert_eq!(report.added.len(), 2);
            assert_eq!(report.added[0].title, "Hot Single");
            assert_eq!(report.added[0].grouping(), "Single");
            assert_eq!(report.added[1].grouping(), "Strong LP");
            assert_eq!(store.add_calls, 2);
        }
    }
}
