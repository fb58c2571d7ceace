//! Page walker - drives extraction across an inclusive page range.
//!
//! Strictly sequential: page N+1 is requested only after page N's response
//! is in, which is both the ordering guarantee and the natural pacing.
//! Any single page failing (transport or non-200) contributes nothing and
//! the walk continues; only the per-run summary reflects the gap.

use crate::extract::{extract_page, ListingKind, Release, Thresholds};
use crate::fetch::PageFetcher;
use crate::listing;

/// Scrape listing pages `start..=end`, returning the page-ordered
/// concatenation of every page's qualifying releases.
pub fn scrape_pages(
    fetcher: &mut dyn PageFetcher,
    base_url: &str,
    start: u32,
    end: u32,
    kind: ListingKind,
    thresholds: &Thresholds,
) -> Vec<Release> {
    let mut all = Vec::new();

    for page_num in start..=end {
        let url = format!("{}{}/", base_url, page_num);
        println!("Fetching page {}", url);

        let resp = match fetcher.fetch(&url) {
            Ok(r) => r,
            Err(e) => {
                // Transport failure is non-fatal: skip this page explicitly.
                eprintln!("Error fetching page {}: {}", url, e);
                continue;
            }
        };

        if !resp.is_ok() {
            println!("Failed to fetch page {}. Status code: {}", url, resp.status);
            continue;
        }

        let blocks = listing::parse_listing_page(&resp.body);
        let mut releases = extract_page(&blocks, kind, thresholds, fetcher);
        println!("Page {} scraped successfully ({} records).", page_num, releases.len());
        all.append(&mut releases);
    }

    println!("Scraping complete. {} records scraped.", all.len());
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::PageResponse;
    use std::error::Error;

    /// Serves a scripted response per fetched URL, in call order.
    struct ScriptedFetcher {
        responses: Vec<Result<PageResponse, String>>,
        urls: Vec<String>,
    }

    impl PageFetcher for ScriptedFetcher {
        fn fetch(&mut self, url: &str) -> Result<PageResponse, Box<dyn Error>> {
            self.urls.push(url.to_string());
            if self.responses.is_empty() {
                return Ok(PageResponse { status: 404, body: String::new() });
            }
            self.responses.remove(0).map_err(|e| e.into())
        }
    }

    fn listing_html(date: &str, artist: &str, title: &str, score: u32, votes: u32) -> String {
        format!(
            r#"<div class="albumBlock">
                <div class="date">{}</div>
                <div class="artistTitle">{}</div>
                <div class="albumTitle">{}</div>
                <div class="ratingRowContainer"><div class="ratingRow">
                    <div class="rating">{}</div>
                    <div class="ratingText">user score</div>
                    <div class="ratingText">({})</div>
                </div></div>
            </div>"#,
            date, artist, title, score, votes
        )
    }

    #[test]
    fn test_walk_concatenates_in_page_order() {
        let mut fetcher = ScriptedFetcher {
            responses: vec![
                Ok(PageResponse { status: 200, body: listing_html("Jan 9", "A", "First", 85, 100) }),
                Ok(PageResponse { status: 200, body: listing_html("Jan 2", "B", "Second", 84, 90) }),
            ],
            urls: Vec::new(),
        };
        let out = scrape_pages(
            &mut fetcher,
            "https://example.org/releases/singles/",
            1,
            2,
            ListingKind::Singles,
            &Thresholds::default(),
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "First");
        assert_eq!(out[1].title, "Second");
        assert_eq!(fetcher.urls, vec![
            "https://example.org/releases/singles/1/",
            "https://example.org/releases/singles/2/",
        ]);
    }

    #[test]
    fn test_non_200_page_is_skipped() {
        let mut fetcher = ScriptedFetcher {
            responses: vec![
                Ok(PageResponse { status: 503, body: String::new() }),
                Ok(PageResponse { status: 200, body: listing_html("Jan 2", "B", "Kept", 85, 100) }),
            ],
            urls: Vec::new(),
        };
        let out = scrape_pages(&mut fetcher, "u/", 1, 2, ListingKind::Singles, &Thresholds::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Kept");
    }

    #[test]
    fn test_transport_failure_skips_page_and_continues() {
        let mut fetcher = ScriptedFetcher {
            responses: vec![
                Err("timed out".to_string()),
                Ok(PageResponse { status: 200, body: listing_html("Jan 2", "B", "Kept", 85, 100) }),
            ],
            urls: Vec::new(),
        };
        let out = scrape_pages(&mut fetcher, "u/", 1, 2, ListingKind::Singles, &Thresholds::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Kept");
        assert_eq!(fetcher.urls.len(), 2);
    }
}
