//! HTML record source - turns raw AOTY page markup into structured records.
//!
//! All CSS selectors live here. They are a contract with the target site's
//! markup and have to be kept in sync if albumoftheyear.org changes its
//! templates; nothing outside this module touches HTML.

use scraper::{ElementRef, Html, Selector};

pub const BASE_URL: &str = "https://www.albumoftheyear.org";

/// One rating entry inside a listing block, in page order.
/// Blocks carry zero, one (user) or two (critic then user) of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingEntry {
    pub score: u32,
    pub votes: u32,
}

/// One scraped block from a release-listing page.
#[derive(Debug, Clone)]
pub struct ListingBlock {
    /// Textual release date, e.g. "Jan 5". None for releases not yet dated.
    pub date: Option<String>,
    pub artist: String,
    pub title: String,
    pub ratings: Vec<RatingEntry>,
    /// Absolute detail-page URL (albums only).
    pub detail_url: Option<String>,
}

/// Per-track rating row from an album detail page.
#[derive(Debug, Clone)]
pub struct TrackDetail {
    pub title: String,
    pub rating: u32,
    pub votes: u32,
}

fn selector(src: &str) -> Selector {
    // All selectors are literals; a parse failure is a programming error.
    Selector::parse(src).expect("invalid selector literal")
}

fn inner_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Parse a vote-count text like "(1,234)" or "86 Ratings" into a number.
fn parse_votes(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Extract all listing blocks from a releases page.
///
/// Blocks with malformed artist/title markup are skipped rather than
/// failing the page; missing dates and missing ratings are represented
/// as `None`/empty and filtered later by the extractor.
pub fn parse_listing_page(html: &str) -> Vec<ListingBlock> {
    let doc = Html::parse_document(html);

    let block_sel = selector("div.albumBlock");
    let date_sel = selector(".date");
    let artist_sel = selector(".artistTitle");
    let title_sel = selector(".albumTitle");
    let rating_row_sel = selector(".ratingRowContainer .ratingRow");
    let rating_sel = selector(".rating");
    let text_sel = selector(".ratingText");
    let link_sel = selector("a[href]");

    let mut blocks = Vec::new();

    for block in doc.select(&block_sel) {
        let artist = match block.select(&artist_sel).next() {
            Some(el) => inner_text(el),
            None => continue,
        };
        let title = match block.select(&title_sel).next() {
            Some(el) => inner_text(el),
            None => continue,
        };

        let date = block
            .select(&date_sel)
            .next()
            .map(inner_text)
            .filter(|d| !d.is_empty());

        let mut ratings = Vec::new();
        for row in block.select(&rating_row_sel) {
            let score = row
                .select(&rating_sel)
                .next()
                .and_then(|el| inner_text(el).parse::<u32>().ok());
            // The vote count is the ratingText piece holding "(N)".
            let votes = row
                .select(&text_sel)
                .filter_map(|el| {
                    let t = inner_text(el);
                    if t.contains('(') { parse_votes(&t) } else { None }
                })
                .next();
            if let (Some(score), Some(votes)) = (score, votes) {
                ratings.push(RatingEntry { score, votes });
            }
        }

        let detail_url = block
            .select(&link_sel)
            .filter_map(|el| el.value().attr("href"))
            .find(|href| href.starts_with("/album/"))
            .map(|href| format!("{}{}", BASE_URL, href));

        blocks.push(ListingBlock { date, artist, title, ratings, detail_url });
    }

    blocks
}

/// Extract per-track rating rows from an album detail page.
///
/// Rows without a rating or vote count (unrated tracks, interludes) are
/// skipped; an album page with no usable rows yields an empty vec.
pub fn parse_album_tracks(html: &str) -> Vec<TrackDetail> {
    let doc = Html::parse_document(html);

    let row_sel = selector("table.trackListTable tr");
    let title_sel = selector(".trackTitle a");
    let rating_sel = selector("td.trackRating span");

    let mut tracks = Vec::new();

    for row in doc.select(&row_sel) {
        let title = match row.select(&title_sel).next() {
            Some(el) => inner_text(el),
            None => continue,
        };
        let rating_el = match row.select(&rating_sel).next() {
            Some(el) => el,
            None => continue,
        };
        let rating = match inner_text(rating_el).parse::<u32>() {
            Ok(r) => r,
            Err(_) => continue,
        };
        // Vote count lives in the rating span's title attribute, "23 Ratings".
        let votes = match rating_el.value().attr("title").and_then(parse_votes) {
            Some(v) => v,
            None => continue,
        };

        tracks.push(TrackDetail { title, rating, votes });
    }

    tracks
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_FIXTURE: &str = r#"
        <div class="albumBlock five small">
            <a href="/album/1234-artist-album.php"><img src="x.jpg"></a>
            <div class="date">Jan 5</div>
            <div class="artistTitle">Some Artist</div>
            <div class="albumTitle">Some Single</div>
            <div class="ratingRowContainer">
                <div class="ratingRow">
                    <div class="rating">82</div>
                    <div class="ratingText">user score</div>
                    <div class="ratingText">(1,024)</div>
                </div>
            </div>
        </div>
        <div class="albumBlock five small">
            <div class="date">Jan 3</div>
            <div class="artistTitle">Quiet Artist</div>
            <div class="albumTitle">Unrated Release</div>
        </div>
        <div class="albumBlock five small">
            <div class="artistTitle">Undated Artist</div>
            <div class="albumTitle">Undated Release</div>
            <div class="ratingRowContainer">
                <div class="ratingRow">
                    <div class="rating">70</div>
                    <div class="ratingText">critic score</div>
                    <div class="ratingText">(4)</div>
                </div>
                <div class="ratingRow">
                    <div class="rating">75</div>
                    <div class="ratingText">user score</div>
                    <div class="ratingText">(12)</div>
                </div>
            </div>
        </div>
    "#;

    #[test]
    fn test_parse_listing_page() {
        let blocks = parse_listing_page(LISTING_FIXTURE);
        assert_eq!(blocks.len(), 3);

        assert_eq!(blocks[0].date.as_deref(), Some("Jan 5"));
        assert_eq!(blocks[0].artist, "Some Artist");
        assert_eq!(blocks[0].title, "Some Single");
        assert_eq!(blocks[0].ratings, vec![RatingEntry { score: 82, votes: 1024 }]);
        assert_eq!(
            blocks[0].detail_url.as_deref(),
            Some("https://www.albumoftheyear.org/album/1234-artist-album.php")
        );

        // no rating rows at all
        assert!(blocks[1].ratings.is_empty());
        assert!(blocks[1].detail_url.is_none());

        // critic row first, user row second, date missing
        assert!(blocks[2].date.is_none());
        assert_eq!(blocks[2].ratings.len(), 2);
        assert_eq!(blocks[2].ratings[1], RatingEntry { score: 75, votes: 12 });
    }

    #[test]
    fn test_parse_listing_page_empty() {
        assert!(parse_listing_page("<html><body></body></html>").is_empty());
    }

    const DETAIL_FIXTURE: &str = r#"
        <table class="trackListTable">
            <tr>
                <td class="trackTitle"><a href="/song/1.php">Opener</a></td>
                <td class="trackRating"><span title="41 Ratings">88</span></td>
            </tr>
            <tr>
                <td class="trackTitle"><a href="/song/2.php">Interlude</a></td>
                <td class="trackRating"></td>
            </tr>
            <tr>
                <td class="trackTitle"><a href="/song/3.php">Closer</a></td>
                <td class="trackRating"><span title="2,015 Ratings">79</span></td>
            </tr>
        </table>
    "#;

    #[test]
    fn test_parse_album_tracks() {
        let tracks = parse_album_tracks(DETAIL_FIXTURE);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].title, "Opener");
        assert_eq!(tracks[0].rating, 88);
        assert_eq!(tracks[0].votes, 41);
        assert_eq!(tracks[1].title, "Closer");
        assert_eq!(tracks[1].votes, 2015);
    }

    #[test]
    fn test_parse_votes() {
        assert_eq!(parse_votes("(1,234)"), Some(1234));
        assert_eq!(parse_votes("86 Ratings"), Some(86));
        assert_eq!(parse_votes("no digits"), None);
    }
}
