//! Rating smoothing - projects raw community ratings onto a stable 0-10 scale.
//!
//! A release with three enthusiastic voters should not outrank one with a
//! slightly lower average over two hundred votes, so raw ratings are pulled
//! toward the site-wide average with a strength inversely proportional to
//! the vote count.

/// Site-wide average user rating on the 0-100 scale.
pub const GLOBAL_AVG: f64 = 74.0;

/// How many "phantom" votes at the global average each release starts with.
pub const SMOOTHING: f64 = 15.0;

/// Weighted average rating, projected to the 0-10 display scale and
/// rounded to 2 decimals.
///
/// `rating` and `global_avg` are on the 0-100 scale. With zero votes the
/// result is exactly `global_avg / 10`; as votes grow the result approaches
/// `rating / 10`.
pub fn weighted_score(rating: u32, votes: u32, global_avg: f64, smoothing: f64) -> f64 {
    let t1 = (rating as f64 * votes as f64 + global_avg * smoothing)
        / (votes as f64 + smoothing);
    round2(t1 / 10.0)
}

/// Bayesian average with a fixed prior-vote count (default 50).
///
/// Alternative smoothing policy. Same shape as [`weighted_score`] but the
/// prior is expressed as a vote count rather than a tunable factor. Not
/// used by the scraping pipeline; kept for experimenting with thresholds.
pub fn bayesian_average(rating: u32, votes: u32, global_avg: f64, prior_votes: u32) -> f64 {
    let prior = prior_votes as f64;
    let t1 = (rating as f64 * votes as f64 + global_avg * prior) / (votes as f64 + prior);
    round2(t1 / 10.0)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
