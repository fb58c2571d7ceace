pub mod config;
pub mod extract;
pub mod fetch;
pub mod listing;
pub mod rank;
pub mod rate_limiter;
pub mod reconcile;
pub mod scoring;
pub mod spotify;
pub mod walker;

pub use config::Config;
pub use extract::{ListingKind, Release, ReleaseKind, Thresholds};
pub use fetch::{HttpFetcher, PageFetcher, PageResponse};
pub use rank::merge_and_rank;
pub use reconcile::{clear_playlist, sync_playlist, SyncReport};
pub use scoring::{bayesian_average, weighted_score, GLOBAL_AVG, SMOOTHING};
pub use spotify::{authenticate, Credentials, PlaylistStore, Session};
pub use walker::scrape_pages;
