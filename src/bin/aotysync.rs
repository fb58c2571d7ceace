use aotysync::{
    authenticate, merge_and_rank, scrape_pages, sync_playlist, Config, Credentials,
    HttpFetcher, ListingKind,
};
use chrono::Datelike;
use std::env;
use std::path::PathBuf;
use std::process;

const SINGLES_URL: &str = "https://www.albumoftheyear.org/releases/singles/";
const ALBUMS_URL: &str = "https://www.albumoftheyear.org/releases/";

fn print_usage() {
    println!("aotysync - sync highly rated new releases from AOTY into a Spotify playlist");
    println!();
    println!("Usage: aotysync [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --start-page <N>       First listing page to scrape (default: 1)");
    println!("  --end-page <N>         Last listing page to scrape (default: 20)");
    println!("  --min-votes <N>        Minimum user vote count (default: 7)");
    println!("  --min-rating <N>       Minimum user rating, 0-100 (default: 76)");
    println!("  --min-weighted <X>     Minimum weighted score, 0-10 (default: 7.5)");
    println!("  --playlist <ID>        Spotify playlist to sync into");
    println!("  --year <N>             Calendar year assumed for scraped dates");
    println!("  --singles-only         Skip the albums listing");
    println!("  --albums-only          Skip the singles listing");
    println!("  --dry-run              Scrape and rank, but do not touch Spotify");
    println!("  --show-config          Print the effective configuration and exit");
    println!("  --help, -h             Show this help message");
    println!();
    println!("Spotify credentials come from SPOTIFY_CLIENT_ID / SPOTIFY_CLIENT_SECRET");
    println!("or spotify_credentials.toml; the playlist can also be given via");
    println!("SPOTIFY_PLAYLIST_ID. Defaults persist in ~/.config/aotysync/config.toml.");
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    match args.get(i + 1).and_then(|v| v.parse().ok()) {
        Some(v) => v,
        None => {
            eprintln!("Error: {} requires a value", flag);
            process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut overrides = Config::new();
    let mut singles_only = false;
    let mut albums_only = false;
    let mut dry_run = false;
    let mut show_config = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--start-page" => {
                overrides.start_page = Some(parse_value(&args, i, "--start-page"));
                i += 1;
            }
            "--end-page" => {
                overrides.end_page = Some(parse_value(&args, i, "--end-page"));
                i += 1;
            }
            "--min-votes" => {
                overrides.min_votes = Some(parse_value(&args, i, "--min-votes"));
                i += 1;
            }
            "--min-rating" => {
                overrides.min_rating = Some(parse_value(&args, i, "--min-rating"));
                i += 1;
            }
            "--min-weighted" => {
                overrides.min_weighted = Some(parse_value(&args, i, "--min-weighted"));
                i += 1;
            }
            "--playlist" => {
                overrides.playlist_id = Some(parse_value(&args, i, "--playlist"));
                i += 1;
            }
            "--year" => {
                overrides.year = Some(parse_value(&args, i, "--year"));
                i += 1;
            }
            "--singles-only" => singles_only = true,
            "--albums-only" => albums_only = true,
            "--dry-run" => dry_run = true,
            "--show-config" => show_config = true,
            _ => {
                eprintln!("Error: Unknown option: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    if singles_only && albums_only {
        eprintln!("Error: --singles-only and --albums-only are mutually exclusive");
        process::exit(1);
    }

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: could not read config file: {}", e);
            Config::new()
        }
    };
    config.merge(&overrides);

    if show_config {
        config.print("Effective configuration");
        return;
    }

    let thresholds = config.thresholds();
    let start_page = config.start_page.unwrap_or(1);
    let end_page = config.end_page.unwrap_or(20);
    let year = config.year.unwrap_or_else(|| chrono::Local::now().year());

    let mut fetcher = HttpFetcher::default();

    let singles = if albums_only {
        Vec::new()
    } else {
        println!("Scraping singles pages {}-{}...", start_page, end_page);
        scrape_pages(&mut fetcher, SINGLES_URL, start_page, end_page, ListingKind::Singles, &thresholds)
    };

    let albums = if singles_only {
        Vec::new()
    } else {
        println!("Scraping album pages {}-{}...", start_page, end_page);
        scrape_pages(&mut fetcher, ALBUMS_URL, start_page, end_page, ListingKind::Albums, &thresholds)
    };

    let scraped = singles.len() + albums.len();
    let ranked = merge_and_rank(albums, singles, year);

    if ranked.is_empty() {
        println!("No qualifying releases found.");
        return;
    }

    if dry_run {
        println!();
        println!("Ranked candidates ({}):", ranked.len());
        for r in &ranked {
            println!("  {:6} | {:5.2} | {} - {} [{}]", r.date, r.weighted, r.artist, r.title, r.grouping());
        }
        return;
    }

    let playlist_id = match config.playlist_id.or_else(|| env::var("SPOTIFY_PLAYLIST_ID").ok()) {
        Some(id) => id,
        None => {
            eprintln!("Error: no playlist configured (--playlist or SPOTIFY_PLAYLIST_ID)");
            process::exit(1);
        }
    };

    let creds = match Credentials::load() {
        Some(c) => c,
        None => {
            eprintln!("Error: Spotify credentials not found (SPOTIFY_CLIENT_ID / SPOTIFY_CLIENT_SECRET or spotify_credentials.toml)");
            process::exit(1);
        }
    };

    let token_cache = config
        .token_cache
        .map(PathBuf::from)
        .unwrap_or_else(default_token_cache);

    let mut session = match authenticate(&creds, &token_cache) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let report = match sync_playlist(&mut session, &playlist_id, &ranked) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error syncing playlist: {}", e);
            process::exit(1);
        }
    };

    println!();
    if report.added.is_empty() {
        println!("No new songs to add.");
    } else {
        // oldest-ranked first, so the most recent additions read last
        println!("Added {} track(s):", report.added.len());
        for r in report.added.iter().rev() {
            println!("  {:6} | {:5.2} | {} - {} [{}]", r.date, r.weighted, r.artist, r.title, r.grouping());
        }
    }
    println!(
        "Summary: {} scraped, {} added, {} already on playlist, {} not found.",
        scraped,
        report.added.len(),
        report.title_filtered + report.already_present,
        report.not_found
    );
}

fn default_token_cache() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".config/aotysync/token.json"),
        None => PathBuf::from("aotysync_token.json"),
    }
}
