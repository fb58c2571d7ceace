//! Wipes every track from the configured playlist. Full reset, not part of
//! the normal sync run.

use aotysync::{authenticate, clear_playlist, Config, Credentials};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

fn print_usage() {
    println!("playlist_reset - remove ALL tracks from a Spotify playlist");
    println!();
    println!("Usage: playlist_reset [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --playlist <ID>   Playlist to wipe (default: configured playlist)");
    println!("  --yes             Skip the confirmation prompt");
    println!("  --help, -h        Show this help message");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut playlist_arg: Option<String> = None;
    let mut skip_confirm = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--playlist" => {
                match args.get(i + 1) {
                    Some(id) => playlist_arg = Some(id.clone()),
                    None => {
                        eprintln!("Error: --playlist requires a value");
                        process::exit(1);
                    }
                }
                i += 1;
            }
            "--yes" => skip_confirm = true,
            _ => {
                eprintln!("Error: Unknown option: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = Config::load().unwrap_or_default();

    let playlist_id = match playlist_arg
        .or(config.playlist_id.clone())
        .or_else(|| env::var("SPOTIFY_PLAYLIST_ID").ok())
    {
        Some(id) => id,
        None => {
            eprintln!("Error: no playlist configured (--playlist or SPOTIFY_PLAYLIST_ID)");
            process::exit(1);
        }
    };

    if !skip_confirm {
        print!("Remove ALL tracks from playlist {}? [y/N] ", playlist_id);
        let _ = io::stdout().flush();
        let mut line = String::new();
        let _ = io::stdin().read_line(&mut line);
        if !matches!(line.trim(), "y" | "Y" | "yes") {
            println!("Aborted.");
            return;
        }
    }

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
        .unwrap_or_else(|| match env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".config/aotysync/token.json"),
            None => PathBuf::from("aotysync_token.json"),
        });

    let mut session = match authenticate(&creds, &token_cache) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match clear_playlist(&mut session, &playlist_id) {
        Ok(0) => println!("Playlist {} is already empty.", playlist_id),
        Ok(n) => println!("Removed {} track(s) from playlist {}.", n, playlist_id),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
