//! Spotify Web API client - playlist listing, catalog search, add/remove.
//!
//! Authentication uses the authorization-code flow scoped to
//! `playlist-modify-private`, with the token cached in a local JSON file:
//! first run prints the authorize URL and asks for the redirect URL back,
//! later runs refresh silently. Client credentials come from environment
//! variables or `spotify_credentials.toml` (next to the binary,
//! `/etc/aotysync/`, or `~/.config/aotysync/`).
//!
//! The reconciler consumes the [`PlaylistStore`] trait so it can run
//! against an in-memory store in tests.

use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::rate_limiter::RateLimiter;

const ACCOUNTS_BASE: &str = "https://accounts.spotify.com";
const API_BASE: &str = "https://api.spotify.com/v1";
const SCOPE: &str = "playlist-modify-private";

const API_TIMEOUT: Duration = Duration::from_secs(20);
/// Refresh slightly early so a token never expires mid-request.
const EXPIRY_MARGIN_SECS: u64 = 60;
/// Playlist pagination size.
const PAGE_SIZE: u32 = 50;
/// The remove endpoint caps the number of tracks per request.
const REMOVE_CHUNK: usize = 100;

// ── Credentials ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
}

fn default_redirect_uri() -> String {
    "http://localhost:8080".to_string()
}

impl Credentials {
    /// Environment variables win over credential files.
    pub fn load() -> Option<Credentials> {
        if let (Ok(client_id), Ok(client_secret)) = (
            std::env::var("SPOTIFY_CLIENT_ID"),
            std::env::var("SPOTIFY_CLIENT_SECRET"),
        ) {
            let redirect_uri = std::env::var("SPOTIFY_REDIRECT_URI")
                .unwrap_or_else(|_| default_redirect_uri());
            return Some(Credentials { client_id, client_secret, redirect_uri });
        }

        for path in Self::search_paths() {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(creds) = toml::from_str::<Credentials>(&content) {
                    return Some(creds);
                }
            }
        }

        None
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("spotify_credentials.toml"),
            PathBuf::from("/etc/aotysync/spotify_credentials.toml"),
        ];
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(PathBuf::from(home).join(".config/aotysync/spotify_credentials.toml"));
        }
        paths
    }
}

// ── Token cache ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct CachedToken {
    access_token: String,
    refresh_token: Option<String>,
    /// Unix timestamp after which the access token is stale.
    expires_at: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn load_cached(path: &Path) -> Option<CachedToken> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

fn save_cache(path: &Path, token: &CachedToken) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(token)?)?;
    Ok(())
}

// ── Authentication ───────────────────────────────────────────────────────────

fn request_token(
    agent: &ureq::Agent,
    creds: &Credentials,
    form: &[(&str, &str)],
) -> Result<TokenResponse, Box<dyn Error>> {
    let basic = BASE64.encode(format!("{}:{}", creds.client_id, creds.client_secret));
    let resp = agent
        .post(&format!("{}/api/token", ACCOUNTS_BASE))
        .set("Authorization", &format!("Basic {}", basic))
        .send_form(form)
        .map_err(|e| format!("Spotify authentication failed: {}", e))?;
    Ok(resp.into_json()?)
}

/// Extract the `code` parameter from a pasted redirect URL.
fn parse_auth_code(url: &str) -> Option<String> {
    let idx = url.find("code=")?;
    let code = url[idx + 5..].split('&').next()?;
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

/// First-run interactive step: the user authorizes in a browser and pastes
/// the URL they were redirected to.
fn interactive_code(creds: &Credentials) -> Result<String, Box<dyn Error>> {
    let url = format!(
        "{}/authorize?client_id={}&response_type=code&redirect_uri={}&scope={}",
        ACCOUNTS_BASE,
        creds.client_id,
        urlencoded(&creds.redirect_uri),
        SCOPE
    );
    println!("Open this URL in a browser and authorize the application:");
    println!("  {}", url);
    print!("Paste the URL you were redirected to: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    parse_auth_code(line.trim())
        .ok_or_else(|| "no code parameter in the pasted redirect URL".into())
}

/// Obtain an authenticated session, using the token cache when possible.
///
/// Any failure here is fatal to the run; there is no retry.
pub fn authenticate(creds: &Credentials, cache_path: &Path) -> Result<Session, Box<dyn Error>> {
    let agent = ureq::AgentBuilder::new().timeout(API_TIMEOUT).build();
    let cached = load_cached(cache_path);

    if let Some(tok) = &cached {
        if tok.expires_at > now_secs() + EXPIRY_MARGIN_SECS {
            return Ok(Session::new(agent, tok.access_token.clone()));
        }
    }

    let access_token = match cached.and_then(|t| t.refresh_token) {
        Some(refresh) => {
            println!("Refreshing Spotify access token...");
            let resp = request_token(
                &agent,
                creds,
                &[("grant_type", "refresh_token"), ("refresh_token", &refresh)],
            )?;
            // Refresh responses may omit the refresh token; keep the old one.
            save_cache(cache_path, &CachedToken {
                access_token: resp.access_token.clone(),
                refresh_token: resp.refresh_token.or(Some(refresh)),
                expires_at: now_secs() + resp.expires_in,
            })?;
            resp.access_token
        }
        None => {
            let code = interactive_code(creds)?;
            let resp = request_token(
                &agent,
                creds,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", &code),
                    ("redirect_uri", &creds.redirect_uri),
                ],
            )?;
            save_cache(cache_path, &CachedToken {
                access_token: resp.access_token.clone(),
                refresh_token: resp.refresh_token.clone(),
                expires_at: now_secs() + resp.expires_in,
            })?;
            resp.access_token
        }
    };

    Ok(Session::new(agent, access_token))
}

// ── Playlist store ───────────────────────────────────────────────────────────

/// A track currently on the playlist.
#[derive(Debug, Clone)]
pub struct PlaylistEntry {
    pub uri: String,
    pub title: String,
}

/// A catalog track resolved by search.
#[derive(Debug, Clone)]
pub struct TrackRef {
    pub uri: String,
    pub name: String,
    pub artist: String,
}

pub trait PlaylistStore {
    /// Full current membership, following pagination to the end.
    fn list_tracks(&mut self, playlist_id: &str) -> Result<Vec<PlaylistEntry>, Box<dyn Error>>;
    /// Top catalog match for artist + title, if any.
    fn search_track(&mut self, artist: &str, title: &str)
        -> Result<Option<TrackRef>, Box<dyn Error>>;
    fn add_track(&mut self, playlist_id: &str, uri: &str) -> Result<(), Box<dyn Error>>;
    /// Remove every occurrence of each given track.
    fn remove_tracks(&mut self, playlist_id: &str, uris: &[String]) -> Result<(), Box<dyn Error>>;
}

// ── API response types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PagedTracks {
    items: Vec<PageItem>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageItem {
    // Null for removed or local tracks.
    track: Option<ApiTrack>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    uri: String,
    name: String,
    #[serde(default)]
    artists: Vec<ApiArtist>,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    tracks: SearchTracks,
}

#[derive(Debug, Deserialize)]
struct SearchTracks {
    items: Vec<ApiTrack>,
}

/// Authenticated API session.
pub struct Session {
    agent: ureq::Agent,
    token: String,
    limiter: RateLimiter,
}

impl Session {
    fn new(agent: ureq::Agent, token: String) -> Self {
        Session {
            agent,
            token,
            limiter: RateLimiter::from_millis("spotify", 250),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl PlaylistStore for Session {
    fn list_tracks(&mut self, playlist_id: &str) -> Result<Vec<PlaylistEntry>, Box<dyn Error>> {
        let mut entries = Vec::new();
        let mut url = Some(format!(
            "{}/playlists/{}/tracks?limit={}",
            API_BASE, playlist_id, PAGE_SIZE
        ));

        while let Some(u) = url {
            self.limiter.wait_if_needed();
            let resp = match self.agent.get(&u).set("Authorization", &self.auth_header()).call() {
                Ok(r) => r,
                Err(ureq::Error::Status(404, _)) => {
                    println!("Playlist not found: {}", playlist_id);
                    return Ok(Vec::new());
                }
                Err(e) => return Err(e.into()),
            };

            let page: PagedTracks = resp.into_json()?;
            for item in page.items {
                if let Some(track) = item.track {
                    entries.push(PlaylistEntry { uri: track.uri, title: track.name });
                }
            }
            url = page.next;
        }

        Ok(entries)
    }

    fn search_track(
        &mut self,
        artist: &str,
        title: &str,
    ) -> Result<Option<TrackRef>, Box<dyn Error>> {
        let query = urlencoded(&format!("artist:{} track:{}", artist, title));
        let url = format!("{}/search?q={}&type=track&limit=1", API_BASE, query);

        self.limiter.wait_if_needed();
        let envelope: SearchEnvelope = self
            .agent
            .get(&url)
            .set("Authorization", &self.auth_header())
            .call()?
            .into_json()?;

        Ok(envelope.tracks.items.into_iter().next().map(|t| TrackRef {
            uri: t.uri,
            name: t.name,
            artist: t.artists.first().map(|a| a.name.clone()).unwrap_or_default(),
        }))
    }

    fn add_track(&mut self, playlist_id: &str, uri: &str) -> Result<(), Box<dyn Error>> {
        let url = format!("{}/playlists/{}/tracks", API_BASE, playlist_id);
        self.limiter.wait_if_needed();
        self.agent
            .post(&url)
            .set("Authorization", &self.auth_header())
            .send_json(serde_json::json!({ "uris": [uri] }))?;
        Ok(())
    }

    fn remove_tracks(&mut self, playlist_id: &str, uris: &[String]) -> Result<(), Box<dyn Error>> {
        let url = format!("{}/playlists/{}/tracks", API_BASE, playlist_id);

        for chunk in uris.chunks(REMOVE_CHUNK) {
            let tracks: Vec<serde_json::Value> =
                chunk.iter().map(|u| serde_json::json!({ "uri": u })).collect();
            self.limiter.wait_if_needed();
            self.agent
                .request("DELETE", &url)
                .set("Authorization", &self.auth_header())
                .send_json(serde_json::json!({ "tracks": tracks }))?;
        }

        Ok(())
    }
}

/// Minimal percent-encoding for query strings.
fn urlencoded(s: &str) -> String {
    s.replace('%', "%25")
        .replace(' ', "%20")
        .replace('&', "%26")
        .replace('=', "%3D")
        .replace('+', "%2B")
        .replace('#', "%23")
        .replace(':', "%3A")
        .replace('/', "%2F")
}
