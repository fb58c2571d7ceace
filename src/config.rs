use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::extract::Thresholds;

/// Persisted run defaults. Every field is optional; CLI flags are merged
/// on top and unset values fall back to the built-in thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_page: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_page: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_votes: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_weighted: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_min_rating: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_min_votes: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_songs_keep: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_cache: Option<String>,

    /// Calendar year assumed for scraped dates at ranking time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl Config {
    pub fn new() -> Self {
        Config {
            start_page: None,
            end_page: None,
            min_votes: None,
            min_rating: None,
            min_weighted: None,
            track_min_rating: None,
            track_min_votes: None,
            top_songs_keep: None,
            playlist_id: None,
            token_cache: None,
            year: None,
        }
    }

    /// Config file path (~/.config/aotysync/config.toml)
    pub fn get_config_path() -> Result<PathBuf, io::Error> {
        let home = std::env::var("HOME")
            .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "HOME environment variable not set"))?;

        let config_dir = Path::new(&home).join(".config").join("aotysync");
        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file; a missing file yields an empty config.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Config::new());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    /// Merge with another config, preferring values from other.
    pub fn merge(&mut self, other: &Config) {
        if other.start_page.is_some() {
            self.start_page = other.start_page;
        }
        if other.end_page.is_some() {
            self.end_page = other.end_page;
        }
        if other.min_votes.is_some() {
            self.min_votes = other.min_votes;
        }
        if other.min_rating.is_some() {
            self.min_rating = other.min_rating;
        }
        if other.min_weighted.is_some() {
            self.min_weighted = other.min_weighted;
        }
        if other.track_min_rating.is_some() {
            self.track_min_rating = other.track_min_rating;
        }
        if other.track_min_votes.is_some() {
            self.track_min_votes = other.track_min_votes;
        }
        if other.top_songs_keep.is_some() {
            self.top_songs_keep = other.top_songs_keep;
        }
        if other.playlist_id.is_some() {
            self.playlist_id = other.playlist_id.clone();
        }
        if other.token_cache.is_some() {
            self.token_cache = other.token_cache.clone();
        }
        if other.year.is_some() {
            self.year = other.year;
        }
    }

    /// Extraction thresholds with built-in defaults for unset fields.
    pub fn thresholds(&self) -> Thresholds {
        let defaults = Thresholds::default();
        Thresholds {
            min_votes: self.min_votes.unwrap_or(defaults.min_votes),
            min_rating: self.min_rating.unwrap_or(defaults.min_rating),
            min_weighted: self.min_weighted.unwrap_or(defaults.min_weighted),
            track_min_rating: self.track_min_rating.unwrap_or(defaults.track_min_rating),
            track_min_votes: self.track_min_votes.unwrap_or(defaults.track_min_votes),
            top_songs_keep: self.top_songs_keep.unwrap_or(defaults.top_songs_keep),
        }
    }

    /// Print the config in a human-readable format
    pub fn print(&self, title: &str) {
        println!("{}:", title);

        if let Some(start_page) = self.start_page {
            println!("  Start page:         {}", start_page);
        }
        if let Some(end_page) = self.end_page {
            println!("  End page:           {}", end_page);
        }
        if let Some(min_votes) = self.min_votes {
            println!("  Min votes:          {}", min_votes);
        }
        if let Some(min_rating) = self.min_rating {
            println!("  Min rating:         {}", min_rating);
        }
        if let Some(min_weighted) = self.min_weighted {
            println!("  Min weighted score: {}", min_weighted);
        }
        if let Some(track_min_rating) = self.track_min_rating {
            println!("  Track min rating:   {}", track_min_rating);
        }
        if let Some(track_min_votes) = self.track_min_votes {
            println!("  Track min votes:    {}", track_min_votes);
        }
        if let Some(top_songs_keep) = self.top_songs_keep {
            println!("  Top songs to keep:  {}", top_songs_keep);
        }
        if let Some(playlist_id) = &self.playlist_id {
            println!("  Playlist:           {}", playlist_id);
        }
        if let Some(token_cache) = &self.token_cache {
            println!("  Token cache:        {}", token_cache);
        }
        if let Some(year) = self.year {
            println!("  Assumed year:       {}", year);
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
