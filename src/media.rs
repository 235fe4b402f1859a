use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use iced::widget::image::Handle;
use iced::Color;
use serde::Deserialize;

use crate::api::ApiError;
use crate::listing::ListingRequest;
use crate::player::PlaybackError;

fn simple_hash(s: &str) -> String {
    let mut hash: u64 = 5381;
    for byte in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(byte as u64);
    }
    format!("{:016x}", hash)
}

fn get_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("cinestream").join("posters"))
}

pub const BACKGROUND_DARK: Color = Color::from_rgb(0.067, 0.063, 0.11);
pub const SURFACE_DARK_GRAY: Color = Color::from_rgb(0.12, 0.12, 0.16);
pub const ACCENT_BLUE: Color = Color::from_rgb(0.231, 0.510, 0.965);
pub const ACCENT_PURPLE: Color = Color::from_rgb(0.576, 0.200, 0.918);
pub const EPISODE_RED: Color = Color::from_rgb(0.863, 0.149, 0.149);
pub const TEXT_WHITE: Color = Color::from_rgb(1.0, 1.0, 1.0);
pub const TEXT_GRAY: Color = Color::from_rgb(0.612, 0.639, 0.686);

pub const CDN_UPLOAD_PATH: &str = "uploads/movies";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Default)]
pub struct Rating {
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub origin_name: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub thumb_url: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default, rename = "tmdb")]
    pub rating: Option<Rating>,
}

impl MovieSummary {
    /// Absolute poster URL, joining relative paths onto the listing's CDN domain.
    pub fn poster_source(&self, cdn_domain: Option<&str>) -> Option<String> {
        let path = if self.poster_url.is_empty() {
            &self.thumb_url
        } else {
            &self.poster_url
        };
        if path.is_empty() {
            return None;
        }
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.clone());
        }
        match cdn_domain.map(|d| d.trim_end_matches('/')) {
            Some(domain) if !domain.is_empty() => Some(format!(
                "{}/{}/{}",
                domain,
                CDN_UPLOAD_PATH,
                path.trim_start_matches('/')
            )),
            _ => Some(path.clone()),
        }
    }

    pub fn vote_average(&self) -> Option<f32> {
        self.rating
            .filter(|r| r.vote_count > 0 || r.vote_average > 0.0)
            .map(|r| r.vote_average)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total_items: u32,
    #[serde(default)]
    pub total_items_per_page: u32,
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

/// One listing page, normalised from either response envelope.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MoviePage {
    pub items: Vec<MovieSummary>,
    pub pagination: Pagination,
    pub cdn_image_domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Taxonomy {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: String,
    pub slug: String,
}

impl std::fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaxonomyRef {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieDetail {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub origin_name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub thumb_url: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub quality: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub episode_current: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub actor: Vec<String>,
    #[serde(default)]
    pub director: Vec<String>,
    #[serde(default)]
    pub category: Vec<TaxonomyRef>,
    #[serde(default)]
    pub country: Vec<TaxonomyRef>,
    #[serde(default)]
    pub trailer_url: String,
}

impl MovieDetail {
    pub fn directors(&self) -> String {
        join_names(self.director.iter().map(String::as_str))
    }

    pub fn actors(&self) -> String {
        join_names(self.actor.iter().map(String::as_str))
    }

    pub fn categories(&self) -> String {
        join_names(self.category.iter().map(|c| c.name.as_str()))
    }

    pub fn countries(&self) -> String {
        join_names(self.country.iter().map(|c| c.name.as_str()))
    }

    /// Wide artwork for the detail header; relative paths have no CDN to join.
    pub fn artwork_source(&self) -> Option<String> {
        [self.thumb_url.as_str(), self.poster_url.as_str()]
            .into_iter()
            .find(|url| url.starts_with("http://") || url.starts_with("https://"))
            .map(String::from)
    }

    pub fn subtitle(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.origin_name, year),
            None => self.origin_name.clone(),
        }
    }

    /// Quality, language, runtime and episode badges, skipping empty ones.
    pub fn badges(&self) -> Vec<&str> {
        [
            self.quality.as_str(),
            self.lang.as_str(),
            self.time.as_str(),
            self.episode_current.as_str(),
        ]
        .into_iter()
        .filter(|b| !b.trim().is_empty())
        .collect()
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Episode {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub link_embed: String,
    #[serde(default)]
    pub link_m3u8: String,
}

impl Episode {
    pub fn is_selected_by(&self, slug: Option<&str>) -> bool {
        slug == Some(self.slug.as_str())
    }

    pub fn embed_url(&self) -> Option<&str> {
        Some(self.link_embed.trim()).filter(|l| !l.is_empty())
    }

    pub fn stream_url(&self) -> Option<&str> {
        Some(self.link_m3u8.trim()).filter(|l| !l.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EpisodeServer {
    pub server_name: String,
    #[serde(default)]
    pub server_data: Vec<Episode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieWithEpisodes {
    pub movie: MovieDetail,
    pub episodes: Vec<EpisodeServer>,
}

impl MovieWithEpisodes {
    pub fn first_episode(&self) -> Option<&Episode> {
        self.episodes.first()?.server_data.first()
    }

    pub fn find_episode(&self, slug: &str) -> Option<&Episode> {
        self.episodes
            .iter()
            .flat_map(|server| server.server_data.iter())
            .find(|episode| episode.slug == slug)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Home,
    Filter,
    Movie(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadingState {
    #[default]
    Idle,
    Loading,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Home,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyKind {
    Category,
    Country,
}

/// Decoded posters kept in memory; older ones are reloaded from disk.
const MAX_POSTER_HANDLES: usize = 512;

#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    cache: HashMap<String, Handle>,
    order: VecDeque<String>,
    pending: HashSet<String>,
    cache_directory: Option<PathBuf>,
}

impl ImageCache {
    pub fn new() -> Self {
        let cache_directory = get_cache_dir();
        if let Some(ref dir) = cache_directory {
            if let Err(e) = std::fs::create_dir_all(dir) {
                log::warn!("poster cache disabled, cannot create {}: {}", dir.display(), e);
                return Self::default();
            }
        }
        Self {
            cache_directory,
            ..Self::default()
        }
    }

    pub fn get(&self, url: &str) -> Option<&Handle> {
        self.cache.get(url)
    }

    pub fn insert(&mut self, url: String, handle: Handle) {
        self.pending.remove(&url);
        if self.cache.insert(url.clone(), handle).is_none() {
            self.order.push_back(url);
        }
        while self.order.len() > MAX_POSTER_HANDLES {
            if let Some(oldest) = self.order.pop_front() {
                self.cache.remove(&oldest);
            }
        }
    }

    pub fn fail(&mut self, url: &str) {
        self.pending.remove(url);
    }

    pub fn is_pending(&self, url: &str) -> bool {
        self.pending.contains(url)
    }

    pub fn needs_load(&self, url: &str) -> bool {
        self.get(url).is_none() && !self.is_pending(url)
    }

    pub fn mark_pending(&mut self, url: String) {
        self.pending.insert(url);
    }

    pub fn get_cache_path(&self, url: &str) -> Option<PathBuf> {
        self.cache_directory
            .as_ref()
            .map(|dir| dir.join(simple_hash(url)))
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    Setup(crate::settings::SetupMessage),
    NavigateTo(Screen),
    OpenTaxonomy(TaxonomyKind, String),
    CategoriesLoaded(Result<Vec<Taxonomy>, ApiError>),
    CountriesLoaded(Result<Vec<Taxonomy>, ApiError>),
    SearchQueryChanged(String),
    SearchSubmit,
    ClearSearch,
    GoToPage(ListingKind, u32),
    NextPage(ListingKind),
    PreviousPage(ListingKind),
    ListingLoaded(ListingKind, ListingRequest, Result<MoviePage, ApiError>),
    RetryListing(ListingKind),
    SetCategoryFilter(Option<Taxonomy>),
    SetCountryFilter(Option<Taxonomy>),
    SetYearFilter(Option<u32>),
    ResetFilter,
    MovieLoaded(String, Result<MovieWithEpisodes, ApiError>),
    RetryMovie,
    SelectEpisode(String),
    PlayEpisode,
    PlaybackFinished(Result<String, PlaybackError>),
    LoadImage(String),
    ImageLoaded(String, Result<Handle, String>),
    ClockTick,
}

pub fn truncate_description(description: &str, max_chars: usize) -> String {
    if description.chars().count() <= max_chars {
        return description.to_string();
    }
    let truncated: String = description.chars().take(max_chars).collect();
    format!(
        "{}...",
        truncated.rfind(' ').map_or(truncated.as_str(), |i| &truncated[..i])
    )
}
