use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::listing::{FilterSelection, ListingMode, ListingRequest};
use crate::media::{
    EpisodeServer, MovieDetail, MoviePage, MovieSummary, MovieWithEpisodes, Pagination, Taxonomy,
};
use crate::settings::AppSettings;

pub const DEFAULT_API_BASE_URL: &str = "https://my-movies-be.onrender.com/api";
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("could not read response: {0}")]
    Parse(String),
    #[error("server returned HTTP {0}")]
    Http(u16),
    #[error("movie not found")]
    NotFound,
    #[error("too many requests, try again shortly")]
    RateLimit,
    #[error("invalid API address: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    items: Vec<MovieSummary>,
    #[serde(default)]
    pagination: Pagination,
}

impl From<LatestResponse> for MoviePage {
    fn from(response: LatestResponse) -> Self {
        Self {
            items: response.items,
            pagination: response.pagination,
            cdn_image_domain: None,
        }
    }
}

/// Envelope shared by the search and filter endpoints.
#[derive(Debug, Deserialize)]
struct EnvelopeResponse {
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    #[serde(default)]
    items: Option<Vec<MovieSummary>>,
    #[serde(default)]
    params: EnvelopeParams,
    #[serde(rename = "APP_DOMAIN_CDN_IMAGE", default)]
    cdn_image_domain: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeParams {
    #[serde(default)]
    pagination: Pagination,
}

impl From<EnvelopeResponse> for MoviePage {
    fn from(response: EnvelopeResponse) -> Self {
        let data = response.data;
        Self {
            items: data.items.unwrap_or_default(),
            pagination: data.params.pagination,
            cdn_image_domain: data.cdn_image_domain.filter(|d| !d.trim().is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MovieResponse {
    movie: MovieDetail,
    #[serde(default)]
    episodes: Vec<EpisodeServer>,
}

impl From<MovieResponse> for MovieWithEpisodes {
    fn from(response: MovieResponse) -> Self {
        Self {
            movie: response.movie,
            episodes: response.episodes,
        }
    }
}

struct CacheEntry<T> {
    data: T,
    created_at: Instant,
}

impl<T: Clone> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            created_at: Instant::now(),
        }
    }

    fn is_valid(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() < ttl
    }
}

type Cache<T> = Arc<RwLock<HashMap<String, CacheEntry<T>>>>;

#[derive(Clone)]
pub struct CatalogueClient {
    base_url: Url,
    search_limit: u32,
    cache_ttl: Duration,
    http_client: Arc<reqwest::Client>,
    list_cache: Cache<MoviePage>,
    taxonomy_cache: Cache<Vec<Taxonomy>>,
    movie_cache: Cache<MovieWithEpisodes>,
}

impl std::fmt::Debug for CatalogueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogueClient")
            .field("base_url", &self.base_url.as_str())
            .field("search_limit", &self.search_limit)
            .finish()
    }
}

impl CatalogueClient {
    pub fn new(base_url: &str, search_limit: u32, cache_ttl: Duration) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url.trim()).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url,
            search_limit,
            cache_ttl,
            http_client: Arc::new(reqwest::Client::new()),
            list_cache: Arc::new(RwLock::new(HashMap::new())),
            taxonomy_cache: Arc::new(RwLock::new(HashMap::new())),
            movie_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn from_settings(settings: &AppSettings) -> Result<Self, ApiError> {
        Self::new(
            &settings.api_base_url,
            settings.search_limit,
            Duration::from_secs(settings.cache_ttl_secs),
        )
    }

    fn endpoint_url(&self, segments: &[&str], params: &[(&str, String)]) -> Result<String, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url.into())
    }

    pub fn new_movies_url(&self, page: u32) -> Result<String, ApiError> {
        self.endpoint_url(&["movies", "new"], &[("page", page.to_string())])
    }

    pub fn search_url(&self, keyword: &str, page: u32) -> Result<String, ApiError> {
        self.endpoint_url(
            &["movies", "search"],
            &[
                ("keyword", keyword.to_string()),
                ("page", page.to_string()),
                ("limit", self.search_limit.to_string()),
            ],
        )
    }

    pub fn filter_url(&self, filter: &FilterSelection, page: u32) -> Result<String, ApiError> {
        let mut params = Vec::with_capacity(5);
        if let Some(category) = &filter.category {
            params.push(("category", category.clone()));
        }
        if let Some(country) = &filter.country {
            params.push(("country", country.clone()));
        }
        if let Some(year) = filter.year {
            params.push(("year", year.to_string()));
        }
        params.push(("page", page.to_string()));
        params.push(("limit", self.search_limit.to_string()));
        self.endpoint_url(&["movies", "filter"], &params)
    }

    pub fn movie_url(&self, slug: &str) -> Result<String, ApiError> {
        self.endpoint_url(&["movies", slug], &[])
    }

    fn cached<T: Clone>(&self, cache: &Cache<T>, key: &str) -> Option<T> {
        let data = cache
            .read()
            .ok()?
            .get(key)
            .filter(|e| e.is_valid(self.cache_ttl))
            .map(|e| e.data.clone())?;
        log::debug!("cache hit: {}", key);
        Some(data)
    }

    fn store<T: Clone>(&self, cache: &Cache<T>, key: String, data: T) {
        if let Ok(mut entries) = cache.write() {
            entries.retain(|_, e| e.is_valid(self.cache_ttl));
            entries.insert(key, CacheEntry::new(data));
        }
    }

    async fn fetch_response(&self, url: &str) -> Result<reqwest::Response, ApiError> {
        log::debug!("GET {}", url);
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        match response.status().as_u16() {
            429 => Err(ApiError::RateLimit),
            s if s >= 400 => Err(ApiError::Http(s)),
            _ => Ok(response),
        }
    }

    async fn fetch_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ApiError> {
        self.fetch_response(url)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn fetch_page<R>(&self, url: String) -> Result<MoviePage, ApiError>
    where
        R: for<'de> Deserialize<'de> + Into<MoviePage>,
    {
        if let Some(cached) = self.cached(&self.list_cache, &url) {
            return Ok(cached);
        }
        let response: R = self.fetch_json(&url).await?;
        let page: MoviePage = response.into();
        self.store(&self.list_cache, url, page.clone());
        Ok(page)
    }

    async fn fetch_taxonomy(&self, segment: &str) -> Result<Vec<Taxonomy>, ApiError> {
        let url = self.endpoint_url(&[segment], &[])?;
        if let Some(cached) = self.cached(&self.taxonomy_cache, &url) {
            return Ok(cached);
        }
        let items: Vec<Taxonomy> = self.fetch_json(&url).await?;
        self.store(&self.taxonomy_cache, url, items.clone());
        Ok(items)
    }

    pub async fn fetch_categories(&self) -> Result<Vec<Taxonomy>, ApiError> {
        self.fetch_taxonomy("categories").await
    }

    pub async fn fetch_countries(&self) -> Result<Vec<Taxonomy>, ApiError> {
        self.fetch_taxonomy("country").await
    }

    pub async fn fetch_new_movies(&self, page: u32) -> Result<MoviePage, ApiError> {
        self.fetch_page::<LatestResponse>(self.new_movies_url(page)?)
            .await
    }

    pub async fn search(&self, keyword: &str, page: u32) -> Result<MoviePage, ApiError> {
        self.fetch_page::<EnvelopeResponse>(self.search_url(keyword, page)?)
            .await
    }

    pub async fn fetch_filtered(
        &self,
        filter: &FilterSelection,
        page: u32,
    ) -> Result<MoviePage, ApiError> {
        self.fetch_page::<EnvelopeResponse>(self.filter_url(filter, page)?)
            .await
    }

    pub async fn fetch_movie(&self, slug: &str) -> Result<MovieWithEpisodes, ApiError> {
        let url = self.movie_url(slug)?;
        if let Some(cached) = self.cached(&self.movie_cache, &url) {
            return Ok(cached);
        }
        let response: MovieResponse = self.fetch_json(&url).await.map_err(|e| match e {
            ApiError::Http(404) => ApiError::NotFound,
            other => other,
        })?;
        let movie = MovieWithEpisodes::from(response);
        self.store(&self.movie_cache, url, movie.clone());
        Ok(movie)
    }

    pub async fn fetch_image_bytes(&self, url: String) -> Result<Vec<u8>, String> {
        self.http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| e.to_string())
    }
}

pub async fn load_listing(
    client: CatalogueClient,
    request: ListingRequest,
) -> Result<MoviePage, ApiError> {
    match &request.mode {
        ListingMode::Latest => client.fetch_new_movies(request.page).await,
        ListingMode::Search { keyword } => client.search(keyword, request.page).await,
        ListingMode::Filter(filter) => client.fetch_filtered(filter, request.page).await,
    }
}

pub async fn load_categories(client: CatalogueClient) -> Result<Vec<Taxonomy>, ApiError> {
    client.fetch_categories().await
}

pub async fn load_countries(client: CatalogueClient) -> Result<Vec<Taxonomy>, ApiError> {
    client.fetch_countries().await
}

pub async fn load_movie(client: CatalogueClient, slug: String) -> Result<MovieWithEpisodes, ApiError> {
    client.fetch_movie(&slug).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client() -> CatalogueClient {
        CatalogueClient::new(
            "https://api.example.com/api/",
            20,
            Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
        )
        .unwrap()
    }

    #[test]
    fn builds_listing_urls() {
        let client = client();
        assert_eq!(
            client.new_movies_url(3).unwrap(),
            "https://api.example.com/api/movies/new?page=3"
        );
        assert_eq!(
            client.search_url("tom&jerry", 1).unwrap(),
            "https://api.example.com/api/movies/search?keyword=tom%26jerry&page=1&limit=20"
        );
        assert_eq!(
            client.movie_url("lat-mat-7").unwrap(),
            "https://api.example.com/api/movies/lat-mat-7"
        );
    }

    #[test]
    fn filter_url_omits_unset_selections() {
        let client = client();
        let filter = FilterSelection {
            category: Some(String::from("hanh-dong")),
            country: None,
            year: Some(2024),
        };
        assert_eq!(
            client.filter_url(&filter, 2).unwrap(),
            "https://api.example.com/api/movies/filter?category=hanh-dong&year=2024&page=2&limit=20"
        );
        assert_eq!(
            client.filter_url(&FilterSelection::default(), 1).unwrap(),
            "https://api.example.com/api/movies/filter?page=1&limit=20"
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(
            CatalogueClient::new("not a url", 20, Duration::from_secs(1)),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            CatalogueClient::new("mailto:someone@example.com", 20, Duration::from_secs(1)),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn decodes_latest_listing() {
        let json = r#"{
            "status": true,
            "msg": "",
            "items": [
                {"_id": "a1", "name": "Phim A", "slug": "phim-a", "poster_url": "https://img/a.jpg",
                 "year": 2025, "tmdb": {"vote_average": 7.5, "vote_count": 12}}
            ],
            "pagination": {"totalItems": 24000, "totalItemsPerPage": 24, "currentPage": 2, "totalPages": 1000}
        }"#;
        let page: MoviePage = serde_json::from_str::<LatestResponse>(json).unwrap().into();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].vote_average(), Some(7.5));
        assert_eq!(page.pagination.current_page, 2);
        assert_eq!(page.pagination.total_pages, 1000);
        assert_eq!(page.cdn_image_domain, None);
    }

    #[test]
    fn decodes_search_envelope_with_null_items() {
        let json = r#"{
            "status": "success",
            "msg": "",
            "data": {
                "items": null,
                "params": {"pagination": {"totalItems": 0, "totalItemsPerPage": 20, "currentPage": 1, "totalPages": 0}},
                "APP_DOMAIN_FRONTEND": "https://ophim.example",
                "APP_DOMAIN_CDN_IMAGE": "https://img.ophim.example"
            }
        }"#;
        let page: MoviePage = serde_json::from_str::<EnvelopeResponse>(json).unwrap().into();
        assert!(page.items.is_empty());
        assert_eq!(page.pagination.total_pages, 0);
        assert_eq!(
            page.cdn_image_domain.as_deref(),
            Some("https://img.ophim.example")
        );
    }

    #[test]
    fn decodes_movie_with_episodes() {
        let json = r##"{
            "status": true,
            "msg": "",
            "movie": {
                "_id": "m1", "name": "Phim", "slug": "phim", "origin_name": "Movie",
                "content": "<p>Nội dung</p>", "year": 2020, "quality": "FHD", "lang": "Vietsub",
                "episode_current": "Hoàn Tất (2/2)", "time": "45 phút",
                "actor": ["X"], "director": ["Y"],
                "category": [{"id": "c", "name": "Tâm Lý", "slug": "tam-ly"}],
                "country": [{"id": "k", "name": "Nhật Bản", "slug": "nhat-ban"}],
                "trailer_url": ""
            },
            "episodes": [
                {"server_name": "#Hà Nội (Vietsub)", "server_data": [
                    {"name": "1", "slug": "tap-1", "filename": "f1", "link_embed": "https://embed/1", "link_m3u8": "https://m3u8/1"},
                    {"name": "2", "slug": "tap-2", "filename": "f2", "link_embed": "https://embed/2", "link_m3u8": ""}
                ]}
            ]
        }"##;
        let movie: MovieWithEpisodes = serde_json::from_str::<MovieResponse>(json).unwrap().into();
        assert_eq!(movie.movie.slug, "phim");
        assert_eq!(movie.first_episode().map(|e| e.slug.as_str()), Some("tap-1"));
        assert_eq!(
            movie.find_episode("tap-2").and_then(|e| e.stream_url()),
            None
        );
    }

    #[test]
    fn decodes_taxonomy_list() {
        let json = r#"[{"_id": "1", "name": "Hành Động", "slug": "hanh-dong"},
                       {"_id": "2", "name": "Cổ Trang", "slug": "co-trang"}]"#;
        let items: Vec<Taxonomy> = serde_json::from_str(json).unwrap();
        assert_eq!(items[1].slug, "co-trang");
        assert_eq!(items[0].to_string(), "Hành Động");
    }

    #[test]
    fn cache_entries_expire() {
        let client = CatalogueClient::new("https://api.example.com", 20, Duration::ZERO).unwrap();
        client.store(&client.list_cache, String::from("k"), MoviePage::default());
        assert!(client.cached(&client.list_cache, "k").is_none());

        let client = client_with_ttl(60);
        client.store(&client.list_cache, String::from("k"), MoviePage::default());
        assert_eq!(
            client.cached(&client.list_cache, "k"),
            Some(MoviePage::default())
        );
    }

    fn client_with_ttl(secs: u64) -> CatalogueClient {
        CatalogueClient::new("https://api.example.com", 20, Duration::from_secs(secs)).unwrap()
    }

    #[test]
    fn expired_entries_are_pruned_on_write() {
        let client = CatalogueClient::new("https://api.example.com", 20, Duration::ZERO).unwrap();
        client.store(&client.list_cache, String::from("a"), MoviePage::default());
        client.store(&client.list_cache, String::from("b"), MoviePage::default());
        let entries = client.list_cache.read().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("b"));
    }

    /// Answers every connection with the same canned response and counts them.
    async fn canned_server(status: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        (format!("http://{}/api", addr), hits)
    }

    async fn client_for(status: &'static str, body: &'static str) -> (CatalogueClient, Arc<AtomicUsize>) {
        let (base, hits) = canned_server(status, body).await;
        (client_with_base(&base), hits)
    }

    fn client_with_base(base: &str) -> CatalogueClient {
        CatalogueClient::new(base, 20, Duration::from_secs(60)).unwrap()
    }

    #[tokio::test]
    async fn missing_movie_maps_to_not_found() {
        let (client, _) = client_for("404 Not Found", "{}").await;
        assert_eq!(client.fetch_movie("khong-co").await, Err(ApiError::NotFound));
    }

    #[tokio::test]
    async fn missing_listing_endpoint_keeps_status() {
        let (client, _) = client_for("404 Not Found", "{}").await;
        assert_eq!(client.fetch_categories().await, Err(ApiError::Http(404)));
        assert_eq!(
            client.fetch_filtered(&FilterSelection::default(), 1).await,
            Err(ApiError::Http(404))
        );
    }

    #[tokio::test]
    async fn maps_rate_limit_and_server_errors() {
        let (client, _) = client_for("429 Too Many Requests", "{}").await;
        assert_eq!(client.fetch_new_movies(1).await, Err(ApiError::RateLimit));

        let (client, _) = client_for("503 Service Unavailable", "{}").await;
        assert_eq!(client.search("batman", 1).await, Err(ApiError::Http(503)));
        assert_eq!(client.fetch_movie("phim").await, Err(ApiError::Http(503)));
    }

    #[tokio::test]
    async fn undecodable_body_is_a_parse_error() {
        let (client, _) = client_for("200 OK", "<html>maintenance</html>").await;
        assert!(matches!(client.fetch_countries().await, Err(ApiError::Parse(_))));
    }

    #[tokio::test]
    async fn repeated_fetch_is_served_from_cache() {
        let (client, hits) = client_for(
            "200 OK",
            r#"[{"_id": "1", "name": "Hàn Quốc", "slug": "han-quoc"}]"#,
        )
        .await;
        let first = client.fetch_countries().await.unwrap();
        let second = client.fetch_countries().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].slug, "han-quoc");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetches_are_not_cached() {
        let (client, hits) = client_for("500 Internal Server Error", "{}").await;
        assert!(client.fetch_new_movies(2).await.is_err());
        assert!(client.fetch_new_movies(2).await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
