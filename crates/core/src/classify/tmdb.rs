//! TMDB (The Movie Database) backed classifier.
//!
//! Titles are parsed locally with [`ReleaseNameParser`]; recognition runs a
//! TMDB search for the parsed name, narrowed by year when one was found.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Classifier, ClassifyError, MediaRecord, MediaType, RecognizedMeta, ReleaseNameParser};

/// TMDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Image base URL for posters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
    /// Result language, e.g. `en-US`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Classifier resolving titles against TMDB search.
pub struct TmdbClassifier {
    client: Client,
    base_url: String,
    api_key: String,
    image_base_url: String,
    language: Option<String>,
    parser: ReleaseNameParser,
}

impl TmdbClassifier {
    pub fn new(config: TmdbConfig) -> Result<Self, ClassifyError> {
        if config.api_key.is_empty() {
            return Err(ClassifyError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.themoviedb.org/3".to_string());

        let image_base_url = config
            .image_base_url
            .unwrap_or_else(|| "https://image.tmdb.org/t/p".to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
            language: config.language,
            parser: ReleaseNameParser::new(),
        })
    }

    /// Search for movies by name.
    pub async fn search_movies(
        &self,
        query: &str,
        year: Option<u32>,
    ) -> Result<Vec<MediaRecord>, ClassifyError> {
        debug!("TMDB movie search: query='{}', year={:?}", query, year);

        let results: TmdbSearchResponse<TmdbMovieResult> =
            self.search("movie", query, year.map(|y| ("year", y))).await?;

        Ok(results
            .results
            .into_iter()
            .map(|r| r.into_record(&self.image_base_url))
            .collect())
    }

    /// Search for TV series by name.
    pub async fn search_tv(
        &self,
        query: &str,
        year: Option<u32>,
    ) -> Result<Vec<MediaRecord>, ClassifyError> {
        debug!("TMDB TV search: query='{}', year={:?}", query, year);

        let results: TmdbSearchResponse<TmdbTvResult> = self
            .search("tv", query, year.map(|y| ("first_air_date_year", y)))
            .await?;

        Ok(results
            .results
            .into_iter()
            .map(|r| r.into_record(&self.image_base_url))
            .collect())
    }

    async fn search<T: for<'de> Deserialize<'de>>(
        &self,
        kind: &str,
        query: &str,
        year: Option<(&str, u32)>,
    ) -> Result<TmdbSearchResponse<T>, ClassifyError> {
        let url = format!("{}/search/{}", self.base_url, kind);

        let mut request = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", query)]);

        if let Some((param, y)) = year {
            request = request.query(&[(param, y.to_string())]);
        }
        if let Some(language) = &self.language {
            request = request.query(&[("language", language.as_str())]);
        }

        let response = request.send().await?;

        let status = response.status();
        if status == 401 {
            return Err(ClassifyError::NotConfigured(
                "Invalid TMDB API key".to_string(),
            ));
        }
        if status == 429 {
            return Err(ClassifyError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            ClassifyError::Parse(format!("Failed to parse {} search response: {}", kind, e))
        })
    }

    async fn search_kind(
        &self,
        kind: MediaType,
        name: &str,
        year: Option<u32>,
    ) -> Result<Option<MediaRecord>, ClassifyError> {
        let first = |records: Vec<MediaRecord>| records.into_iter().next();

        let found = match kind {
            MediaType::Movie => first(self.search_movies(name, year).await?),
            MediaType::Tv => first(self.search_tv(name, year).await?),
        };
        if found.is_some() || year.is_none() {
            return Ok(found);
        }

        // Release years are often off by one from the catalog; retry unfiltered.
        Ok(match kind {
            MediaType::Movie => first(self.search_movies(name, None).await?),
            MediaType::Tv => first(self.search_tv(name, None).await?),
        })
    }
}

#[async_trait]
impl Classifier for TmdbClassifier {
    fn parse(&self, title: &str, subtitle: Option<&str>) -> RecognizedMeta {
        self.parser.parse(title, subtitle)
    }

    async fn recognize(&self, meta: &RecognizedMeta) -> Result<Option<MediaRecord>, ClassifyError> {
        if !meta.has_name() {
            return Ok(None);
        }

        let order: &[MediaType] = match meta.media_type_hint {
            Some(MediaType::Tv) => &[MediaType::Tv],
            Some(MediaType::Movie) => &[MediaType::Movie],
            None => &[MediaType::Movie, MediaType::Tv],
        };

        for kind in order {
            if let Some(record) = self.search_kind(*kind, &meta.name, meta.year).await? {
                debug!(
                    "TMDB matched '{}' to {} {} (id {})",
                    meta.name, record.media_type, record.title_year(), record.tmdb_id
                );
                return Ok(Some(record));
            }
        }

        Ok(None)
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u32,
    title: String,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvResult {
    id: u32,
    name: String,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

impl TmdbMovieResult {
    fn into_record(self, image_base_url: &str) -> MediaRecord {
        MediaRecord {
            title: self.title,
            year: year_of(self.release_date.as_deref()),
            media_type: MediaType::Movie,
            tmdb_id: self.id,
            poster_url: poster_url(image_base_url, self.poster_path.as_deref()),
            overview: self.overview.filter(|o| !o.is_empty()),
        }
    }
}

impl TmdbTvResult {
    fn into_record(self, image_base_url: &str) -> MediaRecord {
        MediaRecord {
            title: self.name,
            year: year_of(self.first_air_date.as_deref()),
            media_type: MediaType::Tv,
            tmdb_id: self.id,
            poster_url: poster_url(image_base_url, self.poster_path.as_deref()),
            overview: self.overview.filter(|o| !o.is_empty()),
        }
    }
}

/// Year from a `YYYY-MM-DD` date.
fn year_of(date: Option<&str>) -> Option<u32> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

fn poster_url(image_base_url: &str, path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{}/w500{}", image_base_url, p))
}
