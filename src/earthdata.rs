//! NASA Earthdata search and data access over the CMR HTTP API.
//!
//! Search goes through the UMM-JSON granule endpoint; downloads stream to a
//! `.partial` sidecar first and are renamed into place only once the body is
//! fully written. An interrupted run leaves a `.partial` file, never a
//! truncated file under the final name.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::download::DownloadError;
use crate::types::DayNight;

const CMR_GRANULE_SEARCH_URL: &str = "https://cmr.earthdata.nasa.gov/search/granules.umm_json";

/// Single-page search cap. One tile-year of one product is a few hundred
/// granules, far below this.
const PAGE_SIZE: usize = 2000;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search endpoint returned {status}")]
    Status { status: reqwest::StatusCode },
}

/// Granule search criteria.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub short_name: String,
    pub tile: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub day_night: DayNight,
}

impl SearchQuery {
    /// CMR query parameters. The tile is matched as a wildcard pattern
    /// against granule names; an empty tile matches everything.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let granule_name = if self.tile.is_empty() {
            "*".to_string()
        } else {
            format!("*{}*", self.tile)
        };
        vec![
            ("short_name".to_string(), self.short_name.clone()),
            ("cloud_hosted".to_string(), "true".to_string()),
            ("day_night_flag".to_string(), self.day_night.to_string()),
            ("readable_granule_name".to_string(), granule_name),
            (
                "options[readable_granule_name][pattern]".to_string(),
                "true".to_string(),
            ),
            (
                "temporal".to_string(),
                format!(
                    "{}T00:00:00Z,{}T23:59:59Z",
                    self.start_date, self.end_date
                ),
            ),
            ("page_size".to_string(), PAGE_SIZE.to_string()),
        ]
    }
}

/// One granule from a UMM-JSON search response.
#[derive(Debug, Clone, Deserialize)]
pub struct GranuleHit {
    #[serde(default)]
    pub meta: Value,
    #[serde(default)]
    pub umm: Value,
}

#[derive(Debug, Default, Deserialize)]
struct GranuleList {
    #[serde(default)]
    items: Vec<GranuleHit>,
}

impl GranuleHit {
    /// Direct https data links, in archive order.
    pub fn data_links(&self) -> Vec<String> {
        self.umm["RelatedUrls"]
            .as_array()
            .map(|urls| {
                urls.iter()
                    .filter(|u| u["Type"].as_str() == Some("GET DATA"))
                    .filter_map(|u| u["URL"].as_str())
                    .filter(|url| url.starts_with("https://"))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Blocking client for granule search and data fetch.
pub struct EarthdataClient {
    http: Client,
    token: Option<String>,
}

impl EarthdataClient {
    /// Build a client, optionally carrying an Earthdata bearer token. Search
    /// works without one; the data archive usually requires it.
    pub fn new(token: Option<String>) -> Result<Self, SearchError> {
        let http = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(EarthdataClient { http, token })
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub fn search_granules(&self, query: &SearchQuery) -> Result<Vec<GranuleHit>, SearchError> {
        info!(
            "searching {} from {} to {}, tile {}, {}",
            query.short_name, query.start_date, query.end_date, query.tile, query.day_night
        );

        let response = self
            .with_auth(self.http.get(CMR_GRANULE_SEARCH_URL))
            .query(&query.to_params())
            .send()?;
        if !response.status().is_success() {
            return Err(SearchError::Status {
                status: response.status(),
            });
        }

        let list: GranuleList = response.json()?;
        info!("found {} granules", list.items.len());
        Ok(list.items)
    }

    /// Fetch one file to `target` via a `.partial` sidecar.
    pub fn fetch(&self, url: &str, target: &Path) -> Result<(), DownloadError> {
        debug!("GET {}", url);
        let mut response = self.with_auth(self.http.get(url)).send()?;
        if !response.status().is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let partial = match target.file_name() {
            Some(name) => {
                let mut name = name.to_os_string();
                name.push(".partial");
                target.with_file_name(name)
            }
            None => target.with_extension("partial"),
        };
        {
            let mut out = fs::File::create(&partial)?;
            response.copy_to(&mut out)?;
        }
        fs::rename(&partial, target)?;
        Ok(())
    }
}
