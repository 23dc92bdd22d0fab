//! Jellyfin API connector implementation
//!
//! Implements the catalog and virtual-library collaborator traits for the
//! Jellyfin REST API.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_library::{
    CatalogItem, CatalogQuery, LibraryError, LibrarySnapshotProvider, MetadataField,
    RecentActivityProvider, VirtualLibraryManager, WatchState,
};
use core_runtime::logging::redact_secrets;
use core_runtime::CoreConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{JellyfinError, Result};
use crate::types::{AddPathRequest, ItemsResponse, VirtualFolder};

/// Item types that groupings are built from
const ITEM_TYPES: &str = "Movie,Series";

/// Fields requested for the full library snapshot
const SNAPSHOT_FIELDS: &str =
    "Path,ProviderIds,Genres,Studios,Tags,People,ProductionYear,CommunityRating,UserData,SortName,DateCreated";

/// Upper bound on items in one snapshot request
const SNAPSHOT_LIMIT: u32 = 10_000;

const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(60);

const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for library management calls
const ADMIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the API key on write calls
const TOKEN_HEADER: &str = "X-Emby-Token";

/// Jellyfin API connector
///
/// # Features
///
/// - Full catalog snapshot with the fields rule and list matching need
/// - Filtered, server-sorted item queries for plain metadata groupings
/// - Recently played items for recommendation seeds
/// - Virtual library creation and cover upload
///
/// # Example
///
/// ```ignore
/// use provider_jellyfin::JellyfinConnector;
/// use core_library::LibrarySnapshotProvider;
///
/// let connector = JellyfinConnector::new(http_client, "http://jellyfin:8096", api_key);
/// let items = connector.fetch_snapshot().await?;
/// ```
pub struct JellyfinConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Server base URL without trailing slash
    base_url: String,

    api_key: String,
}

impl JellyfinConnector {
    /// Create a new Jellyfin connector
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `base_url` - server URL, e.g. `http://localhost:8096`
    /// * `api_key` - Jellyfin API key
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
            api_key: api_key.into(),
        }
    }

    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &CoreConfig) -> Self {
        Self::new(http_client, config.base_url(), config.api_key.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query parameters for a filtered catalog request.
    pub fn query_params(query: &CatalogQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("Recursive", "true".to_string()),
            ("Fields", "Path".to_string()),
            ("IncludeItemTypes", ITEM_TYPES.to_string()),
        ];

        if let Some(filter) = &query.filter {
            let key = match filter.field {
                MetadataField::Genre => "Genres",
                MetadataField::Actor => "Person",
                MetadataField::Studio => "Studios",
                MetadataField::Tag => "Tags",
                MetadataField::Year => "years",
            };
            params.push((key, filter.value.clone()));
        }

        match query.watch_state {
            WatchState::Any => {}
            WatchState::Unwatched => params.push(("Filters", "IsUnplayed".to_string())),
            WatchState::Watched => params.push(("Filters", "IsPlayed".to_string())),
        }

        if let Some(field) = query.sort {
            let (sort_by, sort_order) = field.server_params();
            params.push(("SortBy", sort_by.to_string()));
            params.push(("SortOrder", sort_order.to_string()));
        }

        params
    }

    fn get(&self, path: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("{}{}", self.base_url, path))
            .query("api_key", &self.api_key)
    }

    fn post(&self, path: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Post, format!("{}{}", self.base_url, path))
            .header(TOKEN_HEADER, self.api_key.clone())
            .timeout(ADMIN_TIMEOUT)
    }

    /// Send a request and map non-2xx statuses to [`JellyfinError::ApiError`].
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(url = %redact_secrets(&request.url), "Jellyfin request");
        let response = self.http_client.execute(request).await?;

        if response.is_success() {
            return Ok(response);
        }

        let mut message = String::from_utf8_lossy(&response.body).into_owned();
        message.truncate(200);
        warn!(status = response.status, "Jellyfin request failed");
        Err(JellyfinError::ApiError {
            status_code: response.status,
            message,
        })
    }

    async fn fetch_items(&self, request: HttpRequest) -> Result<Vec<CatalogItem>> {
        let response = self.send(request).await?;
        let body: ItemsResponse = serde_json::from_slice(&response.body).map_err(|e| {
            JellyfinError::ParseError(format!("Failed to parse items response: {}", e))
        })?;

        Ok(body.items.into_iter().map(CatalogItem::from).collect())
    }

    async fn virtual_folders(&self) -> Result<Vec<VirtualFolder>> {
        let response = self
            .send(self.get("/Library/VirtualFolders").timeout(ADMIN_TIMEOUT))
            .await?;

        serde_json::from_slice(&response.body).map_err(|e| {
            JellyfinError::ParseError(format!("Failed to parse virtual folders: {}", e))
        })
    }

    async fn create_virtual_folder(&self, name: &str, path: &str) -> Result<()> {
        // Mixed libraries omit collectionType
        let create = self
            .post("/Library/VirtualFolders")
            .query("name", name)
            .query("refreshLibrary", "false")
            .body(Bytes::new());

        match self.send(create).await {
            Ok(_) => {}
            Err(JellyfinError::ApiError {
                status_code: 409, ..
            }) => debug!(name, "Library already exists"),
            Err(e) => return Err(e),
        }

        let add_path = self
            .post("/Library/VirtualFolders/Paths")
            .json(&AddPathRequest { name, path })?;
        self.send(add_path).await?;

        self.send(self.post("/Library/Refresh")).await?;
        Ok(())
    }

    async fn upload_cover(&self, name: &str, image: Bytes, content_type: &str) -> Result<()> {
        let item_id = self
            .virtual_folders()
            .await?
            .into_iter()
            .find(|folder| folder.name == name)
            .and_then(|folder| folder.item_id)
            .ok_or_else(|| JellyfinError::LibraryNotFound {
                name: name.to_string(),
            })?;

        let request = self
            .post(&format!("/Items/{}/Images/Primary", urlencoding::encode(&item_id)))
            .header("Content-Type", content_type)
            .body(image);
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl LibrarySnapshotProvider for JellyfinConnector {
    #[instrument(skip(self))]
    async fn fetch_snapshot(&self) -> core_library::Result<Vec<CatalogItem>> {
        let request = self
            .get("/Items")
            .query("Recursive", "true")
            .query("Fields", SNAPSHOT_FIELDS)
            .query("IncludeItemTypes", ITEM_TYPES)
            .query("Limit", &SNAPSHOT_LIMIT.to_string())
            .timeout(SNAPSHOT_TIMEOUT);

        let items = self.fetch_items(request).await?;
        info!("Fetched {} items from Jellyfin", items.len());
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn query_items(&self, query: &CatalogQuery) -> core_library::Result<Vec<CatalogItem>> {
        let request = Self::query_params(query)
            .into_iter()
            .fold(self.get("/Items"), |request, (key, value)| {
                request.query(key, &value)
            })
            .timeout(QUERY_TIMEOUT);

        let items = self.fetch_items(request).await?;
        debug!(count = items.len(), "Catalog query returned items");
        Ok(items)
    }
}

#[async_trait]
impl RecentActivityProvider for JellyfinConnector {
    #[instrument(skip(self))]
    async fn recent_items(
        &self,
        user_id: &str,
        limit: usize,
    ) -> core_library::Result<Vec<CatalogItem>> {
        let request = self
            .get(&format!("/Users/{}/Items", urlencoding::encode(user_id)))
            .query("SortBy", "DatePlayed")
            .query("SortOrder", "Descending")
            .query("Filters", "IsPlayed")
            .query("Recursive", "true")
            .query("IncludeItemTypes", ITEM_TYPES)
            .query("Fields", "ProviderIds")
            .query("Limit", &limit.to_string())
            .timeout(QUERY_TIMEOUT);

        Ok(self.fetch_items(request).await?)
    }
}

#[async_trait]
impl VirtualLibraryManager for JellyfinConnector {
    async fn list_libraries(&self) -> core_library::Result<Vec<String>> {
        Ok(self
            .virtual_folders()
            .await?
            .into_iter()
            .map(|folder| folder.name)
            .collect())
    }

    #[instrument(skip(self))]
    async fn create_library(&self, name: &str, path: &str) -> core_library::Result<()> {
        self.create_virtual_folder(name, path)
            .await
            .map_err(|e| {
                LibraryError::Unavailable(format!("Failed to create library {:?}: {}", name, e))
            })?;
        info!(name, path, "Created Jellyfin library");
        Ok(())
    }

    #[instrument(skip(self, image))]
    async fn set_library_cover(
        &self,
        name: &str,
        image: Bytes,
        content_type: &str,
    ) -> core_library::Result<()> {
        self.upload_cover(name, image, content_type).await?;
        info!(name, "Updated library cover image");
        Ok(())
    }
}
