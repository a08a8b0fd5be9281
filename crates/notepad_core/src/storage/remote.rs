//! Remote HTTP storage backend.
//!
//! # Responsibility
//! - Map store mutations to per-page REST verbs:
//!   `GET /pages`, `POST /pages`, `PATCH /pages/{id}`, `DELETE /pages/{id}`.
//!
//! # Invariants
//! - Every request carries `Authorization: Bearer <key>` when a key is set.
//! - Non-2xx responses become `RemoteRequestFailed`; a 404 on a per-page
//!   verb becomes `NotFound`.
//! - PATCH bodies carry only what changed; derived fields travel with
//!   `content`.

use crate::model::page::{Page, PageId, PageUpdate, PlaceMarker};
use crate::storage::{PageChange, PageStorage, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Partial page body sent with PATCH.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PagePatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    places: Option<&'a [PlaceMarker]>,
    updated_at: DateTime<Utc>,
}

impl<'a> PagePatch<'a> {
    fn from_update(page: &'a Page, update: &PageUpdate) -> Self {
        let content_changed = update.content.is_some();
        Self {
            title: update.title.as_ref().map(|_| page.title.as_str()),
            content: content_changed.then(|| page.content()),
            tags: content_changed.then(|| page.tags()),
            places: content_changed.then(|| page.places()),
            updated_at: page.updated_at(),
        }
    }
}

/// Page storage backed by a REST API.
pub struct RemoteApiStorage {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl RemoteApiStorage {
    /// Creates a client using the default timeout.
    pub fn new(base_url: &str, api_key: Option<String>) -> StorageResult<Self> {
        Self::with_timeout(base_url, api_key, DEFAULT_REMOTE_TIMEOUT)
    }

    /// Creates a client with an explicit per-request timeout.
    ///
    /// # Errors
    /// - `Unavailable` when `base_url` is not an absolute http(s) URL or the
    ///   HTTP client cannot be built.
    pub fn with_timeout(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> StorageResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|err| StorageError::Unavailable(format!("invalid api url `{base_url}`: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::Unavailable(format!(
                "api url `{base_url}` cannot be used as a base"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| StorageError::Unavailable(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /pages` with one full record (create or replace).
    pub fn save_page(&self, page: &Page) -> StorageResult<()> {
        let request = self.request(Method::POST, None)?.json(page);
        self.send("save_page", request, None).map(|_| ())
    }

    /// `PATCH /pages/{id}` with the fields touched by `update`.
    pub fn patch_page(&self, page: &Page, update: &PageUpdate) -> StorageResult<()> {
        let body = PagePatch::from_update(page, update);
        let request = self.request(Method::PATCH, Some(page.id()))?.json(&body);
        self.send("patch_page", request, Some(page.id())).map(|_| ())
    }

    /// `DELETE /pages/{id}`.
    pub fn delete_page(&self, page_id: &PageId) -> StorageResult<()> {
        let request = self.request(Method::DELETE, Some(page_id))?;
        self.send("delete_page", request, Some(page_id)).map(|_| ())
    }

    fn endpoint(&self, page_id: Option<&PageId>) -> StorageResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StorageError::Unavailable(format!(
                    "api url `{}` cannot be used as a base",
                    self.base_url
                ))
            })?;
            segments.pop_if_empty().push("pages");
            if let Some(page_id) = page_id {
                segments.push(page_id.as_str());
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, page_id: Option<&PageId>) -> StorageResult<RequestBuilder> {
        let mut request = self
            .client
            .request(method, self.endpoint(page_id)?)
            .header(ACCEPT, "application/json");
        if let Some(api_key) = self.api_key.as_deref() {
            request = request.bearer_auth(api_key);
        }
        Ok(request)
    }

    fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        page_id: Option<&PageId>,
    ) -> StorageResult<Response> {
        let response = request.send().map_err(|err| {
            warn!(
                "event=remote_request module=storage backend=remote status=error operation={} error_code=transport_failed error={}",
                operation, err
            );
            StorageError::Unavailable(format!("remote request `{operation}` failed: {err}"))
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(
                "event=remote_request module=storage backend=remote status=ok operation={} http_status={}",
                operation,
                status.as_u16()
            );
            return Ok(response);
        }

        warn!(
            "event=remote_request module=storage backend=remote status=error operation={} http_status={}",
            operation,
            status.as_u16()
        );
        match page_id {
            Some(page_id) if status == StatusCode::NOT_FOUND => {
                Err(StorageError::NotFound(page_id.clone()))
            }
            _ => Err(StorageError::RemoteRequestFailed {
                operation,
                status: status.as_u16(),
            }),
        }
    }
}

impl PageStorage for RemoteApiStorage {
    fn load(&self) -> StorageResult<Vec<Page>> {
        let request = self.request(Method::GET, None)?;
        let response = self.send("load_pages", request, None)?;
        response.json::<Vec<Page>>().map_err(|err| {
            StorageError::Unavailable(format!("malformed pages response: {err}"))
        })
    }

    fn save_all(&self, pages: &[Page]) -> StorageResult<()> {
        for page in pages {
            self.save_page(page)?;
        }
        Ok(())
    }

    fn apply_change(&self, change: &PageChange<'_>, _pages: &[Page]) -> StorageResult<()> {
        match change {
            PageChange::Created(page) => self.save_page(page),
            PageChange::Updated { page, update } => self.patch_page(page, update),
            PageChange::Deleted(page_id) => self.delete_page(page_id),
        }
    }

    fn backend_name(&self) -> &'static str {
        "remote"
    }
}
