//! Google Drive API connector implementation
//!
//! Implements the `RemoteStore` trait for Google Drive API v3.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::remote::{
    ChildPage, RemoteEntry, RemoteEntryKind, RemoteStore, UpdatedObject, UploadedObject,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use core_auth::TokenProvider;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::GoogleDriveError;
use crate::types::{
    CreatedFolderResponse, DriveFile, FilesListResponse, UpdateResponse, UploadResponse,
};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Google Drive upload endpoint base URL
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// MIME type marking a container
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// MIME prefix marking provider-native documents (no binary export)
const NATIVE_MIME_PREFIX: &str = "application/vnd.google-apps.";

/// Maximum results per page (Google Drive API limit)
const MAX_PAGE_SIZE: u32 = 1000;

/// Fields to request for file resources
const FILE_FIELDS: &str = "id,name,mimeType,modifiedTime,parents,trashed";

/// Multipart boundary for uploads
const UPLOAD_BOUNDARY: &str = "drivesyncd_multipart_boundary";

/// Retry attempts for rate-limited and server-errored requests
const MAX_RETRIES: u32 = 3;

/// Google Drive API connector
///
/// Implements `RemoteStore` for Google Drive API v3:
///
/// - Paginated children listing with query filtering
/// - Multipart upload and media update
/// - Folder lookup before creation
/// - Idempotent delete ("not found" counts as success)
/// - Exponential backoff for rate limiting and server errors
/// - Bearer credentials fetched per call from a `TokenProvider`
pub struct GoogleDriveConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Source of valid access tokens (refreshes transparently)
    token_provider: Arc<dyn TokenProvider>,
}

impl GoogleDriveConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, token_provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            http_client,
            token_provider,
        }
    }

    /// Fetch a bearer token for the next request
    async fn bearer(&self) -> Result<String> {
        self.token_provider
            .access_token()
            .await
            .map_err(Into::into)
    }

    /// Parse RFC 3339 timestamp to Unix seconds
    fn parse_timestamp(rfc3339: &str) -> Option<i64> {
        DateTime::parse_from_rfc3339(rfc3339)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).timestamp())
    }

    /// Escape a value for embedding in a Drive query string
    fn escape_query_value(value: &str) -> String {
        value.replace('\\', "\\\\").replace('\'', "\\'")
    }

    /// Convert DriveFile to RemoteEntry
    fn convert_entry(file: DriveFile) -> Result<RemoteEntry> {
        let modified_at = Self::parse_timestamp(&file.modified_time).ok_or_else(|| {
            GoogleDriveError::ParseError(format!(
                "invalid modifiedTime for {}: {}",
                file.id, file.modified_time
            ))
        })?;

        let kind = if file.mime_type == FOLDER_MIME {
            RemoteEntryKind::Folder
        } else if file.mime_type.starts_with(NATIVE_MIME_PREFIX) {
            RemoteEntryKind::NativeDocument
        } else {
            RemoteEntryKind::File
        };

        Ok(RemoteEntry {
            id: file.id,
            name: file.name,
            kind,
            modified_at,
            parent_ids: file.parents,
        })
    }

    /// Execute an API request with retry logic
    ///
    /// Retries rate limiting (429) and server errors (5xx) with exponential
    /// backoff; other non-success statuses fail immediately.
    async fn execute_with_retry(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut attempt = 0;

        loop {
            match self.http_client.execute(request.clone()).await {
                Ok(response) => {
                    if response.is_success() {
                        return Ok(response);
                    }

                    if response.status == 429 || response.is_server_error() {
                        attempt += 1;
                        if attempt >= MAX_RETRIES {
                            warn!(
                                url = %request.url,
                                status = response.status,
                                "API request failed after {} attempts",
                                MAX_RETRIES
                            );
                            return Err(GoogleDriveError::ApiError {
                                status_code: response.status,
                                message: format!("request failed after {} retries", MAX_RETRIES),
                            }
                            .into());
                        }

                        let backoff_ms = 100u64 * 2u64.pow(attempt);
                        warn!(
                            url = %request.url,
                            status = response.status,
                            attempt = attempt,
                            "API request failed, retrying in {}ms",
                            backoff_ms
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    } else {
                        return Err(GoogleDriveError::ApiError {
                            status_code: response.status,
                            message: String::from_utf8_lossy(&response.body).to_string(),
                        }
                        .into());
                    }
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= MAX_RETRIES {
                        warn!(url = %request.url, "API request failed after {} attempts: {}", MAX_RETRIES, e);
                        return Err(e);
                    }

                    let backoff_ms = 100u64 * 2u64.pow(attempt);
                    warn!(
                        url = %request.url,
                        attempt = attempt,
                        "API request failed ({}), retrying in {}ms",
                        e,
                        backoff_ms
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }

    /// Build the multipart/related body for a metadata + media upload
    fn multipart_body(metadata: &serde_json::Value, content: &Bytes) -> Bytes {
        let mut body = Vec::with_capacity(content.len() + 256);
        body.extend_from_slice(format!("--{}\r\n", UPLOAD_BOUNDARY).as_bytes());
        body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.extend_from_slice(metadata.to_string().as_bytes());
        body.extend_from_slice(format!("\r\n--{}\r\n", UPLOAD_BOUNDARY).as_bytes());
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", UPLOAD_BOUNDARY).as_bytes());
        Bytes::from(body)
    }
}

#[async_trait]
impl RemoteStore for GoogleDriveConnector {
    #[instrument(skip(self), fields(container_id = %container_id))]
    async fn list_children(
        &self,
        container_id: &str,
        cursor: Option<String>,
    ) -> Result<ChildPage> {
        let query = format!(
            "'{}' in parents and trashed=false",
            Self::escape_query_value(container_id)
        );

        let mut url = format!(
            "{}/files?q={}&pageSize={}&fields=nextPageToken,files({})",
            DRIVE_API_BASE,
            urlencoding::encode(&query),
            MAX_PAGE_SIZE,
            FILE_FIELDS
        );

        if let Some(page_token) = cursor {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(&page_token)));
        }

        let request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(self.bearer().await?)
            .timeout(Duration::from_secs(30));

        let response = self.execute_with_retry(request).await?;

        let list: FilesListResponse = serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse files list response: {}", e))
        })?;

        let entries = list
            .files
            .into_iter()
            .filter(|f| !f.trashed)
            .map(Self::convert_entry)
            .collect::<Result<Vec<_>>>()?;

        debug!(count = entries.len(), "Listed container children");

        Ok(ChildPage {
            entries,
            next_cursor: list.next_page_token,
        })
    }

    #[instrument(skip(self), fields(file_id = %id))]
    async fn download(&self, id: &str) -> Result<Bytes> {
        let url = format!("{}/files/{}?alt=media", DRIVE_API_BASE, id);

        let request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(self.bearer().await?)
            .timeout(Duration::from_secs(120));

        let response = self.execute_with_retry(request).await?;

        info!(bytes = response.body.len(), "Downloaded file content");
        Ok(response.body)
    }

    #[instrument(skip(self, content), fields(name = %name, parent_id = %parent_id))]
    async fn upload(
        &self,
        name: &str,
        parent_id: &str,
        content: Bytes,
    ) -> Result<UploadedObject> {
        let url = format!(
            "{}/files?uploadType=multipart&fields=id,modifiedTime",
            DRIVE_UPLOAD_BASE
        );

        let metadata = serde_json::json!({
            "name": name,
            "parents": [parent_id],
        });

        let request = HttpRequest::new(HttpMethod::Post, url)
            .bearer_token(self.bearer().await?)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", UPLOAD_BOUNDARY),
            )
            .body(Self::multipart_body(&metadata, &content))
            .timeout(Duration::from_secs(120));

        let response = self.execute_with_retry(request).await?;

        let uploaded: UploadResponse = serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse upload response: {}", e))
        })?;

        let modified_at = Self::parse_timestamp(&uploaded.modified_time).ok_or_else(|| {
            GoogleDriveError::ParseError(format!(
                "invalid modifiedTime in upload response: {}",
                uploaded.modified_time
            ))
        })?;

        info!(id = %uploaded.id, "Created remote object");

        Ok(UploadedObject {
            id: uploaded.id,
            modified_at,
        })
    }

    #[instrument(skip(self, content), fields(file_id = %id))]
    async fn update(&self, id: &str, content: Bytes) -> Result<UpdatedObject> {
        let url = format!(
            "{}/files/{}?uploadType=media&fields=modifiedTime",
            DRIVE_UPLOAD_BASE, id
        );

        let request = HttpRequest::new(HttpMethod::Patch, url)
            .bearer_token(self.bearer().await?)
            .header("Content-Type", "application/octet-stream")
            .body(content)
            .timeout(Duration::from_secs(120));

        let response = self.execute_with_retry(request).await?;

        let updated: UpdateResponse = serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse update response: {}", e))
        })?;

        let modified_at = Self::parse_timestamp(&updated.modified_time).ok_or_else(|| {
            GoogleDriveError::ParseError(format!(
                "invalid modifiedTime in update response: {}",
                updated.modified_time
            ))
        })?;

        info!("Updated remote object content");

        Ok(UpdatedObject { modified_at })
    }

    #[instrument(skip(self), fields(name = %name, parent_id = %parent_id))]
    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String> {
        let url = format!("{}/files?fields=id", DRIVE_API_BASE);

        let metadata = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME,
            "parents": [parent_id],
        });

        let request = HttpRequest::new(HttpMethod::Post, url)
            .bearer_token(self.bearer().await?)
            .json(&metadata)?
            .timeout(Duration::from_secs(30));

        let response = self.execute_with_retry(request).await?;

        let created: CreatedFolderResponse = serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse folder response: {}", e))
        })?;

        info!(id = %created.id, "Created remote folder");
        Ok(created.id)
    }

    #[instrument(skip(self), fields(name = %name, parent_id = %parent_id))]
    async fn find_folder(&self, name: &str, parent_id: &str) -> Result<Option<String>> {
        let query = format!(
            "name='{}' and '{}' in parents and mimeType='{}' and trashed=false",
            Self::escape_query_value(name),
            Self::escape_query_value(parent_id),
            FOLDER_MIME
        );

        let url = format!(
            "{}/files?q={}&pageSize=1&fields=files(id)",
            DRIVE_API_BASE,
            urlencoding::encode(&query)
        );

        let request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(self.bearer().await?)
            .timeout(Duration::from_secs(30));

        let response = self.execute_with_retry(request).await?;

        #[derive(serde::Deserialize)]
        struct IdOnly {
            id: String,
        }
        #[derive(serde::Deserialize)]
        struct IdListing {
            #[serde(default)]
            files: Vec<IdOnly>,
        }

        let listing: IdListing = serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse folder query: {}", e))
        })?;

        let found = listing.files.into_iter().next().map(|f| f.id);
        debug!(found = found.is_some(), "Looked up folder by name");
        Ok(found)
    }

    #[instrument(skip(self), fields(file_id = %id))]
    async fn delete(&self, id: &str) -> Result<()> {
        let url = format!("{}/files/{}", DRIVE_API_BASE, id);

        let request = HttpRequest::new(HttpMethod::Delete, url)
            .bearer_token(self.bearer().await?)
            .timeout(Duration::from_secs(30));

        match self.execute_with_retry(request).await {
            Ok(_) => {
                info!("Deleted remote object");
                Ok(())
            }
            // Already absent counts as success.
            Err(e) if e.is_not_found() => {
                debug!("Remote object already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    struct StaticTokens;

    #[async_trait]
    impl TokenProvider for StaticTokens {
        async fn access_token(&self) -> core_auth::Result<String> {
            Ok("test-token".to_string())
        }
    }

    fn make_connector(mock_http: MockHttpClient) -> GoogleDriveConnector {
        GoogleDriveConnector::new(Arc::new(mock_http), Arc::new(StaticTokens))
    }

    fn ok_response(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_convert_entry_kinds() {
        let file = DriveFile {
            id: "f1".to_string(),
            name: "notes.txt".to_string(),
            mime_type: "text/plain".to_string(),
            modified_time: "2024-01-02T00:00:00.000Z".to_string(),
            parents: vec!["p1".to_string()],
            trashed: false,
        };
        let entry = GoogleDriveConnector::convert_entry(file.clone()).unwrap();
        assert_eq!(entry.kind, RemoteEntryKind::File);
        assert_eq!(entry.modified_at, 1704153600);

        let folder = DriveFile {
            mime_type: FOLDER_MIME.to_string(),
            ..file.clone()
        };
        assert_eq!(
            GoogleDriveConnector::convert_entry(folder).unwrap().kind,
            RemoteEntryKind::Folder
        );

        let native = DriveFile {
            mime_type: "application/vnd.google-apps.document".to_string(),
            ..file
        };
        assert_eq!(
            GoogleDriveConnector::convert_entry(native).unwrap().kind,
            RemoteEntryKind::NativeDocument
        );
    }

    #[test]
    fn test_query_value_escaping() {
        assert_eq!(
            GoogleDriveConnector::escape_query_value("it's a folder"),
            "it\\'s a folder"
        );
    }

    #[tokio::test]
    async fn test_list_children_success() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.contains("in+parents") || req.url.contains("in%20parents"));
            assert!(req.headers.contains_key("Authorization"));
            Ok(ok_response(
                r#"{
                    "files": [
                        {
                            "id": "file1",
                            "name": "doc.txt",
                            "mimeType": "text/plain",
                            "modifiedTime": "2024-01-01T00:00:00.000Z"
                        },
                        {
                            "id": "folder1",
                            "name": "sub",
                            "mimeType": "application/vnd.google-apps.folder",
                            "modifiedTime": "2024-01-01T00:00:00.000Z"
                        }
                    ],
                    "nextPageToken": "next_page"
                }"#,
            ))
        });

        let connector = make_connector(mock_http);
        let page = connector.list_children("root", None).await.unwrap();

        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[0].id, "file1");
        assert_eq!(page.entries[0].kind, RemoteEntryKind::File);
        assert_eq!(page.entries[1].kind, RemoteEntryKind::Folder);
        assert_eq!(page.next_cursor, Some("next_page".to_string()));
    }

    #[tokio::test]
    async fn test_download_success() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.contains("alt=media"));
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::from(vec![1, 2, 3, 4, 5]),
            })
        });

        let connector = make_connector(mock_http);
        let data = connector.download("file1").await.unwrap();
        assert_eq!(&data[..], &[1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_upload_builds_multipart_and_parses_identity() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.contains("uploadType=multipart"));
            let content_type = req.headers.get("Content-Type").unwrap();
            assert!(content_type.starts_with("multipart/related"));

            let body = req.body.unwrap();
            let text = String::from_utf8_lossy(&body);
            assert!(text.contains(r#""name":"new.txt""#));
            assert!(text.contains(r#""parents":["parent1"]"#));
            assert!(text.contains("payload"));

            Ok(ok_response(
                r#"{"id": "created1", "modifiedTime": "2024-02-01T00:00:00.000Z"}"#,
            ))
        });

        let connector = make_connector(mock_http);
        let uploaded = connector
            .upload("new.txt", "parent1", Bytes::from("payload"))
            .await
            .unwrap();

        assert_eq!(uploaded.id, "created1");
        assert_eq!(
            uploaded.modified_at,
            GoogleDriveConnector::parse_timestamp("2024-02-01T00:00:00.000Z").unwrap()
        );
    }

    #[tokio::test]
    async fn test_update_uses_media_upload() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Patch);
            assert!(req.url.contains("uploadType=media"));
            Ok(ok_response(r#"{"modifiedTime": "2024-02-02T00:00:00.000Z"}"#))
        });

        let connector = make_connector(mock_http);
        let updated = connector
            .update("file1", Bytes::from("new content"))
            .await
            .unwrap();

        assert_eq!(
            updated.modified_at,
            GoogleDriveConnector::parse_timestamp("2024-02-02T00:00:00.000Z").unwrap()
        );
    }

    #[tokio::test]
    async fn test_find_folder_found_and_absent() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.contains("mimeType"));
            Ok(ok_response(r#"{"files": [{"id": "folder9"}]}"#))
        });
        let connector = make_connector(mock_http);
        assert_eq!(
            connector.find_folder("docs", "root").await.unwrap(),
            Some("folder9".to_string())
        );

        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(ok_response(r#"{"files": []}"#)));
        let connector = make_connector(mock_http);
        assert_eq!(connector.find_folder("docs", "root").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_folder_returns_id() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Post);
            let body = req.body.unwrap();
            let text = String::from_utf8_lossy(&body);
            assert!(text.contains(FOLDER_MIME));
            Ok(ok_response(r#"{"id": "newfolder"}"#))
        });

        let connector = make_connector(mock_http);
        let id = connector.create_folder("docs", "root").await.unwrap();
        assert_eq!(id, "newfolder");
    }

    #[tokio::test]
    async fn test_delete_treats_not_found_as_success() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 404,
                headers: HashMap::new(),
                body: Bytes::from("not found"),
            })
        });

        let connector = make_connector(mock_http);
        assert!(connector.delete("missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_then_surfaced() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(MAX_RETRIES as usize)
            .returning(|_| {
                Ok(HttpResponse {
                    status: 503,
                    headers: HashMap::new(),
                    body: Bytes::from("unavailable"),
                })
            });

        let connector = make_connector(mock_http);
        let err = connector.download("file1").await.unwrap_err();
        assert!(matches!(err, BridgeError::Http { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_client_errors_fail_without_retry() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 403,
                headers: HashMap::new(),
                body: Bytes::from("forbidden"),
            })
        });

        let connector = make_connector(mock_http);
        let err = connector.download("file1").await.unwrap_err();
        assert!(matches!(err, BridgeError::Http { status: 403, .. }));
    }
}
