//! Google Drive API response types
//!
//! Data structures for deserializing Google Drive API v3 responses.

use serde::Deserialize;

/// Google Drive API file resource
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID
    pub id: String,

    /// File name
    pub name: String,

    /// MIME type; `application/vnd.google-apps.folder` marks a container,
    /// other `application/vnd.google-apps.*` types are provider-native
    /// documents with no binary export
    pub mime_type: String,

    /// Modification time (RFC 3339)
    pub modified_time: String,

    /// Parent folder IDs
    #[serde(default)]
    pub parents: Vec<String>,

    /// Whether file is trashed
    #[serde(default)]
    pub trashed: bool,
}

/// Google Drive API files.list response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    /// List of files
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for next page
    pub next_page_token: Option<String>,
}

/// files.create response when only the ID is requested
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedFolderResponse {
    pub id: String,
}

/// Upload response carrying the new object's identity and server mtime
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: String,
    pub modified_time: String,
}

/// Media update response carrying the authoritative server mtime
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub modified_time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_drive_file() {
        let json = r#"{
            "id": "abc123",
            "name": "notes.txt",
            "mimeType": "text/plain",
            "modifiedTime": "2024-01-02T00:00:00.000Z",
            "parents": ["folder1"],
            "trashed": false
        }"#;

        let file: DriveFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.id, "abc123");
        assert_eq!(file.name, "notes.txt");
        assert_eq!(file.mime_type, "text/plain");
        assert_eq!(file.parents, vec!["folder1".to_string()]);
        assert!(!file.trashed);
    }

    #[test]
    fn test_deserialize_files_list_response() {
        let json = r#"{
            "files": [
                {
                    "id": "file1",
                    "name": "doc.txt",
                    "mimeType": "text/plain",
                    "modifiedTime": "2024-01-01T00:00:00.000Z"
                }
            ],
            "nextPageToken": "token123"
        }"#;

        let response: FilesListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.files.len(), 1);
        assert_eq!(response.next_page_token, Some("token123".to_string()));
    }

    #[test]
    fn test_deserialize_empty_listing() {
        let response: FilesListResponse = serde_json::from_str("{}").unwrap();
        assert!(response.files.is_empty());
        assert!(response.next_page_token.is_none());
    }
}
