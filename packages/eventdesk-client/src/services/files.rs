use serde_json::json;
use tracing::debug;

use super::fetch_page;
use crate::endpoints::{self, detail, detail_action, keyed_action};
use crate::error::{ClientError, Result};
use crate::http::{ApiClient, ApiRequest, MultipartForm};
use crate::models::{
    ActionResponse, Event, EventFile, FileCategory, FileFilter, FileShareLink, FileUpdate, FileUpload,
    Paginated, ShareLinkRequest, StorageFile,
};
use crate::query::QueryParams;

#[derive(Clone)]
pub struct FilesService {
    client: ApiClient,
}

impl FilesService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &FileFilter) -> Result<Paginated<StorageFile>> {
        fetch_page(&self.client, endpoints::FILES, filter_query(filter, "search")).await
    }

    pub async fn get(&self, id: i64) -> Result<StorageFile> {
        self.client.get(&detail(endpoints::FILES, id)).await
    }

    /// Upload one file. The category is inferred from the extension when not
    /// given.
    pub async fn upload(&self, upload: &FileUpload) -> Result<StorageFile> {
        let category = upload
            .category
            .unwrap_or_else(|| FileCategory::from_file_name(&upload.file_name));
        let name = upload.name.clone().unwrap_or_else(|| upload.file_name.clone());

        let mut form = MultipartForm::new()
            .file("file", &upload.file_name, upload.mime_type.clone(), upload.bytes.clone())
            .text("name", name)
            .text("category", category.as_str())
            .text("description", upload.description.clone().unwrap_or_default())
            .text("is_public", upload.is_public.to_string());
        if let Some(event_id) = upload.event_id {
            form = form.text("event_id", event_id.to_string());
        }

        debug!(file = %upload.file_name, size = upload.bytes.len(), "Uploading file");
        self.client.upload(endpoints::FILES_UPLOAD, form).await
    }

    /// Upload several files sharing one category, description and visibility.
    /// Every file goes under the repeated `files` field.
    pub async fn upload_multiple(
        &self,
        files: &[FileUpload],
        category: Option<FileCategory>,
        description: Option<&str>,
        is_public: bool,
    ) -> Result<Vec<StorageFile>> {
        if files.is_empty() {
            return Err(ClientError::Config("no files to upload".into()));
        }

        let mut form = MultipartForm::new();
        for file in files {
            form = form.file("files", &file.file_name, file.mime_type.clone(), file.bytes.clone());
        }
        if let Some(category) = category {
            form = form.text("category", category.as_str());
        }
        form = form
            .text("description", description.unwrap_or_default())
            .text("is_public", is_public.to_string());

        self.client.upload(endpoints::FILES_UPLOAD_MULTIPLE, form).await
    }

    pub async fn update(&self, id: i64, update: &FileUpdate) -> Result<StorageFile> {
        self.client.patch(&detail(endpoints::FILES, id), update).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&detail(endpoints::FILES, id)).await
    }

    pub async fn search(&self, filter: &FileFilter) -> Result<Paginated<StorageFile>> {
        fetch_page(&self.client, endpoints::FILES_SEARCH, filter_query(filter, "query")).await
    }

    /// Attachments of an event, as embedded in the event detail.
    pub async fn event_files(&self, event_id: i64) -> Result<Vec<EventFile>> {
        let event: Event = self.client.get(&detail(endpoints::EVENTS, event_id)).await?;
        Ok(event.files)
    }

    pub async fn share_links(&self, id: i64) -> Result<Vec<FileShareLink>> {
        self.client
            .get(&detail_action(endpoints::FILES, id, "share_links"))
            .await
    }

    pub async fn create_share_link(&self, id: i64, request: &ShareLinkRequest) -> Result<FileShareLink> {
        self.client
            .post(&detail_action(endpoints::FILES, id, "create_share_link"), request)
            .await
    }

    pub async fn disable_share_link(&self, token: &str) -> Result<ActionResponse> {
        self.client
            .post(&keyed_action(endpoints::SHARE_LINKS, token, "disable"), &json!({}))
            .await
    }

    pub async fn enable_share_link(&self, token: &str) -> Result<ActionResponse> {
        self.client
            .post(&keyed_action(endpoints::SHARE_LINKS, token, "enable"), &json!({}))
            .await
    }

    /// Absolute URL of the download action.
    pub fn download_url(&self, id: i64) -> String {
        self.client
            .config()
            .url(&detail_action(endpoints::FILES, id, "download"))
    }

    /// Fetch the raw bytes. The server counts every call as a download.
    pub async fn download(&self, id: i64) -> Result<Vec<u8>> {
        let request = ApiRequest::post(detail_action(endpoints::FILES, id, "download"));
        let response = self.client.execute(&request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// List and search share every filter except the name of the text field.
fn filter_query(filter: &FileFilter, text_key: &str) -> QueryParams {
    QueryParams::new()
        .push(text_key, filter.query.clone())
        .push("category", filter.category.map(|c| c.as_str()))
        .push("is_public", filter.is_public)
        .push("uploaded_by", filter.uploaded_by)
        .push("page", filter.page)
        .push("page_size", filter.page_size)
}
