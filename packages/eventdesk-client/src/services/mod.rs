//! Thin per-resource wrappers around [`ApiClient`].

mod events;
mod files;
mod notifications;
mod poller;
mod users;

pub use events::EventsService;
pub use files::FilesService;
pub use notifications::NotificationsService;
pub use poller::{NotificationPoller, NotificationSnapshot, DEFAULT_POLL_INTERVAL};
pub use users::UsersService;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Result;
use crate::http::ApiClient;
use crate::models::{ListResponse, Paginated};
use crate::query::QueryParams;

/// GET a list endpoint, accepting either a DRF page or a bare array.
async fn fetch_page<T: DeserializeOwned>(
    client: &ApiClient,
    path: &str,
    query: QueryParams,
) -> Result<Paginated<T>> {
    let list: ListResponse<T> = client.get_with(path, query).await?;
    Ok(list.into())
}

/// Every item of a list endpoint, following `next` links until the last page.
async fn fetch_all<T: DeserializeOwned>(client: &ApiClient, path: &str) -> Result<Vec<T>> {
    let mut page: Paginated<T> = fetch_page(client, path, QueryParams::new()).await?;
    let mut items = std::mem::take(&mut page.results);

    // `next` is absolute and already carries the query string.
    while let Some(next) = page.next.take() {
        debug!(path, next = %next, "Fetching next page");
        page = fetch_page(client, &next, QueryParams::new()).await?;
        items.append(&mut page.results);
    }
    Ok(items)
}

/// Total row count of a filtered list, fetching a single item.
async fn fetch_count(client: &ApiClient, path: &str, query: QueryParams) -> Result<u64> {
    let page: Paginated<serde_json::Value> = fetch_page(client, path, query.push("page_size", 1)).await?;
    Ok(page.count)
}
