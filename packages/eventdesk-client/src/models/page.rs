use serde::{Deserialize, Serialize};

/// DRF pagination envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

/// List endpoints answer either with an envelope or, when pagination is
/// disabled for the view, with a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Page(Paginated<T>),
    Plain(Vec<T>),
}

impl<T> From<ListResponse<T>> for Paginated<T> {
    fn from(list: ListResponse<T>) -> Self {
        match list {
            ListResponse::Page(page) => page,
            ListResponse::Plain(results) => Paginated {
                count: results.len() as u64,
                next: None,
                previous: None,
                results,
            },
        }
    }
}
