use serde::Deserialize;
use tracing::debug;

use super::{fetch_count, fetch_page};
use crate::endpoints;
use crate::error::Result;
use crate::http::ApiClient;
use crate::models::{Paginated, ProfileUpdate, RegisterRequest, User, UserFilter, UserStatistics};
use crate::query::QueryParams;

/// User creation answers like registration, with the user nested next to
/// fresh tokens; older deployments answer with the bare user.
#[derive(Deserialize)]
#[serde(untagged)]
enum CreatedUser {
    Wrapped { user: User },
    Bare(User),
}

#[derive(Clone)]
pub struct UsersService {
    client: ApiClient,
}

impl UsersService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &UserFilter) -> Result<Paginated<User>> {
        let query = QueryParams::new()
            .push("role", filter.role.as_ref().map(|r| r.as_str().to_string()))
            .push("is_active", filter.is_active)
            .push("search", filter.search.clone())
            .push("ordering", filter.ordering.clone())
            .push("page", filter.page)
            .push("page_size", filter.page_size);
        fetch_page(&self.client, endpoints::USERS, query).await
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        self.client.get(&endpoints::detail(endpoints::USERS, id)).await
    }

    /// Create an account on behalf of someone else. The caller's own
    /// credentials are left untouched.
    pub async fn create(&self, data: &RegisterRequest) -> Result<User> {
        let created: CreatedUser = self.client.post(endpoints::USERS, data).await?;
        Ok(match created {
            CreatedUser::Wrapped { user } | CreatedUser::Bare(user) => user,
        })
    }

    pub async fn update(&self, id: i64, update: &ProfileUpdate) -> Result<User> {
        self.client
            .patch(&endpoints::detail(endpoints::USERS, id), update)
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&endpoints::detail(endpoints::USERS, id)).await
    }

    /// Counters for one user, fetched concurrently. Any failing count fails
    /// the whole call.
    pub async fn statistics(&self, user_id: i64) -> Result<UserStatistics> {
        let (owned_events, participations, uploaded_files, confirmed_participations) = tokio::try_join!(
            fetch_count(&self.client, endpoints::EVENTS, QueryParams::new().push("owner", user_id)),
            fetch_count(
                &self.client,
                endpoints::EVENT_PARTICIPANTS,
                QueryParams::new().push("user", user_id),
            ),
            fetch_count(
                &self.client,
                endpoints::FILES,
                QueryParams::new().push("uploaded_by", user_id),
            ),
            fetch_count(
                &self.client,
                endpoints::EVENT_PARTICIPANTS,
                QueryParams::new().push("user", user_id).push("is_confirmed", true),
            ),
        )?;

        debug!(user_id, owned_events, participations, uploaded_files, "Fetched user statistics");

        Ok(UserStatistics {
            owned_events,
            participations,
            confirmed_participations,
            uploaded_files,
        })
    }
}
