//! Controller for the admin user-management page.

use std::future::Future;

use tracing::debug;

use parcelflow_client::api::users::UserListFilter;
use parcelflow_client::{ApiClient, QueryData};
use parcelflow_core::{Role, User};

use crate::pagination::Pager;
use crate::view::ViewState;

use super::{sort_param, LoadOutcome, SortOrder};

pub struct UserListController {
    client: ApiClient,
    search: String,
    role: Option<Role>,
    sort_by: String,
    sort_order: SortOrder,
    pager: Pager,
    generation: u64,
    state: ViewState<Vec<User>>,
}

impl UserListController {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            search: String::new(),
            role: None,
            sort_by: "createdAt".to_string(),
            sort_order: SortOrder::Desc,
            pager: Pager::new(10),
            generation: 0,
            state: ViewState::Loading,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ViewState<Vec<User>> {
        &self.state
    }

    #[must_use]
    pub const fn pager(&self) -> &Pager {
        &self.pager
    }

    #[must_use]
    pub fn filter(&self) -> UserListFilter {
        UserListFilter {
            page: Some(self.pager.page()),
            limit: Some(self.pager.page_size()),
            search: self.search.clone(),
            role: self.role,
            sort: sort_param(&self.sort_by, self.sort_order),
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.reset_to_first_page();
    }

    pub fn set_role(&mut self, role: Option<Role>) {
        self.role = role;
        self.reset_to_first_page();
    }

    pub fn set_sort(&mut self, field: impl Into<String>, order: SortOrder) {
        self.sort_by = field.into();
        self.sort_order = order;
        self.reset_to_first_page();
    }

    pub const fn set_page(&mut self, page: u32) {
        self.pager.set_page(page);
        self.generation += 1;
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.pager.set_page_size(page_size);
        self.generation += 1;
    }

    const fn reset_to_first_page(&mut self) {
        self.pager.set_page(1);
        self.generation += 1;
    }

    /// Start a load for the current criteria.
    pub fn begin_load(&mut self) -> impl Future<Output = LoadOutcome<QueryData<Vec<User>>>> + use<> {
        self.generation += 1;
        self.state = ViewState::Loading;

        let generation = self.generation;
        let client = self.client.clone();
        let filter = self.filter();
        async move {
            let result = client.list_users(&filter).await;
            LoadOutcome {
                generation,
                result: result.map_err(|e| e.to_string()),
            }
        }
    }

    /// Install a load outcome; superseded outcomes are discarded.
    pub fn apply(&mut self, outcome: LoadOutcome<QueryData<Vec<User>>>) -> bool {
        if outcome.generation != self.generation {
            debug!(
                got = outcome.generation,
                current = self.generation,
                "discarding superseded user list result"
            );
            return false;
        }

        match outcome.result {
            Ok(query) => {
                let total = query.count.unwrap_or(query.data.len() as u64);
                self.pager.set_total(total);
                self.state = ViewState::from_items(query.data);
            }
            Err(message) => self.state = ViewState::Error(message),
        }
        true
    }

    /// Toggle a user's active flag. The mutation invalidates `Tag::Users`,
    /// so the next [`Self::begin_load`] fetches fresh rows.
    ///
    /// # Errors
    ///
    /// Returns the backend's message when the update is rejected.
    pub async fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<User, String> {
        self.client
            .set_user_active(user_id, is_active)
            .await
            .map_err(|e| e.to_string())
    }

    /// Delete a user account.
    ///
    /// # Errors
    ///
    /// Returns the backend's message when the delete is rejected.
    pub async fn delete_user(&self, user_id: &str) -> Result<(), String> {
        self.client.delete_user(user_id).await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::json;

    use parcelflow_client::transport::{ApiRequest, ApiResponse, Transport, TransportError};
    use parcelflow_client::SessionStore;

    struct OneAgent;

    #[async_trait]
    impl Transport for OneAgent {
        async fn send(
            &self,
            _request: &ApiRequest,
            _bearer: Option<&SecretString>,
        ) -> Result<ApiResponse, TransportError> {
            Ok(ApiResponse {
                status: 200,
                body: json!({
                    "success": true,
                    "data": [{
                        "_id": "a1",
                        "name": "Sam Agent",
                        "email": "sam@parcelflow.test",
                        "role": "agent",
                        "isActive": true,
                        "createdAt": "2024-05-01T09:00:00Z"
                    }],
                    "count": 1
                }),
            })
        }
    }

    fn controller() -> UserListController {
        let client = ApiClient::new(Arc::new(OneAgent), SessionStore::new(None));
        UserListController::new(client)
    }

    #[test]
    fn test_role_filter_resets_page() {
        let mut c = controller();
        c.pager.set_total(50);
        c.set_page(3);
        c.set_role(Some(Role::Agent));
        assert_eq!(c.filter().page, Some(1));
        assert_eq!(c.filter().role, Some(Role::Agent));
    }

    #[tokio::test]
    async fn test_load_populates_users() {
        let mut c = controller();
        let outcome = c.begin_load().await;
        assert!(c.apply(outcome));
        let users = c.state().populated().expect("populated");
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::Agent);
        assert_eq!(c.pager().total(), 1);
    }
}
