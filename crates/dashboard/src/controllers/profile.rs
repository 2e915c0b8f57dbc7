//! Controller for the profile page.

use std::future::Future;

use tracing::debug;

use parcelflow_client::api::users::UpdateProfilePayload;
use parcelflow_client::ApiClient;
use parcelflow_core::User;

use crate::view::ViewState;

use super::LoadOutcome;

pub struct ProfileController {
    client: ApiClient,
    generation: u64,
    state: ViewState<User>,
}

impl ProfileController {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            generation: 0,
            state: ViewState::Loading,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ViewState<User> {
        &self.state
    }

    /// Start loading the authenticated user's profile.
    pub fn begin_load(&mut self) -> impl Future<Output = LoadOutcome<User>> + use<> {
        self.generation += 1;
        self.state = ViewState::Loading;

        let generation = self.generation;
        let client = self.client.clone();
        async move {
            let result = client.current_user().await;
            LoadOutcome {
                generation,
                result: result.map_err(|e| e.to_string()),
            }
        }
    }

    /// Install a load outcome; superseded outcomes are discarded.
    pub fn apply(&mut self, outcome: LoadOutcome<User>) -> bool {
        if outcome.generation != self.generation {
            debug!("discarding superseded profile result");
            return false;
        }
        self.state = match outcome.result {
            Ok(user) => ViewState::Populated(user),
            Err(message) => ViewState::Error(message),
        };
        true
    }

    /// Save profile changes. The mutation invalidates `Tag::CurrentUser`,
    /// so subscribed profile views refresh themselves; this controller also
    /// installs the updated user directly.
    ///
    /// # Errors
    ///
    /// Returns the backend's message when the update is rejected.
    pub async fn save(&mut self, payload: &UpdateProfilePayload) -> Result<User, String> {
        match self.client.update_profile(payload).await {
            Ok(user) => {
                self.generation += 1;
                self.state = ViewState::Populated(user.clone());
                Ok(user)
            }
            Err(e) => Err(e.to_string()),
        }
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

    struct Me;

    #[async_trait]
    impl Transport for Me {
        async fn send(
            &self,
            request: &ApiRequest,
            _bearer: Option<&SecretString>,
        ) -> Result<ApiResponse, TransportError> {
            let name = if request.path == "/auth/profile" {
                "Jane Renamed"
            } else {
                "Jane"
            };
            Ok(ApiResponse {
                status: 200,
                body: json!({
                    "success": true,
                    "data": {
                        "_id": "u1",
                        "name": name,
                        "email": "jane@example.com",
                        "role": "customer",
                        "isActive": true,
                        "createdAt": "2024-05-01T09:00:00Z"
                    }
                }),
            })
        }
    }

    fn controller() -> ProfileController {
        let client = ApiClient::new(Arc::new(Me), SessionStore::new(None));
        ProfileController::new(client)
    }

    #[tokio::test]
    async fn test_load_then_save_updates_state() {
        let mut c = controller();
        let outcome = c.begin_load().await;
        assert!(c.apply(outcome));
        assert_eq!(c.state().populated().expect("user").name, "Jane");

        let payload = UpdateProfilePayload {
            name: Some("Jane Renamed".to_string()),
            ..Default::default()
        };
        let user = c.save(&payload).await.expect("save");
        assert_eq!(user.name, "Jane Renamed");
        assert_eq!(c.state().populated().expect("user").name, "Jane Renamed");
    }

    #[tokio::test]
    async fn test_stale_load_does_not_clobber_saved_profile() {
        let mut c = controller();
        let stale = c.begin_load();
        let stale_outcome = stale.await;

        let payload = UpdateProfilePayload {
            name: Some("Jane Renamed".to_string()),
            ..Default::default()
        };
        c.save(&payload).await.expect("save");

        assert!(!c.apply(stale_outcome));
        assert_eq!(c.state().populated().expect("user").name, "Jane Renamed");
    }
}
