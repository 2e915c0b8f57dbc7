//! User-management and profile endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use parcelflow_core::{Address, Role, User};

use crate::client::{ApiClient, QueryData};
use crate::endpoint::{MutationEndpoint, QueryEndpoint, Tag, Verb};
use crate::error::Result;
use crate::query::QueryDescriptor;

use super::require_data;

/// Filter state for user lists. Everything is optional; the role filter
/// alone is enough for agent-picker dropdowns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserListFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: String,
    pub role: Option<Role>,
    /// Sort field, `-`-prefixed for descending.
    pub sort: String,
}

impl UserListFilter {
    /// Filter that selects every user with the given role.
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> QueryDescriptor {
        let mut query = QueryDescriptor::new();
        query.push_opt("page", self.page);
        query.push_opt("limit", self.limit);
        query.push("search", self.search.as_str());
        query.push_opt("role", self.role.map(|r| r.to_string()));
        query.push("sort", self.sort.as_str());
        query
    }
}

/// Profile fields a user may change about themselves. `None` fields are
/// omitted from the request body and left untouched by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateProfilePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// All users, admin view. `GET /users`.
pub struct ListUsers;

impl QueryEndpoint for ListUsers {
    type Args = UserListFilter;
    type Data = Vec<User>;
    const NAME: &'static str = "listUsers";
    const PROVIDES: &'static [Tag] = &[Tag::Users];

    fn path(args: &Self::Args) -> String {
        format!("/users{}", args.descriptor().to_query_string())
    }
}

/// The authenticated user's profile. `GET /user/me`.
pub struct GetMe;

impl QueryEndpoint for GetMe {
    type Args = ();
    type Data = User;
    const NAME: &'static str = "getMe";
    const PROVIDES: &'static [Tag] = &[Tag::CurrentUser];

    fn path(_: &Self::Args) -> String {
        "/user/me".to_string()
    }
}

/// `PUT /auth/profile`.
pub struct UpdateProfile;

impl MutationEndpoint for UpdateProfile {
    type Args = UpdateProfilePayload;
    type Data = User;
    const NAME: &'static str = "updateProfile";
    const VERB: Verb = Verb::Put;
    const INVALIDATES: &'static [Tag] = &[Tag::CurrentUser];

    fn path(_: &Self::Args) -> String {
        "/auth/profile".to_string()
    }

    fn body(args: &Self::Args) -> Option<Value> {
        serde_json::to_value(args).ok()
    }
}

#[derive(Debug, Clone)]
pub struct SetActiveArgs {
    pub user_id: String,
    pub is_active: bool,
}

/// Toggle a user's active flag. `PATCH /users/{id}/status`.
pub struct SetUserActive;

impl MutationEndpoint for SetUserActive {
    type Args = SetActiveArgs;
    type Data = User;
    const NAME: &'static str = "setUserActive";
    const VERB: Verb = Verb::Patch;
    const INVALIDATES: &'static [Tag] = &[Tag::Users];

    fn path(args: &Self::Args) -> String {
        format!("/users/{}/status", args.user_id)
    }

    fn body(args: &Self::Args) -> Option<Value> {
        Some(json!({ "isActive": args.is_active }))
    }
}

/// `DELETE /users/{id}`.
pub struct DeleteUser;

impl MutationEndpoint for DeleteUser {
    type Args = String;
    type Data = Value;
    const NAME: &'static str = "deleteUser";
    const VERB: Verb = Verb::Delete;
    const INVALIDATES: &'static [Tag] = &[Tag::Users];

    fn path(args: &Self::Args) -> String {
        format!("/users/{args}")
    }

    fn body(_: &Self::Args) -> Option<Value> {
        None
    }
}

impl ApiClient {
    /// All users matching the filter (admin view).
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_query`].
    pub async fn list_users(&self, filter: &UserListFilter) -> Result<QueryData<Vec<User>>> {
        self.run_query::<ListUsers>(filter).await
    }

    /// The authenticated user's profile, cached under `Tag::CurrentUser`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_query`].
    pub async fn current_user(&self) -> Result<User> {
        self.run_query::<GetMe>(&()).await.map(|q| q.data)
    }

    /// Update the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_mutation`].
    pub async fn update_profile(&self, payload: &UpdateProfilePayload) -> Result<User> {
        let envelope = self.run_mutation::<UpdateProfile>(payload).await?;
        require_data(envelope)
    }

    /// Activate or deactivate a user account.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_mutation`].
    pub async fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<User> {
        let args = SetActiveArgs {
            user_id: user_id.to_string(),
            is_active,
        };
        let envelope = self.run_mutation::<SetUserActive>(&args).await?;
        require_data(envelope)
    }

    /// Delete a user account.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_mutation`].
    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        self.run_mutation::<DeleteUser>(&user_id.to_string())
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_has_no_query_string() {
        assert_eq!(ListUsers::path(&UserListFilter::default()), "/users");
    }

    #[test]
    fn test_role_only_filter() {
        let filter = UserListFilter::for_role(Role::Agent);
        assert_eq!(ListUsers::path(&filter), "/users?role=agent");
    }

    #[test]
    fn test_paginated_user_list_path() {
        let filter = UserListFilter {
            page: Some(3),
            limit: Some(25),
            search: "doe".to_string(),
            ..Default::default()
        };
        assert_eq!(ListUsers::path(&filter), "/users?page=3&limit=25&search=doe");
    }

    #[test]
    fn test_profile_payload_omits_unset_fields() {
        let payload = UpdateProfilePayload {
            name: Some("Jane".to_string()),
            ..Default::default()
        };
        let body = UpdateProfile::body(&payload).expect("body");
        assert_eq!(body, json!({ "name": "Jane" }));
    }

    #[test]
    fn test_set_active_body() {
        let args = SetActiveArgs {
            user_id: "u7".to_string(),
            is_active: false,
        };
        assert_eq!(SetUserActive::path(&args), "/users/u7/status");
        assert_eq!(SetUserActive::body(&args), Some(json!({ "isActive": false })));
    }
}
