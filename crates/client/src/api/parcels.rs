//! Parcel endpoints: listing, detail, tracking, and the write operations
//! that invalidate them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use parcelflow_core::{Parcel, ParcelDetails, ParcelStatus, PaymentStatus, Recipient, ShippingService};

use crate::client::{ApiClient, QueryData};
use crate::endpoint::{MutationEndpoint, QueryEndpoint, Tag, Verb};
use crate::error::Result;
use crate::query::QueryDescriptor;

use super::require_data;

/// Backend-side filter, sort, and pagination state for parcel lists.
///
/// Unset filters (`None` or empty strings) are omitted from the query string
/// entirely; the backend only sees what the user actually chose.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelListFilter {
    pub page: u32,
    pub limit: u32,
    pub search: String,
    pub status: Option<ParcelStatus>,
    pub category: String,
    pub service: Option<ShippingService>,
    pub payment_status: Option<PaymentStatus>,
    /// Sort field, `-`-prefixed for descending (`-createdAt`).
    pub sort: String,
}

impl Default for ParcelListFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: String::new(),
            status: None,
            category: String::new(),
            service: None,
            payment_status: None,
            sort: "-createdAt".to_string(),
        }
    }
}

impl ParcelListFilter {
    #[must_use]
    pub fn descriptor(&self) -> QueryDescriptor {
        let mut query = QueryDescriptor::new();
        query.push("page", self.page);
        query.push("limit", self.limit);
        query.push("search", self.search.as_str());
        query.push_opt("status", self.status.map(|s| s.to_string()));
        query.push("category", self.category.as_str());
        query.push_opt("service", self.service.map(|s| s.to_string()));
        query.push_opt("paymentStatus", self.payment_status.map(|s| s.to_string()));
        query.push("sort", self.sort.as_str());
        query
    }
}

/// Shipping tier chosen at creation time; cost and ETA are priced by the
/// server, never sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ShippingSelection {
    pub service: ShippingService,
}

/// Request body for creating a parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParcelPayload {
    pub recipient: Recipient,
    pub parcel_details: ParcelDetails,
    pub shipping: ShippingSelection,
}

/// All parcels, admin view. `GET /parcels`.
pub struct ListParcels;

impl QueryEndpoint for ListParcels {
    type Args = ParcelListFilter;
    type Data = Vec<Parcel>;
    const NAME: &'static str = "listParcels";
    const PROVIDES: &'static [Tag] = &[Tag::Parcels];

    fn path(args: &Self::Args) -> String {
        format!("/parcels{}", args.descriptor().to_query_string())
    }
}

/// The authenticated customer's own parcels. `GET /parcels/my-parcels`.
pub struct MyParcels;

impl QueryEndpoint for MyParcels {
    type Args = ParcelListFilter;
    type Data = Vec<Parcel>;
    const NAME: &'static str = "myParcels";
    const PROVIDES: &'static [Tag] = &[Tag::Parcels];

    fn path(args: &Self::Args) -> String {
        format!("/parcels/my-parcels{}", args.descriptor().to_query_string())
    }
}

/// One parcel by id. `GET /parcels/{id}`.
pub struct GetParcel;

impl QueryEndpoint for GetParcel {
    type Args = String;
    type Data = Parcel;
    const NAME: &'static str = "getParcel";
    const PROVIDES: &'static [Tag] = &[Tag::Parcels];

    fn path(args: &Self::Args) -> String {
        format!("/parcels/{args}")
    }
}

/// Public tracking lookup by tracking number. `GET /parcels/track/{tn}`.
pub struct TrackParcel;

impl QueryEndpoint for TrackParcel {
    type Args = String;
    type Data = Parcel;
    const NAME: &'static str = "trackParcel";
    const PROVIDES: &'static [Tag] = &[Tag::Parcels];

    fn path(args: &Self::Args) -> String {
        format!("/parcels/track/{args}")
    }
}

/// `POST /parcels`.
pub struct CreateParcel;

impl MutationEndpoint for CreateParcel {
    type Args = CreateParcelPayload;
    type Data = Parcel;
    const NAME: &'static str = "createParcel";
    const VERB: Verb = Verb::Post;
    const INVALIDATES: &'static [Tag] = &[Tag::Parcels];

    fn path(_: &Self::Args) -> String {
        "/parcels".to_string()
    }

    fn body(args: &Self::Args) -> Option<Value> {
        serde_json::to_value(args).ok()
    }
}

#[derive(Debug, Clone)]
pub struct UpdateStatusArgs {
    pub parcel_id: String,
    pub status: ParcelStatus,
}

/// `PATCH /parcels/{id}/status`.
pub struct UpdateParcelStatus;

impl MutationEndpoint for UpdateParcelStatus {
    type Args = UpdateStatusArgs;
    type Data = Parcel;
    const NAME: &'static str = "updateParcelStatus";
    const VERB: Verb = Verb::Patch;
    const INVALIDATES: &'static [Tag] = &[Tag::Parcels];

    fn path(args: &Self::Args) -> String {
        format!("/parcels/{}/status", args.parcel_id)
    }

    fn body(args: &Self::Args) -> Option<Value> {
        Some(json!({ "status": args.status }))
    }
}

#[derive(Debug, Clone)]
pub struct AssignAgentArgs {
    pub parcel_id: String,
    pub agent_id: String,
}

/// `PATCH /parcels/{id}/assign-agent`.
pub struct AssignAgent;

impl MutationEndpoint for AssignAgent {
    type Args = AssignAgentArgs;
    type Data = Parcel;
    const NAME: &'static str = "assignAgent";
    const VERB: Verb = Verb::Patch;
    const INVALIDATES: &'static [Tag] = &[Tag::Parcels];

    fn path(args: &Self::Args) -> String {
        format!("/parcels/{}/assign-agent", args.parcel_id)
    }

    fn body(args: &Self::Args) -> Option<Value> {
        Some(json!({ "agentId": args.agent_id }))
    }
}

/// `DELETE /parcels/{id}`.
pub struct DeleteParcel;

impl MutationEndpoint for DeleteParcel {
    type Args = String;
    type Data = Value;
    const NAME: &'static str = "deleteParcel";
    const VERB: Verb = Verb::Delete;
    const INVALIDATES: &'static [Tag] = &[Tag::Parcels];

    fn path(args: &Self::Args) -> String {
        format!("/parcels/{args}")
    }

    fn body(_: &Self::Args) -> Option<Value> {
        None
    }
}

impl ApiClient {
    /// All parcels matching the filter (admin view).
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_query`].
    pub async fn list_parcels(&self, filter: &ParcelListFilter) -> Result<QueryData<Vec<Parcel>>> {
        self.run_query::<ListParcels>(filter).await
    }

    /// The current user's parcels matching the filter.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_query`].
    pub async fn my_parcels(&self, filter: &ParcelListFilter) -> Result<QueryData<Vec<Parcel>>> {
        self.run_query::<MyParcels>(filter).await
    }

    /// One parcel by id.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_query`].
    pub async fn get_parcel(&self, parcel_id: &str) -> Result<Parcel> {
        self.run_query::<GetParcel>(&parcel_id.to_string())
            .await
            .map(|q| q.data)
    }

    /// Track a parcel by its tracking number.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_query`].
    pub async fn track_parcel(&self, tracking_number: &str) -> Result<Parcel> {
        self.run_query::<TrackParcel>(&tracking_number.to_string())
            .await
            .map(|q| q.data)
    }

    /// Create a parcel; every parcel list refetches on success.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_mutation`].
    pub async fn create_parcel(&self, payload: &CreateParcelPayload) -> Result<Parcel> {
        let envelope = self.run_mutation::<CreateParcel>(payload).await?;
        require_data(envelope)
    }

    /// Move a parcel to a new lifecycle status.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_mutation`].
    pub async fn update_parcel_status(
        &self,
        parcel_id: &str,
        status: ParcelStatus,
    ) -> Result<Parcel> {
        let args = UpdateStatusArgs {
            parcel_id: parcel_id.to_string(),
            status,
        };
        let envelope = self.run_mutation::<UpdateParcelStatus>(&args).await?;
        require_data(envelope)
    }

    /// Assign a delivery agent to a parcel.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_mutation`].
    pub async fn assign_agent(&self, parcel_id: &str, agent_id: &str) -> Result<Parcel> {
        let args = AssignAgentArgs {
            parcel_id: parcel_id.to_string(),
            agent_id: agent_id.to_string(),
        };
        let envelope = self.run_mutation::<AssignAgent>(&args).await?;
        require_data(envelope)
    }

    /// Delete a parcel.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::run_mutation`].
    pub async fn delete_parcel(&self, parcel_id: &str) -> Result<()> {
        self.run_mutation::<DeleteParcel>(&parcel_id.to_string())
            .await
            .map(|_| ())
    }
}
