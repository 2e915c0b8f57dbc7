//! Controller for the parcel list pages (admin manage-parcels and the
//! customer's my-parcels view share it; only the scope differs).

use std::future::Future;

use tracing::debug;

use parcelflow_client::api::parcels::ParcelListFilter;
use parcelflow_client::{ApiClient, QueryData};
use parcelflow_core::{Parcel, ParcelStatus, PaymentStatus, ShippingService};

use crate::pagination::Pager;
use crate::view::ViewState;

use super::{sort_param, LoadOutcome, SortOrder};

/// Which backend route the list reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParcelScope {
    /// Every parcel (`/parcels`, admin only).
    All,
    /// The authenticated user's parcels (`/parcels/my-parcels`).
    Mine,
}

/// Presentation toggle; changing it never refetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Cards,
    Table,
}

pub struct ParcelListController {
    client: ApiClient,
    scope: ParcelScope,
    search: String,
    status: Option<ParcelStatus>,
    category: String,
    service: Option<ShippingService>,
    payment_status: Option<PaymentStatus>,
    sort_by: String,
    sort_order: SortOrder,
    view_mode: ViewMode,
    pager: Pager,
    generation: u64,
    state: ViewState<Vec<Parcel>>,
}

impl ParcelListController {
    #[must_use]
    pub fn new(client: ApiClient, scope: ParcelScope) -> Self {
        Self {
            client,
            scope,
            search: String::new(),
            status: None,
            category: String::new(),
            service: None,
            payment_status: None,
            sort_by: "createdAt".to_string(),
            sort_order: SortOrder::Desc,
            view_mode: ViewMode::default(),
            pager: Pager::new(10),
            generation: 0,
            state: ViewState::Loading,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ViewState<Vec<Parcel>> {
        &self.state
    }

    #[must_use]
    pub const fn pager(&self) -> &Pager {
        &self.pager
    }

    #[must_use]
    pub const fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// The filter the next load will send.
    #[must_use]
    pub fn filter(&self) -> ParcelListFilter {
        ParcelListFilter {
            page: self.pager.page(),
            limit: self.pager.page_size(),
            search: self.search.clone(),
            status: self.status,
            category: self.category.clone(),
            service: self.service,
            payment_status: self.payment_status,
            sort: sort_param(&self.sort_by, self.sort_order),
        }
    }

    // Every criteria change returns to page 1 and supersedes any in-flight
    // load; a page change supersedes without resetting.

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.reset_to_first_page();
    }

    pub fn set_status(&mut self, status: Option<ParcelStatus>) {
        self.status = status;
        self.reset_to_first_page();
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
        self.reset_to_first_page();
    }

    pub fn set_service(&mut self, service: Option<ShippingService>) {
        self.service = service;
        self.reset_to_first_page();
    }

    pub fn set_payment_status(&mut self, payment_status: Option<PaymentStatus>) {
        self.payment_status = payment_status;
        self.reset_to_first_page();
    }

    pub fn set_sort(&mut self, field: impl Into<String>, order: SortOrder) {
        self.sort_by = field.into();
        self.sort_order = order;
        self.reset_to_first_page();
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.pager.set_page_size(page_size);
        self.generation += 1;
    }

    /// Navigate to a page; out-of-range values clamp.
    pub const fn set_page(&mut self, page: u32) {
        self.pager.set_page(page);
        self.generation += 1;
    }

    /// Toggle card/table presentation. No refetch, no page reset.
    pub const fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    const fn reset_to_first_page(&mut self) {
        self.pager.set_page(1);
        self.generation += 1;
    }

    /// Start a load for the current criteria.
    ///
    /// The returned future owns everything it needs; drive it wherever is
    /// convenient and hand the outcome back to [`Self::apply`].
    pub fn begin_load(
        &mut self,
    ) -> impl Future<Output = LoadOutcome<QueryData<Vec<Parcel>>>> + use<> {
        self.generation += 1;
        self.state = ViewState::Loading;

        let generation = self.generation;
        let client = self.client.clone();
        let scope = self.scope;
        let filter = self.filter();
        async move {
            let result = match scope {
                ParcelScope::All => client.list_parcels(&filter).await,
                ParcelScope::Mine => client.my_parcels(&filter).await,
            };
            LoadOutcome {
                generation,
                result: result.map_err(|e| e.to_string()),
            }
        }
    }

    /// Install a load outcome. Returns `false` (and changes nothing) when
    /// the outcome was superseded by a newer criteria change.
    pub fn apply(&mut self, outcome: LoadOutcome<QueryData<Vec<Parcel>>>) -> bool {
        if outcome.generation != self.generation {
            debug!(
                got = outcome.generation,
                current = self.generation,
                "discarding superseded parcel list result"
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::{json, Value};

    use parcelflow_client::transport::{ApiRequest, ApiResponse, Transport, TransportError};
    use parcelflow_client::SessionStore;

    struct EmptyOk;

    #[async_trait]
    impl Transport for EmptyOk {
        async fn send(
            &self,
            _request: &ApiRequest,
            _bearer: Option<&SecretString>,
        ) -> Result<ApiResponse, TransportError> {
            Ok(ApiResponse {
                status: 200,
                body: json!({ "success": true, "data": Value::Array(vec![]), "count": 0 }),
            })
        }
    }

    fn controller() -> ParcelListController {
        let client = ApiClient::new(Arc::new(EmptyOk), SessionStore::new(None));
        ParcelListController::new(client, ParcelScope::All)
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut c = controller();
        c.pager.set_total(100);
        c.set_page(4);
        assert_eq!(c.filter().page, 4);

        c.set_search("jane");
        assert_eq!(c.filter().page, 1);
        assert_eq!(c.filter().search, "jane");
    }

    #[test]
    fn test_sort_feeds_query_contract() {
        let mut c = controller();
        c.set_sort("weight", SortOrder::Asc);
        assert_eq!(c.filter().sort, "weight");
        c.set_sort("createdAt", SortOrder::Desc);
        assert_eq!(c.filter().sort, "-createdAt");
    }

    #[test]
    fn test_view_mode_toggle_does_not_supersede() {
        let mut c = controller();
        let before = c.generation;
        c.set_view_mode(ViewMode::Table);
        assert_eq!(c.generation, before);
        assert_eq!(c.view_mode(), ViewMode::Table);
    }

    #[tokio::test]
    async fn test_superseded_outcome_is_discarded() {
        let mut c = controller();
        let load = c.begin_load();
        let outcome = load.await;

        // Criteria changed while the request was in flight.
        c.set_status(Some(ParcelStatus::Delivered));
        assert!(!c.apply(outcome));
        assert!(c.state().is_loading());
    }

    #[tokio::test]
    async fn test_current_outcome_populates_state() {
        let mut c = controller();
        let outcome = c.begin_load().await;
        assert!(c.apply(outcome));
        assert_eq!(*c.state(), ViewState::Empty);
        assert_eq!(c.pager().total(), 0);
    }
}
