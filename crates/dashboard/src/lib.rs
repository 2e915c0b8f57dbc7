//! View-layer state for the Parcelflow dashboards.
//!
//! Everything a rendering front end needs short of pixels: route guards
//! evaluated against the live session, per-page controllers that own filter
//! and pagination state, form validation that runs before any network call,
//! and the four-way view state every list page renders from.
//!
//! Controllers never hold locks across awaits; a load is started with
//! `begin_load` (which returns an owned future) and finished with `apply`,
//! which discards superseded results by generation check.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod controllers;
pub mod forms;
pub mod guard;
pub mod pagination;
pub mod view;

pub use controllers::create_parcel::{CreateParcelController, SubmitError, SubmitState};
pub use controllers::parcel_list::{ParcelListController, ParcelScope, ViewMode};
pub use controllers::profile::ProfileController;
pub use controllers::user_list::UserListController;
pub use controllers::{LoadOutcome, SortOrder};
pub use forms::{AddressForm, CreateParcelForm, FieldError, LoginForm, RegisterForm};
pub use guard::{GuardDecision, RouteGuard, HOME_ROUTE, LOGIN_ROUTE};
pub use pagination::Pager;
pub use view::ViewState;
