//! Controller for the create-parcel page.
//!
//! Validation gates the network: `submit` builds the payload only when every
//! field passes, so an invalid form can never issue a request. A successful
//! creation invalidates `Tag::Parcels` inside the client, which refetches
//! every subscribed parcel list.

use thiserror::Error;
use tracing::info;

use parcelflow_client::ApiClient;
use parcelflow_core::Parcel;

use crate::forms::{CreateParcelForm, FieldError};

/// Why a submission did not produce a parcel.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The form failed validation; nothing was sent.
    #[error("{} field(s) failed validation", .0.len())]
    Validation(Vec<FieldError>),

    /// The backend rejected the creation.
    #[error("{0}")]
    Api(String),
}

/// Submission lifecycle for the page's submit button and result banner.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
    Succeeded(Parcel),
    Failed(String),
}

pub struct CreateParcelController {
    client: ApiClient,
    pub form: CreateParcelForm,
    state: SubmitState,
}

impl CreateParcelController {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            form: CreateParcelForm::default(),
            state: SubmitState::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &SubmitState {
        &self.state
    }

    /// Validate the form and, only if it passes, create the parcel.
    ///
    /// # Errors
    ///
    /// `SubmitError::Validation` with per-field messages when the form is
    /// incomplete (no request is issued), `SubmitError::Api` when the
    /// backend rejects it.
    pub async fn submit(&mut self) -> Result<Parcel, SubmitError> {
        let payload = match self.form.validate() {
            Ok(payload) => payload,
            Err(errors) => {
                self.state = SubmitState::Failed(format!(
                    "{} field(s) need attention",
                    errors.len()
                ));
                return Err(SubmitError::Validation(errors));
            }
        };

        self.state = SubmitState::Submitting;
        match self.client.create_parcel(&payload).await {
            Ok(parcel) => {
                info!(tracking = %parcel.tracking_number, "parcel created");
                self.state = SubmitState::Succeeded(parcel.clone());
                Ok(parcel)
            }
            Err(e) => {
                let message = e.to_string();
                self.state = SubmitState::Failed(message.clone());
                Err(SubmitError::Api(message))
            }
        }
    }

    /// Clear the form for another submission.
    pub fn reset(&mut self) {
        self.form = CreateParcelForm::default();
        self.state = SubmitState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::json;

    use parcelflow_client::transport::{ApiRequest, ApiResponse, Transport, TransportError};
    use parcelflow_client::SessionStore;

    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for Counting {
        async fn send(
            &self,
            _request: &ApiRequest,
            _bearer: Option<&SecretString>,
        ) -> Result<ApiResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ApiResponse {
                status: 500,
                body: json!({ "success": false, "message": "should not be reached" }),
            })
        }
    }

    #[tokio::test]
    async fn test_invalid_form_never_touches_the_network() {
        let transport = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let client = ApiClient::new(transport.clone(), SessionStore::new(None));
        let mut controller = CreateParcelController::new(client);

        let err = controller.submit().await.expect_err("empty form");
        assert!(matches!(err, SubmitError::Validation(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert!(matches!(controller.state(), SubmitState::Failed(_)));
    }
}
