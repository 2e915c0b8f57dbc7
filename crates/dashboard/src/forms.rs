//! Form state and validation.
//!
//! Validation runs entirely client-side and must pass before a payload is
//! built; a form with errors never reaches the transport. Field errors are
//! keyed by field path so views can render them inline.

use rust_decimal::Decimal;

use parcelflow_core::{Address, ParcelDetails, Dimensions, Recipient, Role, ShippingService};
use parcelflow_client::api::auth::{LoginPayload, RegisterPayload};
use parcelflow_client::api::parcels::{CreateParcelPayload, ShippingSelection};

/// One inline validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted field path (`recipient.address.zipCode`).
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn require_email(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
    if !(value.contains('@') && value.contains('.')) {
        errors.push(FieldError::new(field, "Invalid email address"));
    }
}

fn require_min(errors: &mut Vec<FieldError>, field: &'static str, value: &str, min: usize, what: &str) {
    if value.trim().len() < min {
        errors.push(FieldError::new(
            field,
            format!("{what} must be at least {min} characters"),
        ));
    }
}

fn parse_positive_decimal(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    what: &str,
) -> Decimal {
    match value.trim().parse::<Decimal>() {
        Ok(parsed) if parsed > Decimal::ZERO => parsed,
        Ok(_) => {
            errors.push(FieldError::new(field, format!("{what} must be positive")));
            Decimal::ZERO
        }
        Err(_) => {
            errors.push(FieldError::new(field, format!("{what} must be a number")));
            Decimal::ZERO
        }
    }
}

/// Login form: two text inputs.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Validate and build the request payload.
    ///
    /// # Errors
    ///
    /// Returns every failing field; the payload is only built when all pass.
    pub fn validate(&self) -> Result<LoginPayload, Vec<FieldError>> {
        let mut errors = Vec::new();
        require_email(&mut errors, "email", &self.email);
        require_min(&mut errors, "password", &self.password, 6, "Password");

        if errors.is_empty() {
            Ok(LoginPayload {
                email: self.email.trim().to_string(),
                password: self.password.clone(),
            })
        } else {
            Err(errors)
        }
    }
}

/// Address sub-form shared by registration and parcel creation.
#[derive(Debug, Clone, Default)]
pub struct AddressForm {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl AddressForm {
    fn validate(&self, prefix: AddressFieldNames, errors: &mut Vec<FieldError>) -> Address {
        require_min(errors, prefix.street, &self.street, 2, "Street");
        require_min(errors, prefix.city, &self.city, 2, "City");
        require_min(errors, prefix.state, &self.state, 2, "State");
        require_min(errors, prefix.zip_code, &self.zip_code, 2, "Zip code");
        require_min(errors, prefix.country, &self.country, 2, "Country");

        Address {
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zip_code: self.zip_code.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }
}

/// Static field paths for one address context.
struct AddressFieldNames {
    street: &'static str,
    city: &'static str,
    state: &'static str,
    zip_code: &'static str,
    country: &'static str,
}

const REGISTER_ADDRESS: AddressFieldNames = AddressFieldNames {
    street: "address.street",
    city: "address.city",
    state: "address.state",
    zip_code: "address.zipCode",
    country: "address.country",
};

const RECIPIENT_ADDRESS: AddressFieldNames = AddressFieldNames {
    street: "recipient.address.street",
    city: "recipient.address.city",
    state: "recipient.address.state",
    zip_code: "recipient.address.zipCode",
    country: "recipient.address.country",
};

/// Account registration form.
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: String,
    pub address: AddressForm,
}

impl RegisterForm {
    /// Validate and build the request payload. New accounts register as
    /// customers.
    ///
    /// # Errors
    ///
    /// Returns every failing field; the payload is only built when all pass.
    pub fn validate(&self) -> Result<RegisterPayload, Vec<FieldError>> {
        let mut errors = Vec::new();
        require_min(&mut errors, "name", &self.name, 2, "Name");
        require_email(&mut errors, "email", &self.email);
        require_min(&mut errors, "password", &self.password, 6, "Password");
        if self.password != self.confirm_password {
            errors.push(FieldError::new("confirmPassword", "Passwords do not match"));
        }
        require_min(&mut errors, "phone", &self.phone, 10, "Phone number");
        let address = self.address.validate(REGISTER_ADDRESS, &mut errors);

        if errors.is_empty() {
            Ok(RegisterPayload {
                name: self.name.trim().to_string(),
                email: self.email.trim().to_string(),
                password: self.password.clone(),
                phone: self.phone.trim().to_string(),
                address,
                role: Role::Customer,
            })
        } else {
            Err(errors)
        }
    }
}

/// Parcel creation form. Numeric inputs arrive as strings from text fields
/// and are parsed here.
#[derive(Debug, Clone, Default)]
pub struct CreateParcelForm {
    pub recipient_name: String,
    pub recipient_email: String,
    pub recipient_phone: String,
    pub recipient_address: AddressForm,
    pub weight: String,
    pub length: String,
    pub width: String,
    pub height: String,
    pub description: String,
    pub value: String,
    pub category: String,
    pub service: ShippingService,
}

impl CreateParcelForm {
    /// Validate and build the request payload.
    ///
    /// # Errors
    ///
    /// Returns every failing field; the payload is only built when all pass,
    /// so a form with errors can never issue a network request.
    pub fn validate(&self) -> Result<CreateParcelPayload, Vec<FieldError>> {
        let mut errors = Vec::new();

        require_min(&mut errors, "recipient.name", &self.recipient_name, 2, "Recipient name");
        require_email(&mut errors, "recipient.email", &self.recipient_email);
        require_min(&mut errors, "recipient.phone", &self.recipient_phone, 10, "Phone number");
        let address = self.recipient_address.validate(RECIPIENT_ADDRESS, &mut errors);

        let weight = parse_positive_decimal(&mut errors, "parcelDetails.weight", &self.weight, "Weight");
        let length = parse_positive_decimal(&mut errors, "parcelDetails.dimensions.length", &self.length, "Length");
        let width = parse_positive_decimal(&mut errors, "parcelDetails.dimensions.width", &self.width, "Width");
        let height = parse_positive_decimal(&mut errors, "parcelDetails.dimensions.height", &self.height, "Height");

        require_min(&mut errors, "parcelDetails.description", &self.description, 2, "Description");
        require_min(&mut errors, "parcelDetails.category", &self.category, 2, "Category");
        let value = parse_positive_decimal(&mut errors, "parcelDetails.value", &self.value, "Declared value");

        if errors.is_empty() {
            Ok(CreateParcelPayload {
                recipient: Recipient {
                    name: self.recipient_name.trim().to_string(),
                    email: self.recipient_email.trim().to_string(),
                    phone: self.recipient_phone.trim().to_string(),
                    address,
                },
                parcel_details: ParcelDetails {
                    weight,
                    dimensions: Dimensions {
                        length,
                        width,
                        height,
                    },
                    description: self.description.trim().to_string(),
                    value,
                    category: self.category.trim().to_string(),
                },
                shipping: ShippingSelection {
                    service: self.service,
                },
            })
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_parcel_form() -> CreateParcelForm {
        CreateParcelForm {
            recipient_name: "Jane Doe".to_string(),
            recipient_email: "jane@example.com".to_string(),
            recipient_phone: "+1-202-555-0101".to_string(),
            recipient_address: AddressForm {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                zip_code: "62701".to_string(),
                country: "US".to_string(),
            },
            weight: "2.5".to_string(),
            length: "30".to_string(),
            width: "20".to_string(),
            height: "10".to_string(),
            description: "Books".to_string(),
            value: "45.00".to_string(),
            category: "books".to_string(),
            service: ShippingService::Express,
        }
    }

    #[test]
    fn test_valid_parcel_form_builds_payload() {
        let payload = filled_parcel_form().validate().expect("valid form");
        assert_eq!(payload.recipient.name, "Jane Doe");
        assert_eq!(payload.parcel_details.weight, Decimal::new(25, 1));
        assert_eq!(payload.shipping.service, ShippingService::Express);
    }

    #[test]
    fn test_missing_weight_blocks_payload() {
        let mut form = filled_parcel_form();
        form.weight = String::new();
        let errors = form.validate().expect_err("must fail");
        assert!(errors.iter().any(|e| e.field == "parcelDetails.weight"));
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let mut form = filled_parcel_form();
        form.weight = "-1".to_string();
        let errors = form.validate().expect_err("must fail");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("positive"));
    }

    #[test]
    fn test_all_failures_reported_at_once() {
        let errors = CreateParcelForm::default().validate().expect_err("must fail");
        assert!(errors.len() > 5);
    }

    #[test]
    fn test_login_form_rules() {
        let form = LoginForm {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };
        let errors = form.validate().expect_err("must fail");
        assert_eq!(errors.len(), 2);

        let form = LoginForm {
            email: "jane@example.com".to_string(),
            password: "hunter22!".to_string(),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_register_password_mismatch() {
        let form = RegisterForm {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password: "hunter22!".to_string(),
            confirm_password: "different".to_string(),
            phone: "+1-202-555-0101".to_string(),
            address: AddressForm {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                zip_code: "62701".to_string(),
                country: "US".to_string(),
            },
        };
        let errors = form.validate().expect_err("must fail");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "confirmPassword");
    }
}
