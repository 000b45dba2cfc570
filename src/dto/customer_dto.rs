use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Address, CommunicationPreference, Customer, Vehicle};

// Request para crear un cliente
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    #[validate(
        length(min = 1, max = 100),
        custom = "crate::utils::validation::validate_not_empty"
    )]
    pub first_name: String,
    #[validate(
        length(min = 1, max = 100),
        custom = "crate::utils::validation::validate_not_empty"
    )]
    pub last_name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom = "crate::utils::validation::validate_phone")]
    pub phone: Option<String>,
    #[validate]
    pub address: Option<Address>,
    pub communication_preference: Option<CommunicationPreference>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

// Request para actualizar un cliente (sólo los campos presentes)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom = "crate::utils::validation::validate_phone")]
    pub phone: Option<String>,
    #[validate]
    pub address: Option<Address>,
    pub communication_preference: Option<CommunicationPreference>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

// Cliente con sus vehículos resueltos
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: Customer,
    pub vehicles: Vec<Vehicle>,
}
