//! Modelo de Customer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::Document;
use crate::database::Collection;

/// Canal preferido por el cliente para recibir avisos
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationPreference {
    #[default]
    Email,
    Sms,
    Both,
    None,
}

impl CommunicationPreference {
    pub fn wants_email(&self) -> bool {
        matches!(self, CommunicationPreference::Email | CommunicationPreference::Both)
    }

    pub fn wants_sms(&self) -> bool {
        matches!(self, CommunicationPreference::Sms | CommunicationPreference::Both)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[validate(length(max = 200))]
    pub street: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 50))]
    pub state: Option<String>,
    #[validate(custom = "crate::utils::validation::validate_postal_code")]
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    #[serde(default)]
    pub communication_preference: CommunicationPreference,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Document for Customer {
    const COLLECTION: Collection = Collection::Customers;
    const RESOURCE: &'static str = "Customer";

    fn id(&self) -> Uuid {
        self.id
    }
}
