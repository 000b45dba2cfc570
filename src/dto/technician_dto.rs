use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTechnicianRequest {
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
    #[serde(default)]
    pub specialties: Vec<String>,
    pub hourly_rate: Decimal,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTechnicianRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom = "crate::utils::validation::validate_phone")]
    pub phone: Option<String>,
    pub specialties: Option<Vec<String>>,
    pub hourly_rate: Option<Decimal>,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianQuery {
    pub q: Option<String>,
    pub active: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
