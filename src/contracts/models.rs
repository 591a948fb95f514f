use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    api::patch::{assign, deserialize_some},
    customers::models::Customer,
    error::AppError,
};

pub const DEFAULT_CONTRACT_STATUS: &str = "active";

fn default_status() -> String {
    DEFAULT_CONTRACT_STATUS.to_string()
}

fn non_negative_price(price: &Decimal) -> Result<(), validator::ValidationError> {
    if price.is_sign_negative() {
        return Err(validator::ValidationError::new("negative_price"));
    }
    Ok(())
}

/// A customer's subscription for a fixed number of eggs.
///
/// `remaining_eggs` and `hen_delivered` belong to the delivery ledger and are
/// never written through the contract endpoints after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Contract {
    pub id: i64,
    pub contract_code: String,
    pub customer_id: i64,
    pub package_name: String,
    pub hen_type: String,
    pub egg_type: String,
    pub total_eggs: i32,
    pub remaining_eggs: i32,
    pub price: Decimal,
    pub start_date: NaiveDate,
    pub status: String,
    pub hen_delivered: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contract as returned by the API, with its customer attached
#[derive(Debug, Clone, Serialize)]
pub struct ContractView {
    #[serde(flatten)]
    pub contract: Contract,
    pub customer: Option<Customer>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewContract {
    #[validate(length(min = 1, max = 36))]
    pub contract_code: String,
    pub customer_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub package_name: String,
    #[validate(length(min = 1, max = 50))]
    pub hen_type: String,
    #[validate(length(min = 1, max = 50))]
    pub egg_type: String,
    #[validate(range(min = 0))]
    pub total_eggs: i32,
    /// Opening balance, defaults to `total_eggs`
    #[validate(range(min = 0))]
    pub remaining_eggs: Option<i32>,
    #[validate(custom = "non_negative_price")]
    pub price: Decimal,
    pub start_date: NaiveDate,
    #[serde(default = "default_status")]
    #[validate(length(min = 1, max = 20))]
    pub status: String,
    #[serde(default)]
    pub hen_delivered: bool,
    pub description: Option<String>,
}

impl NewContract {
    /// Balance the contract opens with; an override may not exceed the total
    pub fn opening_balance(&self) -> Result<i32, AppError> {
        let remaining = self.remaining_eggs.unwrap_or(self.total_eggs);
        if remaining > self.total_eggs {
            return Err(AppError::InvalidInput(format!(
                "remaining_eggs ({}) cannot exceed total_eggs ({})",
                remaining, self.total_eggs
            )));
        }
        Ok(remaining)
    }
}

/// Descriptive fields only. Ledger fields are rejected as unknown.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ContractPatch {
    #[validate(length(min = 1, max = 100))]
    pub package_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub hen_type: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub egg_type: Option<String>,
    #[validate(custom = "non_negative_price")]
    pub price: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 20))]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
}

impl ContractPatch {
    pub fn apply_to(self, contract: &mut Contract) {
        assign(&mut contract.package_name, self.package_name);
        assign(&mut contract.hen_type, self.hen_type);
        assign(&mut contract.egg_type, self.egg_type);
        assign(&mut contract.price, self.price);
        assign(&mut contract.start_date, self.start_date);
        assign(&mut contract.status, self.status);
        assign(&mut contract.description, self.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_contract(json: &str) -> NewContract {
        serde_json::from_str(json).unwrap()
    }

    const BASE: &str = r#"{
        "contract_code": "CON-2024-001",
        "customer_id": 1,
        "package_name": "Free-range hen adoption",
        "hen_type": "grass hen",
        "egg_type": "free-range egg",
        "total_eggs": 200,
        "price": 466.0,
        "start_date": "2024-01-02"
    }"#;

    #[test]
    fn test_defaults_and_opening_balance() {
        let contract = new_contract(BASE);
        assert!(contract.validate().is_ok());
        assert_eq!(contract.status, "active");
        assert!(!contract.hen_delivered);
        assert_eq!(contract.price, dec!(466));
        assert_eq!(contract.opening_balance().unwrap(), 200);
    }

    #[test]
    fn test_opening_balance_override_is_bounded() {
        let mut contract = new_contract(BASE);
        contract.remaining_eggs = Some(170);
        assert_eq!(contract.opening_balance().unwrap(), 170);

        contract.remaining_eggs = Some(201);
        assert!(contract.opening_balance().is_err());

        contract.remaining_eggs = Some(-1);
        assert!(contract.validate().is_err());
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut contract = new_contract(BASE);
        contract.price = dec!(-1);
        assert!(contract.validate().is_err());
    }

    #[test]
    fn test_patch_cannot_touch_ledger_fields() {
        assert!(serde_json::from_str::<ContractPatch>(r#"{"remaining_eggs": 5}"#).is_err());
        assert!(serde_json::from_str::<ContractPatch>(r#"{"hen_delivered": true}"#).is_err());
        assert!(serde_json::from_str::<ContractPatch>(r#"{"total_eggs": 10}"#).is_err());

        let patch: ContractPatch =
            serde_json::from_str(r#"{"status": "paused", "description": null}"#).unwrap();
        assert_eq!(patch.status.as_deref(), Some("paused"));
        assert_eq!(patch.description, Some(None));
    }

    #[test]
    fn test_view_flattens_contract() {
        let now = Utc::now();
        let view = ContractView {
            contract: Contract {
                id: 3,
                contract_code: "CON-1".into(),
                customer_id: 1,
                package_name: "pkg".into(),
                hen_type: "hen".into(),
                egg_type: "egg".into(),
                total_eggs: 200,
                remaining_eggs: 170,
                price: dec!(466.00),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                status: "active".into(),
                hen_delivered: true,
                description: None,
                created_at: now,
                updated_at: now,
            },
            customer: None,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["remaining_eggs"], 170);
        assert_eq!(json["hen_delivered"], true);
        assert_eq!(json["price"], 466.0);
        assert!(json["customer"].is_null());
    }
}
