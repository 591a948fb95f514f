use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::api::patch::{assign, deserialize_some};

/// Customer entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub customer_code: String,
    pub name: String,
    pub phones: Vec<String>,
    pub recipient_name: String,
    pub address: String,
    pub area_code: Option<String>,
    pub first_purchase_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCustomer {
    #[validate(length(min = 1, max = 32))]
    pub customer_code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub phones: Vec<String>,
    #[validate(length(min = 1, max = 100))]
    pub recipient_name: String,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    #[validate(length(max = 10))]
    pub area_code: Option<String>,
    pub first_purchase_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Partial update; the customer code is fixed
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CustomerPatch {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub phones: Option<Vec<String>>,
    #[validate(length(min = 1, max = 100))]
    pub recipient_name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub area_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub first_purchase_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl CustomerPatch {
    pub fn apply_to(self, customer: &mut Customer) {
        assign(&mut customer.name, self.name);
        assign(&mut customer.phones, self.phones);
        assign(&mut customer.recipient_name, self.recipient_name);
        assign(&mut customer.address, self.address);
        assign(&mut customer.area_code, self.area_code);
        assign(&mut customer.first_purchase_date, self.first_purchase_date);
        assign(&mut customer.notes, self.notes);
    }

    /// `area_code` may be cleared but never longer than ten characters
    pub fn area_code_too_long(&self) -> bool {
        matches!(&self.area_code, Some(Some(code)) if code.chars().count() > 10)
    }
}
