use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::api::patch::{assign, deserialize_some};

/// Column width of the optional delivery details
pub const DETAIL_MAX_CHARS: usize = 100;

/// One egg hand-off against a contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Delivery {
    pub id: i64,
    pub contract_id: i64,
    pub batch_id: Option<i64>,
    pub delivered_at: DateTime<Utc>,
    pub eggs_delivered: i32,
    pub packaging: String,
    pub vegetables: Option<String>,
    pub kitchen_gift: Option<String>,
    pub delivered_by: Option<String>,
    pub hen_delivered: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewDelivery {
    pub contract_id: i64,
    pub batch_id: Option<i64>,
    /// Defaults to the time of the request
    pub delivered_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "must be a positive number of eggs"))]
    pub eggs_delivered: i32,
    #[validate(length(min = 1, max = 50))]
    pub packaging: String,
    #[validate(length(max = 100))]
    pub vegetables: Option<String>,
    #[validate(length(max = 100))]
    pub kitchen_gift: Option<String>,
    #[validate(length(max = 100))]
    pub delivered_by: Option<String>,
    #[serde(default)]
    pub hen_delivered: bool,
    pub notes: Option<String>,
}

/// Partial update; `contract_id` and `batch_id` are fixed once recorded
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DeliveryPatch {
    pub delivered_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "must be a positive number of eggs"))]
    pub eggs_delivered: Option<i32>,
    #[validate(length(min = 1, max = 50))]
    pub packaging: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub vegetables: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub kitchen_gift: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub delivered_by: Option<Option<String>>,
    pub hen_delivered: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl DeliveryPatch {
    /// Name of the first detail field set to a value wider than its column
    pub fn overlong_detail(&self) -> Option<&'static str> {
        [
            ("vegetables", &self.vegetables),
            ("kitchen_gift", &self.kitchen_gift),
            ("delivered_by", &self.delivered_by),
        ]
        .into_iter()
        .find_map(|(field, value)| match value {
            Some(Some(text)) if text.chars().count() > DETAIL_MAX_CHARS => Some(field),
            _ => None,
        })
    }

    /// Copy every provided field onto `delivery`; ledger bookkeeping is the caller's job
    pub fn apply_to(&self, delivery: &mut Delivery) {
        assign(&mut delivery.delivered_at, self.delivered_at);
        assign(&mut delivery.eggs_delivered, self.eggs_delivered);
        assign(&mut delivery.packaging, self.packaging.clone());
        assign(&mut delivery.vegetables, self.vegetables.clone());
        assign(&mut delivery.kitchen_gift, self.kitchen_gift.clone());
        assign(&mut delivery.delivered_by, self.delivered_by.clone());
        assign(&mut delivery.hen_delivered, self.hen_delivered);
        assign(&mut delivery.notes, self.notes.clone());
    }
}
