use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::api::patch::{assign, deserialize_some};

pub const DEFAULT_BATCH_STATUS: &str = "planned";

fn default_status() -> String {
    DEFAULT_BATCH_STATUS.to_string()
}

/// A flock raised for one contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Batch {
    pub id: i64,
    pub contract_id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBatch {
    pub contract_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_status")]
    #[validate(length(min = 1, max = 20))]
    pub status: String,
    pub notes: Option<String>,
}

/// Partial update; a batch never moves to another contract
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BatchPatch {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub end_date: Option<Option<NaiveDate>>,
    #[validate(length(min = 1, max = 20))]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl BatchPatch {
    pub fn apply_to(self, batch: &mut Batch) {
        assign(&mut batch.name, self.name);
        assign(&mut batch.start_date, self.start_date);
        assign(&mut batch.end_date, self.end_date);
        assign(&mut batch.status, self.status);
        assign(&mut batch.notes, self.notes);
    }
}
