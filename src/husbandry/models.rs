//! Day-to-day records kept against a batch.
//!
//! Every record belongs to exactly one batch for its whole life, so none of
//! the patch types carry `batch_id`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::api::patch::{assign, deserialize_some};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RearingPlan {
    pub id: i64,
    pub batch_id: i64,
    pub scheduled_date: NaiveDate,
    pub activity: String,
    pub feed_amount: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewRearingPlan {
    pub batch_id: i64,
    pub scheduled_date: NaiveDate,
    #[validate(length(min = 1, max = 255))]
    pub activity: String,
    pub feed_amount: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RearingPlanPatch {
    pub scheduled_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 255))]
    pub activity: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub feed_amount: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl RearingPlanPatch {
    pub fn apply_to(self, plan: &mut RearingPlan) {
        assign(&mut plan.scheduled_date, self.scheduled_date);
        assign(&mut plan.activity, self.activity);
        assign(&mut plan.feed_amount, self.feed_amount);
        assign(&mut plan.notes, self.notes);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Feeding {
    pub id: i64,
    pub batch_id: i64,
    pub feed_type: String,
    pub quantity_kg: Decimal,
    pub fed_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewFeeding {
    pub batch_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub feed_type: String,
    pub quantity_kg: Decimal,
    /// Defaults to the time of insertion
    pub fed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct FeedingPatch {
    #[validate(length(min = 1, max = 100))]
    pub feed_type: Option<String>,
    pub quantity_kg: Option<Decimal>,
    pub fed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl FeedingPatch {
    pub fn apply_to(self, feeding: &mut Feeding) {
        assign(&mut feeding.feed_type, self.feed_type);
        assign(&mut feeding.quantity_kg, self.quantity_kg);
        assign(&mut feeding.fed_at, self.fed_at);
        assign(&mut feeding.notes, self.notes);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Medication {
    pub id: i64,
    pub batch_id: i64,
    pub medication_name: String,
    pub dosage: String,
    pub administered_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMedication {
    pub batch_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub medication_name: String,
    #[validate(length(min = 1, max = 50))]
    pub dosage: String,
    pub administered_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MedicationPatch {
    #[validate(length(min = 1, max = 100))]
    pub medication_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub dosage: Option<String>,
    pub administered_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl MedicationPatch {
    pub fn apply_to(self, medication: &mut Medication) {
        assign(&mut medication.medication_name, self.medication_name);
        assign(&mut medication.dosage, self.dosage);
        assign(&mut medication.administered_at, self.administered_at);
        assign(&mut medication.notes, self.notes);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Weighing {
    pub id: i64,
    pub batch_id: i64,
    pub weight_kg: Decimal,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewWeighing {
    pub batch_id: i64,
    pub weight_kg: Decimal,
    pub recorded_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct WeighingPatch {
    pub weight_kg: Option<Decimal>,
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl WeighingPatch {
    pub fn apply_to(self, weighing: &mut Weighing) {
        assign(&mut weighing.weight_kg, self.weight_kg);
        assign(&mut weighing.recorded_at, self.recorded_at);
        assign(&mut weighing.notes, self.notes);
    }
}
