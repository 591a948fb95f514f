use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    api::patch::{assign, deserialize_some},
    error::{AppError, AppResult},
};

pub const DEFAULT_SETTLEMENT_STATUS: &str = "pending";
pub const TRIAL_STATUS: &str = "trial";

fn default_status() -> String {
    DEFAULT_SETTLEMENT_STATUS.to_string()
}

/// Billing reconciliation record for a contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Settlement {
    pub id: i64,
    pub contract_id: i64,
    pub settlement_date: NaiveDate,
    pub eggs_delivered_total: i32,
    pub amount_due: Decimal,
    pub amount_paid: Decimal,
    pub status: String,
    pub is_trial: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored settlements are never trials; an `is_trial` field sent by a client
/// is ignored like any other unknown field
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSettlement {
    pub contract_id: i64,
    pub settlement_date: NaiveDate,
    #[validate(range(min = 0))]
    pub eggs_delivered_total: i32,
    pub amount_due: Decimal,
    pub amount_paid: Decimal,
    #[serde(default = "default_status")]
    #[validate(length(min = 1, max = 20))]
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SettlementPatch {
    pub settlement_date: Option<NaiveDate>,
    #[validate(range(min = 0))]
    pub eggs_delivered_total: Option<i32>,
    pub amount_due: Option<Decimal>,
    pub amount_paid: Option<Decimal>,
    #[validate(length(min = 1, max = 20))]
    pub status: Option<String>,
    pub is_trial: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl SettlementPatch {
    pub fn apply_to(self, settlement: &mut Settlement) {
        assign(&mut settlement.settlement_date, self.settlement_date);
        assign(&mut settlement.eggs_delivered_total, self.eggs_delivered_total);
        assign(&mut settlement.amount_due, self.amount_due);
        assign(&mut settlement.amount_paid, self.amount_paid);
        assign(&mut settlement.status, self.status);
        assign(&mut settlement.is_trial, self.is_trial);
        assign(&mut settlement.notes, self.notes);
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TrialRequest {
    pub contract_id: i64,
    /// Defaults to everything delivered on the contract so far
    #[validate(range(min = 0))]
    pub eggs_delivered: Option<i64>,
    /// Defaults to the contract price
    pub price_override: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSettlement {
    pub contract_id: i64,
    pub eggs_delivered_total: i64,
    pub amount_due: Decimal,
    pub amount_paid: Decimal,
    pub status: String,
    pub notes: Option<String>,
}

/// Pro-rata share of the contract price for `eggs` out of `total_eggs`,
/// rounded to cents. A zero-sized contract is treated as one egg.
///
/// `None` when the amount does not fit in a `Decimal`.
pub fn trial_amount_due(price: Decimal, eggs: i64, total_eggs: i32) -> Option<Decimal> {
    let total = Decimal::from(total_eggs.max(1));
    price
        .checked_mul(Decimal::from(eggs))?
        .checked_div(total)
        .map(|amount| amount.round_dp(2))
}

impl TrialSettlement {
    pub fn compute(
        request: TrialRequest,
        contract_price: Decimal,
        total_eggs: i32,
        delivered: i64,
    ) -> AppResult<Self> {
        let eggs = request.eggs_delivered.unwrap_or(delivered);
        let price = request.price_override.unwrap_or(contract_price);
        let amount_due = trial_amount_due(price, eggs, total_eggs).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "amount due for {} eggs at price {} is out of range",
                eggs, price
            ))
        })?;

        Ok(Self {
            contract_id: request.contract_id,
            eggs_delivered_total: eggs,
            amount_due,
            amount_paid: Decimal::ZERO,
            status: TRIAL_STATUS.to_string(),
            notes: request.notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn request(eggs: Option<i64>, price: Option<Decimal>) -> TrialRequest {
        TrialRequest {
            contract_id: 5,
            eggs_delivered: eggs,
            price_override: price,
            notes: Some("March".into()),
        }
    }

    #[test]
    fn test_trial_amount_is_pro_rata() {
        assert_eq!(trial_amount_due(dec!(466), 30, 200), Some(dec!(69.90)));
        assert_eq!(trial_amount_due(dec!(100), 1, 3), Some(dec!(33.33)));
        assert_eq!(trial_amount_due(dec!(466), 0, 200), Some(dec!(0)));
    }

    #[test]
    fn test_trial_amount_with_zero_total_uses_one() {
        assert_eq!(trial_amount_due(dec!(12.5), 4, 0), Some(dec!(50)));
    }

    #[test]
    fn test_trial_falls_back_to_delivered_and_contract_price() {
        let trial = TrialSettlement::compute(request(None, None), dec!(466), 200, 30).unwrap();
        assert_eq!(trial.eggs_delivered_total, 30);
        assert_eq!(trial.amount_due, dec!(69.90));
        assert_eq!(trial.amount_paid, Decimal::ZERO);
        assert_eq!(trial.status, "trial");
        assert_eq!(trial.notes.as_deref(), Some("March"));
    }

    #[test]
    fn test_trial_overrides_win() {
        let trial = TrialSettlement::compute(request(Some(50), Some(dec!(400))), dec!(466), 200, 30)
                .unwrap();
        assert_eq!(trial.eggs_delivered_total, 50);
        assert_eq!(trial.amount_due, dec!(100));
    }

    #[test]
    fn test_new_settlement_defaults() {
        let settlement: NewSettlement = serde_json::from_str(
            r#"{
                "contract_id": 5,
                "settlement_date": "2024-03-31",
                "eggs_delivered_total": 30,
                "amount_due": 69.9,
                "amount_paid": 0
            }"#,
        )
        .unwrap();
        assert_eq!(settlement.status, "pending");
        assert!(settlement.validate().is_ok());
    }

    #[test]
    fn test_new_settlement_ignores_client_trial_flag() {
        let settlement: NewSettlement = serde_json::from_str(
            r#"{
                "contract_id": 5,
                "settlement_date": "2024-03-31",
                "eggs_delivered_total": 30,
                "amount_due": 69.9,
                "amount_paid": 0,
                "is_trial": true
            }"#,
        )
        .unwrap();
        assert_eq!(settlement.eggs_delivered_total, 30);
    }

    #[test]
    fn test_trial_amount_overflow_is_an_error() {
        let request: TrialRequest = serde_json::from_str(
            r#"{"contract_id": 1, "eggs_delivered": 1000, "price_override": 7e28}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());

        let err = TrialSettlement::compute(request, Decimal::ONE, 200, 0).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(trial_amount_due(Decimal::MAX, 2, 1), None);
    }
}
