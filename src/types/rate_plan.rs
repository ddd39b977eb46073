//! Rate plan lookup table entries

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rate plan identifier
pub type RatePlanId = String;

/// Named discount policy applied on top of a room type's base rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatePlan {
    pub id: RatePlanId,
    /// Code sent to the backend (e.g. "BAR", "CORP")
    pub code: String,
    pub name: String,
    /// Replaces the room type's base rate when present
    #[serde(default)]
    pub base_rate_override: Option<Decimal>,
    /// Discount in percent, 0-100
    #[serde(default)]
    pub discount_percentage: Decimal,
    pub active: bool,
}

impl RatePlan {
    /// Create an active plan with no override
    pub fn new(id: &str, code: &str, discount_percentage: Decimal) -> Self {
        RatePlan {
            id: id.to_string(),
            code: code.to_string(),
            name: code.to_string(),
            base_rate_override: None,
            discount_percentage,
            active: true,
        }
    }
}
