//! Merchant-side point issuance.

pub mod qr;

use serde::{Deserialize, Serialize};

pub use qr::{QrError, QrPayload, MERCHANT_TRANSACTION};

/// Per-merchant point rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchantSettings {
    pub merchant_id: String,
    /// Points earned per whole dollar spent
    pub points_per_dollar: u64,
    /// Points for a first visit
    pub welcome_bonus: u64,
    /// Points for a successful referral
    pub referral_bonus: u64,
    /// Minimum balance to redeem
    pub minimum_redemption: u64,
    /// Cap on points per transaction
    pub max_points_per_transaction: u64,
}

impl Default for MerchantSettings {
    fn default() -> Self {
        Self {
            merchant_id: "loyaltymax-demo".to_string(),
            points_per_dollar: 1,
            welcome_bonus: 100,
            referral_bonus: 500,
            minimum_redemption: 100,
            max_points_per_transaction: 1000,
        }
    }
}

impl MerchantSettings {
    /// Points for a purchase, capped per transaction.
    pub fn points_for_purchase(&self, amount_cents: u64) -> u64 {
        let points = (amount_cents / 100).saturating_mul(self.points_per_dollar);
        points.min(self.max_points_per_transaction)
    }

    pub fn can_redeem(&self, balance: u64) -> bool {
        balance >= self.minimum_redemption
    }
}
