//! Merchant transaction QR payloads.
//!
//! The payload is the JSON text encoded into the QR image. Rendering the image
//! itself happens elsewhere.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::Network;

/// Value of the `type` field for merchant transactions.
pub const MERCHANT_TRANSACTION: &str = "merchant_transaction";

/// QR payload errors
#[derive(Debug, Error)]
pub enum QrError {
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unsupported payload type: {0}")]
    UnsupportedType(String),

    #[error("Missing merchant id")]
    MissingMerchant,

    #[error("Points amount must be positive")]
    InvalidPoints,

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
}

/// Data scanned by the customer to claim points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub merchant_id: String,
    pub points_amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Issue time, Unix milliseconds
    pub timestamp: i64,
    /// Expiry, Unix milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<i64>,
    pub network_id: String,
}

impl QrPayload {
    /// Create a payload issued at `now`.
    pub fn new(
        merchant_id: impl Into<String>,
        points_amount: u64,
        network: Network,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: MERCHANT_TRANSACTION.to_string(),
            merchant_id: merchant_id.into(),
            points_amount,
            product_id: None,
            description: None,
            timestamp: now.timestamp_millis(),
            valid_until: None,
            network_id: network.network_id().to_string(),
        }
    }

    pub fn with_product(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_valid_until(mut self, valid_until: DateTime<Utc>) -> Self {
        self.valid_until = Some(valid_until.timestamp_millis());
        self
    }

    /// Expire `ttl` after the issue time.
    pub fn valid_for(self, ttl: Duration) -> Self {
        let issued = self.issued_at();
        self.with_valid_until(issued + ttl)
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.valid_until.and_then(DateTime::from_timestamp_millis)
    }

    pub fn network(&self) -> Option<Network> {
        Network::from_network_id(&self.network_id)
    }

    /// A payload without an expiry never expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until
            .is_some_and(|until| until <= now.timestamp_millis())
    }

    /// "Xh Ym remaining", "Expired", or `None` without an expiry.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<String> {
        let until = self.valid_until?;
        let remaining = until - now.timestamp_millis();
        if remaining <= 0 {
            return Some("Expired".to_string());
        }
        let hours = remaining / 3_600_000;
        let minutes = (remaining % 3_600_000) / 60_000;
        Some(format!("{}h {}m remaining", hours, minutes))
    }

    pub fn validate(&self) -> Result<(), QrError> {
        if self.kind != MERCHANT_TRANSACTION {
            return Err(QrError::UnsupportedType(self.kind.clone()));
        }
        if self.merchant_id.trim().is_empty() {
            return Err(QrError::MissingMerchant);
        }
        if self.points_amount == 0 {
            return Err(QrError::InvalidPoints);
        }
        if self.network().is_none() {
            return Err(QrError::UnknownNetwork(self.network_id.clone()));
        }
        Ok(())
    }

    /// Serialize to the QR text.
    pub fn encode(&self) -> Result<String, QrError> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate scanned QR text.
    pub fn decode(text: &str) -> Result<Self, QrError> {
        let payload: QrPayload = serde_json::from_str(text)?;
        payload.validate()?;
        Ok(payload)
    }
}
