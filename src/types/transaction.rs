//! Raw transaction records as they appear in the training CSV and the
//! prediction request body.

use serde::{Deserialize, Serialize};

/// A raw transaction record.
///
/// Field names follow the upstream schema (PascalCase in CSV headers and
/// JSON bodies). Identifier fields are opaque and dropped before modeling;
/// every modelable field is optional so that missing values reach the
/// imputation step instead of failing deserialization. Unknown fields in a
/// JSON body are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Transaction {
    /// Unique transaction identifier.
    pub transaction_id: String,

    /// Batch the transaction was submitted in.
    pub batch_id: String,

    /// Account identifier.
    pub account_id: String,

    /// Subscription identifier.
    pub subscription_id: String,

    /// Customer identifier, used for per-customer aggregates.
    pub customer_id: String,

    /// Currency code (e.g. "UGX").
    pub currency_code: Option<String>,

    /// Numeric country code.
    pub country_code: Option<f64>,

    /// Payment provider identifier.
    pub provider_id: Option<String>,

    /// Product identifier.
    pub product_id: Option<String>,

    /// Product category (e.g. "financial_services").
    pub product_category: Option<String>,

    /// Channel the transaction came through.
    pub channel_id: Option<String>,

    /// Transaction amount (signed; debits are negative).
    pub amount: Option<f64>,

    /// Absolute transaction value.
    pub value: Option<f64>,

    /// Transaction timestamp, RFC 3339 (e.g. "2018-11-15T05:54:12Z").
    pub transaction_start_time: Option<String>,

    /// Pricing strategy code.
    pub pricing_strategy: Option<f64>,

    /// Binary fraud label; present in training data, ignored at inference.
    pub fraud_result: Option<i64>,
}

impl Transaction {
    /// Create a transaction with the given identifiers, amount, and
    /// timestamp; remaining fields get plausible defaults.
    pub fn new(transaction_id: &str, customer_id: &str, amount: f64, timestamp: &str) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            batch_id: "BatchId_1".to_string(),
            account_id: "AccountId_1".to_string(),
            subscription_id: "SubscriptionId_1".to_string(),
            customer_id: customer_id.to_string(),
            currency_code: Some("UGX".to_string()),
            country_code: Some(256.0),
            provider_id: Some("ProviderId_5".to_string()),
            product_id: Some("ProductId_15".to_string()),
            product_category: Some("financial_services".to_string()),
            channel_id: Some("ChannelId_3".to_string()),
            amount: Some(amount),
            value: Some(amount.abs()),
            transaction_start_time: Some(timestamp.to_string()),
            pricing_strategy: Some(2.0),
            fraud_result: Some(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_serialization() {
        let tx = Transaction::new(
            "TransactionId_1",
            "CustomerId_908",
            2200.0,
            "2018-11-15T05:54:12Z",
        );

        let json = serde_json::to_string(&tx).unwrap();
        assert!(json.contains("\"TransactionStartTime\""));

        let deserialized: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx.transaction_id, deserialized.transaction_id);
        assert_eq!(tx.amount, deserialized.amount);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let body = r#"{
            "TransactionId": "TransactionId_1",
            "BatchId": "BatchId_1",
            "AccountId": "AccountId_1",
            "SubscriptionId": "SubscriptionId_1",
            "CustomerId": "CustomerId_1",
            "Amount": 10.0,
            "SomethingElse": true
        }"#;
        let tx: Transaction = serde_json::from_str(body).unwrap();
        assert_eq!(tx.amount, Some(10.0));
        assert!(tx.currency_code.is_none());
        assert!(tx.fraud_result.is_none());
    }

    #[test]
    fn test_missing_identifiers_rejected() {
        // A body with only unrelated fields must not deserialize.
        let body = r#"{"foo": 1, "bar": 2}"#;
        assert!(serde_json::from_str::<Transaction>(body).is_err());
    }
}
