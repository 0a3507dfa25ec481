// service/payment_provider.rs
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::utils::currency::to_minor_units;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),

    #[error("provider error: {0}")]
    Provider(String),
}

/// Charge/refund/transfer seam to the payment provider. Every call takes an
/// idempotency key derived by the caller so a retried operation after a
/// timeout cannot move money twice.
#[async_trait]
pub trait PaymentGateway: Send + Sync + std::fmt::Debug {
    async fn charge(
        &self,
        amount: &BigDecimal,
        customer_ref: &str,
        idempotency_key: &str,
    ) -> Result<String, PaymentError>;

    async fn refund(
        &self,
        charge_id: &str,
        amount: &BigDecimal,
        idempotency_key: &str,
    ) -> Result<String, PaymentError>;

    async fn transfer(
        &self,
        amount: &BigDecimal,
        destination_ref: &str,
        idempotency_key: &str,
    ) -> Result<String, PaymentError>;
}

/// Paystack-style HTTP provider. Amounts go over the wire in minor units and
/// the idempotency key doubles as the transaction reference, which is what
/// makes provider-side retries safe.
#[derive(Debug)]
pub struct PaystackGateway {
    secret_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl PaystackGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            secret_key,
            base_url: "https://api.paystack.co".to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn post(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, PaymentError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        if body["status"].as_bool().unwrap_or(false) {
            Ok(body)
        } else {
            let message = body["message"].as_str().unwrap_or("request failed");
            Err(PaymentError::Declined(message.to_string()))
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn charge(
        &self,
        amount: &BigDecimal,
        customer_ref: &str,
        idempotency_key: &str,
    ) -> Result<String, PaymentError> {
        let payload = serde_json::json!({
            "email": customer_ref,
            "amount": to_minor_units(amount),
            "reference": idempotency_key,
        });
        let body = self.post("/transaction/initialize", payload).await?;
        Ok(body["data"]["reference"]
            .as_str()
            .unwrap_or(idempotency_key)
            .to_string())
    }

    async fn refund(
        &self,
        charge_id: &str,
        amount: &BigDecimal,
        idempotency_key: &str,
    ) -> Result<String, PaymentError> {
        let payload = serde_json::json!({
            "transaction": charge_id,
            "amount": to_minor_units(amount),
            "merchant_note": idempotency_key,
        });
        let body = self.post("/refund", payload).await?;
        Ok(body["data"]["id"]
            .as_i64()
            .map(|id| id.to_string())
            .unwrap_or_else(|| idempotency_key.to_string()))
    }

    async fn transfer(
        &self,
        amount: &BigDecimal,
        destination_ref: &str,
        idempotency_key: &str,
    ) -> Result<String, PaymentError> {
        let payload = serde_json::json!({
            "source": "balance",
            "amount": to_minor_units(amount),
            "recipient": destination_ref,
            "reference": idempotency_key,
        });
        let body = self.post("/transfer", payload).await?;
        Ok(body["data"]["transfer_code"]
            .as_str()
            .unwrap_or(idempotency_key)
            .to_string())
    }
}

/// In-memory gateway for tests and local runs. Deduplicates on idempotency
/// key the way the real provider does, and can be flipped into a failing mode
/// to exercise the no-mutation-on-upstream-failure paths.
#[derive(Debug, Default)]
pub struct SandboxGateway {
    seen: Mutex<HashMap<String, String>>,
    failing: Mutex<bool>,
}

impl SandboxGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    /// Number of distinct fund movements executed.
    pub fn operation_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn execute(&self, prefix: &str, idempotency_key: &str) -> Result<String, PaymentError> {
        if *self.failing.lock().unwrap() {
            return Err(PaymentError::Declined("sandbox failure mode".to_string()));
        }
        let mut seen = self.seen.lock().unwrap();
        if let Some(existing) = seen.get(idempotency_key) {
            return Ok(existing.clone());
        }
        let reference = format!("{prefix}_{}", Uuid::new_v4().simple());
        seen.insert(idempotency_key.to_string(), reference.clone());
        Ok(reference)
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn charge(
        &self,
        _amount: &BigDecimal,
        _customer_ref: &str,
        idempotency_key: &str,
    ) -> Result<String, PaymentError> {
        self.execute("ch", idempotency_key)
    }

    async fn refund(
        &self,
        _charge_id: &str,
        _amount: &BigDecimal,
        idempotency_key: &str,
    ) -> Result<String, PaymentError> {
        self.execute("rf", idempotency_key)
    }

    async fn transfer(
        &self,
        _amount: &BigDecimal,
        _destination_ref: &str,
        idempotency_key: &str,
    ) -> Result<String, PaymentError> {
        self.execute("tr", idempotency_key)
    }
}
