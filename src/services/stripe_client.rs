use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Minimal Stripe client built on reqwest.
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
    success_url: String,
    cancel_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: Option<String>,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionObject {
    pub id: Option<String>,
    pub customer: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub items: StripeSubscriptionItems,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StripeSubscriptionItems {
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub price: Option<StripePriceRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePriceRef {
    pub id: String,
}

impl StripeSubscriptionObject {
    /// The price id currently billed on the subscription's first line item.
    pub fn current_price_id(&self) -> Option<&str> {
        self.items
            .data
            .first()
            .and_then(|item| item.price.as_ref())
            .map(|price| price.id.as_str())
    }
}

/// One active (product, price) pair as the catalog sync consumes it.
#[derive(Debug, Clone)]
pub struct StripeCatalogEntry {
    pub price_id: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_amount: i64,
    pub currency: String,
    pub interval: Option<String>,
    pub interval_count: Option<i32>,
    pub price_type: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

impl StripeClient {
    pub fn new(
        secret_key: String,
        webhook_secret: String,
        success_url: String,
        cancel_url: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            webhook_secret,
            success_url,
            cancel_url,
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let details = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .map(|envelope| envelope.error)
            .ok();

        error!(
            status = %status,
            stripe_error_type = ?details.as_ref().and_then(|d| d.type_.as_deref()),
            stripe_error_code = ?details.as_ref().and_then(|d| d.code.as_deref()),
            stripe_error_message = ?details.as_ref().and_then(|d| d.message.as_deref()),
            context = %context,
            "stripe api request failed"
        );

        anyhow::bail!("Stripe API request failed: {} (status {})", context, status);
    }

    /// Creates a Stripe customer for the given email/user.
    pub async fn create_customer(&self, email: &str, user_id: Uuid) -> Result<String> {
        // https://stripe.com/docs/api/customers/create
        let body = [
            ("email", email.to_string()),
            ("metadata[user_id]", user_id.to_string()),
        ];

        let resp = self
            .http
            .post("https://api.stripe.com/v1/customers")
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create customer").await?;

        #[derive(Deserialize)]
        struct CustomerResp {
            id: String,
        }

        let parsed: CustomerResp = resp.json().await?;
        Ok(parsed.id)
    }

    /// Creates a subscription-mode Checkout Session and returns its URL.
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        customer_id: &str,
        metadata: HashMap<String, String>,
    ) -> Result<String> {
        // https://stripe.com/docs/payments/checkout
        let mut body: Vec<(String, String)> = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("line_items[0][price]".to_string(), price_id.to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("customer".to_string(), customer_id.to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];

        for (key, value) in metadata {
            body.push((format!("metadata[{}]", key), value));
        }

        let resp = self
            .http
            .post("https://api.stripe.com/v1/checkout/sessions")
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create checkout session").await?;

        #[derive(Deserialize)]
        struct CheckoutResp {
            url: Option<String>,
        }

        let parsed: CheckoutResp = resp.json().await?;
        parsed
            .url
            .ok_or_else(|| anyhow::anyhow!("Stripe Checkout session URL is missing"))
    }

    /// Marks a Stripe subscription to cancel at period end and returns the
    /// effective cancellation date.
    pub async fn cancel_subscription_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<DateTime<Utc>> {
        // https://stripe.com/docs/api/subscriptions/cancel#cancel_subscription-at_period_end
        let body = [("cancel_at_period_end", "true".to_string())];
        let resp = self
            .http
            .post(format!(
                "https://api.stripe.com/v1/subscriptions/{}",
                subscription_id
            ))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "cancel subscription").await?;

        #[derive(Deserialize)]
        struct CancelResp {
            cancel_at: Option<i64>,
            current_period_end: Option<i64>,
        }

        let parsed: CancelResp = resp.json().await?;
        parsed
            .cancel_at
            .or(parsed.current_period_end)
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .ok_or_else(|| anyhow::anyhow!("Stripe cancellation date is missing"))
    }

    /// Verifies the webhook signature. https://stripe.com/docs/webhooks/signatures
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent> {
        let mut timestamp: Option<String> = None;
        let mut signature: Option<String> = None;

        for part in signature_header.split(',') {
            if let Some(rest) = part.strip_prefix("t=") {
                timestamp = Some(rest.to_string());
            } else if let Some(rest) = part.strip_prefix("v1=") {
                signature = Some(rest.to_string());
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| anyhow::anyhow!("missing timestamp in stripe-signature"))?;
        let signature =
            signature.ok_or_else(|| anyhow::anyhow!("missing v1 in stripe-signature"))?;

        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())?;
        mac.update(signed_payload.as_bytes());
        let expected = mac.finalize().into_bytes();
        let provided = hex::decode(signature)?;

        if expected[..] != provided[..] {
            anyhow::bail!("invalid webhook signature");
        }

        let event: StripeEvent = serde_json::from_slice(payload)?;
        Ok(event)
    }

    pub fn extract_checkout_session(event: &StripeEvent) -> Option<StripeCheckoutSession> {
        serde_json::from_value(event.data.object.clone()).ok()
    }

    pub fn extract_subscription_object(event: &StripeEvent) -> Option<StripeSubscriptionObject> {
        serde_json::from_value(event.data.object.clone()).ok()
    }

    /// Lists all active products with their active prices, flattened into
    /// catalog entries for the plan sync.
    pub async fn list_active_prices(&self) -> Result<Vec<StripeCatalogEntry>> {
        #[derive(Deserialize)]
        struct ProductList {
            data: Vec<Product>,
        }

        #[derive(Deserialize)]
        struct Product {
            id: String,
            name: String,
            description: Option<String>,
        }

        #[derive(Deserialize)]
        struct PriceList {
            data: Vec<Price>,
        }

        #[derive(Deserialize)]
        struct Price {
            id: String,
            unit_amount: Option<i64>,
            currency: String,
            recurring: Option<Recurring>,
            #[serde(rename = "type")]
            type_: String,
        }

        #[derive(Deserialize)]
        struct Recurring {
            interval: String,
            interval_count: Option<i32>,
        }

        // https://stripe.com/docs/api/products/list
        let resp = self
            .http
            .get("https://api.stripe.com/v1/products?active=true&limit=100")
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "list products").await?;
        let products: ProductList = resp.json().await?;

        let mut entries = Vec::new();
        for product in products.data {
            // https://stripe.com/docs/api/prices/list
            let resp = self
                .http
                .get(format!(
                    "https://api.stripe.com/v1/prices?product={}&active=true",
                    product.id
                ))
                .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
                .send()
                .await?;
            let resp = Self::ensure_success(resp, "list prices").await?;
            let prices: PriceList = resp.json().await?;

            for price in prices.data {
                entries.push(StripeCatalogEntry {
                    price_id: price.id,
                    name: product.name.clone(),
                    description: product.description.clone(),
                    unit_amount: price.unit_amount.unwrap_or(0),
                    currency: price.currency,
                    interval: price.recurring.as_ref().map(|r| r.interval.clone()),
                    interval_count: price.recurring.as_ref().and_then(|r| r.interval_count),
                    price_type: price.type_,
                });
            }
        }

        Ok(entries)
    }
}
