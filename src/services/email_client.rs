use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::warn;

/// Transactional emails the backend sends. All of them are best-effort:
/// a failed send is logged by the mailer task and never fails the request
/// that queued it.
#[derive(Debug, Clone)]
pub enum OutboundEmail {
    Welcome {
        to: String,
    },
    PlanSubscribed {
        to: String,
        plan_name: String,
    },
    SubscriptionCanceled {
        to: String,
        ends_at: DateTime<Utc>,
    },
    PasswordChanged {
        to: String,
    },
}

impl OutboundEmail {
    pub fn to(&self) -> &str {
        match self {
            OutboundEmail::Welcome { to }
            | OutboundEmail::PlanSubscribed { to, .. }
            | OutboundEmail::SubscriptionCanceled { to, .. }
            | OutboundEmail::PasswordChanged { to } => to,
        }
    }

    pub fn subject(&self) -> String {
        match self {
            OutboundEmail::Welcome { .. } => "Welcome to AuraSync!".to_string(),
            OutboundEmail::PlanSubscribed { plan_name, .. } => {
                format!("Your AuraSync {} plan is active", plan_name)
            }
            OutboundEmail::SubscriptionCanceled { .. } => {
                "Your subscription has been canceled".to_string()
            }
            OutboundEmail::PasswordChanged { .. } => {
                "Your password was changed".to_string()
            }
        }
    }

    pub fn html_body(&self) -> String {
        match self {
            OutboundEmail::Welcome { .. } => {
                "<p>Welcome to AuraSync! Your account is ready and your free plan is \
                 active.</p>"
                    .to_string()
            }
            OutboundEmail::PlanSubscribed { plan_name, .. } => format!(
                "<p>Thanks for subscribing! Your <strong>{}</strong> plan is now \
                 active.</p>",
                plan_name
            ),
            OutboundEmail::SubscriptionCanceled { ends_at, .. } => format!(
                "<p>Your subscription has been canceled. You keep access until \
                 {}.</p>",
                ends_at.format("%Y-%m-%d")
            ),
            OutboundEmail::PasswordChanged { .. } => {
                "<p>Your AuraSync password was changed. If this wasn't you, contact \
                 support immediately.</p>"
                    .to_string()
            }
        }
    }
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<()>;
    fn provider_name(&self) -> &'static str;
}

/// Resend API client. https://resend.com/docs/api-reference/emails/send-email
pub struct ResendClient {
    http: reqwest::Client,
    api_key: String,
    from_address: String,
}

impl ResendClient {
    pub fn new(api_key: String, from_address: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            from_address,
        }
    }
}

#[async_trait]
impl EmailProvider for ResendClient {
    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        let body = serde_json::json!({
            "from": self.from_address,
            "to": [email.to()],
            "subject": email.subject(),
            "html": email.html_body(),
        });

        let resp = self
            .http
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("Resend API request failed (status {})", resp.status());
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "resend"
    }
}

/// Fire-and-forget mail queue: emails ride an mpsc channel consumed by a
/// spawned task, decoupled from the request/response lifecycle.
#[derive(Clone)]
pub struct Mailer {
    tx: mpsc::Sender<OutboundEmail>,
}

impl Mailer {
    pub fn new(provider: Arc<dyn EmailProvider>) -> Self {
        let (tx, mut rx) = mpsc::channel::<OutboundEmail>(256);

        tokio::spawn(async move {
            while let Some(email) = rx.recv().await {
                if let Err(error) = provider.send(&email).await {
                    warn!(
                        provider = provider.provider_name(),
                        to = email.to(),
                        error = %error,
                        "Email provider failed"
                    );
                }
            }
        });

        Self { tx }
    }

    pub fn try_send(&self, email: OutboundEmail) {
        match self.tx.try_send(email) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Mail queue full; dropping email");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Mail queue closed; dropping email");
            }
        }
    }
}
