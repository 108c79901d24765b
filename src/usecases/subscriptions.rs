use std::{collections::HashMap, sync::Arc};

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::users::UserEntity,
    repositories::{plans::PlanRepository, users::UserRepository},
    value_objects::{
        enums::{billing_events::BillingEventKind, billing_intervals::BillingInterval},
        plans::FREE_PLAN_NAME,
    },
};
use crate::services::{
    email_client::{Mailer, OutboundEmail},
    stripe_client::{StripeCatalogEntry, StripeClient, StripeEvent},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StripeGateway: Send + Sync {
    async fn create_customer(&self, email: &str, user_id: Uuid) -> AnyResult<String>;

    async fn create_checkout_session(
        &self,
        price_id: &str,
        customer_id: &str,
        metadata: HashMap<String, String>,
    ) -> AnyResult<String>;

    async fn cancel_subscription_at_period_end(
        &self,
        subscription_id: &str,
    ) -> AnyResult<DateTime<Utc>>;

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent>;

    async fn list_active_prices(&self) -> AnyResult<Vec<StripeCatalogEntry>>;
}

#[async_trait]
impl StripeGateway for StripeClient {
    async fn create_customer(&self, email: &str, user_id: Uuid) -> AnyResult<String> {
        self.create_customer(email, user_id).await
    }

    async fn create_checkout_session(
        &self,
        price_id: &str,
        customer_id: &str,
        metadata: HashMap<String, String>,
    ) -> AnyResult<String> {
        self.create_checkout_session(price_id, customer_id, metadata)
            .await
    }

    async fn cancel_subscription_at_period_end(
        &self,
        subscription_id: &str,
    ) -> AnyResult<DateTime<Utc>> {
        self.cancel_subscription_at_period_end(subscription_id)
            .await
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent> {
        self.verify_webhook_signature(payload, signature)
    }

    async fn list_active_prices(&self) -> AnyResult<Vec<StripeCatalogEntry>> {
        self.list_active_prices().await
    }
}

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("invalid webhook payload: {0}")]
    InvalidWebhook(String),
    #[error("user not found")]
    UserNotFound,
    #[error("no active subscription to cancel")]
    SubscriptionNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SubscriptionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SubscriptionError::InvalidWebhook(_) => StatusCode::BAD_REQUEST,
            SubscriptionError::UserNotFound | SubscriptionError::SubscriptionNotFound => {
                StatusCode::NOT_FOUND
            }
            SubscriptionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SubscriptionError>;

pub struct SubscriptionUseCase<U, P, Stripe>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    plan_repo: Arc<P>,
    stripe_client: Arc<Stripe>,
    mailer: Mailer,
}

impl<U, P, Stripe> SubscriptionUseCase<U, P, Stripe>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        plan_repo: Arc<P>,
        stripe_client: Arc<Stripe>,
        mailer: Mailer,
    ) -> Self {
        Self {
            user_repo,
            plan_repo,
            stripe_client,
            mailer,
        }
    }

    /// Lazily provisions the Stripe customer, then returns the hosted
    /// checkout URL for the requested price.
    pub async fn create_checkout_session(
        &self,
        user_id: Uuid,
        price_id: &str,
    ) -> UseCaseResult<String> {
        info!(%user_id, price_id, "subscriptions: create checkout session requested");

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(SubscriptionError::Internal)?
            .ok_or(SubscriptionError::UserNotFound)?;

        let customer_id = match user.stripe_customer_id.clone() {
            Some(customer_id) => customer_id,
            None => {
                let customer_id = self
                    .stripe_client
                    .create_customer(&user.email, user.id)
                    .await
                    .map_err(|err| {
                        error!(
                            %user_id,
                            error = ?err,
                            "subscriptions: failed to create stripe customer"
                        );
                        SubscriptionError::Internal(err)
                    })?;

                self.user_repo
                    .set_stripe_customer_id(user.id, &customer_id)
                    .await
                    .map_err(|err| {
                        error!(
                            %user_id,
                            customer_id,
                            db_error = ?err,
                            "subscriptions: failed to persist stripe customer id"
                        );
                        SubscriptionError::Internal(err)
                    })?;

                customer_id
            }
        };

        let metadata = HashMap::from([
            ("user_id".to_string(), user_id.to_string()),
            ("price_id".to_string(), price_id.to_string()),
        ]);

        let checkout_url = self
            .stripe_client
            .create_checkout_session(price_id, &customer_id, metadata)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    price_id,
                    customer_id,
                    error = ?err,
                    "subscriptions: stripe checkout session creation failed"
                );
                SubscriptionError::Internal(err)
            })?;

        info!(%user_id, price_id, "subscriptions: checkout session created");

        Ok(checkout_url)
    }

    /// Requests cancellation at the end of the current billing period and
    /// returns the effective cancellation date. The entitlement itself is
    /// only downgraded later, when Stripe delivers the deletion webhook.
    pub async fn cancel_subscription(&self, user_id: Uuid) -> UseCaseResult<DateTime<Utc>> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(SubscriptionError::Internal)?
            .ok_or(SubscriptionError::UserNotFound)?;

        let subscription_id = user.stripe_subscription_id.clone().ok_or_else(|| {
            let err = SubscriptionError::SubscriptionNotFound;
            warn!(
                %user_id,
                status = err.status_code().as_u16(),
                "subscriptions: no active subscription to cancel"
            );
            err
        })?;

        info!(%user_id, subscription_id, "subscriptions: canceling subscription at Stripe");

        let ends_at = self
            .stripe_client
            .cancel_subscription_at_period_end(&subscription_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    subscription_id,
                    error = ?err,
                    "subscriptions: stripe cancel subscription failed"
                );
                SubscriptionError::Internal(err)
            })?;

        self.mailer.try_send(OutboundEmail::SubscriptionCanceled {
            to: user.email.clone(),
            ends_at,
        });

        info!(%user_id, %ends_at, "subscriptions: cancellation scheduled");

        Ok(ends_at)
    }

    /// Webhook entry point. Signature failures are the only path that errors
    /// back to Stripe; anything durably handled or deliberately ignored is
    /// acknowledged so the provider stops retrying.
    pub async fn handle_stripe_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> UseCaseResult<()> {
        let event = self
            .stripe_client
            .verify_webhook_signature(payload, signature)
            .map_err(|err| {
                warn!(error = %err, "subscriptions: stripe webhook verification failed");
                SubscriptionError::InvalidWebhook("signature verification failed".to_string())
            })?;

        info!(event_type = %event.type_, "subscriptions: stripe webhook verified");

        match BillingEventKind::from_event_type(&event.type_) {
            BillingEventKind::CheckoutSessionCompleted => {
                self.handle_checkout_completed(&event).await?;
            }
            BillingEventKind::SubscriptionUpdated => {
                self.handle_subscription_updated(&event).await?;
            }
            BillingEventKind::SubscriptionDeleted => {
                self.handle_subscription_deleted(&event).await?;
            }
            BillingEventKind::Unrecognized => {
                debug!(event_type = %event.type_, "subscriptions: unhandled stripe event type");
            }
        }

        Ok(())
    }

    async fn handle_checkout_completed(&self, event: &StripeEvent) -> UseCaseResult<()> {
        let Some(session) = StripeClient::extract_checkout_session(event) else {
            warn!("subscriptions: checkout webhook without a session object; ignoring");
            return Ok(());
        };

        let metadata = session.metadata.unwrap_or_default();
        let user_id = metadata.get("user_id").and_then(|v| Uuid::parse_str(v).ok());
        let price_id = metadata.get("price_id");
        let subscription_id = session.subscription;

        let (Some(user_id), Some(price_id), Some(subscription_id)) =
            (user_id, price_id, subscription_id)
        else {
            warn!("subscriptions: checkout webhook missing user_id/price_id/subscription; ignoring");
            return Ok(());
        };

        let user = match self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(SubscriptionError::Internal)?
        {
            Some(user) => user,
            None => {
                warn!(%user_id, "subscriptions: checkout webhook references unknown user");
                return Ok(());
            }
        };

        let plan = match self
            .plan_repo
            .find_by_stripe_price_id(price_id)
            .await
            .map_err(SubscriptionError::Internal)?
        {
            Some(plan) => plan,
            None => {
                warn!(
                    %user_id,
                    price_id,
                    "subscriptions: checkout webhook references unknown price"
                );
                return Ok(());
            }
        };

        self.user_repo
            .assign_plan(user.id, plan.id, Some(subscription_id.clone()))
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    plan_id = %plan.id,
                    db_error = ?err,
                    "subscriptions: failed to assign plan after checkout"
                );
                SubscriptionError::Internal(err)
            })?;

        self.mailer.try_send(OutboundEmail::PlanSubscribed {
            to: user.email,
            plan_name: plan.name.clone(),
        });

        info!(
            %user_id,
            plan_name = %plan.name,
            subscription_id,
            "subscriptions: checkout completed, entitlement updated"
        );

        Ok(())
    }

    async fn handle_subscription_updated(&self, event: &StripeEvent) -> UseCaseResult<()> {
        let Some(subscription) = StripeClient::extract_subscription_object(event) else {
            warn!("subscriptions: update webhook without a subscription object; ignoring");
            return Ok(());
        };

        let Some(user) = self.find_user_by_event_customer(&subscription.customer).await? else {
            return Ok(());
        };

        match subscription.status.as_deref() {
            Some("active") => {
                let Some(price_id) = subscription.current_price_id() else {
                    warn!(
                        user_id = %user.id,
                        "subscriptions: active subscription update without a price id"
                    );
                    return Ok(());
                };

                let plan = match self
                    .plan_repo
                    .find_by_stripe_price_id(price_id)
                    .await
                    .map_err(SubscriptionError::Internal)?
                {
                    Some(plan) => plan,
                    None => {
                        warn!(
                            user_id = %user.id,
                            price_id,
                            "subscriptions: subscription update references unknown price"
                        );
                        return Ok(());
                    }
                };

                let subscription_id = subscription
                    .id
                    .clone()
                    .or_else(|| user.stripe_subscription_id.clone());

                self.user_repo
                    .assign_plan(user.id, plan.id, subscription_id)
                    .await
                    .map_err(|err| {
                        error!(
                            user_id = %user.id,
                            plan_id = %plan.id,
                            db_error = ?err,
                            "subscriptions: failed to reassign plan on subscription update"
                        );
                        SubscriptionError::Internal(err)
                    })?;

                info!(
                    user_id = %user.id,
                    plan_name = %plan.name,
                    "subscriptions: subscription update applied"
                );
            }
            Some("canceled") | Some("unpaid") => {
                info!(
                    user_id = %user.id,
                    status = ?subscription.status,
                    "subscriptions: subscription lapsed, moving user to free plan"
                );
                self.move_to_free_plan(&user).await?;
            }
            other => {
                debug!(
                    user_id = %user.id,
                    status = ?other,
                    "subscriptions: subscription update with unhandled status"
                );
            }
        }

        Ok(())
    }

    async fn handle_subscription_deleted(&self, event: &StripeEvent) -> UseCaseResult<()> {
        let Some(subscription) = StripeClient::extract_subscription_object(event) else {
            warn!("subscriptions: delete webhook without a subscription object; ignoring");
            return Ok(());
        };

        let Some(user) = self.find_user_by_event_customer(&subscription.customer).await? else {
            return Ok(());
        };

        self.move_to_free_plan(&user).await?;

        self.mailer.try_send(OutboundEmail::SubscriptionCanceled {
            to: user.email.clone(),
            ends_at: Utc::now(),
        });

        info!(user_id = %user.id, "subscriptions: subscription deleted, user on free plan");

        Ok(())
    }

    async fn find_user_by_event_customer(
        &self,
        customer: &Option<String>,
    ) -> UseCaseResult<Option<UserEntity>> {
        let Some(customer_id) = customer.as_deref() else {
            warn!("subscriptions: subscription webhook without a customer id; ignoring");
            return Ok(None);
        };

        let user = self
            .user_repo
            .find_by_stripe_customer_id(customer_id)
            .await
            .map_err(SubscriptionError::Internal)?;

        if user.is_none() {
            warn!(
                customer_id,
                "subscriptions: subscription webhook references unknown customer"
            );
        }

        Ok(user)
    }

    /// Free-plan fallback: the user never ends up with a null plan.
    async fn move_to_free_plan(&self, user: &UserEntity) -> UseCaseResult<()> {
        let free_plan = self
            .plan_repo
            .find_active_by_name_and_interval(FREE_PLAN_NAME, BillingInterval::Month)
            .await
            .map_err(SubscriptionError::Internal)?
            .ok_or_else(|| {
                error!(
                    user_id = %user.id,
                    "subscriptions: free plan missing from catalog, cannot downgrade"
                );
                SubscriptionError::Internal(anyhow::anyhow!("free plan missing from catalog"))
            })?;

        self.user_repo
            .assign_plan(user.id, free_plan.id, None)
            .await
            .map_err(|err| {
                error!(
                    user_id = %user.id,
                    db_error = ?err,
                    "subscriptions: failed to move user to free plan"
                );
                SubscriptionError::Internal(err)
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::plans::PlanEntity,
        repositories::{plans::MockPlanRepository, users::MockUserRepository},
    };
    use crate::services::{email_client::EmailProvider, stripe_client::StripeEventData};
    use mockall::predicate::eq;
    use serde_json::json;

    struct NullEmailProvider;

    #[async_trait]
    impl EmailProvider for NullEmailProvider {
        async fn send(&self, _email: &OutboundEmail) -> AnyResult<()> {
            Ok(())
        }

        fn provider_name(&self) -> &'static str {
            "null"
        }
    }

    fn test_mailer() -> Mailer {
        Mailer::new(Arc::new(NullEmailProvider))
    }

    fn sample_plan(id: Uuid, name: &str, price_id: &str, max_generations: i32) -> PlanEntity {
        PlanEntity {
            id,
            name: name.to_string(),
            description: None,
            max_generations,
            stripe_price_id: Some(price_id.to_string()),
            unit_amount: 4000,
            currency: "brl".to_string(),
            interval: "month".to_string(),
            interval_count: 1,
            price_type: "recurring".to_string(),
            is_active: true,
        }
    }

    fn sample_user(id: Uuid) -> UserEntity {
        let now = Utc::now();
        UserEntity {
            id,
            email: "agent@example.com".to_string(),
            password_hash: "hash".to_string(),
            is_active: true,
            stripe_customer_id: Some("cus_123".to_string()),
            stripe_subscription_id: None,
            subscription_plan_id: Some(Uuid::new_v4()),
            content_generations_count: 3,
            last_reset: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn stripe_event(type_: &str, object: serde_json::Value) -> StripeEvent {
        StripeEvent {
            id: Some("evt_1".to_string()),
            type_: type_.to_string(),
            data: StripeEventData { object },
        }
    }

    fn checkout_completed_event(user_id: Uuid, price_id: &str, subscription: &str) -> StripeEvent {
        stripe_event(
            "checkout.session.completed",
            json!({
                "id": "cs_1",
                "customer": "cus_123",
                "subscription": subscription,
                "metadata": { "user_id": user_id.to_string(), "price_id": price_id },
            }),
        )
    }

    fn verified_stripe(event: StripeEvent) -> MockStripeGateway {
        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_verify_webhook_signature()
            .returning(move |_, _| Ok(event.clone()));
        stripe
    }

    #[tokio::test]
    async fn webhook_rejects_invalid_signature() {
        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_verify_webhook_signature()
            .returning(|_, _| Err(anyhow::anyhow!("invalid webhook signature")));

        let usecase = SubscriptionUseCase::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockPlanRepository::new()),
            Arc::new(stripe),
            test_mailer(),
        );

        let result = usecase.handle_stripe_webhook(b"{}", "t=1,v1=bad").await;
        assert!(matches!(result, Err(SubscriptionError::InvalidWebhook(_))));
    }

    #[tokio::test]
    async fn checkout_completed_assigns_plan_and_resets_usage() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();

        let stripe = verified_stripe(checkout_completed_event(
            user_id,
            "price_premium_m",
            "sub_42",
        ));

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |_| {
                let user = sample_user(user_id);
                Box::pin(async move { Ok(Some(user)) })
            });
        user_repo
            .expect_assign_plan()
            .with(eq(user_id), eq(plan_id), eq(Some("sub_42".to_string())))
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_stripe_price_id()
            .with(eq("price_premium_m"))
            .returning(move |_| {
                let plan = sample_plan(plan_id, "Premium", "price_premium_m", 50);
                Box::pin(async move { Ok(Some(plan)) })
            });

        let usecase = SubscriptionUseCase::new(
            Arc::new(user_repo),
            Arc::new(plan_repo),
            Arc::new(stripe),
            test_mailer(),
        );

        usecase
            .handle_stripe_webhook(b"{}", "t=1,v1=sig")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn checkout_completed_replay_converges_to_same_state() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();

        let stripe = verified_stripe(checkout_completed_event(
            user_id,
            "price_premium_m",
            "sub_42",
        ));

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .with(eq(user_id))
            .times(2)
            .returning(move |_| {
                let user = sample_user(user_id);
                Box::pin(async move { Ok(Some(user)) })
            });
        // Blind overwrite: the replay writes the exact same entitlement.
        user_repo
            .expect_assign_plan()
            .with(eq(user_id), eq(plan_id), eq(Some("sub_42".to_string())))
            .times(2)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_stripe_price_id()
            .returning(move |_| {
                let plan = sample_plan(plan_id, "Premium", "price_premium_m", 50);
                Box::pin(async move { Ok(Some(plan)) })
            });

        let usecase = SubscriptionUseCase::new(
            Arc::new(user_repo),
            Arc::new(plan_repo),
            Arc::new(stripe),
            test_mailer(),
        );

        usecase
            .handle_stripe_webhook(b"{}", "t=1,v1=sig")
            .await
            .unwrap();
        usecase
            .handle_stripe_webhook(b"{}", "t=1,v1=sig")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn checkout_completed_for_unknown_user_is_acknowledged() {
        let user_id = Uuid::new_v4();
        let stripe = verified_stripe(checkout_completed_event(user_id, "price_x", "sub_1"));

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = SubscriptionUseCase::new(
            Arc::new(user_repo),
            Arc::new(MockPlanRepository::new()),
            Arc::new(stripe),
            test_mailer(),
        );

        usecase
            .handle_stripe_webhook(b"{}", "t=1,v1=sig")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn subscription_deleted_falls_back_to_free_plan() {
        let user_id = Uuid::new_v4();
        let free_plan_id = Uuid::new_v4();

        let stripe = verified_stripe(stripe_event(
            "customer.subscription.deleted",
            json!({ "id": "sub_42", "customer": "cus_123", "status": "canceled" }),
        ));

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_stripe_customer_id()
            .with(eq("cus_123"))
            .returning(move |_| {
                let user = sample_user(user_id);
                Box::pin(async move { Ok(Some(user)) })
            });
        user_repo
            .expect_assign_plan()
            .with(eq(user_id), eq(free_plan_id), eq(None))
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_active_by_name_and_interval()
            .with(eq(FREE_PLAN_NAME), eq(BillingInterval::Month))
            .returning(move |_, _| {
                let plan = sample_plan(free_plan_id, "Free", "price_free_plan", 5);
                Box::pin(async move { Ok(Some(plan)) })
            });

        let usecase = SubscriptionUseCase::new(
            Arc::new(user_repo),
            Arc::new(plan_repo),
            Arc::new(stripe),
            test_mailer(),
        );

        usecase
            .handle_stripe_webhook(b"{}", "t=1,v1=sig")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn subscription_updated_to_canceled_moves_user_to_free_plan() {
        let user_id = Uuid::new_v4();
        let free_plan_id = Uuid::new_v4();

        let stripe = verified_stripe(stripe_event(
            "customer.subscription.updated",
            json!({ "id": "sub_42", "customer": "cus_123", "status": "canceled" }),
        ));

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_stripe_customer_id()
            .returning(move |_| {
                let user = sample_user(user_id);
                Box::pin(async move { Ok(Some(user)) })
            });
        user_repo
            .expect_assign_plan()
            .with(eq(user_id), eq(free_plan_id), eq(None))
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_active_by_name_and_interval()
            .returning(move |_, _| {
                let plan = sample_plan(free_plan_id, "Free", "price_free_plan", 5);
                Box::pin(async move { Ok(Some(plan)) })
            });

        let usecase = SubscriptionUseCase::new(
            Arc::new(user_repo),
            Arc::new(plan_repo),
            Arc::new(stripe),
            test_mailer(),
        );

        usecase
            .handle_stripe_webhook(b"{}", "t=1,v1=sig")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn subscription_updated_to_active_reassigns_plan_by_price_id() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();

        let stripe = verified_stripe(stripe_event(
            "customer.subscription.updated",
            json!({
                "id": "sub_42",
                "customer": "cus_123",
                "status": "active",
                "items": { "data": [{ "price": { "id": "price_basic_y" } }] },
            }),
        ));

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_stripe_customer_id()
            .returning(move |_| {
                let user = sample_user(user_id);
                Box::pin(async move { Ok(Some(user)) })
            });
        user_repo
            .expect_assign_plan()
            .with(eq(user_id), eq(plan_id), eq(Some("sub_42".to_string())))
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_stripe_price_id()
            .with(eq("price_basic_y"))
            .returning(move |_| {
                let plan = sample_plan(plan_id, "Basic", "price_basic_y", 240);
                Box::pin(async move { Ok(Some(plan)) })
            });

        let usecase = SubscriptionUseCase::new(
            Arc::new(user_repo),
            Arc::new(plan_repo),
            Arc::new(stripe),
            test_mailer(),
        );

        usecase
            .handle_stripe_webhook(b"{}", "t=1,v1=sig")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unrecognized_event_is_acknowledged_without_mutation() {
        let stripe = verified_stripe(stripe_event("invoice.created", json!({})));

        let usecase = SubscriptionUseCase::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockPlanRepository::new()),
            Arc::new(stripe),
            test_mailer(),
        );

        usecase
            .handle_stripe_webhook(b"{}", "t=1,v1=sig")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cancel_without_subscription_is_rejected() {
        let user_id = Uuid::new_v4();

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_id().returning(move |_| {
            let user = sample_user(user_id);
            Box::pin(async move { Ok(Some(user)) })
        });

        let usecase = SubscriptionUseCase::new(
            Arc::new(user_repo),
            Arc::new(MockPlanRepository::new()),
            Arc::new(MockStripeGateway::new()),
            test_mailer(),
        );

        let result = usecase.cancel_subscription(user_id).await;
        assert!(matches!(
            result,
            Err(SubscriptionError::SubscriptionNotFound)
        ));
    }

    #[tokio::test]
    async fn checkout_provisions_stripe_customer_lazily() {
        let user_id = Uuid::new_v4();

        let mut user = sample_user(user_id);
        user.stripe_customer_id = None;

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_id().returning(move |_| {
            let user = user.clone();
            Box::pin(async move { Ok(Some(user)) })
        });
        user_repo
            .expect_set_stripe_customer_id()
            .with(eq(user_id), eq("cus_new"))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_create_customer()
            .returning(|_, _| Ok("cus_new".to_string()));
        stripe
            .expect_create_checkout_session()
            .withf(|price_id, customer_id, metadata| {
                price_id == "price_premium_m"
                    && customer_id == "cus_new"
                    && metadata.contains_key("user_id")
                    && metadata["price_id"] == "price_premium_m"
            })
            .returning(|_, _, _| Ok("https://checkout.stripe.com/c/pay/cs_1".to_string()));

        let usecase = SubscriptionUseCase::new(
            Arc::new(user_repo),
            Arc::new(MockPlanRepository::new()),
            Arc::new(stripe),
            test_mailer(),
        );

        let url = usecase
            .create_checkout_session(user_id, "price_premium_m")
            .await
            .unwrap();
        assert!(url.starts_with("https://checkout.stripe.com"));
    }
}
