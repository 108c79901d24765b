use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::plans::PlanEntity,
    repositories::{plans::PlanRepository, users::UserRepository},
    value_objects::enums::billing_intervals::BillingInterval,
};

const SWEEP_HOUR_UTC: i64 = 2;

/// The next 02:00 UTC strictly after `after`, so restarts do not drift
/// the trigger away from the fixed wall-clock time.
fn next_trigger(after: DateTime<Utc>) -> DateTime<Utc> {
    let since_midnight = ChronoDuration::seconds(i64::from(after.num_seconds_from_midnight()))
        + ChronoDuration::nanoseconds(i64::from(after.nanosecond()));
    let todays_trigger = after - since_midnight + ChronoDuration::hours(SWEEP_HOUR_UTC);

    if todays_trigger > after {
        todays_trigger
    } else {
        todays_trigger + ChronoDuration::days(1)
    }
}

/// Daily sweep that zeroes usage counters once a billing period has elapsed.
pub struct UsageResetUseCase<U, P>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    plan_repo: Arc<P>,
}

impl<U, P> UsageResetUseCase<U, P>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, plan_repo: Arc<P>) -> Self {
        Self {
            user_repo,
            plan_repo,
        }
    }

    /// Runs forever, sweeping daily at 02:00 UTC. A failed sweep is logged
    /// and retried at the next trigger, never immediately.
    pub async fn run_daily(self: Arc<Self>) {
        loop {
            let now = Utc::now();
            let trigger = next_trigger(now);
            info!(trigger = %trigger, "usage_reset: next sweep scheduled");

            let wait = (trigger - now).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;

            if let Err(err) = self.sweep(Utc::now()).await {
                error!(error = ?err, "usage_reset: sweep failed, retrying at next trigger");
            }
        }
    }

    /// One pass over all entitlement records. Users whose billing period has
    /// elapsed (30 days for monthly plans, 365 for yearly) are collected and
    /// reset in a single transaction, so a failure leaves no partial resets.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<usize> {
        let users = self.user_repo.list_all().await?;

        let mut plans: HashMap<Uuid, Option<PlanEntity>> = HashMap::new();
        let mut due: Vec<Uuid> = Vec::new();

        for user in users {
            let Some(plan_id) = user.subscription_plan_id else {
                continue;
            };

            let plan = match plans.get(&plan_id) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = self.plan_repo.find_by_id(plan_id).await?;
                    plans.insert(plan_id, fetched.clone());
                    fetched
                }
            };

            let Some(plan) = plan else {
                warn!(
                    user_id = %user.id,
                    plan_id = %plan_id,
                    "usage_reset: user references a missing plan, skipping"
                );
                continue;
            };

            // Unlimited plans have nothing to reset.
            if plan.max_generations == 0 {
                continue;
            }

            let Some(last_reset) = user.last_reset else {
                // Never reset before: stamp the record so the next period
                // has a starting point.
                due.push(user.id);
                continue;
            };

            let Some(interval) = BillingInterval::from_str(&plan.interval) else {
                warn!(
                    user_id = %user.id,
                    interval = %plan.interval,
                    "usage_reset: plan has an unsupported interval, skipping"
                );
                continue;
            };

            let elapsed_days = (now - last_reset).num_days();
            if elapsed_days >= interval.reset_after_days() {
                due.push(user.id);
            }
        }

        let reset_count = due.len();
        if reset_count > 0 {
            self.user_repo.reset_usage(due, now).await?;
        }

        info!(reset_count, "usage_reset: sweep complete");

        Ok(reset_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::users::UserEntity,
        repositories::{plans::MockPlanRepository, users::MockUserRepository},
    };
    use chrono::{Days, TimeZone};

    fn plan(id: Uuid, max_generations: i32, interval: &str) -> PlanEntity {
        PlanEntity {
            id,
            name: "Basic".to_string(),
            description: None,
            max_generations,
            stripe_price_id: Some("price_x".to_string()),
            unit_amount: 2000,
            currency: "brl".to_string(),
            interval: interval.to_string(),
            interval_count: 1,
            price_type: "recurring".to_string(),
            is_active: true,
        }
    }

    fn user(plan_id: Option<Uuid>, last_reset: Option<DateTime<Utc>>) -> UserEntity {
        let now = Utc::now();
        UserEntity {
            id: Uuid::new_v4(),
            email: "agent@example.com".to_string(),
            password_hash: "hash".to_string(),
            is_active: true,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            subscription_plan_id: plan_id,
            content_generations_count: 7,
            last_reset,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn trigger_before_two_am_fires_the_same_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 0, 30, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2026, 3, 10, 2, 0, 0).unwrap();
        assert_eq!(next_trigger(now), expected);
    }

    #[test]
    fn trigger_at_or_after_two_am_rolls_to_the_next_day() {
        let at_two = Utc.with_ymd_and_hms(2026, 3, 10, 2, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2026, 3, 10, 22, 15, 0).unwrap();
        let next_day = Utc.with_ymd_and_hms(2026, 3, 11, 2, 0, 0).unwrap();
        assert_eq!(next_trigger(at_two), next_day);
        assert_eq!(next_trigger(evening), next_day);
    }

    #[tokio::test]
    async fn monthly_user_past_thirty_days_is_reset() {
        let now = Utc::now();
        let plan_id = Uuid::new_v4();
        let stale_user = user(Some(plan_id), Some(now - Days::new(31)));
        let stale_id = stale_user.id;

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_list_all().returning(move || {
            let users = vec![stale_user.clone()];
            Box::pin(async move { Ok(users) })
        });
        user_repo
            .expect_reset_usage()
            .withf(move |ids, _| ids == &[stale_id])
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_find_by_id().returning(move |_| {
            let plan = plan(plan_id, 20, "month");
            Box::pin(async move { Ok(Some(plan)) })
        });

        let usecase = UsageResetUseCase::new(Arc::new(user_repo), Arc::new(plan_repo));
        assert_eq!(usecase.sweep(now).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn recent_user_is_untouched() {
        let now = Utc::now();
        let plan_id = Uuid::new_v4();
        let fresh_user = user(Some(plan_id), Some(now - Days::new(10)));

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_list_all().returning(move || {
            let users = vec![fresh_user.clone()];
            Box::pin(async move { Ok(users) })
        });
        user_repo.expect_reset_usage().times(0);

        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_find_by_id().returning(move |_| {
            let plan = plan(plan_id, 20, "month");
            Box::pin(async move { Ok(Some(plan)) })
        });

        let usecase = UsageResetUseCase::new(Arc::new(user_repo), Arc::new(plan_repo));
        assert_eq!(usecase.sweep(now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn yearly_interval_waits_a_full_year() {
        let now = Utc::now();
        let plan_id = Uuid::new_v4();
        let half_year = user(Some(plan_id), Some(now - Days::new(180)));
        let expired = user(Some(plan_id), Some(now - Days::new(366)));
        let expired_id = expired.id;

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_list_all().returning(move || {
            let users = vec![half_year.clone(), expired.clone()];
            Box::pin(async move { Ok(users) })
        });
        user_repo
            .expect_reset_usage()
            .withf(move |ids, _| ids == &[expired_id])
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_find_by_id().returning(move |_| {
            let plan = plan(plan_id, 50, "year");
            Box::pin(async move { Ok(Some(plan)) })
        });

        let usecase = UsageResetUseCase::new(Arc::new(user_repo), Arc::new(plan_repo));
        assert_eq!(usecase.sweep(now).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unlimited_plans_are_never_reset() {
        let now = Utc::now();
        let plan_id = Uuid::new_v4();
        let stale_user = user(Some(plan_id), Some(now - Days::new(400)));

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_list_all().returning(move || {
            let users = vec![stale_user.clone()];
            Box::pin(async move { Ok(users) })
        });
        user_repo.expect_reset_usage().times(0);

        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_find_by_id().returning(move |_| {
            let plan = plan(plan_id, 0, "month");
            Box::pin(async move { Ok(Some(plan)) })
        });

        let usecase = UsageResetUseCase::new(Arc::new(user_repo), Arc::new(plan_repo));
        assert_eq!(usecase.sweep(now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn never_reset_user_is_bootstrapped() {
        let now = Utc::now();
        let plan_id = Uuid::new_v4();
        let fresh_user = user(Some(plan_id), None);
        let fresh_id = fresh_user.id;

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_list_all().returning(move || {
            let users = vec![fresh_user.clone()];
            Box::pin(async move { Ok(users) })
        });
        user_repo
            .expect_reset_usage()
            .withf(move |ids, _| ids == &[fresh_id])
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_find_by_id().returning(move |_| {
            let plan = plan(plan_id, 20, "month");
            Box::pin(async move { Ok(Some(plan)) })
        });

        let usecase = UsageResetUseCase::new(Arc::new(user_repo), Arc::new(plan_repo));
        assert_eq!(usecase.sweep(now).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn users_without_a_plan_are_skipped() {
        let now = Utc::now();
        let planless = user(None, None);

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_list_all().returning(move || {
            let users = vec![planless.clone()];
            Box::pin(async move { Ok(users) })
        });
        user_repo.expect_reset_usage().times(0);

        let usecase =
            UsageResetUseCase::new(Arc::new(user_repo), Arc::new(MockPlanRepository::new()));
        assert_eq!(usecase.sweep(now).await.unwrap(), 0);
    }
}
