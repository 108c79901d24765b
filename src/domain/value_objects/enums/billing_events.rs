/// Closed set of Stripe webhook event types the handler reacts to.
/// Everything else falls into `Unrecognized` and is acknowledged untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingEventKind {
    CheckoutSessionCompleted,
    SubscriptionUpdated,
    SubscriptionDeleted,
    Unrecognized,
}

impl BillingEventKind {
    pub fn from_event_type(value: &str) -> Self {
        match value {
            "checkout.session.completed" => BillingEventKind::CheckoutSessionCompleted,
            "customer.subscription.updated" => BillingEventKind::SubscriptionUpdated,
            "customer.subscription.deleted" => BillingEventKind::SubscriptionDeleted,
            _ => BillingEventKind::Unrecognized,
        }
    }
}
