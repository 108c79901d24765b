pub mod billing_events;
pub mod billing_intervals;
pub mod plan_types;
