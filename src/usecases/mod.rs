pub mod auth;
pub mod content_generator;
pub mod history;
pub mod plan_catalog;
pub mod subscriptions;
pub mod usage_reset;
