pub mod auth;
pub mod content_generator;
pub mod history;
pub mod subscriptions;
pub mod users;
