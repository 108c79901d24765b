pub mod ai_client;
pub mod email_client;
pub mod stripe_client;
