#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub auth: Auth,
    pub stripe: Stripe,
    pub free_plan: FreePlan,
    pub gemini: Gemini,
    pub resend: Resend,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    pub webhook_secret: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Price ids the catalog sync is allowed to mirror into the plans table.
    pub recognized_price_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FreePlan {
    pub price_id: String,
    pub max_generations: i32,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct Gemini {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Resend {
    pub api_key: String,
    pub from_address: String,
}
