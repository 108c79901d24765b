use anyhow::{Ok, Result};

use super::config_model::{
    Auth, Database, DotEnvyConfig, FreePlan, Gemini, Resend, Server, Stripe,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .expect("SERVER_PORT is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let auth = Auth {
        jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET is invalid"),
        token_ttl_minutes: std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
            .unwrap_or_else(|_| "30".to_string())
            .parse()?,
    };

    let stripe = Stripe {
        secret_key: std::env::var("STRIPE_SECRET_KEY").expect("STRIPE_SECRET_KEY is invalid"),
        webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET")
            .expect("STRIPE_WEBHOOK_SECRET is invalid"),
        success_url: std::env::var("STRIPE_SUCCESS_URL").unwrap_or_else(|_| {
            "http://localhost:3000/dashboard?payment_status=success".to_string()
        }),
        cancel_url: std::env::var("STRIPE_CANCEL_URL").unwrap_or_else(|_| {
            "http://localhost:3000/dashboard?payment_status=cancelled".to_string()
        }),
        recognized_price_ids: std::env::var("STRIPE_RECOGNIZED_PRICE_IDS")
            .unwrap_or_default()
            .split(',')
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect(),
    };

    let free_plan = FreePlan {
        price_id: std::env::var("STRIPE_FREE_PLAN_PRICE_ID")
            .unwrap_or_else(|_| "price_free_plan".to_string()),
        max_generations: std::env::var("FREE_PLAN_MAX_GENERATIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?,
        currency: std::env::var("FREE_PLAN_CURRENCY").unwrap_or_else(|_| "brl".to_string()),
    };

    let gemini = Gemini {
        api_key: std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY is invalid"),
        model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
    };

    let resend = Resend {
        api_key: std::env::var("RESEND_API_KEY").expect("RESEND_API_KEY is invalid"),
        from_address: std::env::var("RESEND_FROM_ADDRESS")
            .unwrap_or_else(|_| "AuraSync <onboarding@resend.dev>".to_string()),
    };

    Ok(DotEnvyConfig {
        server,
        database,
        auth,
        stripe,
        free_plan,
        gemini,
        resend,
    })
}
