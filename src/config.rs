use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base: String,
    pub price_week: Option<String>,
    pub price_month: Option<String>,
    pub price_year: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub referer: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Public origin of the web app, used for checkout redirects.
    pub public_base_url: String,
    pub auth: AuthConfig,
    pub stripe: StripeConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let public_base_url = std::env::var("PUBLIC_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let auth = AuthConfig {
            secret: std::env::var("AUTH_JWT_SECRET")?,
            issuer: optional("AUTH_JWT_ISSUER"),
            audience: optional("AUTH_JWT_AUDIENCE"),
        };
        let stripe = StripeConfig {
            secret_key: std::env::var("STRIPE_SECRET_KEY")?,
            webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET")?,
            api_base: std::env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".into()),
            price_week: optional("STRIPE_PRICE_WEEK"),
            price_month: optional("STRIPE_PRICE_MONTH"),
            price_year: optional("STRIPE_PRICE_YEAR"),
        };
        let llm = LlmConfig {
            api_key: std::env::var("OPENAI_API_KEY")?,
            base_url: std::env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".into()),
            model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "openai/gpt-oss-120b".into()),
            timeout_secs: timeout_secs(std::env::var("LLM_TIMEOUT_SECS").ok()),
            referer: std::env::var("LLM_REFERER")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            title: std::env::var("LLM_TITLE").unwrap_or_else(|_| "My Meal Plan App".into()),
        };
        Ok(Self {
            database_url,
            public_base_url,
            auth,
            stripe,
            llm,
        })
    }
}

const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

// Unparsable values fall back to the default; zero is raised to one second.
fn timeout_secs(raw: Option<String>) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS)
        .max(1)
}

// Unset and blank values are treated the same.
fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
