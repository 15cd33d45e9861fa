mod app;
mod auth;
mod billing;
mod config;
mod db;
mod entitlements;
mod error;
mod mealplans;
mod plans;
mod state;
#[cfg(test)]
mod test_support;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "mealplan=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let (app_state, pool) = state::AppState::init().await?;
    db::run_migrations(&pool).await;

    let app = app::build_app(app_state);
    app::serve(app).await
}
