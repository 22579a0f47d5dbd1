use userdir::{app, config::AppConfig, logging, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init("userdir=debug,axum=info,tower_http=info");

    let config = AppConfig::from_env()?;
    let addr = app::bind_addr(&config)?;
    let app_state = AppState::init(config).await?;

    app::serve(app::build_app(app_state), addr).await
}
