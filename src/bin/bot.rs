use userdir::{bot, config::BotConfig, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init("userdir=debug,reqwest=info");

    let config = BotConfig::from_env()?;
    bot::run(config).await
}
