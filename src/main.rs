use anyhow::{Context, Result};
use feedhal::config::{Config, Credentials};
use feedhal::feed::twitter::TwitterClient;
use feedhal::learner::MarkovLearner;
use feedhal::pipeline::{PollRespondLoop, SystemClock};
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feedhal=info")),
        )
        .init();

    let config = Config::load(Path::new("config.toml"))?;

    // Load saved keys from .env (real env vars take precedence)
    Config::load_env_file();
    let credentials = Credentials::from_env().context("missing feed credentials")?;

    let feed = TwitterClient::new(&config.feed, credentials)?;
    let learner = MarkovLearner::open(&config.learner)?;

    tracing::info!(
        query = %config.feed.query,
        topic = %config.response.topic,
        dry_run = config.bot.dry_run,
        initial_countdown = config.throttle.initial_countdown,
        "starting poll loop"
    );

    let mut bot = PollRespondLoop::new(&config, feed, learner, SystemClock);
    bot.run().await
}
