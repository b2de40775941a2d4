//! vigil bot binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `VIGIL_*` environment variables, opens the SQLite store, and long-polls
//! the Telegram bot API.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use teloxide::Bot;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vigil_bot::{App, BotConfig, Timings, platform::ChatPlatform as _, telegram::TelegramPlatform};
use vigil_core::{profanity::ProfanityMatcher, store::ModerationStore};
use vigil_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Vigil group moderation bot")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("VIGIL"))
    .build()
    .context("failed to read config file")?;

  let bot_cfg: BotConfig = settings
    .try_deserialize()
    .context("failed to deserialise BotConfig")?;

  let store_path = expand_tilde(&bot_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if !bot_cfg.profanity_words.is_empty() {
    let added = store
      .add_vocabulary(bot_cfg.profanity_words.clone())
      .await
      .context("failed to seed profanity vocabulary")?;
    tracing::info!(added, "seeded profanity vocabulary");
  }

  let vocabulary = store
    .vocabulary()
    .await
    .context("failed to load profanity vocabulary")?;
  let matcher = ProfanityMatcher::new(vocabulary);
  if matcher.is_empty() {
    tracing::warn!("profanity vocabulary is empty; profanity checks will never match");
  }

  let bot = Bot::new(&bot_cfg.token);
  let platform = TelegramPlatform::connect(bot.clone())
    .await
    .context("failed to reach the bot API")?;

  tracing::info!(
    bot = platform.bot_username(),
    words = matcher.len(),
    "starting long polling"
  );
  let app = Arc::new(App::new(platform, store, matcher, Timings::from(&bot_cfg)));
  vigil_bot::telegram::run(bot, app).await;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
