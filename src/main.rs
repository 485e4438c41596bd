use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use matome::api::{ApiClient, RSS_ITEM_LIMIT, SITEMAP_LIMIT};
use matome::config::Config;
use matome::project::{render_rss, render_sitemap};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default config file location (~/.config/matome/matome.toml), falling back
/// to the working directory when HOME is unset.
fn default_config_path() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home)
            .join(".config")
            .join("matome")
            .join("matome.toml"),
        Err(_) => PathBuf::from("matome.toml"),
    }
}

/// Atomically write `content` to `dst` using write-to-temp-then-rename.
fn atomic_write(dst: &Path, content: &[u8]) -> Result<()> {
    use std::time::{SystemTime, UNIX_EPOCH};
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = dst.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut temp_file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .with_context(|| format!("Failed to create temporary file '{}'", temp_path.display()))?;

    temp_file.write_all(content).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!("Failed to write to temporary file '{}'", temp_path.display())
    })?;
    temp_file.sync_all().with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!("Failed to sync temporary file '{}'", temp_path.display())
    })?;
    drop(temp_file);

    #[cfg(windows)]
    if dst.exists() {
        std::fs::remove_file(dst)
            .with_context(|| format!("Failed to replace '{}'", dst.display()))?;
    }

    std::fs::rename(&temp_path, dst).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!("Failed to move output into place at '{}'", dst.display())
    })
}

fn emit(output: Option<&Path>, document: &str) -> Result<()> {
    match output {
        Some(path) => {
            atomic_write(path, document.as_bytes())?;
            tracing::info!(path = %path.display(), bytes = document.len(), "Wrote document");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(document.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "matome", about = "News aggregation site front end")]
struct Args {
    /// Config file (TOML). Missing file means defaults.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Provider base URL, e.g. https://example.com/api
    #[arg(long, value_name = "URL", global = true)]
    api_base_url: Option<String>,

    /// Address to bind the HTTP server to
    #[arg(long, value_name = "ADDR", global = true)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the site over HTTP (default)
    Serve,
    /// Render the RSS feed once
    Rss {
        /// Write to FILE instead of stdout
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Render sitemap.xml once
    Sitemap {
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn load_config(args: &Args) -> Result<Config> {
    let path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = Config::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    config.apply_env();
    if let Some(base) = &args.api_base_url {
        config.api_base_url = base.clone();
    }
    if let Some(bind) = &args.bind {
        config.bind = bind.clone();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    match &args.command {
        None | Some(Command::Serve) => matome::server::serve(&config).await,
        Some(Command::Rss { output }) => {
            let client = ApiClient::new(&config.api_base_url, config.request_timeout())
                .context("Failed to create provider client")?
                .with_local_offset(config.utc_offset()?);
            let articles = client
                .list_articles(RSS_ITEM_LIMIT, 0)
                .await
                .context("Failed to fetch articles for RSS")?;
            let xml = render_rss(&config.site(), &articles)?;
            emit(output.as_deref(), &xml)
        }
        Some(Command::Sitemap { output }) => {
            let offset = config.utc_offset()?;
            let client = ApiClient::new(&config.api_base_url, config.request_timeout())
                .context("Failed to create provider client")?
                .with_local_offset(offset);
            let articles = client
                .list_articles(SITEMAP_LIMIT, 0)
                .await
                .context("Failed to fetch articles for sitemap")?;
            let today = chrono::Utc::now().with_timezone(&offset).date_naive();
            let xml = render_sitemap(&config.site(), &articles, today)?;
            emit(output.as_deref(), &xml)
        }
    }
}
