use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use publisher::api::{self, AppState};
use publisher::config::{self, Config};
use publisher::models::Article;
use publisher::publish::{ContentPublisher, WeixinPublisher};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::Publish {
            title,
            digest,
            body,
            cover_url,
        }) => {
            let body_html = tokio::fs::read_to_string(&body)
                .await
                .with_context(|| format!("failed to read {}", body.display()))?;
            let mut article = Article::new(title, digest, body_html);
            article.cover_image_url = cover_url;
            handle_publish(&cfg, article).await
        }
        Some(cli::Commands::Token) => handle_token(&cfg).await,
        Some(cli::Commands::Upload { url, inline, file }) => {
            handle_upload(&cfg, &url, inline, file).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "publisher=debug,tower_http=debug".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_publisher(cfg: &Config) -> anyhow::Result<WeixinPublisher> {
    cfg.require_identity()?;
    Ok(WeixinPublisher::from_config(cfg)?)
}

async fn run_server(cfg: Config, port: u16) -> anyhow::Result<()> {
    let publisher = build_publisher(&cfg)?;
    tracing::info!(
        api_base = %cfg.api_base,
        automated_publish = cfg.automated_publish,
        output_dir = %cfg.output_dir.display(),
        "publisher configured"
    );

    tokio::fs::create_dir_all(&cfg.output_dir)
        .await
        .with_context(|| format!("failed to create {}", cfg.output_dir.display()))?;

    let state = Arc::new(AppState {
        archive: publisher.archive().clone(),
        publisher: Arc::new(publisher),
    });

    let public_dir = cfg.public_dir.is_dir().then(|| cfg.public_dir.clone());
    if public_dir.is_none() {
        tracing::warn!(
            public_dir = %cfg.public_dir.display(),
            "public directory not found; static files disabled"
        );
    }
    let app = api::app(state, public_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("publisher listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_publish(cfg: &Config, article: Article) -> anyhow::Result<()> {
    let publisher = build_publisher(cfg)?;
    let result = publisher.publish(&article).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn handle_token(cfg: &Config) -> anyhow::Result<()> {
    let publisher = build_publisher(cfg)?;
    let cred = publisher.credentials().refresh().await?;
    println!(
        "access token valid for {}s (expires at {})",
        cred.expires_in(),
        cred.expires_at().to_rfc3339()
    );
    Ok(())
}

async fn handle_upload(
    cfg: &Config,
    url: &str,
    inline: bool,
    file: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    let publisher = build_publisher(cfg)?;

    if inline {
        let buffer = match file {
            Some(path) => Some(bytes::Bytes::from(
                tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?,
            )),
            None => None,
        };
        let image_url = publisher.media().upload_inline_asset(url, buffer).await?;
        println!("{}", image_url);
    } else {
        let media_id = publisher.media().upload_cover_asset(url).await?;
        println!("{}", media_id);
    }
    Ok(())
}
