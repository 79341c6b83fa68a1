use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Weixin article publisher
#[derive(Parser)]
#[command(name = "publisher", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (defaults to PUBLISHER_PORT or 8000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Publish one article from the command line
    Publish {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        digest: String,
        /// File holding the article body HTML
        #[arg(long)]
        body: PathBuf,
        /// Cover image URL; the placeholder cover is used when omitted
        #[arg(long)]
        cover_url: Option<String>,
    },

    /// Fetch a fresh access token and report its expiry
    Token,

    /// Upload a single image
    Upload {
        /// Source image URL
        #[arg(long)]
        url: String,
        /// Upload as an inline-content image (returns a URL) instead of a cover
        #[arg(long)]
        inline: bool,
        /// Local file to upload instead of downloading the URL (inline only)
        #[arg(long, requires = "inline")]
        file: Option<PathBuf>,
    },
}
