//! termfeed-view - CLI feed viewer.
//!
//! Connects to a feed server, subscribes to the named feed, and renders
//! the live byte stream on stdout. Connection health goes to stderr
//! through the tracing subscriber, so piping the feed output stays clean.
//!
//! ```text
//! termfeed-view [--host HOST] [--secure] FEED_ID
//! ```

use std::env;
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use termfeed::{
    Config, DisplayState, Error, FeedId, FeedViewer, LogIndicator, Result, TtySink, ViewerSession,
};

const USAGE: &str = "usage: termfeed-view [--host HOST] [--secure] FEED_ID";

#[derive(Debug, Default)]
struct CliArgs {
    feed: Option<String>,
    host: Option<String>,
    secure: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(argument) = args.next() {
        match argument.as_str() {
            "--host" => {
                let Some(host) = args.next() else {
                    return Err(Error::config("--host requires a value"));
                };
                cli.host = Some(host);
            }
            "--secure" => {
                cli.secure = true;
            }
            flag if flag.starts_with('-') => {
                return Err(Error::config(format!("unknown flag: {flag}")));
            }
            feed => {
                if cli.feed.is_some() {
                    return Err(Error::config("more than one feed id given"));
                }
                cli.feed = Some(feed.to_string());
            }
        }
    }

    Ok(cli)
}

async fn run() -> Result<DisplayState> {
    let cli = parse_args(env::args().skip(1))?;
    let feed_id = match cli.feed {
        Some(feed) => FeedId::new(feed)?,
        None => return Err(Error::config(USAGE)),
    };

    let mut config = Config::from_env()?.viewer;
    if let Some(host) = cli.host {
        config = config.with_host(host);
    }
    if cli.secure {
        config = config.with_secure(true);
    }

    let mut session = ViewerSession::open(&config.endpoint()?).await?;
    let mut viewer = FeedViewer::new(feed_id, TtySink::new(), LogIndicator::new());

    while let Some(event) = session.next_event().await {
        let step = viewer.handle_event(event);
        if step.subscribe {
            let feed_id = viewer.feed_id().to_string();
            session.send(&feed_id).await?;
        }
    }

    Ok(viewer.finalize())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(DisplayState::Error) => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "viewer failed");
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
