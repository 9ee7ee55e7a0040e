//! sfreader - Salesforce session discovery and read-only SOQL queries.
//!
//! Works from browser-exported artifacts: a cookie-jar JSON file
//! (privileged surface) and/or a page-snapshot JSON file (unprivileged
//! surface). Resolves the org session from them and runs SOQL queries
//! against the org's REST API.

mod api;
mod browser;
mod config;
mod protocol;
mod session;

use std::io;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api::{ApiClient, ApiError};
use browser::{CookieJar, PageSnapshot, SnapshotCookieJar};
use config::Config;
use protocol::{handle_request, Request, Response};
use session::{resolve, Credential, CredentialStore, ResolveContext};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  sfreader resolve (--page <snapshot.json> | --host <hostname>) [--cookies <cookies.json>]");
    eprintln!("  sfreader query <soql> [--all] (--page ... | --host ...) [--cookies ...]");
    eprintln!("  sfreader objects (--page ... | --host ...) [--cookies ...]");
    eprintln!("  sfreader serve (--page ... | --host ...) [--cookies ...]");
    eprintln!("  sfreader set-api-version <version>");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("resolve") => cmd_resolve(&args),
        Some("query") => cmd_query(&args).await,
        Some("objects") => cmd_objects(&args).await,
        Some("serve") => cmd_serve(&args).await,
        Some("set-api-version") => cmd_set_api_version(&args),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

/// Value following a `--flag` argument, if present.
fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Load whichever browser surfaces were passed on the command line and
/// work out the current hostname.
struct Surfaces {
    jar: Option<SnapshotCookieJar>,
    page: Option<PageSnapshot>,
    hostname: String,
}

impl Surfaces {
    fn from_args(args: &[String]) -> Result<Self> {
        let jar = flag_value(args, "--cookies")
            .map(|p| SnapshotCookieJar::load(Path::new(p)))
            .transpose()?;
        let page = flag_value(args, "--page")
            .map(|p| PageSnapshot::load(Path::new(p)))
            .transpose()?;
        let hostname = flag_value(args, "--host")
            .map(str::to_string)
            .or_else(|| page.as_ref().map(|p| p.hostname.clone()))
            .ok_or_else(|| anyhow!("pass --host or --page to identify the current page"))?;
        Ok(Self {
            jar,
            page,
            hostname,
        })
    }

    fn context(&self) -> ResolveContext<'_> {
        ResolveContext {
            hostname: &self.hostname,
            cookies: self.jar.as_ref().map(|j| j as &dyn CookieJar),
            page: self.page.as_ref(),
        }
    }

    fn resolve(&self, store: &mut CredentialStore) -> Result<Credential> {
        resolve(&self.context(), store).map_err(|e| anyhow!(e))
    }
}

fn cmd_resolve(args: &[String]) -> Result<()> {
    let surfaces = Surfaces::from_args(args)?;
    let mut store = CredentialStore::new();
    let credential = surfaces.resolve(&mut store)?;
    info!(
        instance_url = %credential.instance_url(),
        org_id = credential.org_id().unwrap_or("unknown"),
        "session resolved"
    );
    println!("{}", serde_json::to_string_pretty(&credential)?);
    Ok(())
}

async fn cmd_query(args: &[String]) -> Result<()> {
    let soql = args
        .get(2)
        .filter(|a| !a.starts_with("--"))
        .ok_or_else(|| anyhow!("usage: sfreader query <soql> ..."))?;

    let surfaces = Surfaces::from_args(args)?;
    let mut store = CredentialStore::new();
    let credential = surfaces.resolve(&mut store)?;

    let config = Config::load().context("Failed to load config")?;
    let client = ApiClient::new(config.api_version())?;

    match run_query(&client, &credential, soql, args.iter().any(|a| a == "--all")).await {
        Ok(result) => {
            info!(total = result.total_size, "query complete");
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(err) => {
            if matches!(err, ApiError::SessionExpired(_)) {
                warn!("the API rejected the session; refresh the Salesforce page and re-run");
            }
            Err(err.into())
        }
    }
}

/// Run a query, optionally following `nextRecordsUrl` pages until done.
async fn run_query(
    client: &ApiClient,
    credential: &Credential,
    soql: &str,
    all: bool,
) -> Result<api::QueryResponse, ApiError> {
    let mut result = client.query(credential, soql).await?;
    while all && !result.done {
        let Some(next) = result.next_records_url.take() else {
            break;
        };
        let page = client.query_more(credential, &next).await?;
        result.records.extend(page.records);
        result.done = page.done;
        result.next_records_url = page.next_records_url;
    }
    Ok(result)
}

async fn cmd_objects(args: &[String]) -> Result<()> {
    let surfaces = Surfaces::from_args(args)?;
    let mut store = CredentialStore::new();
    let credential = surfaces.resolve(&mut store)?;

    let config = Config::load().context("Failed to load config")?;
    let client = ApiClient::new(config.api_version())?;

    let mut objects = client.list_objects(&credential).await?;
    objects.retain(|o| o.queryable);
    objects.sort_by(|a, b| a.label.cmp(&b.label));
    println!("{}", serde_json::to_string_pretty(&objects)?);
    Ok(())
}

fn cmd_set_api_version(args: &[String]) -> Result<()> {
    let version = args
        .get(2)
        .ok_or_else(|| anyhow!("usage: sfreader set-api-version <version>"))?;

    let mut config = Config::load().context("Failed to load config")?;
    config.api_version = version.clone();
    config.save().context("Failed to save config")?;
    println!("API version set to {}", version);
    Ok(())
}

/// Service the typed message protocol over stdin/stdout, one JSON
/// request per line, one JSON response per request.
async fn cmd_serve(args: &[String]) -> Result<()> {
    let surfaces = Surfaces::from_args(args)?;
    let mut store = CredentialStore::new();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    info!(hostname = %surfaces.hostname, "serving session requests on stdin");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => handle_request(request, &surfaces.context(), &mut store),
            Err(e) => Response::Error {
                error: format!("unrecognized request: {}", e),
            },
        };

        let mut out = serde_json::to_string(&response)?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}
