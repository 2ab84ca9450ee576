//! Command-line client for a running searchify server.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde::Deserialize;

const STATUS_HEADER: &str = "x-status";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the searchify server
    #[arg(long, env = "SEARCHIFY_SERVER", default_value = "http://127.0.0.1:3000")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a search query and print the results
    Search { query: String },
    /// Index a page, or remove it when it is not searchable
    Publish { id: i64 },
    /// Remove a page from the index
    Unpublish { id: i64 },
    /// Index every publicly visible page
    Reindex,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query_string: String,
    matches: u64,
    results: Option<Vec<SearchResultItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchResultItem {
    title: String,
    link: String,
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct HookResponse {
    success: bool,
}

#[derive(Debug, Deserialize)]
struct ReindexResponse {
    indexed: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = Client::new();
    let base = args.server.trim_end_matches('/');

    match args.command {
        Command::Search { query } => {
            let response = client
                .get(format!("{base}/search"))
                .query(&[("q", query.as_str())])
                .send()
                .await
                .context("Failed to reach searchify server")?;
            let body: SearchResponse = checked(response).await?.json().await?;

            println!("{} matches for \"{}\"", body.matches, body.query_string);
            for item in body.results.unwrap_or_default() {
                println!("\n{}  {}", item.title, item.link);
                println!("  {}", item.snippet);
            }
        }
        Command::Publish { id } => {
            hook(&client, &format!("{base}/hooks/publish/{id}")).await?;
        }
        Command::Unpublish { id } => {
            hook(&client, &format!("{base}/hooks/unpublish/{id}")).await?;
        }
        Command::Reindex => {
            let response = client
                .post(format!("{base}/admin/reindex"))
                .send()
                .await
                .context("Failed to reach searchify server")?;
            let body: ReindexResponse = checked(response).await?.json().await?;
            println!("Indexed {} pages", body.indexed);
        }
    }

    Ok(())
}

async fn hook(client: &Client, url: &str) -> Result<()> {
    let response = client
        .post(url)
        .send()
        .await
        .context("Failed to reach searchify server")?;
    let response = checked(response).await?;

    if let Some(toast) = decode_toast(&response) {
        println!("{toast}");
    }

    let body: HookResponse = response.json().await?;
    if !body.success {
        bail!("The index was not updated");
    }
    Ok(())
}

async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: serde_json::Value = response.json().await.unwrap_or_default();
    let message = body
        .get("error")
        .and_then(|e| e.as_str())
        .unwrap_or("no details");
    bail!("Server responded {status}: {message}")
}

fn decode_toast(response: &Response) -> Option<String> {
    let raw = response.headers().get(STATUS_HEADER)?.to_str().ok()?;
    urlencoding::decode(raw).ok().map(|s| s.into_owned())
}
