use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use doppler_proxy::classify::{classify, RequestContext};
use doppler_proxy::events::TrafficEvent;
use doppler_proxy::filters::catalog;
use doppler_proxy::filters::loader::{read_directory, write_file};
use doppler_proxy::filters::prefixes::PrefixDocument;
use doppler_proxy::filters::FilterLoader;

#[derive(Parser)]
#[command(name = "doppler-cli")]
#[command(about = "Tooling and management CLI for doppler-proxy", long_about = None)]
struct Cli {
    /// Admin API base URL
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key
    #[arg(short, long, default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single request offline
    Classify {
        /// Filter directory; the built-in catalog is used when omitted
        #[arg(long)]
        filters: Option<PathBuf>,
        /// Peer address of the request
        #[arg(long)]
        address: String,
        #[arg(long, default_value = "")]
        user_agent: String,
        #[arg(long, default_value = "/")]
        url: String,
        /// Value of the x-forwarded-for header
        #[arg(long)]
        forwarded_for: Option<String>,
    },
    /// Load a filter directory and report each file
    CheckFilters { dir: PathBuf },
    /// Build a filter file from vendor prefix documents
    Import {
        /// Known agent family (openai, google, bing, perplexity)
        #[arg(long)]
        name: String,
        #[arg(long, required = true, num_args = 1..)]
        prefixes: Vec<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Check proxy system status
    Status,
    /// List active filters
    Filters,
    /// Reload filters from their sources
    Reload,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify {
            filters,
            address,
            user_agent,
            url,
            forwarded_for,
        } => {
            let loader = match filters {
                Some(dir) => FilterLoader::new(Vec::new(), Some(dir), false),
                None => FilterLoader::new(Vec::new(), None, true),
            };
            let set = loader.load()?;

            let mut headers = HeaderMap::new();
            if !user_agent.is_empty() {
                headers.insert(reqwest::header::USER_AGENT, HeaderValue::from_str(&user_agent)?);
            }
            if let Some(xff) = forwarded_for {
                headers.insert("x-forwarded-for", HeaderValue::from_str(&xff)?);
            }
            let ctx = RequestContext::new(address, headers, url);

            match classify(&ctx, set.filters()) {
                Some(result) => {
                    let event = TrafficEvent::from(&result);
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
                None => println!("no match"),
            }
        }
        Commands::CheckFilters { dir } => {
            let mut failures = 0;
            for (path, result) in read_directory(&dir)? {
                match result {
                    Ok(filter) => println!(
                        "ok    {} ({}): {} ranges, {} user agents, {} utm",
                        filter.name(),
                        path.display(),
                        filter.ip_ranges().len(),
                        filter.user_agent_markers().len(),
                        filter.utm_markers().len()
                    ),
                    Err(e) => {
                        failures += 1;
                        println!("error {}: {}", path.display(), e);
                    }
                }
            }
            if failures > 0 {
                return Err(format!("{} filter file(s) failed to load", failures).into());
            }
        }
        Commands::Import { name, prefixes, out } => {
            let agent = catalog::lookup(&name).ok_or_else(|| format!("unknown agent family: {}", name))?;
            let mut ranges = Vec::new();
            for path in &prefixes {
                ranges.extend(PrefixDocument::from_file(path)?.ranges());
            }
            let filter = agent.to_filter(ranges);
            let written = write_file(&out, &filter)?;
            println!(
                "wrote {} with {} ranges",
                written.display(),
                filter.ip_ranges().len()
            );
        }
        Commands::Status => admin_get(&cli.url, &cli.key, "/admin/status").await?,
        Commands::Filters => admin_get(&cli.url, &cli.key, "/admin/filters").await?,
        Commands::Reload => {
            let client = reqwest::Client::new();
            let res = client
                .post(format!("{}/admin/filters/reload", cli.url))
                .headers(auth_headers(&cli.key)?)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn auth_headers(key: &str) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    Ok(headers)
}

async fn admin_get(base: &str, key: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}{}", base, path))
        .headers(auth_headers(key)?)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
