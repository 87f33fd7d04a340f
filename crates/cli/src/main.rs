use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use server::config::ServerConfig;

const DEFAULT_SERVER_URL: &str = "http://localhost:3001";
const WATCH_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "autofix-studio")]
#[command(about = "Automated issue resolution workflows", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of a running Autofix Studio server
    #[arg(long, global = true, default_value = DEFAULT_SERVER_URL)]
    server: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Autofix Studio server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        agent_url: Option<String>,
    },
    /// Start a new session for an issue
    Start {
        /// Issue key, e.g. SCRUM-1
        issue_key: String,

        /// Repository URL to fix (GitHub https or ssh)
        #[arg(long)]
        repo_url: Option<String>,
    },
    /// Execute the session's next phase
    Run { session_id: String },
    /// Approve the open gate
    Approve { session_id: String },
    /// Reject the open gate (not implemented server-side yet)
    Reject { session_id: String },
    /// Show a session's current state
    Status { session_id: String },
    /// Keep running phases until a gate, an error or completion
    Watch { session_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, agent_url } => serve(port, agent_url).await,
        Commands::Start {
            issue_key,
            repo_url,
        } => start(&cli.server, &issue_key, repo_url).await,
        Commands::Run { session_id } => run_phase(&cli.server, &session_id).await,
        Commands::Approve { session_id } => approve(&cli.server, &session_id).await,
        Commands::Reject { session_id } => reject(&cli.server, &session_id).await,
        Commands::Status { session_id } => status(&cli.server, &session_id).await,
        Commands::Watch { session_id } => watch(&cli.server, &session_id).await,
    }
}

async fn serve(port: Option<u16>, agent_url: Option<String>) -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = ServerConfig::from_env();
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(agent_url) = agent_url {
        config.agent_url = agent_url;
    }

    server::run(config).await
}

async fn start(server_url: &str, issue_key: &str, repo_url: Option<String>) -> Result<()> {
    let body = post(
        server_url,
        "/api/workflows",
        Some(json!({"issue_key": issue_key, "repo_url": repo_url})),
    )
    .await?;

    let state = &body["state"];
    println!(
        "{} session {} for {}",
        "Started".green().bold(),
        state["id"].as_str().unwrap_or("?"),
        issue_key.bold()
    );
    print_phases(state);
    println!(
        "\nNext: {} run {}",
        "autofix-studio".bold(),
        state["id"].as_str().unwrap_or("<id>")
    );

    Ok(())
}

async fn run_phase(server_url: &str, session_id: &str) -> Result<()> {
    let body = post(
        server_url,
        &format!("/api/workflows/{}/run", session_id),
        None,
    )
    .await?;

    print_outcome(&body);
    Ok(())
}

async fn approve(server_url: &str, session_id: &str) -> Result<()> {
    let body = post(
        server_url,
        &format!("/api/workflows/{}/approve", session_id),
        None,
    )
    .await?;

    println!("{}", "Approved.".green().bold());
    print_phases(&body["state"]);
    Ok(())
}

async fn reject(server_url: &str, session_id: &str) -> Result<()> {
    let result = post(
        server_url,
        &format!("/api/workflows/{}/reject", session_id),
        None,
    )
    .await;

    match result {
        Err(e) => {
            println!("{} {}", "Rejected:".yellow().bold(), e);
            Ok(())
        }
        Ok(_) => Ok(()),
    }
}

async fn status(server_url: &str, session_id: &str) -> Result<()> {
    let url = format!(
        "{}/api/workflows/{}",
        server_url.trim_end_matches('/'),
        session_id
    );
    let response = reqwest::get(&url)
        .await
        .with_context(|| format!("failed to reach {}", url))?;
    let body = read_body(response).await?;

    println!(
        "Session {} ({})",
        session_id.bold(),
        body["issue_key"].as_str().unwrap_or("?")
    );
    print_phases(&body);
    Ok(())
}

async fn watch(server_url: &str, session_id: &str) -> Result<()> {
    loop {
        let body = post(
            server_url,
            &format!("/api/workflows/{}/run", session_id),
            None,
        )
        .await?;

        print_outcome(&body);

        match body["status"].as_str() {
            Some("success") if body["state"]["status"] == "completed" => return Ok(()),
            Some("success") => tokio::time::sleep(WATCH_POLL_INTERVAL).await,
            Some("awaiting_approval") => {
                println!(
                    "\nRun {} approve {} to continue.",
                    "autofix-studio".bold(),
                    session_id
                );
                return Ok(());
            }
            _ => return Ok(()),
        }
    }
}

async fn post(server_url: &str, path: &str, body: Option<Value>) -> Result<Value> {
    let url = format!("{}{}", server_url.trim_end_matches('/'), path);
    let client = reqwest::Client::new();

    let request = match body {
        Some(body) => client.post(&url).json(&body),
        None => client.post(&url),
    };

    let response = request
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    read_body(response).await
}

async fn read_body(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or_else(|_| json!({}));

    // The run endpoint reports executor failures as a 500 with full state;
    // keep those as data so the caller can show the refreshed session.
    if !status.is_success() && body.get("state").is_none() {
        let message = body["message"]
            .as_str()
            .or_else(|| body["error"].as_str())
            .unwrap_or("request failed");
        bail!("{} ({})", message, status);
    }

    Ok(body)
}

fn print_outcome(body: &Value) {
    match body["status"].as_str() {
        Some("success") => {
            let state = &body["state"];
            if state["status"] == "completed" {
                println!("{}", "Workflow completed.".green().bold());
            } else {
                println!("{}", "Phase completed.".green());
            }
            print_phases(state);
        }
        Some("awaiting_approval") => {
            println!(
                "{} {}",
                "Awaiting approval:".yellow().bold(),
                body["message"].as_str().unwrap_or("")
            );
            print_phases(&body["state"]);
        }
        Some("error") => {
            println!(
                "{} {}",
                "Phase failed:".red().bold(),
                body["error"].as_str().unwrap_or("unknown error")
            );
            println!("Run again to retry the same phase.");
        }
        _ => println!("{}", body),
    }
}

fn print_phases(state: &Value) {
    let current = state["current_phase_index"].as_u64().unwrap_or(0);

    for (i, phase) in state["phases"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .enumerate()
    {
        let status = phase["status"].as_str().unwrap_or("pending");
        let glyph = match status {
            "completed" | "approved" => "✓".green(),
            "awaiting_approval" => "⏸".yellow(),
            "failed" => "✗".red(),
            _ if (i as u64) == current => "→".cyan(),
            _ => "·".dimmed(),
        };
        let description = phase["description"].as_str().unwrap_or("?");
        let gated = if phase["requires_approval"].as_bool().unwrap_or(false) {
            " (gated)".dimmed().to_string()
        } else {
            String::new()
        };

        println!("  {} {}{}", glyph, description, gated);
    }
}
