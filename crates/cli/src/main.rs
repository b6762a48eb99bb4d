//! Loket CLI - Command-line interface for the Loket queue daemon
//! Operator commands, live watching and audio administration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Write;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9639";

/// How long one watch poll is held open server-side, in ms
const WATCH_WAIT_MS: u64 = 25_000;

#[derive(Parser)]
#[command(name = "loket")]
#[command(about = "Loket queue daemon CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "LOKET_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Call the next number on a line
    Call {
        /// Service line: teller or cs
        line: String,
    },

    /// Repeat the announcement for the current number
    Recall {
        /// Service line: teller or cs
        line: String,
    },

    /// Apply a correction to a line's counter
    Adjust {
        /// Service line: teller or cs
        line: String,

        /// Signed correction, e.g. -1 after a miscount
        #[arg(allow_hyphen_values = true)]
        delta: i32,
    },

    /// Reset a line's counter to zero
    Reset {
        /// Service line: teller or cs
        line: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show counters and daemon health
    Status,

    /// Follow the queue event feed live
    Watch {
        /// Start after this sequence number (0 = full history)
        #[arg(long, default_value = "0")]
        from: i64,
    },

    /// Interactive operator panel for one line
    Panel {
        /// Service line: teller or cs
        #[arg(default_value = "teller")]
        line: String,
    },

    /// List the voices the speech engine offers
    Voices,

    /// Show or change announcement audio settings
    Audio {
        /// Voice identifier from `loket voices`
        #[arg(long)]
        voice: Option<String>,

        /// Speaking pitch, 0.5 - 2.0
        #[arg(long)]
        pitch: Option<f32>,

        /// Speaking rate, 0.5 - 2.0
        #[arg(long)]
        rate: Option<f32>,

        /// Volume, 0.0 - 1.0
        #[arg(long)]
        volume: Option<f32>,
    },

    /// Announce the current number without advancing the queue
    TestVoice {
        /// Service line: teller or cs
        #[arg(default_value = "teller")]
        line: String,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct VoiceRow {
    id: String,
    name: String,
    language: String,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

/// Prompt on stdout and read one line from stdin
fn ask(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

fn print_call(result: &serde_json::Value, verb: &str) {
    let ticket = result["ticket"].as_str().unwrap_or("?");
    println!("{}", format!("✓ {} {}", verb, ticket).green().bold());
    if !result["announced"].as_bool().unwrap_or(false) {
        println!("{}", "  (announcement was not queued)".yellow());
    }
}

async fn show_state(rpc_url: &str) -> Result<()> {
    let state = call_rpc(rpc_url, "queue.state.v1", json!({})).await?;
    println!(
        "  {} A-{:03}    {} B-{:03}",
        "Teller:".bold(),
        state["teller"].as_u64().unwrap_or(0),
        "Customer Service:".bold(),
        state["cs"].as_u64().unwrap_or(0),
    );
    Ok(())
}

async fn run_panel(rpc_url: &str, line: &str) -> Result<()> {
    println!("{}", format!("Operator panel, line: {}", line).cyan().bold());
    println!("  n = call next   r = recall   0 = reset   s = state   q = quit");
    println!();

    loop {
        let choice = ask("> ")?;
        match choice.as_str() {
            "n" => {
                let result =
                    call_rpc(rpc_url, "queue.call.v1", json!({ "line": line })).await?;
                print_call(&result, "Called");
            }
            "r" => {
                let result =
                    call_rpc(rpc_url, "queue.recall.v1", json!({ "line": line })).await?;
                if result["number"].is_null() {
                    println!("{}", "Nothing to repeat, queue is at zero".yellow());
                } else {
                    print_call(&result, "Repeating");
                }
            }
            "0" => {
                let confirm = ask(&format!("Reset {} to zero? [y/N] ", line))?;
                if confirm.eq_ignore_ascii_case("y") {
                    call_rpc(rpc_url, "queue.reset.v1", json!({ "line": line })).await?;
                    println!("{}", format!("✓ {} reset to 0", line).green().bold());
                } else {
                    println!("Cancelled.");
                }
            }
            "s" => show_state(rpc_url).await?,
            "q" => break,
            "" => {}
            other => println!("{}", format!("Unknown command: {}", other).yellow()),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Call { line } => {
            let result = call_rpc(&cli.rpc_url, "queue.call.v1", json!({ "line": line })).await?;
            print_call(&result, "Called");
        }

        Commands::Recall { line } => {
            let result =
                call_rpc(&cli.rpc_url, "queue.recall.v1", json!({ "line": line })).await?;

            if result["number"].is_null() {
                println!("{}", "Nothing to repeat, queue is at zero".yellow());
            } else {
                print_call(&result, "Repeating");
            }
        }

        Commands::Adjust { line, delta } => {
            let result = call_rpc(
                &cli.rpc_url,
                "queue.adjust.v1",
                json!({ "line": line, "delta": delta }),
            )
            .await?;

            println!(
                "{}",
                format!("✓ {} adjusted to {}", line, result["number"])
                    .green()
                    .bold()
            );
        }

        Commands::Reset { line, yes } => {
            if !yes {
                let confirm = ask(&format!("Reset {} to zero? [y/N] ", line))?;
                if !confirm.eq_ignore_ascii_case("y") {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            call_rpc(&cli.rpc_url, "queue.reset.v1", json!({ "line": line })).await?;
            println!("{}", format!("✓ {} reset to 0", line).green().bold());
        }

        Commands::Status => {
            println!("{}", "Queue Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "system.status.v1", json!({})).await {
                Ok(status) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    show_state(&cli.rpc_url).await?;
                    println!();
                    println!(
                        "  {} {}",
                        "Announcer:".bold(),
                        status["announcer_state"].as_str().unwrap_or("?"),
                    );
                    println!(
                        "  {} {}",
                        "Pending announcements:".bold(),
                        status["pending_announcements"]
                    );
                    let engine = if status["engine_available"].as_bool().unwrap_or(false) {
                        "available".green()
                    } else {
                        "missing (chime-only)".yellow()
                    };
                    println!("  {} {}", "Speech engine:".bold(), engine);
                    println!();
                    println!("  {} {}", "Events logged:".bold(), status["latest_seq"]);
                    println!(
                        "  {} v{}, up {} seconds",
                        "Daemon:".bold(),
                        status["version"].as_str().unwrap_or("?"),
                        status["uptime_seconds"]
                    );
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::Watch { from } => {
            println!("{}", "Watching queue events (Ctrl+C to stop)".cyan().bold());
            let mut after_seq = from;

            loop {
                let page = call_rpc(
                    &cli.rpc_url,
                    "queue.events.v1",
                    json!({ "after_seq": after_seq, "wait_ms": WATCH_WAIT_MS }),
                )
                .await?;

                if let Some(events) = page["events"].as_array() {
                    for event in events {
                        println!(
                            "[{}] {} {} -> {}",
                            event["seq"],
                            event["kind"].as_str().unwrap_or("?").bold(),
                            event["line"].as_str().unwrap_or("?"),
                            event["number"]
                        );
                    }
                }

                after_seq = page["latest_seq"].as_i64().unwrap_or(after_seq);
            }
        }

        Commands::Panel { line } => {
            run_panel(&cli.rpc_url, &line).await?;
        }

        Commands::Voices => {
            let result = call_rpc(&cli.rpc_url, "voices.list.v1", json!({})).await?;

            if !result["available"].as_bool().unwrap_or(false) {
                println!("{}", "Speech engine missing, announcements are chime-only".yellow());
            }

            let voices: Vec<VoiceRow> =
                serde_json::from_value(result["voices"].clone()).unwrap_or_default();
            if voices.is_empty() {
                println!("No voices reported.");
            } else {
                let table = Table::new(voices).to_string();
                println!("{}", table);
            }
        }

        Commands::Audio {
            voice,
            pitch,
            rate,
            volume,
        } => {
            let current = call_rpc(&cli.rpc_url, "audio.get.v1", json!({})).await?;
            let mut settings = current["settings"].clone();

            let changing =
                voice.is_some() || pitch.is_some() || rate.is_some() || volume.is_some();

            if changing {
                if let Some(voice) = voice {
                    settings["voiceURI"] = json!(voice);
                }
                if let Some(pitch) = pitch {
                    settings["pitch"] = json!(pitch);
                }
                if let Some(rate) = rate {
                    settings["rate"] = json!(rate);
                }
                if let Some(volume) = volume {
                    settings["volume"] = json!(volume);
                }

                let result = call_rpc(
                    &cli.rpc_url,
                    "audio.set.v1",
                    json!({ "settings": settings }),
                )
                .await?;
                settings = result["settings"].clone();
                println!("{}", "✓ Audio settings saved".green().bold());
            }

            println!();
            let voice_id = settings["voiceURI"].as_str().unwrap_or("");
            let voice_label = if voice_id.is_empty() {
                "(engine default)"
            } else {
                voice_id
            };
            println!("  {} {}", "Voice:".bold(), voice_label);
            println!("  {} {}", "Pitch:".bold(), settings["pitch"]);
            println!("  {} {}", "Rate:".bold(), settings["rate"]);
            println!("  {} {}", "Volume:".bold(), settings["volume"]);
        }

        Commands::TestVoice { line } => {
            let result =
                call_rpc(&cli.rpc_url, "announce.test.v1", json!({ "line": line })).await?;

            if result["announced"].as_bool().unwrap_or(false) {
                println!("{}", "✓ Test announcement queued".green().bold());
            } else {
                println!("{}", "Announcer is not running".yellow());
            }
        }
    }

    Ok(())
}
