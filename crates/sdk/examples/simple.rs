//! Simple SDK Example
//!
//! Walks the whole counter day: call, recall, adjust, and an admin
//! content edit, against a running daemon.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    cargo run --package loket-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --package loket-sdk --example simple
//!    ```

use loket_sdk::{AdminPanel, LoketClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Loket SDK - Simple Example");
    println!("==========================\n");

    // 1. Connect to daemon
    println!("1. Connecting to daemon...");
    let client = LoketClient::connect("http://127.0.0.1:9639")?;
    let status = client.status().await?;
    println!(
        "   ✓ Connected (daemon v{}, speech engine {})\n",
        status.version,
        if status.engine_available {
            "available"
        } else {
            "missing"
        }
    );

    // 2. Call the next customer at the teller line
    println!("2. Calling the next teller customer...");
    let outcome = client.call("teller").await?;
    println!("   ✓ Now serving {}\n", outcome.ticket);

    // 3. Repeat the announcement for whoever missed it
    println!("3. Recalling...");
    match client.recall("teller").await?.ticket {
        Some(ticket) => println!("   ✓ Repeated {}\n", ticket),
        None => println!("   ○ Queue is at zero, nothing to repeat\n"),
    }

    // 4. Correct a miscount
    println!("4. Adjusting the counter back by one...");
    let adjusted = client.adjust("teller", -1).await?;
    println!("   ✓ Teller line now at {}\n", adjusted.number);

    // 5. Edit branch content through an admin session
    println!("5. Editing branch content...");
    let panel = AdminPanel::connect("http://127.0.0.1:9639").await?;
    let mut session = panel.begin_edit();
    session.draft_mut()["greeting"] = serde_json::json!("Selamat datang");
    let saved = session.save(false).await.map_err(|(_, e)| e)?;
    println!("   ✓ Saved; greeting is now {}\n", saved["greeting"]);

    // 6. Read the event trail this example produced
    println!("6. Reading the event feed...");
    let page = client.events(0, 0).await?;
    for event in page.events.iter().rev().take(5).rev() {
        println!("   [{}] {:?} {} -> {}", event.seq, event.kind, event.line, event.number);
    }

    println!("\n✓ Example completed successfully!");

    Ok(())
}
