//! # Kitchen Display Station
//!
//! Event-driven kitchen view: comandas arrive over the push channel and
//! land in the order queue; staff act on them through simple line
//! commands (stand-in for the display UI).
//!
//! ```text
//! push channel ──► EventBridge ──► QueueState ◄── command loop (staff)
//! ```
//!
//! The bridge is opened on entry and closed (with its unsubscribe)
//! on every exit path, including ctrl-c.

mod state;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use comanda_core::types::OrderNotice;
use comanda_sync::{EventBridge, EventSink, StationConfig, SubscribePayload};

use crate::state::QueueState;

// =============================================================================
// Event Sink
// =============================================================================

/// Routes validated push events into the queue.
struct KitchenSink {
    queue: QueueState,
}

impl EventSink for KitchenSink {
    fn on_new_order(&mut self, notice: OrderNotice) {
        let order_id = notice.order_id.clone();
        let table = notice.table_number;
        let inserted = self.queue.with_queue_mut(|q| q.ingest(notice, Utc::now()));
        if inserted {
            info!(%order_id, table, "comanda received");
            println!("── new comanda #{order_id} for table {table}");
        } else {
            // Duplicate delivery of a known order id; idempotent no-op
            info!(%order_id, "duplicate comanda ignored");
        }
    }

    fn on_connection(&mut self, connected: bool) {
        if connected {
            println!("── channel connected");
        } else {
            println!("── channel disconnected; reconnecting…");
        }
    }
}

// =============================================================================
// Command Loop
// =============================================================================

fn print_queue(queue: &QueueState) {
    queue.with_queue(|q| {
        if q.is_empty() {
            println!("no comandas yet…");
            return;
        }
        let now = Utc::now();
        for ticket in q.tickets() {
            println!(
                "#{} · table {} · {:?} · {}",
                ticket.order_id,
                ticket.table_number,
                ticket.state,
                ticket.elapsed_label(now)
            );
            for item in &ticket.items {
                match &item.note {
                    Some(note) => println!("    {} × {} — {}", item.name, item.quantity, note),
                    None => println!("    {} × {}", item.name, item.quantity),
                }
            }
        }
    });
}

/// Handles one staff command. Returns false to quit.
fn handle_command(queue: &QueueState, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("ls") | Some("") | None => print_queue(queue),
        Some("done") => match parts.next() {
            Some(id) => {
                if !queue.with_queue_mut(|q| q.toggle_state(id)) {
                    println!("no comanda #{id}");
                }
            }
            None => println!("usage: done <order-id>"),
        },
        Some("note") => match parts.next() {
            Some(id) => {
                let note = parts.collect::<Vec<_>>().join(" ");
                if !queue.with_queue_mut(|q| q.edit_note(id, &note)) {
                    println!("no comanda #{id}");
                }
            }
            None => println!("usage: note <order-id> <text>"),
        },
        Some("rm") => match parts.next() {
            Some(id) => {
                queue.with_queue_mut(|q| q.remove(id));
            }
            None => println!("usage: rm <order-id>"),
        },
        Some("clear") => queue.with_queue_mut(|q| q.clear()),
        Some("quit") | Some("exit") => return false,
        Some(other) => {
            println!("unknown command '{other}' (ls | done | note | rm | clear | quit)")
        }
    }
    true
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("starting kitchen display station");

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let config = StationConfig::load_or_default(config_path, "Cocina")?;
    info!(
        station = %config.station.name,
        channel = %config.channel.url,
        "configuration loaded"
    );

    let queue = QueueState::new();
    let bridge = EventBridge::open(
        config.transport_config(),
        SubscribePayload::new(&config.station.id, &config.station.name),
        KitchenSink {
            queue: queue.clone(),
        },
    );

    println!("kitchen display ready (ls | done <id> | note <id> <text> | rm <id> | clear | quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_command(&queue, line.trim()) {
                            break;
                        }
                    }
                    Ok(None) => break, // stdin closed
                    Err(e) => {
                        warn!(error = %e, "stdin error");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    // Guaranteed teardown: unsubscribe + transport shutdown
    bridge.close().await;
    info!("kitchen display stopped");
    Ok(())
}
