//! # Cashier Station (Caja)
//!
//! Event-driven cashier view: table totals arrive over the push channel
//! and reconcile into the ledger; the cashier drives selection, tip and
//! payment through simple line commands (stand-in for the grid UI).
//!
//! ```text
//! push channel ──► EventBridge ──► LedgerState ◄── command loop
//!                                      ▲
//! settlement service ◄── CheckoutSession (select / tip / pay)
//! ```
//!
//! The bridge is opened on entry and closed (with its unsubscribe)
//! on every exit path, including ctrl-c.

mod session;
mod state;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use comanda_client::{ClientConfig, SettlementApi, SettlementClient};
use comanda_core::types::{HistoryFilter, PaymentMethod, TableStatus};
use comanda_core::{Money, TableTotal};
use comanda_sync::{EventBridge, EventSink, StationConfig, SubscribePayload};

use crate::session::{CheckoutSession, SessionPhase};
use crate::state::LedgerState;

// =============================================================================
// Event Sink
// =============================================================================

/// Reconciles pushed totals snapshots into the ledger.
struct CashierSink {
    ledger: LedgerState,
}

impl EventSink for CashierSink {
    fn on_table_totals(&mut self, totals: Vec<TableTotal>) {
        info!(tables = totals.len(), "totals snapshot received");
        self.ledger.with_ledger_mut(|l| l.reconcile(&totals));
    }

    fn on_connection(&mut self, connected: bool) {
        if connected {
            println!("── channel connected; awaiting totals");
        } else {
            println!("── channel disconnected; reconnecting…");
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

fn print_grid(ledger: &LedgerState) {
    ledger.with_ledger(|l| {
        for entry in l.entries() {
            let mark = match entry.status {
                TableStatus::Free => " ",
                TableStatus::Occupied => "●",
                TableStatus::Settled => "✓",
            };
            println!(
                "table {:>2} {} {:?} {}",
                entry.table_id, mark, entry.status, entry.total
            );
        }
    });
}

fn print_session(session: &CheckoutSession) {
    if let Some(error) = session.error() {
        println!("!! {error}");
    }
    if let Some(notice) = session.notice() {
        println!("✔ {notice}");
    }

    let Some(detail) = session.detail() else {
        if session.phase() == SessionPhase::Idle {
            println!("select a table to review its order.");
        }
        return;
    };

    println!(
        "order #{} — table {} — {} items",
        detail.order_id,
        detail.table_number,
        detail.items.len()
    );
    for item in &detail.items {
        println!(
            "    {} × {}  {}  = {}",
            item.name, item.quantity, item.unit_price, item.subtotal
        );
    }

    if let Some(b) = session.breakdown() {
        println!("raw total:               {}", b.raw_total);
        println!("tip {:>3}% exact:          {}", b.tip_percent, b.exact_tip);
        println!("tip rounded (hundreds):  {}", b.rounded_tip);
        println!("exact total:             {}", b.exact_total);
        println!("total w/ rounded tip:    {}", b.total_with_rounded_tip);
        println!("final rounded total:     {}", b.final_rounded_total);
        println!("AMOUNT DUE:              {}", b.amount_due);
        if session.method() == PaymentMethod::Cash {
            println!("change:                  {}", b.change);
            if b.shortfall.is_positive() {
                println!("SHORT BY:                {}", b.shortfall);
            }
        }
    }
}

async fn print_history(client: &SettlementClient, limit: Option<u32>) {
    let filter = HistoryFilter {
        limit,
        ..Default::default()
    };
    match client.payment_history(&filter).await {
        Ok(records) if records.is_empty() => println!("no payments found."),
        Ok(records) => {
            for r in records {
                println!(
                    "{} · order #{} · table {} · {} + tip {} = {} · {} · {}",
                    r.payment_id,
                    r.order_id,
                    r.table_number,
                    r.raw_total,
                    r.tip,
                    r.amount_paid,
                    r.method,
                    r.paid_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Err(e) => println!("!! {e}"),
    }
}

// =============================================================================
// Command Loop
// =============================================================================

/// Handles one cashier command. Returns false to quit.
async fn handle_command(
    line: &str,
    session: &mut CheckoutSession,
    ledger: &LedgerState,
    client: &SettlementClient,
) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("tables") | Some("ls") | Some("") | None => print_grid(ledger),
        Some("select") => match parts.next().and_then(|s| s.parse::<u32>().ok()) {
            Some(table) => {
                session.select_table(client, table).await;
                print_session(session);
            }
            None => println!("usage: select <table>"),
        },
        Some("tip") => match parts.next().and_then(|s| s.parse::<u8>().ok()) {
            Some(pct) => {
                session.set_tip_percent(pct);
                print_session(session);
            }
            None => println!("usage: tip <0-100>"),
        },
        Some("method") => match parts.next() {
            Some("debit") => session.set_method(PaymentMethod::Debit),
            Some("credit") => session.set_method(PaymentMethod::Credit),
            Some("cash") => session.set_method(PaymentMethod::Cash),
            _ => println!("usage: method debit|credit|cash"),
        },
        Some("cash") => match parts.next().and_then(|s| s.parse::<i64>().ok()) {
            Some(amount) => {
                session.set_method(PaymentMethod::Cash);
                session.set_cash_tendered(Money::from_minor(amount));
                print_session(session);
            }
            None => println!("usage: cash <amount>"),
        },
        Some("pay") => {
            session.confirm(client, ledger).await;
            print_session(session);
        }
        Some("history") => {
            let limit = parts.next().and_then(|s| s.parse::<u32>().ok());
            print_history(client, limit).await;
        }
        Some("quit") | Some("exit") => return false,
        Some(other) => println!(
            "unknown command '{other}' (tables | select <n> | tip <pct> | method <m> | cash <amt> | pay | history | quit)"
        ),
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

    info!("starting cashier station");

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let config = StationConfig::load_or_default(config_path, "Caja 1")?;
    info!(
        station = %config.station.name,
        channel = %config.channel.url,
        service = %config.service.url,
        tables = config.tables.count,
        "configuration loaded"
    );

    let client = SettlementClient::new(&ClientConfig {
        base_url: config.service.url.clone(),
        timeout_secs: config.service.timeout_secs,
    })?;

    let ledger = LedgerState::new(config.tables.count);
    let bridge = EventBridge::open(
        config.transport_config(),
        SubscribePayload::new(&config.station.id, &config.station.name),
        CashierSink {
            ledger: ledger.clone(),
        },
    );

    let mut session = CheckoutSession::new();
    println!(
        "cashier ready (tables | select <n> | tip <pct> | method debit|credit|cash | cash <amt> | pay | history [limit] | quit)"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_command(line.trim(), &mut session, &ledger, &client).await {
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
    info!("cashier station stopped");
    Ok(())
}
