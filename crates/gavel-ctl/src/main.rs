//! gavel-ctl: command-line interface for the Gavel node daemon.

mod cmd;

use anyhow::{Context, Result, bail};

const DEFAULT_PORT: u16 = 9101;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Status,
    Peers,
    Auctions,
    Open { item_id: String, start_price: u64 },
    Bid { item_id: String, price: u64 },
    Close { item_id: String },
    Shutdown,
    Help,
}

fn parse_price(raw: &str) -> Result<u64> {
    raw.parse()
        .with_context(|| format!("price must be a non-negative integer, got '{raw}'"))
}

/// Split `--port` from the rest and decode the command.
fn parse_args(args: &[String]) -> Result<(u16, Command)> {
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args
                .get(i)
                .context("--port requires a value")?
                .parse()
                .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    let command = match remaining.as_slice() {
        ["status"] | [] => Command::Status,
        ["peers"] => Command::Peers,
        ["auctions"] => Command::Auctions,
        ["open", item, price] => Command::Open {
            item_id: item.to_string(),
            start_price: parse_price(price)?,
        },
        ["bid", item, price] => Command::Bid {
            item_id: item.to_string(),
            price: parse_price(price)?,
        },
        ["close", item] => Command::Close {
            item_id: item.to_string(),
        },
        ["shutdown"] => Command::Shutdown,
        ["help"] | ["--help"] | ["-h"] => Command::Help,
        other => bail!("unknown command: {}", other.join(" ")),
    };
    Ok((port, command))
}

fn print_usage() {
    println!("Usage: gavel-ctl [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  status                 Show node identity and counts");
    println!("  peers                  List known peers");
    println!("  auctions               List auctions on this node");
    println!("  open <item> <price>    Open an auction");
    println!("  bid <item> <price>     Place a bid");
    println!("  close <item>           Close an auction you own");
    println!("  shutdown               Stop the daemon");
    println!();
    println!("Options:");
    println!("  --port <port>   API port (default: {})", DEFAULT_PORT);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let (port, command) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{e:#}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    match command {
        Command::Status => cmd::status::cmd_status(port).await,
        Command::Peers => cmd::status::cmd_peers(port).await,
        Command::Auctions => cmd::auctions::cmd_auctions(port).await,
        Command::Open {
            item_id,
            start_price,
        } => cmd::auctions::cmd_open(port, &item_id, start_price).await,
        Command::Bid { item_id, price } => cmd::auctions::cmd_bid(port, &item_id, price).await,
        Command::Close { item_id } => cmd::auctions::cmd_close(port, &item_id).await,
        Command::Shutdown => cmd::status::cmd_shutdown(port).await,
        Command::Help => {
            print_usage();
            Ok(())
        }
    }
}
