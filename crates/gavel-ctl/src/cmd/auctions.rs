//! Auction listing and open / bid / close commands.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::http::{auction_url, base_url, get_json, post_json, post_json_body};

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct AuctionRecord {
    item_id: String,
    owner: String,
    current_price: u64,
    highest_bidder: Option<String>,
    status: String,
}

#[derive(Deserialize)]
struct AuctionsResponse {
    auctions: Vec<AuctionRecord>,
}

#[derive(Deserialize)]
struct CommandResponse {
    record: AuctionRecord,
    broadcast_to: usize,
}

#[derive(Serialize)]
struct OpenRequest<'a> {
    item_id: &'a str,
    start_price: u64,
}

#[derive(Serialize)]
struct BidRequest {
    price: u64,
}

fn short(id: &str) -> &str {
    &id[..id.len().min(16)]
}

fn print_record(r: &AuctionRecord) {
    println!("  ┌─ {}", r.item_id);
    println!("  │  owner   : {}", short(&r.owner));
    println!("  │  price   : {}", r.current_price);
    println!(
        "  │  bidder  : {}",
        r.highest_bidder.as_deref().map(short).unwrap_or("-")
    );
    println!("  └─ status  : {}", r.status);
}

fn print_command(verb: &str, resp: &CommandResponse) {
    println!("{} '{}' (sent to {} peers)", verb, resp.record.item_id, resp.broadcast_to);
    print_record(&resp.record);
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_auctions(port: u16) -> Result<()> {
    let resp: AuctionsResponse = get_json(&format!("{}/auctions", base_url(port))).await?;

    if resp.auctions.is_empty() {
        println!("No auctions.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Auctions ({})", resp.auctions.len());
    println!("═══════════════════════════════════════");
    for r in &resp.auctions {
        print_record(r);
    }
    Ok(())
}

pub async fn cmd_open(port: u16, item_id: &str, start_price: u64) -> Result<()> {
    let resp: CommandResponse = post_json_body(
        &format!("{}/auctions", base_url(port)),
        &OpenRequest {
            item_id,
            start_price,
        },
    )
    .await?;
    print_command("Opened", &resp);
    Ok(())
}

pub async fn cmd_bid(port: u16, item_id: &str, price: u64) -> Result<()> {
    let url = auction_url(port, item_id, "bid")?;
    let resp: CommandResponse = post_json_body(url.as_str(), &BidRequest { price }).await?;
    print_command("Bid on", &resp);
    Ok(())
}

pub async fn cmd_close(port: u16, item_id: &str) -> Result<()> {
    let url = auction_url(port, item_id, "close")?;
    let resp: CommandResponse = post_json(url.as_str()).await?;
    print_command("Closed", &resp);
    Ok(())
}
