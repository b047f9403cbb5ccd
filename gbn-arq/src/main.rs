//! Entry point for `gbn-sim`.
//!
//! Reads an input file, feeds it 20 bytes at a time through a Go-Back-N
//! sender and receiver over a simulated lossy channel, and writes whatever the
//! receiver delivered to an output file.  All protocol work is delegated to
//! the library; `main.rs` owns only process setup (logging, argument parsing,
//! file I/O).

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use gbn_arq::config::TIME_UNIT;
use gbn_arq::{ChannelConfig, Message, ProtocolConfig, Simulator};

/// Go-Back-N transfer over a simulated lossy, corrupting channel.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// File whose contents A sends to B.
    input: PathBuf,

    /// Where B's delivered bytes are written.
    #[arg(short, long, default_value = "output.dat")]
    output: PathBuf,

    /// Probability that a packet is lost.
    #[arg(short, long, default_value_t = 0.0)]
    loss: f64,

    /// Probability that a packet is corrupted.
    #[arg(short, long, default_value_t = 0.0)]
    corrupt: f64,

    /// Mean time units between application messages.
    #[arg(short, long, default_value_t = 10)]
    interval: u32,

    /// Send at most this many messages (default: the whole file).
    #[arg(short, long)]
    messages: Option<usize>,

    /// Random seed for the channel.
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// Sender window size.
    #[arg(long, default_value_t = 8)]
    window: u32,

    /// Retransmission timeout in time units.  Kept above the channel's
    /// backlogged round trip (a full window takes ~44 units to drain), or
    /// lossy runs retransmit faster than the channel clears.
    #[arg(long, default_value_t = 60)]
    timeout: u32,

    /// Sender packet buffer capacity.
    #[arg(long, default_value_t = 1000)]
    buffer: u32,

    /// Give up after this many time units.
    #[arg(long, default_value_t = 1_000_000)]
    max_time: u32,

    /// Log every packet event (overridden by RUST_LOG).
    #[arg(short, long)]
    trace: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set RUST_LOG to control verbosity.
    let default_filter = if cli.trace { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let input = fs::read(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let mut messages = Message::chunk(&input);
    if let Some(limit) = cli.messages {
        messages.truncate(limit);
    }

    let protocol = ProtocolConfig {
        window_size: cli.window,
        timer_duration: TIME_UNIT * cli.timeout,
        buffer_capacity: cli.buffer,
    };
    let channel = ChannelConfig {
        loss_prob: cli.loss,
        corrupt_prob: cli.corrupt,
        mean_interval: TIME_UNIT * cli.interval,
        max_time: TIME_UNIT * cli.max_time,
        seed: cli.seed,
        faults: Vec::new(),
    };

    let mut sim = Simulator::new(&protocol, channel).context("invalid configuration")?;
    let total = messages.len();
    let report = sim.run(messages);

    fs::write(&cli.output, report.delivered_bytes())
        .with_context(|| format!("writing {}", cli.output.display()))?;

    println!(
        "delivered {}/{} messages in {:.1} time units{}",
        report.delivered.len(),
        total,
        report.finished_at.as_secs_f64() / TIME_UNIT.as_secs_f64(),
        if report.completed { "" } else { " (incomplete)" }
    );
    println!(
        "channel: {} packets, {} lost, {} corrupted",
        report.channel.packets_sent, report.channel.lost, report.channel.corrupted
    );
    println!(
        "A: {} sent, {} retransmitted, {} acks accepted, {} ignored, {} dropped",
        report.sender.transmitted,
        report.sender.retransmitted,
        report.sender.acks_accepted,
        report.sender.acks_rejected,
        report.sender.messages_dropped
    );
    println!(
        "B: {} delivered, {} corrupt, {} out of order, {} replies",
        report.receiver.delivered,
        report.receiver.corrupt,
        report.receiver.out_of_order,
        report.receiver.replies_sent
    );

    if !report.completed {
        log::warn!("transfer did not complete; output is truncated");
    }
    Ok(())
}
