//! Entry point for `arq-transport`.
//!
//! Parses CLI arguments, runs one simulation with either the alternating-bit
//! or the Go-Back-N configuration, and prints the run report.  All protocol
//! work is delegated to library modules; `main.rs` owns only process setup
//! (logging, argument parsing).

use anyhow::{Context as _, Result};
use arq_transport::config::{ABP_TIMEOUT, GBN_TIMEOUT};
use arq_transport::{ArqConfig, SimConfig, SimReport, Simulator};
use clap::{Args, Parser, Subcommand};

/// Reliable delivery over a simulated lossy, corrupting channel.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,

    #[command(flatten)]
    sim: SimArgs,

    /// Increase trace verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Mode {
    /// Window of one over sequence numbers {0, 1}.
    AlternatingBit {
        /// Retransmission timeout.
        #[arg(short, long, default_value_t = ABP_TIMEOUT)]
        timeout: f64,
    },
    /// Sliding window of N packets.
    GoBackN {
        /// Window size N.
        #[arg(short, long, default_value_t = 2)]
        window: usize,
        /// Number of distinct sequence numbers (default: 2 x window).
        #[arg(short = 'q', long)]
        seqnum_limit: Option<u16>,
        /// Retransmission timeout.
        #[arg(short, long, default_value_t = GBN_TIMEOUT)]
        timeout: f64,
    },
}

#[derive(Args)]
struct SimArgs {
    /// Number of messages to simulate.
    #[arg(short = 'n', long, default_value_t = 10, global = true)]
    num_msgs: u64,
    /// Packet loss probability.
    #[arg(short = 'l', long, default_value_t = 0.0, global = true)]
    loss: f64,
    /// Packet corruption probability.
    #[arg(short = 'c', long, default_value_t = 0.0, global = true)]
    corrupt: f64,
    /// Average time between messages from the application.
    #[arg(short = 'd', long, default_value_t = 1000.0, global = true)]
    delay: f64,
    /// Random seed.
    #[arg(short = 's', long, default_value_t = 1234, global = true)]
    seed: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still wins if set; -v only moves the default.
    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let arq = match cli.mode {
        Mode::AlternatingBit { timeout } => ArqConfig {
            timeout,
            ..ArqConfig::alternating_bit()
        },
        Mode::GoBackN {
            window,
            seqnum_limit,
            timeout,
        } => {
            let preset = ArqConfig::go_back_n(window);
            ArqConfig {
                seqnum_limit: seqnum_limit.unwrap_or(preset.seqnum_limit),
                timeout,
                ..preset
            }
        }
    };

    let config = SimConfig {
        arq,
        num_msgs: cli.sim.num_msgs,
        loss_prob: cli.sim.loss,
        corrupt_prob: cli.sim.corrupt,
        avg_interarrival: cli.sim.delay,
        seed: cli.sim.seed,
        ..SimConfig::default()
    };

    let sim = Simulator::new(config).context("invalid simulation parameters")?;
    print_report(&sim.run());
    Ok(())
}

fn print_report(report: &SimReport) {
    println!("simulation finished at time {:.3}", report.end_time);
    println!("  messages generated:     {}", report.generated);
    println!("  rejected (window full): {}", report.rejected);
    println!("  delivered:              {}", report.delivered.len());
    println!("  acknowledged at sender: {}", report.acked);
    println!("  sender packets:         {}", report.sender_packets);
    println!("  receiver packets:       {}", report.receiver_packets);
    println!("  lost:                   {}", report.lost);
    println!("  corrupted:              {}", report.corrupted);
    println!("  retransmissions:        {}", report.retransmissions);
    println!("  timeouts:               {}", report.timeouts);
    if report.truncated {
        println!("  (stopped at the time limit with events pending)");
    }
    for message in &report.delivered {
        log::info!("delivered {message}");
    }
}
