//! Send raw SDK commands to a Tello through the restriction layer.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tello_core::{Restrictions, RestrictionsUpdate};
use tello_sdk::{RestrictedTello, TelloConfig};

/// Send raw commands to a Tello and print each reply
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Drone IP address
    #[arg(long, default_value = "192.168.10.1")]
    ip: IpAddr,

    /// Drone command port
    #[arg(long, default_value_t = 8889)]
    port: u16,

    /// Local port for the command socket (0 picks a free one)
    #[arg(long, default_value_t = 8889)]
    local_port: u16,

    /// JSON restriction overrides applied on top of the defaults
    #[arg(long)]
    restrictions: Option<PathBuf>,

    /// Enter SDK mode (`command`) before sending anything else
    #[arg(long)]
    connect: bool,

    /// Seconds to wait for each reply
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Commands to send, e.g. "takeoff" "forward 50" "land"
    #[arg(required = true)]
    commands: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tello_cli::init_logging();
    let args = Args::parse();

    let mut restrictions = Restrictions::default();
    if let Some(path) = &args.restrictions {
        restrictions.apply(RestrictionsUpdate::from_json_file(path)?);
    }

    let config = TelloConfig {
        ip: args.ip,
        command_port: args.port,
        local_port: args.local_port,
        response_timeout: Duration::from_secs(args.timeout),
        ..Default::default()
    };
    let mut tello = RestrictedTello::bind(&config, restrictions).await?;
    println!("Talking to Tello at {}", config.drone_addr());

    if args.connect {
        match tello.connect().await {
            Ok(()) => println!("command -> ok"),
            Err(e) => {
                eprintln!("Failed to enter SDK mode: {}", e);
                return Err(e.into());
            }
        }
    }

    let mut failures = 0;
    for command in &args.commands {
        match tello.send_command(command).await {
            Ok(reply) => println!("{} -> {}", command, reply),
            Err(e) => {
                failures += 1;
                println!("{} -> {}", command, e);
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
