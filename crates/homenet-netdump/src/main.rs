//! netdump - print derived addresses as JSON
//!
//! `netdump host` prints the addresses of one static host, `netdump network`
//! the subnets of one network id.

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use homenet_netdump::{
    host_dump, network_dump, HostRequest, MacAddr, NetworkRequest, Prefix,
    DEFAULT_MAX_STATIC_HOST_ID,
};

#[derive(Parser)]
#[command(name = "netdump")]
#[command(about = "Dump generated IP addresses for hosts or networks")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (to stderr)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Addresses of a static host within its networks
    Host {
        /// The host ID
        #[arg(long, allow_negative_numbers = true, default_value_t = -1)]
        id: i64,

        /// The MAC address of the host
        #[arg(long)]
        mac: Option<MacAddr>,

        /// Maximum ID of static hosts in the network
        #[arg(long, default_value_t = DEFAULT_MAX_STATIC_HOST_ID)]
        max_static_host_id: i64,

        /// IPv6 GUA network prefix
        #[arg(long)]
        ipv6_gua_prefix: Option<Prefix>,

        /// IPv6 ULA network prefix
        #[arg(long)]
        ipv6_ula_prefix: Prefix,

        /// IPv4 network prefix
        #[arg(long)]
        ipv4_prefix: Prefix,
    },
    /// Subnets of a network within larger parent prefixes
    Network {
        /// The network ID
        #[arg(long)]
        id: u64,

        /// Parent IPv4 prefix
        #[arg(long)]
        ipv4_prefix: Option<Prefix>,

        /// Parent IPv6 ULA prefix
        #[arg(long)]
        ipv6_ula_prefix: Option<Prefix>,

        /// Parent IPv6 GUA prefix
        #[arg(long)]
        ipv6_gua_prefix: Option<Prefix>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries the JSON, so logs go to stderr
    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let json = match args.command {
        Command::Host {
            id,
            mac,
            max_static_host_id,
            ipv6_gua_prefix,
            ipv6_ula_prefix,
            ipv4_prefix,
        } => {
            let dump = host_dump(&HostRequest {
                id,
                max_static_host_id,
                mac,
                ipv6_gua_prefix,
                ipv6_ula_prefix,
                ipv4_prefix,
            })?;
            serde_json::to_string(&dump)?
        }
        Command::Network {
            id,
            ipv4_prefix,
            ipv6_ula_prefix,
            ipv6_gua_prefix,
        } => {
            let dump = network_dump(&NetworkRequest {
                id,
                ipv4_prefix,
                ipv6_ula_prefix,
                ipv6_gua_prefix,
            })?;
            serde_json::to_string(&dump)?
        }
    };

    println!("{}", json);
    Ok(())
}
