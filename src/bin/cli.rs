//! RespLite CLI Client
//!
//! Command-line interface for issuing single commands to a RESP store.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use resplite::{Client, ClientConfig, Result, Ttl};
use tracing_subscriber::{fmt, EnvFilter};

/// Size of the buffer replies are read into
const VALUE_CAPACITY: usize = 4096;

/// RespLite CLI
#[derive(Parser, Debug)]
#[command(name = "resplite-cli")]
#[command(about = "Minimal CLI for RESP key-value stores")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "6379")]
    port: u16,

    /// Reply timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    /// Command buffer capacity in bytes
    #[arg(short, long, default_value = "2048")]
    buffer: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping,

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Increment a counter by one
    Incr {
        key: String,
    },

    /// Decrement a counter by one
    Decr {
        key: String,
    },

    /// Increment a counter by an amount
    Incrby {
        key: String,

        #[arg(allow_hyphen_values = true)]
        by: i64,
    },

    /// Set a timeout on a key
    Expire {
        key: String,

        /// Timeout in seconds
        #[arg(allow_hyphen_values = true)]
        seconds: i64,
    },

    /// Show the remaining time to live of a key
    Ttl {
        key: String,
    },

    /// Publish a message on a channel
    Publish {
        channel: String,
        message: String,
    },

    /// Show the server clock
    Time,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,resplite=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = ClientConfig::builder()
        .host(&args.host)
        .port(args.port)
        .reply_timeout_ms(args.timeout_ms)
        .buffer_capacity(args.buffer)
        .build();

    match run(config, args.command) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("(error) {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: ClientConfig, command: Commands) -> Result<String> {
    tracing::debug!("Using {}", config.endpoint());
    let mut client = Client::new(config)?;
    let mut value = vec![0u8; VALUE_CAPACITY];

    let output = match command {
        Commands::Ping => {
            client.ping()?;
            "PONG".to_string()
        }
        Commands::Get { key } => match client.get(&key, &mut value)? {
            Some(len) => format!("\"{}\"", String::from_utf8_lossy(&value[..len])),
            None => "(nil)".to_string(),
        },
        Commands::Set { key, value } => {
            client.set(&key, &value)?;
            "OK".to_string()
        }
        Commands::Del { key } => format!("(integer) {}", client.del(&key)? as i64),
        Commands::Incr { key } => format!("(integer) {}", client.incr(&key)?),
        Commands::Decr { key } => format!("(integer) {}", client.decr(&key)?),
        Commands::Incrby { key, by } => format!("(integer) {}", client.incr_by(&key, by)?),
        Commands::Expire { key, seconds } => {
            format!("(integer) {}", client.expire(&key, seconds)? as i64)
        }
        Commands::Ttl { key } => match client.ttl(&key)? {
            Ttl::Missing => "(integer) -2".to_string(),
            Ttl::NoExpiry => "(integer) -1".to_string(),
            Ttl::ExpiresIn(remaining) => format!("(integer) {}", remaining.as_secs()),
        },
        Commands::Publish { channel, message } => {
            format!("(integer) {}", client.publish(&channel, &message)?)
        }
        Commands::Time => {
            let time = client.time()?;
            format!("1) \"{}\"\n2) \"{}\"", time.seconds, time.micros)
        }
    };

    client.disconnect();
    Ok(output)
}
