use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};

use vertex::config::Config;
use vertex::{
    add_downstream_addresses, control_stop, deliver, get_downstream_addresses_with, vlog,
    vlog_warn, Anchor, DataFlow, Mailbox, Registry, Result, Vertex,
};

/// Vertex - run a single dataflow vertex against stand-in workers
#[derive(Parser, Debug)]
#[command(name = "vertex")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    VERTEX_DEBUG=1     Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Config file (defaults to ~/.vertex/vertex.toml)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Build one vertex, feed it payloads and print what each worker got
    Run {
        /// Transform as module:function
        #[arg(short, long, default_value = "math:double")]
        transform: String,

        /// Relay method (defaults to the configured one)
        #[arg(short, long, value_enum)]
        method: Option<Method>,

        /// Number of downstream workers
        #[arg(short, long, default_value_t = 2)]
        workers: usize,

        /// Payloads, parsed as JSON where possible
        payloads: Vec<String>,
    },

    /// List the builtin transforms
    Transforms,

    /// Print the effective configuration
    Config {
        /// Also write it back to the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    RoundRobin,
    Broadcast,
}

impl From<Method> for DataFlow {
    fn from(m: Method) -> Self {
        match m {
            Method::RoundRobin => DataFlow::RoundRobin,
            Method::Broadcast => DataFlow::Broadcast,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    vertex::log::init(config.log_level(), cli.debug, config.log_path()?);

    match cli.command {
        Command::Run {
            transform,
            method,
            workers,
            payloads,
        } => {
            let method = method.map(DataFlow::from).unwrap_or(config.method);
            run_demo(&config, &transform, method, workers, payloads)
        }
        Command::Transforms => {
            for name in Registry::builtin().names() {
                println!("{}", name);
            }
            Ok(())
        }
        Command::Config { save } => {
            print!("{}", toml::to_string_pretty(&config)?);
            if save {
                match &cli.config {
                    Some(path) => config.save_to(path)?,
                    None => config.save()?,
                }
            }
            Ok(())
        }
    }
}

fn run_demo(
    config: &Config,
    transform: &str,
    method: DataFlow,
    workers: usize,
    payloads: Vec<String>,
) -> Result<()> {
    let transform = Registry::builtin().resolve(transform)?;
    vlog!(
        "Run command: transform={}, method={}, workers={}, payloads={}",
        transform.reference(),
        method,
        workers,
        payloads.len()
    );

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(async {
        let anchor = Anchor::spawn();
        let (control, data) = Vertex::new(&anchor, transform).with_method(method).spawn()?;

        let mut inboxes: Vec<Mailbox> = (0..workers).map(|_| Mailbox::new()).collect();
        add_downstream_addresses(&data, inboxes.iter().map(|m| m.address().clone()).collect());

        for raw in &payloads {
            deliver(&data, parse_payload(raw));
        }
        // The data task answers in mailbox order, so every payload has been
        // relayed by the time the reply arrives.
        let downstream = match get_downstream_addresses_with(&data, config).await {
            Ok(addresses) => addresses,
            Err(e) => {
                vlog_warn!("downstream query failed: {}", e);
                Vec::new()
            }
        };

        let mut received = Vec::with_capacity(inboxes.len());
        for (i, inbox) in inboxes.iter_mut().enumerate() {
            let values = inbox.drain_data();
            received.push(json!({
                "worker": i + 1,
                "address": downstream.get(i).map(|a| a.to_string()),
                "received": values,
            }));
        }

        control_stop(&control);
        let data_exit = data.wait_exit().await;
        Ok::<_, vertex::Error>(json!({
            "method": method.to_string(),
            "workers": received,
            "data_exit": data_exit.to_string(),
        }))
    })?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn parse_payload(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
