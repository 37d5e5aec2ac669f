//! MapKV CLI Client
//!
//! Command-line interface for the map commands.

use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use mapkv::client::{Answer, ListReply, MapClient};
use mapkv::Result;

/// MapKV CLI
#[derive(Parser, Debug)]
#[command(name = "mapkv-cli")]
#[command(about = "CLI for MapKV map values")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:11211")]
    server: String,

    /// Read/write timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Set a mapkey in the map at key
    Set {
        key: String,
        mapkey: String,
        value: String,

        /// 0 = never, < 2592000 = seconds from now, else epoch seconds
        #[arg(short, long, default_value = "0")]
        expiry: u64,
    },

    /// Get the value of a mapkey
    Get { key: String, mapkey: String },

    /// Delete a mapkey
    Del { key: String, mapkey: String },

    /// Empty the map
    Clear { key: String },

    /// Number of mapkeys
    Size { key: String },

    /// Check whether a mapkey exists
    HasKey { key: String, mapkey: String },

    /// Check whether any mapkey holds a value
    HasValue { key: String, value: String },

    /// Check whether the map is empty
    Empty { key: String },

    /// List mapkeys
    Keys { key: String },

    /// List values
    Values { key: String },

    /// Dump the map
    Dump { key: String },
}

fn main() {
    let args = Args::parse();
    let timeout = (args.timeout_ms > 0).then(|| Duration::from_millis(args.timeout_ms));

    if let Err(e) = run(&args.server, timeout, args.command) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(server: &str, timeout: Option<Duration>, command: Commands) -> Result<()> {
    let mut client = MapClient::connect(server, timeout)?;

    match command {
        Commands::Set {
            key,
            mapkey,
            value,
            expiry,
        } => println!("{}", client.map_set(&key, &mapkey, value.as_bytes(), expiry)?),
        Commands::Get { key, mapkey } => match client.map_get(&key, &mapkey)? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => println!("(nil)"),
        },
        Commands::Del { key, mapkey } => println!("{}", client.map_delete(&key, &mapkey)?),
        Commands::Clear { key } => println!("{}", client.map_clear(&key)?),
        Commands::Size { key } => print_answer(client.map_size(&key)?),
        Commands::HasKey { key, mapkey } => print_answer(client.map_key(&key, &mapkey)?),
        Commands::HasValue { key, value } => print_answer(client.map_value(&key, value.as_bytes())?),
        Commands::Empty { key } => print_answer(client.map_empty(&key)?),
        Commands::Keys { key } => print_list(client.map_keys(&key)?, |k| k.clone()),
        Commands::Values { key } => {
            print_list(client.map_values(&key)?, |v| String::from_utf8_lossy(v).into_owned())
        }
        Commands::Dump { key } => match client.map_to_s(&key)? {
            Some(dump) => println!("{}", dump),
            None => println!("(nil)"),
        },
    }

    Ok(())
}

fn print_answer<T: std::fmt::Display>(answer: Answer<T>) {
    match answer {
        Answer::Value(v) => println!("{}", v),
        Answer::Status(s) => println!("{}", s),
    }
}

fn print_list<T>(list: Option<ListReply<T>>, render: impl Fn(&T) -> String) {
    match list {
        Some(list) => {
            println!("({} items)", list.count);
            for (i, item) in list.items.iter().enumerate() {
                println!("{}) {}", i + 1, render(item));
            }
        }
        None => println!("(nil)"),
    }
}
