//! restkv CLI Client
//!
//! Sends a single command to a restkv-compatible REST endpoint and prints
//! the JSON result.

use clap::Parser;
use restkv::protocol::Arg;
use restkv::Client;

/// restkv CLI
#[derive(Parser, Debug)]
#[command(name = "restkv-cli")]
#[command(about = "CLI for Redis-compatible REST endpoints")]
#[command(version)]
struct Args {
    /// Base URL of the REST endpoint
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    /// Bearer token for authentication
    #[arg(short, long, env = "RESTKV_API_TOKEN", default_value = "")]
    token: String,

    /// Command name followed by its arguments, e.g. `SET key value`
    #[arg(required = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let client = Client::new(&args.url, &args.token);
    let mut request = client.new_request();

    let cmd_args: Vec<Arg> = args.command[1..]
        .iter()
        .map(|a| Arg::from(a.as_str()))
        .collect();

    let result: Result<serde_json::Value, _> =
        request.exec_one(&args.command[0], &cmd_args).await;

    match result {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(pretty) => println!("{pretty}"),
            Err(_) => println!("{value}"),
        },
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
