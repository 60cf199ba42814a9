//! Example: Delete a file or folder (recursively)
//!
//! Usage:
//!   cargo run --example rm -- --token TOKEN [--root /mount] PATH

mod cli;

use cli::{init_tracing, parse_mount};

const USAGE: &str = "Usage: cargo run --example rm -- --token TOKEN [--root ROOT] PATH";

#[tokio::main]
async fn main() {
    init_tracing();
    let mount = parse_mount(USAGE, 1);
    let path = &mount.positionals[0];
    let fs = mount.connect();

    let result = fs.delete_recursive(path).await;
    fs.close().await;

    match result {
        Ok(0) => println!("Nothing to delete at {}", path),
        Ok(_) => println!("✅ Deleted {}", path),
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}
