//! Example: Move or rename a file or folder
//!
//! Usage:
//!   cargo run --example mv -- --token TOKEN [--root /mount] FROM TO

mod cli;

use cli::{init_tracing, parse_mount};

const USAGE: &str = "Usage: cargo run --example mv -- --token TOKEN [--root ROOT] FROM TO";

#[tokio::main]
async fn main() {
    init_tracing();
    let mount = parse_mount(USAGE, 2);
    let from = &mount.positionals[0];
    let to = &mount.positionals[1];
    let fs = mount.connect();

    let result = fs.move_path(from, to).await;
    fs.close().await;

    match result {
        Ok(true) => println!("✅ Moved {} -> {}", from, to),
        Ok(false) => {
            eprintln!("❌ Not found: {}", from);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}
