//! Example: Get information about a file or folder
//!
//! Usage:
//!   cargo run --example stat -- --token TOKEN [--root /mount] PATH

mod cli;

use cli::{format_size, init_tracing, parse_mount};

const USAGE: &str = "Usage: cargo run --example stat -- --token TOKEN [--root ROOT] PATH";

#[tokio::main]
async fn main() {
    init_tracing();
    let mount = parse_mount(USAGE, 1);
    let path = &mount.positionals[0];
    let fs = mount.connect();

    match fs.stat(path).await {
        Some(stat) => {
            println!("\n🔍 Information:");
            println!("  Path:          {}", stat.path);
            println!("  Type:          {}", if stat.is_directory { "folder" } else { "file" });
            if !stat.is_directory {
                println!("  Size:          {}", format_size(stat.size));
            }
            if let Some(modified) = stat.last_modified {
                println!("  Modified (ms): {}", modified);
            }
        }
        None => {
            eprintln!("❌ Not found: {}", path);
            fs.close().await;
            std::process::exit(1);
        }
    }
    fs.close().await;
}
