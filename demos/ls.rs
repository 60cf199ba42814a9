//! Example: List a folder, one level or recursively
//!
//! Usage:
//!   cargo run --example ls -- --token TOKEN [--root /mount] [--recursive] PATH

mod cli;

use cli::{format_size, init_tracing, mount_from_parser, ArgParser};

const USAGE: &str =
    "Usage: cargo run --example ls -- --token TOKEN [--root ROOT] [--recursive] PATH";

#[tokio::main]
async fn main() {
    init_tracing();
    let mut parser = ArgParser::new(USAGE);
    let recursive = parser.take_flag(&["--recursive", "-R"]);
    let mount = mount_from_parser(parser, USAGE, 1);
    let path = &mount.positionals[0];
    let fs = mount.connect();

    if recursive {
        match fs.enumerate(path, false).await {
            Ok(Some(files)) => {
                for file in files {
                    println!("📄 {} ({})", file.path, format_size(file.size));
                }
            }
            Ok(None) => eprintln!("❌ Not found: {}", path),
            Err(e) => eprintln!("❌ Listing failed: {}", e),
        }
    } else {
        let entry = fs.browse(path).await;
        if !entry.exists {
            eprintln!("❌ Not found: {}", path);
        }
        for child in entry.children.unwrap_or_default() {
            let name = child.full_path.unwrap_or_default();
            if child.is_directory {
                println!("📁 {}/", name);
            } else {
                println!("📄 {} ({})", name, format_size(child.size.unwrap_or(0)));
            }
        }
    }
    fs.close().await;
}
