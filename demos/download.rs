//! Example: Download a file
//!
//! Usage:
//!   cargo run --example download -- --token TOKEN [--root /mount] [--limit BYTES] REMOTE_PATH LOCAL_FILE

mod cli;

use cli::{format_size, init_tracing, mount_from_parser, usage_and_exit, ArgParser};
use dropbox_fs::progress::make_progress_bar;
use futures::io::AllowStdIo;

const USAGE: &str = "Usage: cargo run --example download -- --token TOKEN [--root ROOT] [--limit BYTES] REMOTE_PATH LOCAL_FILE";

#[tokio::main]
async fn main() {
    init_tracing();
    let mut parser = ArgParser::new(USAGE);
    let limit = parser
        .take_value(&["--limit"])
        .map(|v| v.parse::<u64>().unwrap_or_else(|_| usage_and_exit(USAGE)));
    let mount = mount_from_parser(parser, USAGE, 2);
    let remote = &mount.positionals[0];
    let local = &mount.positionals[1];

    let file = match std::fs::File::create(local) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("❌ Cannot create {}: {}", local, e);
            std::process::exit(1);
        }
    };

    let fs = mount.connect();
    println!("Downloading {} -> {}", remote, local);

    let mut sink = AllowStdIo::new(file);
    let result = fs
        .read_with_progress(remote, &mut sink, limit, Some(make_progress_bar()))
        .await;
    fs.close().await;

    match result {
        Ok(bytes) => println!("\n✅ Downloaded {}", format_size(bytes)),
        Err(e) => {
            eprintln!("\n❌ Download failed: {}", e);
            std::process::exit(1);
        }
    }
}
