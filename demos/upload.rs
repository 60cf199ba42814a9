//! Example: Upload a local file
//!
//! Usage:
//!   cargo run --example upload -- --token TOKEN [--root /mount] LOCAL_FILE REMOTE_PATH
//!
//! Files over 4 MiB go through an upload session; the progress bar shows
//! bytes accepted so far.

mod cli;

use cli::{format_size, init_tracing, parse_mount};
use dropbox_fs::progress::make_progress_bar;
use futures::io::AllowStdIo;

const USAGE: &str =
    "Usage: cargo run --example upload -- --token TOKEN [--root ROOT] LOCAL_FILE REMOTE_PATH";

#[tokio::main]
async fn main() {
    init_tracing();
    let mount = parse_mount(USAGE, 2);
    let local = &mount.positionals[0];
    let remote = &mount.positionals[1];

    let file = match std::fs::File::open(local) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("❌ Cannot open {}: {}", local, e);
            std::process::exit(1);
        }
    };

    let fs = mount.connect();
    println!("Uploading {} -> {}", local, remote);

    let mut source = AllowStdIo::new(file);
    let result = fs
        .write_with_progress(remote, &mut source, Some(make_progress_bar()))
        .await;
    fs.close().await;

    match result {
        Ok(bytes) => println!("\n✅ Uploaded {}", format_size(bytes)),
        Err(e) => {
            eprintln!("\n❌ Upload failed: {}", e);
            std::process::exit(1);
        }
    }
}
