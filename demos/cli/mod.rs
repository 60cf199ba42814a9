use std::env;
use std::process;

use dropbox_fs::{ConnectionConfig, DropboxFs, PluginConfig};
use tracing_subscriber::{fmt, EnvFilter};

pub fn usage_and_exit(usage: &str) -> ! {
    eprintln!("{usage}");
    process::exit(1);
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dropbox_fs=debug"));
    fmt().with_env_filter(filter).with_target(false).init();
}

pub struct ArgParser {
    args: Vec<String>,
    usage: &'static str,
}

impl ArgParser {
    pub fn new(usage: &'static str) -> Self {
        let args: Vec<String> = env::args().skip(1).collect();

        if args.iter().any(|a| a == "--help" || a == "-h") {
            println!("{usage}");
            process::exit(0);
        }

        Self { args, usage }
    }

    pub fn take_value(&mut self, names: &[&str]) -> Option<String> {
        let mut i = 0;
        while i < self.args.len() {
            if names.contains(&self.args[i].as_str()) {
                let value = self.args.get(i + 1).cloned();
                if value.is_none() {
                    usage_and_exit(self.usage);
                }
                self.args.drain(i..=i + 1);
                return value;
            }
            i += 1;
        }
        None
    }

    #[allow(dead_code)]
    pub fn take_flag(&mut self, names: &[&str]) -> bool {
        match self.args.iter().position(|a| names.contains(&a.as_str())) {
            Some(i) => {
                self.args.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn remaining(self) -> Vec<String> {
        self.args
    }
}

/// Connection settings plus the positional arguments left over.
pub struct Mount {
    pub token: String,
    pub root: String,
    pub proxy: Option<String>,
    pub positionals: Vec<String>,
}

impl Mount {
    pub fn connect(&self) -> DropboxFs {
        let mut connection = ConnectionConfig::new(self.token.clone());
        connection.proxy = self.proxy.clone();
        let config = PluginConfig {
            dropbox_connection: connection,
        };

        match DropboxFs::connect(&self.root, &config) {
            Ok(fs) => fs,
            Err(e) => {
                eprintln!("❌ Failed to connect: {}", e);
                process::exit(1);
            }
        }
    }
}

/// Parse `--token` (or `DROPBOX_TOKEN`), `--root` and `--proxy`, expecting
/// exactly `positionals` positional arguments.
#[allow(dead_code)]
pub fn parse_mount(usage: &'static str, positionals: usize) -> Mount {
    mount_from_parser(ArgParser::new(usage), usage, positionals)
}

pub fn mount_from_parser(mut parser: ArgParser, usage: &'static str, positionals: usize) -> Mount {
    let token = parser
        .take_value(&["--token", "-t"])
        .or_else(|| env::var("DROPBOX_TOKEN").ok())
        .unwrap_or_else(|| usage_and_exit(usage));
    let root = parser.take_value(&["--root", "-r"]).unwrap_or_default();
    let proxy = parser.take_value(&["--proxy"]);

    let rest = parser.remaining();
    if rest.len() != positionals {
        usage_and_exit(usage);
    }

    Mount {
        token,
        root,
        proxy,
        positionals: rest,
    }
}

#[allow(dead_code)] // Not every demo prints sizes.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1_048_576 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else if bytes < 1_073_741_824 {
        format!("{:.2} MB", bytes as f64 / 1_048_576.0)
    } else {
        format!("{:.2} GB", bytes as f64 / 1_073_741_824.0)
    }
}
