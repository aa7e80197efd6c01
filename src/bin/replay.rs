//! Replays a JSONL fixture of upstream chunks through a single [`Session`]
//! and prints the emitted SSE frames to stdout. Useful for exercising the
//! core against a captured upstream transcript without a live server.

use std::io::BufRead;

use clap::Parser;
use glm_sse_bridge::{Session, UpstreamChunk};

#[derive(Parser)]
#[command(about = "Replay a JSONL upstream chunk fixture through the SSE translation core")]
struct Args {
    /// Path to a file with one JSON-encoded upstream chunk per line.
    fixture: std::path::PathBuf,

    #[arg(long, default_value = "glm-4")]
    model: String,

    #[arg(long, default_value = "")]
    user_message: String,

    /// Emit non-stream (buffered) rather than SSE frames.
    #[arg(long)]
    no_stream: bool,
}

fn main() {
    simplelog::TermLogger::init(
        log::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
    .expect("logger init");

    let args = Args::parse();
    let file = std::fs::File::open(&args.fixture).unwrap_or_else(|e| {
        eprintln!("failed to open {}: {e}", args.fixture.display());
        std::process::exit(1);
    });

    let mut session = Session::new(args.model, !args.no_stream, args.user_message, || {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock before epoch")
            .as_secs() as i64
    });

    for line in std::io::BufReader::new(file).lines() {
        let line = line.expect("read fixture line");
        if line.trim().is_empty() {
            continue;
        }
        let chunk: UpstreamChunk = match serde_json::from_str(&line) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("skipping malformed fixture line: {e}");
                continue;
            }
        };
        for frame in session.consume(&chunk) {
            print!("{frame}");
        }
    }
}
