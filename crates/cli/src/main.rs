//! # CLI - IPScore Interactive Shell
//!
//! A REPL over the IPScore engine. Reads commands from stdin, runs them
//! against an [`EngineHandle`], and prints results to stdout. Works both
//! interactively and with commands piped in.
//!
//! ## Commands
//!
//! ```text
//! GET ip                   Score of ip (0 when unknown)
//! GETEX ip                 Score of ip, or "(nil)" when its /24 was never written
//! SET ip score             Overwrite a score, prints the previous one
//! INCR ip delta            Add to a score, prints the new one
//! DECR ip delta            Subtract from a score, prints the new one
//! DEL ip                   Zero a score
//! DECAY [factor] [dz]      Decay every score (defaults from config)
//! BULK file                Apply a change file (IP,Change per line)
//! SAVE [file]              Write an archive (default: IPSCORE_ARCHIVE)
//! LOAD [file]              Replace all scores with an archive
//! CLEAR                    Drop every score
//! COUNT                    Number of non-zero scores
//! STATS                    Counters and memory usage
//! BOGON ip                 Is ip in a reserved range?
//! VERSION                  Engine version
//! EXIT / QUIT              Leave the shell
//! ```
//!
//! ## Configuration
//!
//! See the `config` crate. `RUST_LOG` overrides `IPSCORE_LOG`; logs go to
//! stderr so they never mix with command output.
//!
//! ## Example
//!
//! ```text
//! $ IPSCORE_ARCHIVE=scores.ipsa ipscore
//! IPScore 0.1.0 started (stripes=256, bogons=allowed, archive=scores.ipsa)
//! > INCR 203.0.113.7 40
//! 40
//! > GETEX 203.0.114.1
//! (nil)
//! > SAVE
//! OK (1 records)
//! > EXIT
//! bye
//! ```

use anyhow::Result;
use config::Config;
use engine::EngineHandle;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

enum Outcome {
    Reply(String),
    Exit,
}

fn init_logging(cfg: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cfg = Config::from_env();
    init_logging(&cfg);

    let handle = EngineHandle::with_config(&cfg)?;

    if let Some(path) = cfg.archive_path.as_ref().filter(|p| p.exists()) {
        match handle.load(path) {
            Ok(n) => info!(path = %path.display(), records = n, "startup archive loaded"),
            Err(e) => warn!(path = %path.display(), error = %e, "startup archive ignored"),
        }
    }

    println!(
        "IPScore {} started (stripes={}, bogons={}, archive={})",
        engine::version(),
        cfg.lock_stripes,
        if cfg.reject_bogons { "rejected" } else { "allowed" },
        cfg.archive_path
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string()),
    );
    println!("Commands: GET | GETEX | SET | INCR | DECR | DEL | DECAY | BULK");
    println!("          SAVE | LOAD | CLEAR | COUNT | STATS | BOGON | VERSION | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if let Some((cmd, args)) = parts.split_first() {
            match execute(&handle, &cfg, cmd, args) {
                Ok(Outcome::Reply(text)) => println!("{text}"),
                Ok(Outcome::Exit) => {
                    println!("bye");
                    break;
                }
                Err(e) => println!("ERR {e}"),
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    handle.destroy();
    Ok(())
}

fn execute(h: &EngineHandle, cfg: &Config, cmd: &str, args: &[&str]) -> Result<Outcome> {
    let reply = match (cmd.to_uppercase().as_str(), args) {
        ("GET", [ip]) => h.get(ip)?.to_string(),
        ("GETEX", [ip]) => match h.get_ex(ip)? {
            Some(v) => v.to_string(),
            None => "(nil)".to_string(),
        },
        ("SET", [ip, v]) => format!("OK (was {})", h.set(ip, number(v)?)?),
        ("INCR", [ip, d]) => h.increment(ip, number(d)?)?.to_string(),
        ("DECR", [ip, d]) => h.decrement(ip, number(d)?)?.to_string(),
        ("DEL", [ip]) => {
            h.delete(ip)?;
            "OK".to_string()
        }
        ("DECAY", rest) if rest.len() <= 2 => {
            let factor = match rest.first() {
                Some(f) => f
                    .parse::<f64>()
                    .map_err(|_| anyhow::anyhow!("invalid factor {f:?}"))?,
                None => cfg.decay_factor,
            };
            let deadzone = match rest.get(1) {
                Some(d) => d
                    .parse::<u16>()
                    .map_err(|_| anyhow::anyhow!("invalid deadzone {d:?}"))?,
                None => cfg.decay_deadzone,
            };
            format!("OK (modified {})", h.decay(factor, deadzone)?)
        }
        ("BULK", [file]) => {
            let s = h.bulk_load_file(file)?;
            format!(
                "OK processed={} skipped={} sets={} updates={} errors={} ({:.3}s, {:.0} lines/s)",
                s.lines_processed,
                s.lines_skipped,
                s.sets,
                s.updates,
                s.parse_errors,
                s.elapsed_seconds,
                s.lines_per_second
            )
        }
        ("SAVE", rest) if rest.len() <= 1 => {
            format!("OK ({} records)", h.save(archive_arg(cfg, rest)?)?)
        }
        ("LOAD", rest) if rest.len() <= 1 => {
            format!("OK ({} records)", h.load(archive_arg(cfg, rest)?)?)
        }
        ("CLEAR", []) => {
            h.clear()?;
            "OK".to_string()
        }
        ("COUNT", []) => h.count()?.to_string(),
        ("STATS", []) => format!(
            "count={} blocks={} memory={} bytes",
            h.count()?,
            h.block_count()?,
            h.memory_usage()?
        ),
        ("BOGON", [ip]) => {
            let addr = addr::parse_ipv4(ip)?;
            let verdict = if addr::is_bogon(addr) { "yes" } else { "no" };
            verdict.to_string()
        }
        ("VERSION", []) => engine::version().to_string(),
        ("EXIT" | "QUIT", _) => return Ok(Outcome::Exit),
        (
            "GET" | "GETEX" | "SET" | "INCR" | "DECR" | "DEL" | "DECAY" | "BULK" | "SAVE"
            | "LOAD" | "CLEAR" | "COUNT" | "STATS" | "BOGON" | "VERSION",
            _,
        ) => anyhow::bail!("usage: {}", usage(&cmd.to_uppercase())),
        _ => anyhow::bail!("unknown command: {cmd}"),
    };
    Ok(Outcome::Reply(reply))
}

fn number(text: &str) -> Result<i32> {
    text.parse()
        .map_err(|_| anyhow::anyhow!("invalid number {text:?}"))
}

fn archive_arg(cfg: &Config, args: &[&str]) -> Result<PathBuf> {
    match args.first() {
        Some(p) => Ok(PathBuf::from(p)),
        None => cfg
            .archive_path
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no file given and IPSCORE_ARCHIVE is not set")),
    }
}

fn usage(cmd: &str) -> &'static str {
    match cmd {
        "GET" => "GET ip",
        "GETEX" => "GETEX ip",
        "SET" => "SET ip score",
        "INCR" => "INCR ip delta",
        "DECR" => "DECR ip delta",
        "DEL" => "DEL ip",
        "DECAY" => "DECAY [factor] [deadzone]",
        "BULK" => "BULK file",
        "SAVE" => "SAVE [file]",
        "LOAD" => "LOAD [file]",
        "BOGON" => "BOGON ip",
        _ => "no arguments expected",
    }
}
