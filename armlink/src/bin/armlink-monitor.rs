//! Pose stream monitor.
//!
//! Connects to a pose producer and periodically prints the connection state,
//! latency and both limb directions to stderr.
//!
//! # Usage
//!
//! ```sh
//! armlink-monitor --endpoint ws://127.0.0.1:8765 --interval 500
//! ```
//!
//! Runs until `--duration` elapses, or forever. Ctrl+C terminates the process;
//! dropping the client signals the session thread.

use std::io;
use std::time::Duration;

use minstant::Instant;

use armlink::net::Endpoint;
use armlink::{ClientConfig, ClientError, Limb, PoseClient, UnitVector3};
use thiserror::Error;

/// The producer's default address.
const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8765";

/// Default report interval in milliseconds.
const DEFAULT_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Error)]
enum MonitorError {
    #[error("{0}")]
    Args(#[from] io::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
}

struct Args {
    config: ClientConfig,
    interval: Duration,
    duration: Option<Duration>,
}

fn main() {
    armlink::init_tracing();

    if let Err(e) = run() {
        eprintln!("armlink-monitor: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), MonitorError> {
    let args: Vec<String> = std::env::args().collect();
    let Args {
        config,
        interval,
        duration,
    } = parse_args(&args)?;

    eprintln!(
        "armlink-monitor: connecting to {} (auto-reconnect: {})",
        config.endpoint, config.auto_reconnect
    );

    let client = PoseClient::new(config)?;
    client.start()?;

    let started = Instant::now();
    let mut last_tick = started;
    loop {
        std::thread::sleep(interval);

        let now = Instant::now();
        let elapsed = now.duration_since(last_tick);
        last_tick = now;

        let left = client.step(Limb::Left, elapsed);
        let right = client.step(Limb::Right, elapsed);
        let latency = client
            .latency_ms()
            .map_or_else(|| "-".to_owned(), |ms| format!("{ms:.1}ms"));
        eprintln!(
            "[{:>7.1}s] {:<24} latency {:>8}  left {}  right {}",
            started.elapsed().as_secs_f64(),
            client.connection_state().to_string(),
            latency,
            fmt_direction(&left),
            fmt_direction(&right),
        );

        if duration.is_some_and(|d| started.elapsed() >= d) {
            break;
        }
    }

    client.stop();
    let stats = client.stats();
    eprintln!(
        "armlink-monitor: stopped after {} connection(s), {} frame(s), {} pose(s), {} decode error(s)",
        stats.connections, stats.frames_received, stats.poses_applied, stats.decode_errors
    );
    Ok(())
}

fn fmt_direction(v: &UnitVector3) -> String {
    format!("({:+.3}, {:+.3}, {:+.3})", v.x, v.y, v.z)
}

fn invalid_input(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message.into())
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> io::Result<&'a str> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| invalid_input(format!("missing value for {flag}")))
}

fn parse_args(args: &[String]) -> io::Result<Args> {
    let mut endpoint = DEFAULT_ENDPOINT.to_owned();
    let mut auto_reconnect = true;
    let mut reconnect_delay = None;
    let mut interval_ms = DEFAULT_INTERVAL_MS;
    let mut duration = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--endpoint" | "-e" => {
                i += 1;
                endpoint = value(args, i, "--endpoint")?.to_owned();
            }
            "--no-reconnect" => auto_reconnect = false,
            "--reconnect-delay" | "-r" => {
                i += 1;
                let secs: f64 = value(args, i, "--reconnect-delay")?
                    .parse()
                    .map_err(|e| invalid_input(format!("--reconnect-delay: {e}")))?;
                reconnect_delay = Some(
                    Duration::try_from_secs_f64(secs)
                        .map_err(|e| invalid_input(format!("--reconnect-delay: {e}")))?,
                );
            }
            "--interval" | "-i" => {
                i += 1;
                interval_ms = value(args, i, "--interval")?
                    .parse()
                    .map_err(|e| invalid_input(format!("--interval: {e}")))?;
            }
            "--duration" | "-d" => {
                i += 1;
                let secs: u64 = value(args, i, "--duration")?
                    .parse()
                    .map_err(|e| invalid_input(format!("--duration: {e}")))?;
                duration = Some(Duration::from_secs(secs));
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            arg => return Err(invalid_input(format!("unknown argument: {arg}"))),
        }
        i += 1;
    }

    if interval_ms == 0 {
        return Err(invalid_input("--interval must be at least 1"));
    }

    let endpoint = endpoint
        .parse::<Endpoint>()
        .map_err(|e| invalid_input(format!("--endpoint {endpoint}: {e}")))?;
    let mut config = ClientConfig::new(endpoint).with_auto_reconnect(auto_reconnect);
    if let Some(delay) = reconnect_delay {
        config = config.with_reconnect_delay(delay);
    }

    Ok(Args {
        config,
        interval: Duration::from_millis(interval_ms),
        duration,
    })
}

fn print_usage() {
    eprintln!(
        r#"armlink-monitor - watch a live arm-pose stream

USAGE:
    armlink-monitor [OPTIONS]

OPTIONS:
    -e, --endpoint <URL>          Producer address (default: ws://127.0.0.1:8765)
        --no-reconnect            Stop after the first failure
    -r, --reconnect-delay <SECS>  Wait before reconnecting (default: 5)
    -i, --interval <MS>           Report interval (default: 1000)
    -d, --duration <SECS>         Exit after this long (default: run forever)
    -h, --help                    Print this help message

ENVIRONMENT:
    RUST_LOG                      Log filter when built with --features tracing

EXAMPLE:
    armlink-monitor --endpoint ws://192.168.1.20:8765 --interval 250
"#
    );
}
