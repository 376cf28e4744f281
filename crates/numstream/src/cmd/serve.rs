use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use numstream_generator::{watch, GeneratorConfig, GeneratorServer};
use tracing::info;

use crate::cmd::{parse_duration, ServeArgs};
use crate::exit::{generator_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let reload_interval = parse_duration(&args.reload_interval)?;
    let config = match &args.config {
        Some(path) => GeneratorConfig::from_file(path)
            .map_err(|err| generator_error(&format!("loading {}", path.display()), err))?,
        None => GeneratorConfig {
            size: args.size,
            proportions: parse_proportions(&args.proportion)?,
            max_rate: args.max_rate,
            seed_mode: args.seed_mode.into(),
            default_seed: args.default_seed,
            max_items: args.max_items,
        },
    };

    let server =
        GeneratorServer::bind(&args.bind, config).map_err(|err| generator_error("bind failed", err))?;
    info!(addr = %server.local_addr(), "generator listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(Arc::clone(&running), wake_addr(server.local_addr()))?;

    if let Some(path) = args.config {
        watch(
            path,
            server.shared_config().clone(),
            reload_interval,
            Arc::clone(&running),
        )
        .map_err(|err| generator_error("config watcher failed", err))?;
    }

    let result = server.serve(&running);
    running.store(false, Ordering::SeqCst);
    result.map_err(|err| generator_error("serve failed", err))?;
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>, wake: SocketAddr) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        // Unblock the pending accept.
        let _ = TcpStream::connect(wake);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

fn wake_addr(mut addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        let loopback = match addr.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
        };
        addr.set_ip(loopback);
    }
    addr
}

fn parse_proportions(inputs: &[String]) -> CliResult<Vec<(usize, f64)>> {
    inputs.iter().map(|input| parse_proportion(input)).collect()
}

fn parse_proportion(input: &str) -> CliResult<(usize, f64)> {
    let invalid = || CliError::new(USAGE, format!("invalid proportion (want COUNT:WEIGHT): {input}"));

    let (count, weight) = input.split_once(':').ok_or_else(invalid)?;
    let count: usize = count.trim().parse().map_err(|_| invalid())?;
    let weight: f64 = weight.trim().parse().map_err(|_| invalid())?;
    Ok((count, weight))
}
