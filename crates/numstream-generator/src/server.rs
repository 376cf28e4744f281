use std::io::BufWriter;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use numstream_frame::{frame, LineWriter};
use numstream_transport::{ChunkSource, Connection, Listener, TransportError};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::{GeneratorConfig, SeedMode};
use crate::error::Result;
use crate::generator::Generator;
use crate::reload::SharedConfig;

/// What one served connection amounted to.
#[derive(Debug, Clone, PartialEq)]
pub struct ServeSummary {
    pub peer: SocketAddr,
    pub seed: u64,
    pub items: u64,
    pub elapsed: Duration,
}

impl ServeSummary {
    /// Values written per second.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.items as f64 / secs
        } else {
            0.0
        }
    }
}

/// Determine the generator seed for a freshly accepted connection.
///
/// In [`SeedMode::Ask`] one line is read from the client; a line that is not a
/// signed integer, or a client that closes first, falls back to the default
/// seed. Negative seeds are reinterpreted bit for bit as unsigned.
pub fn resolve_seed(connection: &Connection, config: &GeneratorConfig) -> Result<u64> {
    match config.seed_mode {
        SeedMode::Fixed => Ok(config.default_seed),
        SeedMode::Random => Ok(rand::thread_rng().gen()),
        SeedMode::Ask => {
            let mut lines = frame(connection.try_clone()?);
            let line = lines.read_line()?;
            let parsed = line.as_ref().and_then(|record| {
                record
                    .to_str()
                    .ok()
                    .and_then(|text| text.trim().parse::<i64>().ok())
            });
            match parsed {
                Some(seed) => Ok(seed as u64),
                None => {
                    warn!(
                        peer = %connection.peer_addr(),
                        line = ?line,
                        default_seed = config.default_seed,
                        "unusable seed line, using default seed"
                    );
                    Ok(config.default_seed)
                }
            }
        }
    }
}

/// Serve one connection until the client goes away or `max_items` is reached.
pub fn serve_connection(connection: Connection, config: &GeneratorConfig) -> Result<ServeSummary> {
    let peer = connection.peer_addr();
    let seed = resolve_seed(&connection, config)?;
    let mut generator = Generator::new(config, seed)?;
    debug!(%peer, seed, "serving");

    let mut throttle = config.rate_interval()?.map(Throttle::new);
    let mut writer = LineWriter::new(BufWriter::new(connection));
    let start = Instant::now();
    let mut items = 0u64;

    loop {
        if config.max_items.is_some_and(|max| items >= max) {
            break;
        }
        if let Some(throttle) = throttle.as_mut() {
            throttle.wait();
        }

        let value = generator.next_value().to_string();
        let written = writer.write_line(value.as_bytes()).and_then(|()| {
            if throttle.is_some() {
                writer.flush()
            } else {
                Ok(())
            }
        });
        if let Err(err) = written {
            debug!(%peer, error = %err, "client went away");
            break;
        }
        items += 1;
    }

    if let Err(err) = writer.flush() {
        debug!(%peer, error = %err, "final flush failed");
    }
    writer.get_mut().get_mut().close();

    let summary = ServeSummary {
        peer,
        seed,
        items,
        elapsed: start.elapsed(),
    };
    info!(
        %peer,
        seed,
        items,
        throughput = summary.throughput(),
        "done serving"
    );
    Ok(summary)
}

/// Sleeps just long enough to keep writes at or below a fixed rate.
struct Throttle {
    interval: Duration,
    next: Instant,
}

impl Throttle {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
        }
        self.next = self.next.max(now) + self.interval;
    }
}

/// Accepts clients and serves each one from its own thread and generator.
pub struct GeneratorServer {
    listener: Listener,
    config: SharedConfig,
}

impl GeneratorServer {
    /// Validate `config` and bind to `addr`.
    pub fn bind(addr: &str, config: GeneratorConfig) -> Result<Self> {
        Self::bind_shared(addr, SharedConfig::new(config))
    }

    /// Bind to `addr`, serving each new client with whatever `config` holds
    /// at the moment it is accepted.
    pub fn bind_shared(addr: &str, config: SharedConfig) -> Result<Self> {
        config.snapshot().validate()?;
        let listener = Listener::bind(addr)?;
        Ok(Self { listener, config })
    }

    /// The address this server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// The configuration new clients are served with.
    pub fn config(&self) -> Arc<GeneratorConfig> {
        self.config.snapshot()
    }

    pub fn shared_config(&self) -> &SharedConfig {
        &self.config
    }

    /// Accept one client (blocking) and serve it on a new thread.
    pub fn accept_one(&self) -> Result<JoinHandle<Result<ServeSummary>>> {
        let connection = self.listener.accept()?;
        self.spawn(connection)
    }

    /// Accept clients until `running` is cleared. Returns how many were served.
    ///
    /// The flag is checked around each blocking accept; whoever clears it must
    /// open one more connection to wake the loop. That connection is dropped
    /// unserved.
    pub fn serve(&self, running: &AtomicBool) -> Result<u64> {
        let mut served = 0u64;
        while running.load(Ordering::SeqCst) {
            let connection = self.listener.accept()?;
            if !running.load(Ordering::SeqCst) {
                debug!(peer = %connection.peer_addr(), "shutdown requested, dropping connection");
                break;
            }
            self.spawn(connection)?;
            served += 1;
        }
        info!(served, "generator server stopped");
        Ok(served)
    }

    fn spawn(&self, connection: Connection) -> Result<JoinHandle<Result<ServeSummary>>> {
        let peer = connection.peer_addr();
        let config = self.config.snapshot();

        let handle = thread::Builder::new()
            .name(format!("serve-{peer}"))
            .spawn(move || {
                let result = serve_connection(connection, &config);
                if let Err(err) = &result {
                    warn!(%peer, error = %err, "connection failed");
                }
                result
            })
            .map_err(TransportError::Io)?;
        Ok(handle)
    }
}

impl std::fmt::Debug for GeneratorServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorServer")
            .field("addr", &self.local_addr())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpStream;

    use numstream_client::{ClientConfig, SequenceClient};

    use super::*;
    use crate::error::GeneratorError;

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            size: 64,
            proportions: vec![(1, 0.25)],
            ..GeneratorConfig::default()
        }
    }

    fn collect(server: &GeneratorServer, seed: i64, limit: u64) -> Vec<i64> {
        let client = SequenceClient::new(ClientConfig::new("127.0.0.1", server.local_addr().port()));
        let sequence = client.start_sequence(seed, limit).expect("sequence should start");
        let handle = server.accept_one().expect("server should accept");
        let values = sequence.map(|v| v.expect("value should decode")).collect();
        handle
            .join()
            .expect("serve thread")
            .expect("serve should succeed");
        values
    }

    #[test]
    fn same_seed_same_stream() {
        let server = GeneratorServer::bind("127.0.0.1:0", small_config()).unwrap();

        let a = collect(&server, 23, 200);
        let b = collect(&server, 23, 200);
        let c = collect(&server, 24, 200);

        assert_eq!(a.len(), 200);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn stream_matches_local_generator() {
        let config = small_config();
        let server = GeneratorServer::bind("127.0.0.1:0", config.clone()).unwrap();

        let remote = collect(&server, 5, 50);
        let local: Vec<i64> = Generator::new(&config, 5)
            .unwrap()
            .take(50)
            .map(i64::from)
            .collect();
        assert_eq!(remote, local);
    }

    #[test]
    fn max_items_ends_stream_cleanly() {
        let config = GeneratorConfig {
            max_items: Some(10),
            ..small_config()
        };
        let server = GeneratorServer::bind("127.0.0.1:0", config).unwrap();

        let values = collect(&server, 1, 1_000);
        assert_eq!(values.len(), 10);
    }

    #[test]
    fn negative_seed_is_reinterpreted() {
        let config = small_config();
        let server = GeneratorServer::bind("127.0.0.1:0", config.clone()).unwrap();

        let remote = collect(&server, -1, 20);
        let local: Vec<i64> = Generator::new(&config, u64::MAX)
            .unwrap()
            .take(20)
            .map(i64::from)
            .collect();
        assert_eq!(remote, local);
    }

    #[test]
    fn unusable_seed_falls_back_to_default() {
        let config = GeneratorConfig {
            max_items: Some(5),
            ..small_config()
        };
        let server = GeneratorServer::bind("127.0.0.1:0", config.clone()).unwrap();

        let mut stream = TcpStream::connect(server.local_addr()).unwrap();
        stream.write_all(b"not-a-seed\n").unwrap();
        let handle = server.accept_one().unwrap();

        let lines: Vec<u32> = BufReader::new(stream)
            .lines()
            .map(|l| l.unwrap().parse().unwrap())
            .collect();
        let summary = handle.join().unwrap().unwrap();

        let expected: Vec<u32> = Generator::new(&config, config.default_seed)
            .unwrap()
            .take(5)
            .collect();
        assert_eq!(lines, expected);
        assert_eq!(summary.seed, config.default_seed);
        assert_eq!(summary.items, 5);
    }

    #[test]
    fn fixed_mode_ignores_client_seed() {
        let config = GeneratorConfig {
            seed_mode: SeedMode::Fixed,
            ..small_config()
        };
        let server = GeneratorServer::bind("127.0.0.1:0", config).unwrap();

        let a = collect(&server, 1, 30);
        let b = collect(&server, 2, 30);
        assert_eq!(a, b);
    }

    #[test]
    fn throttled_stream_respects_rate() {
        let config = GeneratorConfig {
            max_rate: Some(200.0),
            max_items: Some(20),
            ..small_config()
        };
        let server = GeneratorServer::bind("127.0.0.1:0", config).unwrap();

        let client = SequenceClient::new(ClientConfig::new("127.0.0.1", server.local_addr().port()));
        let sequence = client.start_sequence(3, 100).unwrap();
        let handle = server.accept_one().unwrap();
        assert_eq!(sequence.count(), 20);

        let summary = handle.join().unwrap().unwrap();
        assert_eq!(summary.items, 20);
        assert!(summary.elapsed >= Duration::from_millis(90));
        assert!(summary.throughput() <= 250.0);
    }

    #[test]
    fn serve_stops_when_flag_cleared() {
        let server = GeneratorServer::bind("127.0.0.1:0", small_config()).unwrap();
        let running = AtomicBool::new(false);
        assert_eq!(server.serve(&running).unwrap(), 0);
    }

    #[test]
    fn serve_wakes_on_shutdown_connection() {
        let server = GeneratorServer::bind("127.0.0.1:0", small_config()).unwrap();
        let port = server.local_addr().port();
        let running = Arc::new(AtomicBool::new(true));

        let stopper = {
            let running = Arc::clone(&running);
            thread::spawn(move || {
                let client = SequenceClient::new(ClientConfig::new("127.0.0.1", port));
                let values = client.start_sequence(8, 5).unwrap().count();

                running.store(false, Ordering::SeqCst);
                let _wake = TcpStream::connect(("127.0.0.1", port)).unwrap();
                values
            })
        };

        assert_eq!(server.serve(&running).unwrap(), 1);
        assert_eq!(stopper.join().unwrap(), 5);
    }

    #[test]
    fn bind_rejects_invalid_config() {
        let config = GeneratorConfig {
            size: 0,
            ..GeneratorConfig::default()
        };
        let result = GeneratorServer::bind("127.0.0.1:0", config);
        assert!(matches!(result, Err(GeneratorError::InvalidConfig(_))));
    }

    #[test]
    fn summary_throughput() {
        let summary = ServeSummary {
            peer: "127.0.0.1:1".parse().unwrap(),
            seed: 1,
            items: 500,
            elapsed: Duration::from_millis(250),
        };
        assert_eq!(summary.throughput(), 2000.0);

        let instant = ServeSummary {
            elapsed: Duration::ZERO,
            ..summary
        };
        assert_eq!(instant.throughput(), 0.0);
    }

    #[test]
    fn seed_line_read_through_buffered_reader() {
        let config = GeneratorConfig {
            max_items: Some(1),
            ..small_config()
        };
        let server = GeneratorServer::bind("127.0.0.1:0", config).unwrap();

        let mut stream = TcpStream::connect(server.local_addr()).unwrap();
        stream.write_all(b"4").unwrap();
        stream.write_all(b"2\r\n").unwrap();
        let handle = server.accept_one().unwrap();

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert!(line.ends_with('\n'));

        let summary = handle.join().unwrap().unwrap();
        assert_eq!(summary.seed, 42);
    }

    #[test]
    fn replaced_config_applies_to_next_client() {
        let server = GeneratorServer::bind("127.0.0.1:0", small_config()).unwrap();
        assert_eq!(collect(&server, 3, 40).len(), 40);

        let changed = server
            .shared_config()
            .replace(GeneratorConfig {
                max_items: Some(5),
                ..small_config()
            })
            .unwrap();
        assert!(changed);
        assert_eq!(server.config().max_items, Some(5));

        assert_eq!(collect(&server, 3, 40).len(), 5);
    }

    #[test]
    fn unrepresentable_rate_rejected_before_serving() {
        let config = GeneratorConfig {
            max_rate: Some(1e-30),
            ..small_config()
        };
        let result = GeneratorServer::bind("127.0.0.1:0", config);
        assert!(matches!(result, Err(GeneratorError::InvalidConfig(_))));
    }
}
