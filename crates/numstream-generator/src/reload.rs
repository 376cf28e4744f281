use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use numstream_transport::TransportError;
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::error::Result;

/// How often a watched configuration file is re-read by default.
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(1);

/// Generator configuration that can be replaced while the server runs.
///
/// Connections take a snapshot when they are accepted and keep it for their
/// whole lifetime; a replacement only affects connections accepted later.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<RwLock<Arc<GeneratorConfig>>>,
}

impl SharedConfig {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// The configuration currently in effect.
    pub fn snapshot(&self) -> Arc<GeneratorConfig> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Validate and install `config`. Returns `false` if it equals the current one.
    pub fn replace(&self, config: GeneratorConfig) -> Result<bool> {
        config.validate()?;
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if **guard == config {
            return Ok(false);
        }
        *guard = Arc::new(config);
        Ok(true)
    }

    /// Re-read `path` and install its contents if they changed.
    pub fn reload_from(&self, path: &Path) -> Result<bool> {
        let changed = self.replace(GeneratorConfig::from_file(path)?)?;
        if changed {
            info!(path = %path.display(), config = ?self.snapshot(), "configuration changed");
        }
        Ok(changed)
    }
}

/// Poll `path` every `interval` and apply changes to `shared` until `running` is cleared.
///
/// A file that fails to load or validate is logged and skipped; the previous
/// configuration stays in effect.
pub fn watch(
    path: PathBuf,
    shared: SharedConfig,
    interval: Duration,
    running: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    debug!(path = %path.display(), ?interval, "watching configuration file");
    let handle = thread::Builder::new()
        .name("config-watch".to_string())
        .spawn(move || {
            while running.load(Ordering::SeqCst) {
                thread::sleep(interval);
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(err) = shared.reload_from(&path) {
                    warn!(path = %path.display(), error = %err, "configuration reload failed");
                }
            }
        })
        .map_err(TransportError::Io)?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::config::SeedMode;
    use crate::error::GeneratorError;

    fn temp_path(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "numstream-reload-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir.join("generator.toml")
    }

    fn small(size: usize) -> GeneratorConfig {
        GeneratorConfig {
            size,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn replace_reports_changes_only() {
        let shared = SharedConfig::new(small(10));

        assert!(!shared.replace(small(10)).unwrap());
        assert!(shared.replace(small(20)).unwrap());
        assert_eq!(shared.snapshot().size, 20);
    }

    #[test]
    fn replace_keeps_current_on_invalid_config() {
        let shared = SharedConfig::new(small(10));

        let err = shared.replace(small(0)).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfig(_)));
        assert_eq!(shared.snapshot().size, 10);
    }

    #[test]
    fn snapshots_are_unaffected_by_replacement() {
        let shared = SharedConfig::new(small(10));
        let before = shared.snapshot();

        shared.replace(small(30)).unwrap();

        assert_eq!(before.size, 10);
        assert_eq!(shared.snapshot().size, 30);
    }

    #[test]
    fn reload_from_file() {
        let path = temp_path("once");
        std::fs::write(&path, "size = 5\nseed_mode = \"random\"\n").unwrap();
        let shared = SharedConfig::new(small(10));

        assert!(shared.reload_from(&path).unwrap());
        assert!(!shared.reload_from(&path).unwrap());
        assert_eq!(shared.snapshot().seed_mode, SeedMode::Random);

        std::fs::write(&path, "size = 0\n").unwrap();
        assert!(shared.reload_from(&path).is_err());
        assert_eq!(shared.snapshot().size, 5);
    }

    #[test]
    fn watcher_applies_file_changes_and_stops() {
        let path = temp_path("watch");
        std::fs::write(&path, "size = 10\n").unwrap();
        let shared = SharedConfig::new(GeneratorConfig::from_file(&path).unwrap());
        let running = Arc::new(AtomicBool::new(true));

        let handle = watch(
            path.clone(),
            shared.clone(),
            Duration::from_millis(20),
            Arc::clone(&running),
        )
        .unwrap();

        std::fs::write(&path, "size = 42\n").unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while shared.snapshot().size != 42 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(shared.snapshot().size, 42);

        running.store(false, Ordering::SeqCst);
        handle.join().expect("watcher should exit");
    }
}
