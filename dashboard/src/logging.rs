use crate::config::LoggingConfig;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging: stderr output plus optional rolling file output
///
/// The dashboard itself owns stdout, so console logs go to stderr.
/// Keep the returned guard alive for the whole run or buffered file
/// output is lost on exit.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    // Default to info; RUST_LOG overrides
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    if !config.enabled {
        subscriber.init();
        return None;
    }

    if let Err(e) = std::fs::create_dir_all(&config.directory) {
        eprintln!("Failed to create log directory {}: {}", config.directory, e);
    }
    cleanup_old_logs(config);

    let file_appender = match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.directory, &config.file_prefix),
        "never" => tracing_appender::rolling::never(&config.directory, &config.file_prefix),
        _ => tracing_appender::rolling::daily(&config.directory, &config.file_prefix),
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    subscriber
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    Some(guard)
}

/// Delete log files beyond `max_files` (newest kept) or older than `max_age_days`
///
/// Returns the number of files removed.
pub fn cleanup_old_logs(config: &LoggingConfig) -> usize {
    if config.max_files == 0 && config.max_age_days == 0 {
        return 0;
    }

    let mut log_files = match list_log_files(Path::new(&config.directory), &config.file_prefix) {
        Some(files) => files,
        None => return 0,
    };
    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let now = SystemTime::now();
    let max_age = Duration::from_secs(u64::from(config.max_age_days) * 24 * 60 * 60);

    let mut deleted = 0;
    for (idx, (path, modified)) in log_files.iter().enumerate() {
        let over_count = config.max_files > 0 && idx >= config.max_files as usize;
        let over_age = config.max_age_days > 0
            && now
                .duration_since(*modified)
                .map(|age| age > max_age)
                .unwrap_or(false);

        if !(over_count || over_age) {
            continue;
        }
        match std::fs::remove_file(path) {
            Ok(_) => deleted += 1,
            Err(e) => eprintln!("Failed to delete log file {:?}: {}", path, e),
        }
    }

    if deleted > 0 {
        eprintln!("Cleaned up {} old log file(s)", deleted);
    }
    deleted
}

fn list_log_files(dir: &Path, prefix: &str) -> Option<Vec<(PathBuf, SystemTime)>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if dir.exists() {
                eprintln!("Failed to read log directory: {}", e);
            }
            return None;
        }
    };

    Some(
        entries
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() || !entry.file_name().to_str()?.starts_with(prefix) {
                    return None;
                }
                Some((entry.path(), metadata.modified().ok()?))
            })
            .collect(),
    )
}
