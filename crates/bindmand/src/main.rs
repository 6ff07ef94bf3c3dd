// # bindmand - bindman daemon
//
// Thin integration layer: reads configuration from the environment, installs
// logging, builds the record manager and keeps it alive until a shutdown
// signal arrives. All record logic lives in bindman-core; the webhook
// transport that calls into the manager is hosted elsewhere.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Name server
// - `BINDMAN_NAMESERVER_ADDRESS`: Address of the name server to manage
// - `BINDMAN_NAMESERVER_PORT`: Port of the name server (default 53)
// - `BINDMAN_NAMESERVER_KEY_FILE`: Key file name, must match `K*.+157+*.key`
//   and live in the data directory
// - `BINDMAN_NAMESERVER_ZONE`: Zone this instance may modify
//
// ### Records
// - `BINDMAN_DNS_TTL`: TTL of managed records (default 1h)
// - `BINDMAN_DNS_REMOVAL_DELAY`: Grace period before a removal is sent (default 10m)
//
// ### Runtime
// - `BINDMAN_DATA_PATH`: Data directory (default ./data)
// - `BINDMAN_DEBUG`: Keep nsupdate session scripts (true/false)
// - `BINDMAN_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// Durations accept plain seconds or a unit suffix: `90`, `90s`, `20m`, `1h`.
//
// ## Example
//
// ```bash
// export BINDMAN_NAMESERVER_ADDRESS=ns1.test.com
// export BINDMAN_NAMESERVER_KEY_FILE=Ktest.com.+157+50086.key
// export BINDMAN_NAMESERVER_ZONE=test.com
// export BINDMAN_DNS_REMOVAL_DELAY=20m
//
// bindmand
// bindmand version
// ```

use anyhow::{Context, Result};
use bindman_core::{ConfigBuilder, ManagerConfig, RecordManager};
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_COMMIT: &str = match option_env!("BINDMAN_GIT_COMMIT") {
    Some(commit) => commit,
    None => "unknown-commit",
};
const BUILD_TIME: &str = match option_env!("BINDMAN_BUILD_TIME") {
    Some(time) => time,
    None => "unknown-buildtime",
};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum BindmanExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<BindmanExitCode> for ExitCode {
    fn from(code: BindmanExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn version_message() -> String {
    format!(
        "Bindman-DNS Bind9\n  Version: {}\n  GitCommit: {}\n  BuildTime: {}\n",
        VERSION, GIT_COMMIT, BUILD_TIME
    )
}

/// Settings read from the environment
struct Settings {
    manager: ConfigBuilder,
    log_level: String,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut manager = ConfigBuilder::new();

        if let Some(server) = lookup("BINDMAN_NAMESERVER_ADDRESS") {
            manager = manager.with_server(server);
        }
        if let Some(port) = lookup("BINDMAN_NAMESERVER_PORT") {
            let port = port
                .trim()
                .parse()
                .with_context(|| format!("BINDMAN_NAMESERVER_PORT is not a port: {}", port))?;
            manager = manager.with_port(port);
        }
        if let Some(key_file) = lookup("BINDMAN_NAMESERVER_KEY_FILE") {
            manager = manager.with_key_file(key_file);
        }
        if let Some(zone) = lookup("BINDMAN_NAMESERVER_ZONE") {
            manager = manager.with_zone(zone);
        }
        if let Some(path) = lookup("BINDMAN_DATA_PATH") {
            manager = manager.with_base_path(path);
        }
        if let Some(debug) = lookup("BINDMAN_DEBUG") {
            manager = manager.with_debug(parse_bool(&debug)?);
        }
        if let Some(ttl) = lookup("BINDMAN_DNS_TTL") {
            manager = manager.with_ttl(parse_duration(&ttl).context("BINDMAN_DNS_TTL")?);
        }
        if let Some(delay) = lookup("BINDMAN_DNS_REMOVAL_DELAY") {
            manager = manager
                .with_removal_delay(parse_duration(&delay).context("BINDMAN_DNS_REMOVAL_DELAY")?);
        }

        Ok(Self {
            manager,
            log_level: lookup("BINDMAN_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "BINDMAN_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("BINDMAN_DEBUG must be true or false. Got: {}", other),
    }
}

/// Parse `90`, `90s`, `20m` or `1h`
fn parse_duration(value: &str) -> Result<Duration> {
    let value = value.trim();
    let (digits, unit) = match value.find(|c: char| !c.is_ascii_digit()) {
        Some(i) => value.split_at(i),
        None => (value, "s"),
    };
    let amount: u64 = digits
        .parse()
        .with_context(|| format!("invalid duration '{}'", value))?;

    let scale: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        _ => anyhow::bail!("invalid duration unit in '{}'. Use s, m or h", value),
    };
    let seconds = amount
        .checked_mul(scale)
        .with_context(|| format!("duration '{}' is too large", value))?;
    Ok(Duration::from_secs(seconds))
}

fn main() -> ExitCode {
    if env::args().nth(1).as_deref() == Some("version") {
        print!("{}", version_message());
        return BindmanExitCode::CleanShutdown.into();
    }

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return BindmanExitCode::ConfigError.into();
        }
    };

    let log_level = match settings.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return BindmanExitCode::ConfigError.into();
        }
    };

    let config = match settings.manager.build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error occurred while setting up the DNS Manager.\n  {}", e);
            return BindmanExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return BindmanExitCode::ConfigError.into();
    }

    info!(
        version = VERSION,
        git_commit = GIT_COMMIT,
        build_time = BUILD_TIME,
        "Bindman-DNS Bind9 version"
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return BindmanExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            BindmanExitCode::RuntimeError
        } else {
            BindmanExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: ManagerConfig) -> Result<()> {
    info!("Managing zone {} on {}:{}", config.zone(), config.server(), config.port());
    info!(
        "Record TTL {:?}, removal delay {:?}, data in {}",
        config.ttl(),
        config.removal_delay(),
        config.base_path().display()
    );

    let manager = RecordManager::with_nsupdate(config)
        .await
        .context("Failed to start the record manager")?;

    let records = manager.get_dns_records().await?;
    info!("Record cache loaded: {} record(s)", records.len());

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);

    let pending = manager.pending_removals();
    if pending > 0 {
        warn!("{} scheduled removal(s) dropped by shutdown", pending);
    }
    info!("Shutting down daemon");

    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
