// # gandi-ddns - Declarative DDNS for Gandi LiveDNS
//
// Thin integration layer: all reconciliation logic lives in gandi-ddns-core.
//
// The binary is responsible for:
// 1. Parsing the command line
// 2. Locating and loading the config file
// 3. Initializing logging and the runtime
// 4. Wiring the IP sources, the LiveDNS provider and the notifier
// 5. Running one reconciliation pass and mapping the outcome to an exit code
//
// It is meant to be run periodically (cron, systemd timer), not as a daemon.
//
// ## Configuration
//
// - `--config PATH` / `GANDI_DDNS_CONFIG`: config file (TOML)
// - otherwise the first existing of `~/.config/gandi-ddns.toml`,
//   `/etc/gandi-ddns/config.toml`
// - `GANDI_APIKEY`: overrides `gandi_api_key` from the file
// - `--dry-run` / `GANDI_DDNS_MODE=dry-run`: read everything, write nothing
// - `--log-level` / `GANDI_DDNS_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export GANDI_APIKEY=your_key
// gandi-ddns --config /etc/gandi-ddns/config.toml
// gandi-ddns --list example.com
// ```

use anyhow::{Context, Result};
use clap::Parser;
use gandi_ddns_core::traits::IpVersion;
use gandi_ddns_core::{
    CommandNotifier, GandiDdnsConfig, IpResolver, NoopNotifier, Notifier, ReconcilerEngine,
    ZoneProvider,
};
use gandi_ddns_ip_http::HttpIpSource;
use gandi_ddns_ip_netlink::NetlinkIpSource;
use gandi_ddns_livedns::GandiProvider;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// System-wide config location
const SYSTEM_CONFIG_PATH: &str = "/etc/gandi-ddns/config.toml";

/// Per-user config location, relative to the home directory
const USER_CONFIG_PATH: &str = ".config/gandi-ddns.toml";

/// Environment variable selecting the run mode
const MODE_ENV: &str = "GANDI_DDNS_MODE";

/// Exit codes for different termination scenarios
///
/// - 0: Run completed (individual records may have failed)
/// - 1: Configuration or startup error
/// - 2: Runtime error (IP detection failed, runtime unavailable)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GandiDdnsExitCode {
    /// Run completed
    Completed = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<GandiDdnsExitCode> for ExitCode {
    fn from(code: GandiDdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Reconcile Gandi LiveDNS records with this host's address
#[derive(Parser, Debug)]
#[command(name = "gandi-ddns", version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the default locations
    #[arg(short, long, env = "GANDI_DDNS_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Perform all reads, log intended writes, send none
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GANDI_DDNS_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Print every RRset of DOMAIN as JSON and exit
    #[arg(long, value_name = "DOMAIN")]
    list: Option<String>,
}

impl Args {
    /// Dry-run from the flag or the mode variable
    fn dry_run_requested(&self, mode: Option<&str>) -> bool {
        self.dry_run || mode.is_some_and(|m| m.trim().eq_ignore_ascii_case("dry-run"))
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing
    let log_level = match parse_log_level(&args.log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return GandiDdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return GandiDdnsExitCode::ConfigError.into();
    }

    // Load and validate configuration
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return GandiDdnsExitCode::ConfigError.into();
        }
    };

    let dry_run = args.dry_run_requested(std::env::var(MODE_ENV).ok().as_deref());
    if dry_run {
        warn!("Running in DRY-RUN mode - no changes will be made");
    }

    let provider = match build_provider(&config, dry_run) {
        Ok(provider) => provider,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return GandiDdnsExitCode::ConfigError.into();
        }
    };

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return GandiDdnsExitCode::RuntimeError.into();
        }
    };

    if let Some(domain) = args.list {
        return rt
            .block_on(async {
                match list_zone(&provider, &domain.to_ascii_lowercase()).await {
                    Ok(()) => GandiDdnsExitCode::Completed,
                    Err(e) => {
                        error!("Failed to list {}: {:#}", domain, e);
                        GandiDdnsExitCode::RuntimeError
                    }
                }
            })
            .into();
    }

    let engine = match build_engine(&config, provider) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return GandiDdnsExitCode::ConfigError.into();
        }
    };

    info!(
        "Reconciling {} record(s) across {} domain(s) via {}",
        config.record_count(),
        config.domains.len(),
        engine.provider_name()
    );

    let result = rt.block_on(async {
        match engine.run().await {
            Ok(report) => {
                if report.failure_count() > 0 {
                    warn!(
                        "{} record(s) could not be reconciled",
                        report.failure_count()
                    );
                }
                GandiDdnsExitCode::Completed
            }
            Err(e) => {
                error!("Run aborted: {}", e);
                GandiDdnsExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Map a level name to a tracing level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "log level '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Default config locations, in lookup order
fn config_candidates(home: Option<PathBuf>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = home {
        candidates.push(home.join(USER_CONFIG_PATH));
    }
    candidates.push(PathBuf::from(SYSTEM_CONFIG_PATH));
    candidates
}

/// Pick the config file: an explicit path always wins, otherwise the first
/// candidate that exists
fn discover_config(explicit: Option<&Path>, candidates: &[PathBuf]) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .with_context(|| {
            format!(
                "no config file found; looked in: {}",
                candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
}

/// Locate, parse and validate the configuration
fn load_config(explicit: Option<&Path>) -> Result<GandiDdnsConfig> {
    let path = discover_config(explicit, &config_candidates(dirs::home_dir()))?;
    info!("Using config file {}", path.display());

    let config = GandiDdnsConfig::load(&path)?;
    config.validate()?;
    Ok(config)
}

/// LiveDNS client with the key resolved from env or file
fn build_provider(config: &GandiDdnsConfig, dry_run: bool) -> Result<GandiProvider> {
    let api_key = config.api_key()?;
    Ok(GandiProvider::new(api_key, &config.api_base, dry_run)?)
}

/// Wire the engine for a reconciliation run
fn build_engine(config: &GandiDdnsConfig, provider: GandiProvider) -> Result<ReconcilerEngine> {
    let local = NetlinkIpSource::new(&config.wan_device);
    let public = HttpIpSource::new(&config.ip_source_url, Some(IpVersion::V4))?;
    let resolver = IpResolver::new(Box::new(local), Box::new(public));

    let notifier: Box<dyn Notifier> = match &config.notify_script {
        Some(command_line) => Box::new(CommandNotifier::from_command_line(command_line)?),
        None => Box::new(NoopNotifier),
    };

    Ok(ReconcilerEngine::new(
        resolver,
        Box::new(provider),
        notifier,
        config,
    )?)
}

/// Print every RRset of a domain as pretty JSON
async fn list_zone(provider: &GandiProvider, domain: &str) -> Result<()> {
    let info = provider.domain_info(domain).await?;
    let records = provider.list_records(&info.zone_records_href).await?;

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level(" DEBUG ").unwrap(), Level::DEBUG);
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn test_candidates_order() {
        let candidates = config_candidates(Some(PathBuf::from("/home/alice")));
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/home/alice/.config/gandi-ddns.toml"),
                PathBuf::from("/etc/gandi-ddns/config.toml"),
            ]
        );

        assert_eq!(
            config_candidates(None),
            vec![PathBuf::from("/etc/gandi-ddns/config.toml")]
        );
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = PathBuf::from("/nonexistent/custom.toml");
        let found = discover_config(Some(&explicit), &[]).unwrap();
        assert_eq!(found, explicit);
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let first = dir.path().join("first.toml");
        let second = dir.path().join("second.toml");
        std::fs::write(&first, "wan_device = \"eth0\"").unwrap();
        std::fs::write(&second, "wan_device = \"eth1\"").unwrap();

        let found = discover_config(None, &[missing, first.clone(), second]).unwrap();
        assert_eq!(found, first);
    }

    #[test]
    fn test_no_candidate_lists_paths() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gandi-ddns.toml");

        let err = discover_config(None, &[missing.clone()]).unwrap_err();
        assert!(err.to_string().contains(&missing.display().to_string()));
    }

    #[test]
    fn test_dry_run_sources() {
        let args = Args::parse_from(["gandi-ddns"]);
        assert!(!args.dry_run_requested(None));
        assert!(args.dry_run_requested(Some("dry-run")));
        assert!(args.dry_run_requested(Some("DRY-RUN")));
        assert!(!args.dry_run_requested(Some("live")));

        let args = Args::parse_from(["gandi-ddns", "--dry-run"]);
        assert!(args.dry_run_requested(None));
    }

    #[test]
    fn test_list_flag() {
        let args = Args::parse_from(["gandi-ddns", "--list", "example.com", "-c", "/tmp/x.toml"]);
        assert_eq!(args.list.as_deref(), Some("example.com"));
        assert_eq!(args.config, Some(PathBuf::from("/tmp/x.toml")));
    }

    #[test]
    fn test_build_engine_from_config() {
        let config = GandiDdnsConfig::from_toml_str(
            r#"
            wan_device = "eth0"
            gandi_api_key = "k"
            notify_script = "/usr/bin/logger -t gandi-ddns"

            [[domains."example.com"]]
            type = "A"
            name = "@"
            "#,
        )
        .unwrap();

        let provider = build_provider(&config, true).unwrap();
        let engine = build_engine(&config, provider).unwrap();
        assert_eq!(engine.provider_name(), "gandi");
    }
}
