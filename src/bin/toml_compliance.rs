use anyhow::Context;
use clap::Parser;
use entitlement_compliance::app::runner::{run, RunOptions};
use entitlement_compliance::config::toml_config::TomlConfig;
use entitlement_compliance::core::ConfigProvider;
use entitlement_compliance::domain::model::parse_instant;
use entitlement_compliance::utils::{logger, validation::Validate};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "toml-compliance")]
#[command(about = "Entitlement compliance report with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "compliance.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the monitoring setting from config
    #[arg(long)]
    watch: Option<bool>,

    /// Evaluate at this date instead of now
    #[arg(long)]
    at: Option<String>,

    /// Log as JSON lines instead of compact text
    #[arg(long)]
    json_logs: bool,

    /// Dry run - show the resolved configuration without evaluating
    #[arg(long)]
    dry_run: bool,
}

fn display_config_summary(config: &TomlConfig) {
    tracing::info!("📋 Configuration Summary:");
    tracing::info!("   Product certificates: {}", config.product_dir());
    tracing::info!("   Entitlement certificates: {}", config.entitlement_dir());
    tracing::info!("   Consumer identity: {}", config.consumer_dir());
    tracing::info!(
        "   System: {} with {} socket(s)",
        config.system_arch(),
        config.system_sockets()
    );
    tracing::info!("   Server reachable: {}", config.server_reachable());
    if config.monitoring_enabled() {
        tracing::info!("   Poll interval: {}s", config.poll_interval_secs());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 先載入配置，日誌等級可能來自配置檔
    let config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file '{}'", args.config))?;

    if args.json_logs {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based compliance check");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        anyhow::bail!(e.user_friendly_message());
    }

    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No certificates will be evaluated");
        return Ok(());
    }

    let at = match &args.at {
        Some(raw) => Some(
            parse_instant(raw, false)
                .with_context(|| format!("Invalid --at value '{}'", raw))?,
        ),
        None => None,
    };

    let options = RunOptions {
        format: config.report_format()?,
        output: config.report.output_path.as_ref().map(PathBuf::from),
        icon_dir: config.report.icon_dir.as_ref().map(PathBuf::from),
        at,
        watch: args.watch.unwrap_or_else(|| config.monitoring_enabled()),
    };

    let report = run(&config, options)
        .await
        .context("Compliance evaluation failed")?;

    tracing::info!(
        "✅ Done: {} ({} warnings)",
        report.summary.message,
        report.summary.warn_count
    );
    Ok(())
}
