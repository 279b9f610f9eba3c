use clap::Parser;
use entitlement_compliance::app::runner::{run, RunOptions};
use entitlement_compliance::domain::model::SystemStatus;
use entitlement_compliance::utils::error::{ComplianceError, ErrorSeverity};
use entitlement_compliance::utils::{logger, validation::Validate};
use entitlement_compliance::CliConfig;
use std::path::PathBuf;

fn fail(e: &ComplianceError) -> ! {
    tracing::error!(
        "❌ Compliance check failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting entitlement-compliance");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(&e);
    }

    let options = RunOptions {
        format: config.report_format().unwrap_or_else(|e| fail(&e)),
        output: config.output.as_ref().map(PathBuf::from),
        icon_dir: config.icon_dir.as_ref().map(PathBuf::from),
        at: config.evaluation_instant().unwrap_or_else(|e| fail(&e)),
        watch: config.watch,
    };

    match run(&config, options).await {
        Ok(report) => {
            // 系統狀態非 valid 時以非零結束碼回報，方便腳本判斷
            if report.summary.status != SystemStatus::Valid {
                std::process::exit(4);
            }
        }
        Err(e) => fail(&e),
    }

    Ok(())
}
