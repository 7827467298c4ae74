use clap::Parser;
use oc_advisor::config::toml_config::AdvisorMode;
use oc_advisor::utils::error::{AdvisorError, ErrorSeverity};
use oc_advisor::utils::{logger, validation::Validate};
use oc_advisor::{AdvisorConfig, CliConfig, DiagnosisService, LocalReportSource};
use std::sync::Arc;

fn load_config(cli: &CliConfig) -> Result<AdvisorConfig, AdvisorError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("📄 Loading advisor configuration from {}", path);
            AdvisorConfig::from_file(path)?
        }
        None => AdvisorConfig::builtin()?,
    };

    // 命令列參數優先於配置檔
    if cli.remote {
        config.service.mode = AdvisorMode::Remote;
    }
    if cli.fallback_to_rules {
        config.service.fallback_to_rules = true;
    }
    if cli.strict {
        config.service.strict_extraction = true;
    }

    config.validate()?;
    Ok(config)
}

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report_failure(e: &AdvisorError) {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let config = match load_config(&cli) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            report_failure(&e);
            std::process::exit(exit_code(e.severity()).max(1));
        }
    };

    let service = match DiagnosisService::new(config) {
        Ok(service) => service,
        Err(e) => {
            report_failure(&e);
            std::process::exit(exit_code(e.severity()).max(1));
        }
    };

    let source = LocalReportSource::default();
    let mut worst: Option<ErrorSeverity> = None;

    for report in &cli.reports {
        println!("Analysing {}...", report);
        match service.handle_file(&source, report).await {
            Ok(answer) if cli.fence => println!("```\n{}\n```", answer),
            Ok(answer) => println!("{}", answer),
            Err(e) => {
                report_failure(&e);
                let severity = e.severity();
                worst = Some(worst.map_or(severity, |w| w.max(severity)));
            }
        }
    }

    if let Some(severity) = worst {
        let code = exit_code(severity);
        if code > 0 {
            std::process::exit(code);
        }
    }
}
