use banner_etl::utils::{logger, validation::Validate};
use banner_etl::{BannerPipeline, CliConfig, EtlEngine, LocalStorage};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting banner-etl CLI");
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    let preview_only = config.preview_only;

    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = BannerPipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled).preview_only(preview_only);

    match engine.run().await {
        Ok(outcome) => {
            if let Some(preview) = &outcome.preview {
                println!("{}", preview);
            }
            if let Some(report) = &outcome.report {
                println!("✅ Processed {} tabs", outcome.workbook.tabs.len());
                println!("📁 Workbook: {}", report.workbook_path);
                for bundle in [&report.images, &report.cutouts].into_iter().flatten() {
                    println!(
                        "📦 {} ({} images, {} skipped)",
                        bundle.path, bundle.written, bundle.skipped
                    );
                }
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Banner ETL failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}
