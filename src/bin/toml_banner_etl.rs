use anyhow::Context;
use banner_etl::core::ConfigProvider;
use banner_etl::utils::{logger, validation::Validate};
use banner_etl::{BannerPipeline, EtlEngine, LocalStorage, TomlConfig};
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-banner-etl")]
#[command(about = "Banner formatter driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "banner-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Show the resolved configuration without processing anything
    #[arg(long)]
    dry_run: bool,
}

fn display_config_summary(config: &TomlConfig) {
    tracing::info!("📋 Configuration summary:");
    tracing::info!("  Banners: {}", config.banners_path());
    tracing::info!(
        "  Product CSV: {}",
        config.product_csv_path().unwrap_or("(none)")
    );
    tracing::info!("  Output: {}", config.output_path());
    tracing::info!("  Images: {:?}", config.image_mode());
    if let Some(hubs) = config.hub_filter() {
        tracing::info!("  Hub filter: {}", hubs.join(", "));
    }
    if let Some(preview) = config.preview() {
        tracing::info!("  Preview: {} ({} rows)", preview.tab, preview.rows);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based banner ETL");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let preview_only = config.preview_only();

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = BannerPipeline::new(storage, config);
    let engine =
        EtlEngine::new_with_monitoring(pipeline, monitor_enabled).preview_only(preview_only);

    let outcome = engine.run().await.context("banner ETL failed")?;

    if let Some(preview) = &outcome.preview {
        println!("{}", preview);
    }
    if let Some(report) = &outcome.report {
        println!("{}", serde_json::to_string_pretty(report)?);
    }

    Ok(())
}
