use clap::Parser;
use notebook_report::app::{jupyter_pipeline, run_batch};
use notebook_report::config::toml_config::TomlConfig;
use notebook_report::core::report::Report;
use notebook_report::core::ReportSettings;
use notebook_report::utils::{logger, validation::Validate};

#[derive(Parser)]
#[command(name = "batch-report")]
#[command(about = "Render every notebook listed in a TOML file into HTML reports")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "reports.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON log lines instead of the compact format
    #[arg(long)]
    json_logs: bool,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting batch report run");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No notebook will be executed");
        display_plan(&config);
        return Ok(());
    }

    // 依序處理，遇到第一個錯誤即停止；已完成的報告仍列入摘要
    let summary = run_batch(
        config
            .notebooks
            .iter()
            .map(|entry| jupyter_pipeline(&entry.path, &config, config.template_for(entry))),
    )
    .await;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(failure) = summary.failed {
        let context = format!("failed to build report for {}", failure.notebook.display());
        return Err(anyhow::Error::new(failure.error).context(context));
    }

    tracing::info!("✅ {} report(s) generated", summary.completed.len());

    Ok(())
}

fn display_plan(config: &TomlConfig) {
    println!("📋 Batch Plan:");
    println!("  Report folder: {}", config.report_folder().display());
    println!("  Scratch dir: {}", config.scratch_dir().display());
    println!("  Cell timeout: {}s", config.cell_timeout().as_secs());
    println!("  Jupyter: {}", config.jupyter_command());
    println!();

    for entry in &config.notebooks {
        let report = Report::with_scratch_dir(
            &entry.path,
            config.report_folder(),
            config.scratch_dir(),
        );
        println!("  {} -> {}", entry.path.display(), report.report_path().display());
        println!("    title: {}", report.default_title());
        match config.template_for(entry) {
            Some(template) => println!("    template: {}", template.display()),
            None => println!("    template: (built-in)"),
        }
    }
}
