use async_python_ffi::utils::error::ErrorSeverity;
use async_python_ffi::utils::{logger, validation::Validate};
use async_python_ffi::{build_backend, CliConfig, FfiError, SheepDemo};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    // 載入配置（檔案 + 命令列覆蓋）
    let config = match args.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.logging.json {
        logger::init_json_logger(config.logging.verbose);
    } else {
        logger::init_cli_logger(config.logging.verbose);
    }

    tracing::info!("Starting count-sheep");
    tracing::debug!("Config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match run(&config, &args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!(
                "❌ Demo failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}

async fn run(
    config: &async_python_ffi::DemoConfig,
    args: &CliConfig,
) -> Result<(), FfiError> {
    let backend = build_backend(&config.library)?;
    let demo = SheepDemo::new(backend, config)?.quiet(args.quiet || args.json);

    let report = demo.run().await?;
    tracing::info!(
        "✅ Done in {} ms, {} sheep counted during the native sleep",
        report.total_ms,
        report.sheep_during_sleep().len()
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if report.sleep_status != 0 {
        return Err(FfiError::NativeStatusError {
            function: "rust_sleep",
            code: report.sleep_status,
        });
    }
    Ok(())
}
