use clap::Parser;
use entity_enrich::core::ConfigProvider;
use entity_enrich::utils::error::{ErrorSeverity, EtlError};
use entity_enrich::utils::logger;
use entity_enrich::{
    CliConfig, Credentials, EtlEngine, ExtractionPipeline, GroqClient, JobConfig, LocalStorage,
    SerpClient, SheetClient,
};

fn report_fatal(e: &EtlError) -> ! {
    tracing::error!("❌ Configuration validation failed: {}", e);
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting entity-enrich CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 工作設定：TOML 檔或直接旗標
    let job = match &cli.job {
        Some(path) => JobConfig::from_file(path),
        None => JobConfig::from_cli(&cli),
    };
    let job = match job {
        Ok(job) => job,
        Err(e) => report_fatal(&e),
    };

    // 憑證一次讀入，缺了就整批列出
    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => report_fatal(&e),
    };

    // 建立客戶端與管道
    let searcher =
        SerpClient::new(credentials.serpapi_key.clone())?.with_delay(job.search_delay());
    let mut summarizer = GroqClient::new(credentials.groq_api_key.clone())?;
    if let Ok(model) = std::env::var("GROQ_MODEL") {
        if !model.trim().is_empty() {
            summarizer = summarizer.with_model(model.trim());
        }
    }
    let sheets = SheetClient::new(credentials.google_creds_path.clone())?;
    let storage = LocalStorage::new(".".to_string());

    let pipeline = ExtractionPipeline::new(storage, job, searcher, summarizer, sheets);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Extraction completed successfully!");
            println!("✅ Extraction completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Extraction failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

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
        }
    }

    Ok(())
}
