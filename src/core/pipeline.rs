use crate::clients::SheetClient;
use crate::core::template::QueryTemplate;
use crate::core::{
    AnswerProvider, ConfigProvider, ExtractionRecord, ExtractionReport, Pipeline, Row,
    RowOutcome, SearchOutcome, SearchProvider, Storage, Table,
};
use crate::domain::model::DataSource;
use crate::utils::error::{EtlError, Result};
use std::collections::HashMap;

/// 匯出檔名固定，對應下載按鈕的檔案
pub const OUTPUT_FILENAME: &str = "extracted_data.csv";

pub struct ExtractionPipeline<S, C, W, A>
where
    S: Storage,
    C: ConfigProvider,
    W: SearchProvider,
    A: AnswerProvider,
{
    storage: S,
    config: C,
    searcher: W,
    summarizer: A,
    sheets: SheetClient,
}

impl<S, C, W, A> ExtractionPipeline<S, C, W, A>
where
    S: Storage,
    C: ConfigProvider,
    W: SearchProvider,
    A: AnswerProvider,
{
    pub fn new(storage: S, config: C, searcher: W, summarizer: A, sheets: SheetClient) -> Self {
        Self {
            storage,
            config,
            searcher,
            summarizer,
            sheets,
        }
    }

    /// CSV 轉成表格，表頭列決定欄位
    fn parse_csv(bytes: &[u8]) -> Result<Table> {
        let mut reader = csv::Reader::from_reader(bytes);
        let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut data = HashMap::new();
            for (i, column) in columns.iter().enumerate() {
                let value = record.get(i).unwrap_or("").to_string();
                data.insert(column.clone(), serde_json::Value::String(value));
            }
            rows.push(Row { data });
        }

        Ok(Table { columns, rows })
    }

    fn render_csv(records: &[ExtractionRecord]) -> Result<String> {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.write_record(["Entity", "Response"])?;
        for record in records {
            writer.write_record([record.entity.as_str(), record.outcome.text()])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| EtlError::ProcessingError {
                message: format!("CSV buffer error: {}", e),
            })?;
        String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
            message: format!("CSV output is not UTF-8: {}", e),
        })
    }
}

#[async_trait::async_trait]
impl<S, C, W, A> Pipeline for ExtractionPipeline<S, C, W, A>
where
    S: Storage,
    C: ConfigProvider,
    W: SearchProvider,
    A: AnswerProvider,
{
    async fn extract(&self) -> Result<Table> {
        match self.config.source() {
            DataSource::Csv { path } => {
                tracing::info!("📥 Loading CSV file: {}", path);
                let bytes = self.storage.read_file(&path).await?;
                let table = Self::parse_csv(&bytes)?;
                tracing::info!("📥 CSV loaded, {} rows", table.rows.len());
                Ok(table)
            }
            DataSource::GoogleSheet { url } => {
                tracing::info!("📥 Loading Google Sheet: {}", url);
                let table = self.sheets.load_table(&url).await?;
                tracing::info!("📥 Sheet loaded, {} rows", table.rows.len());
                Ok(table)
            }
        }
    }

    async fn transform(&self, table: Table) -> Result<ExtractionReport> {
        let template = QueryTemplate::new(self.config.query_template());
        let entity_column = self.config.entity_column();
        let total = table.rows.len();
        let mut records = Vec::with_capacity(total);

        // 逐列處理：先搜尋，再摘要，兩個呼叫都是阻塞式的
        for (index, row) in table.rows.iter().enumerate() {
            let entity = row.display_value(entity_column);
            let query = template.render(&entity, row);
            tracing::debug!("🔄 Row {}/{}: query '{}'", index + 1, total, query);

            let outcome = match self.searcher.search(&query).await {
                SearchOutcome::Results(snippets) => {
                    let context = snippets.join(" ");
                    self.summarizer.answer(&entity, &context).await
                }
                // 搜尋失敗照實記錄錯誤文字，摘要不執行
                SearchOutcome::Failed(message) => RowOutcome::Failed(message),
            };

            if outcome.is_failed() {
                tracing::warn!("❌ {} → {}", entity, outcome.text());
            } else {
                tracing::info!("✅ {} → {}", entity, outcome.text());
            }
            records.push(ExtractionRecord { entity, outcome });
        }

        let csv_output = Self::render_csv(&records)?;
        Ok(ExtractionReport {
            records,
            csv_output,
        })
    }

    async fn load(&self, report: ExtractionReport) -> Result<String> {
        let output_path = format!("{}/{}", self.config.output_path(), OUTPUT_FILENAME);
        self.storage
            .write_file(&output_path, report.csv_output.as_bytes())
            .await?;
        tracing::info!("💾 Results saved to: {}", output_path);
        Ok(output_path)
    }
}
