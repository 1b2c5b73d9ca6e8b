use crate::domain::model::{DataSource, ExtractionReport, RowOutcome, SearchOutcome, Table};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn source(&self) -> DataSource;
    fn entity_column(&self) -> &str;
    fn query_template(&self) -> &str;
    fn output_path(&self) -> &str;
    fn search_delay(&self) -> Duration;
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> SearchOutcome;
}

#[async_trait]
pub trait AnswerProvider: Send + Sync {
    async fn answer(&self, entity: &str, context: &str) -> RowOutcome;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Table>;
    async fn transform(&self, table: Table) -> Result<ExtractionReport>;
    async fn load(&self, report: ExtractionReport) -> Result<String>;
}
