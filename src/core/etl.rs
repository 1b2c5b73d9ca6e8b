use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        println!("Starting extraction process...");

        println!("Loading input table...");
        let table = self.pipeline.extract().await?;
        println!("Loaded {} rows", table.rows.len());

        println!("Processing rows...");
        let report = self.pipeline.transform(table).await?;
        let failed = report
            .records
            .iter()
            .filter(|r| r.outcome.is_failed())
            .count();
        println!("Processed {} records ({} failed)", report.records.len(), failed);

        println!("Exporting results...");
        let output_path = self.pipeline.load(report).await?;
        println!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
