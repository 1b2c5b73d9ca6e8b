pub mod etl;
pub mod pipeline;
pub mod template;

pub use crate::domain::model::{
    ExtractionRecord, ExtractionReport, Row, RowOutcome, SearchOutcome, Table,
};
pub use crate::domain::ports::{
    AnswerProvider, ConfigProvider, Pipeline, SearchProvider, Storage,
};
pub use crate::utils::error::Result;
