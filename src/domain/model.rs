use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub data: HashMap<String, serde_json::Value>,
}

impl Row {
    /// 取出欄位值並轉成查詢用字串（缺少欄位視為空字串）
    pub fn display_value(&self, column: &str) -> String {
        match self.data.get(column) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(other) => other.to_string().trim_matches('"').to_string(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// 每列搜尋結果：成功帶回 snippet 列表，失敗帶回錯誤文字
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Results(Vec<String>),
    Failed(String),
}

/// 每列的最終結果，成功與失敗分開標記
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Answered(String),
    Failed(String),
}

impl RowOutcome {
    pub fn text(&self) -> &str {
        match self {
            RowOutcome::Answered(s) | RowOutcome::Failed(s) => s,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RowOutcome::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionRecord {
    pub entity: String,
    pub outcome: RowOutcome,
}

#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub records: Vec<ExtractionRecord>,
    pub csv_output: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Csv { path: String },
    GoogleSheet { url: String },
}
