use crate::domain::model::Row;

/// 查詢字串模板，例如 "Where is {entity} headquartered?"
#[derive(Debug, Clone)]
pub struct QueryTemplate {
    template: String,
}

impl QueryTemplate {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// 以實體值取代 {entity}，再以該列的其他欄位取代對應佔位符。
    /// 找不到的佔位符保留原樣，不視為錯誤。
    pub fn render(&self, entity: &str, row: &Row) -> String {
        let mut query = self.template.replace("{entity}", entity);

        for key in row.data.keys() {
            let placeholder = format!("{{{}}}", key);
            if query.contains(&placeholder) {
                query = query.replace(&placeholder, &row.display_value(key));
            }
        }

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row_with(pairs: &[(&str, &str)]) -> Row {
        let mut data = HashMap::new();
        for (k, v) in pairs {
            data.insert(k.to_string(), serde_json::Value::String(v.to_string()));
        }
        Row { data }
    }

    #[test]
    fn substitutes_entity_placeholder() {
        let template = QueryTemplate::new("Where is {entity}?");
        let row = row_with(&[("company", "Paris")]);
        assert_eq!(template.render("Paris", &row), "Where is Paris?");
    }

    #[test]
    fn template_without_placeholder_is_unchanged() {
        let template = QueryTemplate::new("just a fixed query");
        let row = row_with(&[("company", "Paris")]);
        assert_eq!(template.render("Paris", &row), "just a fixed query");
    }

    #[test]
    fn substitutes_row_column_placeholders() {
        let template = QueryTemplate::new("{entity} office in {country}");
        let row = row_with(&[("company", "Acme"), ("country", "France")]);
        assert_eq!(template.render("Acme", &row), "Acme office in France");
    }

    #[test]
    fn unknown_placeholders_pass_through() {
        let template = QueryTemplate::new("Where is {entty}?");
        let row = row_with(&[("company", "Paris")]);
        assert_eq!(template.render("Paris", &row), "Where is {entty}?");
    }

    #[test]
    fn entity_may_appear_multiple_times() {
        let template = QueryTemplate::new("{entity}, tell me about {entity}");
        let row = row_with(&[]);
        assert_eq!(template.render("Lyon", &row), "Lyon, tell me about Lyon");
    }
}
