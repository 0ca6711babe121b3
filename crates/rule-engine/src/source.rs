//! 规则表来源
//!
//! 规则表以 TSV 形式维护（通常是发布为 TSV 的在线表格），第一行为表头。
//! 列按表头名称定位，顺序不限。

use crate::error::{Result, RuleError};
use crate::models::RuleRow;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// 规则表中的列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    RuleNumber,
    Logic,
    PropertyName,
    Predicate,
    Value,
    Message,
    Severity,
}

impl Column {
    const REQUIRED: [Column; 7] = [
        Column::RuleNumber,
        Column::Logic,
        Column::PropertyName,
        Column::Predicate,
        Column::Value,
        Column::Message,
        Column::Severity,
    ];

    /// 表头名称去掉空白与标点后再匹配
    fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        let column = match key.as_str() {
            "rulenumber" | "rule" | "ruleno" | "ruleid" => Self::RuleNumber,
            "logic" => Self::Logic,
            "propertyname" | "property" => Self::PropertyName,
            "predicate" => Self::Predicate,
            "value" => Self::Value,
            "message" => Self::Message,
            "reportseverity" | "severity" => Self::Severity,
            _ => return None,
        };

        Some(column)
    }

    fn title(&self) -> &'static str {
        match self {
            Self::RuleNumber => "Rule Number",
            Self::Logic => "Logic",
            Self::PropertyName => "Property Name",
            Self::Predicate => "Predicate",
            Self::Value => "Value",
            Self::Message => "Message",
            Self::Severity => "Report Severity",
        }
    }
}

/// 解析 TSV 文本
///
/// 空行被跳过；每行记录其在表格中的行号，配置错误按该行号报告。
pub fn parse_table(text: &str) -> Result<Vec<RuleRow>> {
    // 行号在过滤空行之前确定，与表格中的行号一致
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines.next().ok_or(RuleError::EmptyTable)?;
    let columns: Vec<Option<Column>> = header.split('\t').map(Column::from_header).collect();

    for required in Column::REQUIRED {
        if !columns.contains(&Some(required)) {
            return Err(RuleError::MissingColumn(required.title().to_string()));
        }
    }

    let rows: Vec<RuleRow> = lines
        .map(|(number, line)| {
            let mut row = RuleRow::default().at_line(number);
            for (cell, column) in line.split('\t').zip(&columns) {
                let Some(column) = column else { continue };
                let field = match column {
                    Column::RuleNumber => &mut row.rule_number,
                    Column::Logic => &mut row.logic,
                    Column::PropertyName => &mut row.property_name,
                    Column::Predicate => &mut row.predicate,
                    Column::Value => &mut row.value,
                    Column::Message => &mut row.message,
                    Column::Severity => &mut row.severity,
                };
                *field = cell.trim().to_string();
            }
            row
        })
        .collect();

    if rows.is_empty() {
        return Err(RuleError::EmptyTable);
    }

    Ok(rows)
}

/// 从本地文件读取规则表
#[instrument]
pub async fn read_table(path: &Path) -> Result<Vec<RuleRow>> {
    let text = tokio::fs::read_to_string(path).await?;
    let rows = parse_table(&text)?;
    info!(rows = rows.len(), "规则表已读取");
    Ok(rows)
}

/// 通过 HTTP 获取规则表
#[instrument(skip(timeout))]
pub async fn fetch_table(url: &str, timeout: Duration) -> Result<Vec<RuleRow>> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let text = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let rows = parse_table(&text)?;
    info!(rows = rows.len(), "规则表已获取");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Rule Number\tLogic\tProperty Name\tPredicate\tValue\tMessage\tReport Severity";

    #[test]
    fn test_parse_table() {
        let text = format!(
            "{}\r\n1\tWHERE\tcategory\tmatches\tWalls\t\t\r\n1\tAND\theight\tgreater than\t1200\tWall height must exceed 1200mm\tError\r\n\r\n",
            HEADER
        );
        let rows = parse_table(&text).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].logic, "WHERE");
        assert_eq!(rows[0].severity, "");
        assert_eq!(rows[1].property_name, "height");
        assert_eq!(rows[1].message, "Wall height must exceed 1200mm");
        assert_eq!(rows[1].severity, "Error");
    }

    #[test]
    fn test_blank_rows_keep_table_line_numbers() {
        let text = format!(
            "{}\n1\tAND\tMark\texists\t\tneeds mark\tInfo\n\t\t\t\t\t\t\n\n2\tAND\theight\tapproximately\t1\tm\tError\n",
            HEADER
        );
        let rows = parse_table(&text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, Some(2));
        assert_eq!(rows[1].line, Some(5));

        let err = crate::compiler::RuleParser::new().parse(&rows).unwrap_err();
        assert_eq!(err.row(), Some(5));
        assert!(err.to_string().contains("#5"));
    }

    #[test]
    fn test_columns_located_by_header() {
        let text = "severity\tmessage\tvalue\tpredicate\tproperty_name\tlogic\trule_number\tnotes\n\
                    Warning\tneeds mark\t\texists\tMark\tAND\t4\tignored column\n";
        let rows = parse_table(text).unwrap();

        assert_eq!(rows[0].rule_number, "4");
        assert_eq!(rows[0].severity, "Warning");
        assert_eq!(rows[0].predicate, "exists");
        assert_eq!(rows[0].value, "");
    }

    #[test]
    fn test_short_rows_leave_fields_empty() {
        let text = format!("{}\n2\tAND\tMark\texists\n", HEADER);
        let rows = parse_table(&text).unwrap();
        assert_eq!(rows[0].predicate, "exists");
        assert_eq!(rows[0].message, "");
    }

    #[test]
    fn test_missing_column() {
        let text = "Rule Number\tLogic\tProperty Name\tPredicate\tValue\tMessage\n1\tAND\ta\texists\t\tm\n";
        match parse_table(text) {
            Err(RuleError::MissingColumn(column)) => assert_eq!(column, "Report Severity"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_table() {
        assert!(matches!(parse_table(""), Err(RuleError::EmptyTable)));
        assert!(matches!(parse_table(HEADER), Err(RuleError::EmptyTable)));
    }

    #[test]
    fn test_read_table_from_file() {
        let path = std::env::temp_dir().join(format!("rulecheck-table-{}.tsv", std::process::id()));
        std::fs::write(&path, format!("{}\n7\tAND\tMark\texists\t\tneeds mark\tInfo\n", HEADER))
            .unwrap();

        let rows = tokio_test::block_on(read_table(&path)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rule_number, "7");

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let err = read_table(Path::new("/definitely/not/here.tsv")).await.unwrap_err();
        assert!(matches!(err, RuleError::Io(_)));
        assert!(!err.is_configuration_error());
    }
}
