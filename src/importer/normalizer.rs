// ==========================================
// 版税对账结算系统 - 列归一化器
// ==========================================
// 职责: 把键控行按固定策略或动态映射抽取为规范字段,
//       其余列全部贪婪收入元数据
// 红线: 元数据键集与该行解析出的规范列集互斥
// ==========================================

use crate::domain::revenue::NormalizedRecord;
use crate::domain::types::RecordStatus;
use crate::importer::data_cleaner::{parse_amount, parse_plain_number};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sheet_parser::{row_get, row_has, KeyedRow};
use crate::importer::strategy::{NormalizationStrategy, PlatformStrategy};
use serde_json::Map;

// ==========================================
// 固定策略路径
// ==========================================

/// 固定策略校验: 必需列与金额列别名必须出现在首行
///
/// # 返回
/// - Ok(解析到的金额列名)
/// - Err(MissingRequiredColumns): 列出全部缺失列
pub fn validate_fixed_strategy(
    first_row: &KeyedRow,
    strategy: &PlatformStrategy,
    platform_name: &str,
) -> ImportResult<String> {
    let mut missing: Vec<String> = strategy
        .required_cols
        .iter()
        .filter(|col| !row_has(first_row, col))
        .map(|col| col.to_string())
        .collect();

    // 金额列按别名顺序取首个存在者
    let amount_col = strategy
        .amount_cols
        .iter()
        .find(|col| row_has(first_row, col))
        .map(|col| col.to_string());

    if amount_col.is_none() {
        missing.push(format!("One of: {}", strategy.amount_cols.join(", ")));
    }

    if !missing.is_empty() {
        return Err(ImportError::MissingRequiredColumns {
            platform: platform_name.to_string(),
            columns: missing.join(", "),
        });
    }

    // unwrap 安全: 上面已确认 Some
    Ok(amount_col.unwrap())
}

/// 固定策略归一化单行
///
/// # 行过滤
/// 供应商格与金额格都有内容才保留;否则视为空白/分隔行,静默丢弃
pub fn normalize_fixed_row(
    row: &KeyedRow,
    strategy: &PlatformStrategy,
    amount_col: &str,
) -> Option<NormalizedRecord> {
    let vendor_cell = row_get(row, strategy.vendor_col)?;
    let amount_cell = row_get(row, amount_col)?;
    if !vendor_cell.is_truthy() || !amount_cell.is_truthy() {
        return None;
    }

    // 规范列集合 (元数据与之互斥)
    let core_cols: Vec<&str> = {
        let mut cols = vec![strategy.vendor_col, amount_col];
        if let Some(title) = strategy.title_col {
            cols.push(title);
        }
        cols
    };

    // 贪婪元数据: 非规范列原样保留
    let mut metadata = Map::new();
    for (key, value) in row {
        if !core_cols.contains(&key.as_str()) {
            metadata.insert(key.clone(), value.to_json());
        }
    }

    let line_item_name = strategy
        .title_col
        .and_then(|title| row_get(row, title))
        .map(|c| c.display_text())
        .unwrap_or_else(|| "N/A".to_string());

    Some(NormalizedRecord {
        raw_vendor_name: vendor_cell.display_text(),
        gross_revenue: parse_amount(amount_cell),
        line_item_name,
        metadata,
        vendor_id: None,
        status: RecordStatus::Unprocessed,
    })
}

/// 固定策略归一化整表
pub fn normalize_fixed(
    rows: &[KeyedRow],
    strategy: &PlatformStrategy,
    platform_name: &str,
) -> ImportResult<Vec<NormalizedRecord>> {
    let first_row = match rows.first() {
        Some(row) => row,
        None => return Ok(Vec::new()),
    };

    let amount_col = validate_fixed_strategy(first_row, strategy, platform_name)?;

    Ok(rows
        .iter()
        .filter_map(|row| normalize_fixed_row(row, strategy, &amount_col))
        .collect())
}

// ==========================================
// 动态映射路径
// ==========================================

/// 反查: 源列名 → 规范字段名 (首个声明生效)
fn mapped_field<'a>(mapping: &'a [(String, String)], column: &str) -> Option<&'a str> {
    mapping
        .iter()
        .find(|(_, col)| col == column)
        .map(|(field, _)| field.as_str())
}

/// 动态映射归一化单行
///
/// 对行内每一列做反查: 命中 grossRevenue/lineItemName/rawVendorName
/// 的路由到对应规范字段,未命中的全部进元数据
///
/// # 行过滤
/// 既无供应商文本又无非零金额的行丢弃
pub fn normalize_mapped_row(
    row: &KeyedRow,
    mapping: &[(String, String)],
) -> Option<NormalizedRecord> {
    let mut gross_revenue = 0.0;
    let mut line_item_name = String::new();
    let mut raw_vendor_name = String::new();
    let mut metadata = Map::new();

    for (key, value) in row {
        match mapped_field(mapping, key) {
            Some("grossRevenue") => gross_revenue = parse_plain_number(value),
            Some("lineItemName") => line_item_name = value.display_text(),
            Some("rawVendorName") => raw_vendor_name = value.display_text(),
            // 未映射列与映射到未知字段的列都贪婪收入元数据
            _ => {
                metadata.insert(key.clone(), value.to_json());
            }
        }
    }

    if raw_vendor_name.trim().is_empty() && gross_revenue == 0.0 {
        return None;
    }

    Some(NormalizedRecord {
        raw_vendor_name,
        gross_revenue,
        line_item_name,
        metadata,
        vendor_id: None,
        status: RecordStatus::Unprocessed,
    })
}

/// 动态映射归一化整表
pub fn normalize_mapped(
    rows: &[KeyedRow],
    mapping: &[(String, String)],
) -> Vec<NormalizedRecord> {
    rows.iter()
        .filter_map(|row| normalize_mapped_row(row, mapping))
        .collect()
}

// ==========================================
// 统一入口
// ==========================================

/// 按带标签策略归一化整表
pub fn normalize(
    rows: &[KeyedRow],
    strategy: &NormalizationStrategy<'_>,
    platform_name: &str,
) -> ImportResult<Vec<NormalizedRecord>> {
    match strategy {
        NormalizationStrategy::Fixed(fixed) => normalize_fixed(rows, fixed, platform_name),
        NormalizationStrategy::Mapped(mapping) => Ok(normalize_mapped(rows, mapping)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::sheet_parser::CellValue;
    use crate::importer::strategy::builtin_strategy;

    fn keyed(pairs: &[(&str, CellValue)]) -> KeyedRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_fixed_strategy_missing_columns_listed() {
        let strategy = builtin_strategy("AEBN").unwrap();
        let row = keyed(&[("Studio", text("Acme"))]);

        let err = normalize_fixed(&[row], strategy, "AEBN").unwrap_err();
        match err {
            ImportError::MissingRequiredColumns { platform, columns } => {
                assert_eq!(platform, "AEBN");
                assert!(columns.contains("Total"));
                assert!(columns.contains("Title"));
            }
            other => panic!("expected MissingRequiredColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_fixed_strategy_amount_alias_resolution() {
        let strategy = builtin_strategy("Velvet").unwrap();
        // 首个别名缺失,第二个存在
        let row = keyed(&[
            ("Label", text("AcmeXXX")),
            ("Title", text("Clip A")),
            ("Netsales (CC)", text("€50")),
        ]);

        let records = normalize_fixed(&[row], strategy, "Velvet").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].gross_revenue, 50.0);
    }

    #[test]
    fn test_fixed_strategy_drops_blank_separator_rows() {
        let strategy = builtin_strategy("SEXLIKEREAL").unwrap();
        let rows = vec![
            keyed(&[
                ("Studio", text("Rome Major")),
                ("Payouts, $", text("2.77")),
            ]),
            // 小计/分隔行: 供应商格为空
            keyed(&[("Studio", CellValue::Empty), ("Payouts, $", text("100"))]),
            // 金额格为空
            keyed(&[("Studio", text("Acme")), ("Payouts, $", CellValue::Empty)]),
        ];

        let records = normalize_fixed(&rows, strategy, "SEXLIKEREAL").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw_vendor_name, "Rome Major");
    }

    #[test]
    fn test_fixed_strategy_metadata_disjoint_from_core_columns() {
        let strategy = builtin_strategy("SEXLIKEREAL").unwrap();
        let row = keyed(&[
            ("Studio", text("Rome Major")),
            ("Payouts, $", text("2.77")),
            ("Pay Period", text("July, 2025")),
            ("Amount, $", text("1,963.99")),
        ]);

        let records = normalize_fixed(&[row], strategy, "SEXLIKEREAL").unwrap();
        let record = &records[0];

        // 元数据 = 全部列 − 规范列
        assert!(!record.metadata.contains_key("Studio"));
        assert!(!record.metadata.contains_key("Payouts, $"));
        assert_eq!(
            record.metadata.get("Pay Period").and_then(|v| v.as_str()),
            Some("July, 2025")
        );
        assert_eq!(
            record.metadata.get("Amount, $").and_then(|v| v.as_str()),
            Some("1,963.99")
        );
        // 无标题列的平台,标题缺省为 N/A
        assert_eq!(record.line_item_name, "N/A");
        assert_eq!(record.gross_revenue, 2.77);
    }

    #[test]
    fn test_mapped_row_routes_canonical_fields() {
        let mapping = vec![
            ("rawVendorName".to_string(), "Studio".to_string()),
            ("grossRevenue".to_string(), "Earnings".to_string()),
            ("lineItemName".to_string(), "Video".to_string()),
        ];
        let row = keyed(&[
            ("Studio", text("AcmeXXX")),
            ("Earnings", CellValue::Number(12.5)),
            ("Video", text("Clip B")),
            ("Views", CellValue::Number(300.0)),
        ]);

        let record = normalize_mapped_row(&row, &mapping).unwrap();
        assert_eq!(record.raw_vendor_name, "AcmeXXX");
        assert_eq!(record.gross_revenue, 12.5);
        assert_eq!(record.line_item_name, "Clip B");
        assert_eq!(record.metadata.len(), 1);
        assert_eq!(
            record.metadata.get("Views").and_then(|v| v.as_f64()),
            Some(300.0)
        );
    }

    #[test]
    fn test_mapped_row_drops_trash_rows() {
        let mapping = vec![
            ("rawVendorName".to_string(), "Studio".to_string()),
            ("grossRevenue".to_string(), "Earnings".to_string()),
        ];
        // 无供应商且金额为 0 → 丢弃
        let trash = keyed(&[
            ("Studio", CellValue::Empty),
            ("Earnings", CellValue::Number(0.0)),
        ]);
        assert!(normalize_mapped_row(&trash, &mapping).is_none());

        // 有供应商即保留,金额 0 合法
        let kept = keyed(&[
            ("Studio", text("Acme")),
            ("Earnings", CellValue::Number(0.0)),
        ]);
        assert!(normalize_mapped_row(&kept, &mapping).is_some());
    }
}
