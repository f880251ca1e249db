// ==========================================
// 版税对账结算系统 - 数据清洗器
// ==========================================
// 职责: TRIM / NULL 标准化 / 宽容金额解析
// 红线: 单格金额解析失败不报错,统一降级为 0
//       (上游报表质量不可控,单个坏格不应阻断整个文件)
// ==========================================

use crate::importer::sheet_parser::CellValue;

/// 清洗文本字段（TRIM,可选转大写）
pub fn clean_text(value: &str, uppercase: bool) -> String {
    let trimmed = value.trim();
    if uppercase {
        trimmed.to_uppercase()
    } else {
        trimmed.to_string()
    }
}

/// 标准化 NULL 值（空字符串/空白 → None）
pub fn normalize_null(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// 宽容金额解析
///
/// # 规则
/// - 数值单元格直接采用
/// - 文本: 剥离货币符号 (€/$)、千分位逗号、空白后按十进制解析
/// - 解析失败 → 0.0 (刻意的宽容策略,绝不报错)
pub fn parse_amount(cell: &CellValue) -> f64 {
    match cell {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| *c != '€' && *c != '$' && *c != ',' && !c.is_whitespace())
                .collect();
            cleaned.parse::<f64>().unwrap_or(0.0)
        }
        CellValue::Empty => 0.0,
    }
}

/// 动态映射路径的"朴素数值"解析
///
/// 与 parse_amount 不同,不做货币符号剥离: 映射模板声明的金额列
/// 按原样解析,失败同样降级为 0
pub fn parse_plain_number(cell: &CellValue) -> f64 {
    match cell {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        CellValue::Empty => 0.0,
    }
}
