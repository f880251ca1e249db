// ==========================================
// 版税对账结算系统 - 表头定位器
// ==========================================
// 职责: 在无结构的报表前部按关键词密度找出数据表表头行,
//       并把表头上方的次级表头/值行对压平为元数据
// ==========================================

use crate::config::{HEADER_SCAN_DEPTH, HEADER_SCORE_MIN};
use crate::importer::sheet_parser::{CellValue, RawRow};
use serde_json::{Map, Value};

/// 表头识别关键词表 (取自各平台报表的实际列名词汇)
pub const HEADER_KEYWORDS: [&str; 15] = [
    "studio",
    "revenue",
    "earnings",
    "title",
    "date",
    "period",
    "gross",
    "net",
    "commission",
    "vendor",
    "video",
    "sales",
    "amount",
    "currency",
    "payouts",
];

/// 行的"表头得分": 行内文本命中的关键词个数 (每个关键词至多计 1)
pub fn row_score(row: &RawRow) -> usize {
    let row_text = row
        .iter()
        .map(|c| c.display_text())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    HEADER_KEYWORDS
        .iter()
        .filter(|kw| row_text.contains(**kw))
        .count()
}

/// 在前 HEADER_SCAN_DEPTH 行内定位最可能的数据表表头行
///
/// # 规则
/// - 得分 ≥ HEADER_SCORE_MIN 才是候选
/// - 取达到"滚动最大得分"的最后一行:
///   前部的元数据块往往也长得像表头,真正的数据表表头更靠近数据
///
/// # 返回
/// - Some(下标): 命中
/// - None: 没有任何行达到阈值
pub fn locate_header(rows: &[RawRow]) -> Option<usize> {
    let mut best_row_index = None;
    let mut max_score = 0;

    let limit = rows.len().min(HEADER_SCAN_DEPTH);
    for (i, row) in rows.iter().take(limit).enumerate() {
        let score = row_score(row);
        if score >= HEADER_SCORE_MIN && score >= max_score {
            max_score = score;
            best_row_index = Some(i);
        }
    }

    best_row_index
}

/// 提取表头上方的元数据
///
/// 自上而下扫描: 得分 ≥ 阈值且不是最后一行的行视为次级表头,
/// 紧随其后的一行视为其值行;表头格非空文本且值格非空时记录
/// `metadata[表头文本.trim()] = 值`,随后跳过值行避免二次扫描
pub fn extract_metadata(rows: &[RawRow]) -> Map<String, Value> {
    let mut metadata = Map::new();

    let mut i = 0;
    while i + 1 < rows.len() {
        let row = &rows[i];
        if row_score(row) >= HEADER_SCORE_MIN {
            let values = &rows[i + 1];
            for (col_idx, key_cell) in row.iter().enumerate() {
                // 表头格必须是非空文本;数值格不能当键
                let key = match key_cell {
                    CellValue::Text(s) if !s.trim().is_empty() => s.trim().to_string(),
                    _ => continue,
                };
                match values.get(col_idx) {
                    Some(val) if !val.is_empty() => {
                        metadata.insert(key, val.to_json());
                    }
                    _ => {}
                }
            }
            i += 2; // 跳过值行
        } else {
            i += 1;
        }
    }

    metadata
}
