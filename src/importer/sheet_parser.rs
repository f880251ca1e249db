// ==========================================
// 版税对账结算系统 - 表格文件解析器
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 两种模式:
// - 原始模式: 有序行×有序单元格,供表头定位与预览
// - 键控模式: 指定表头行后产出按列名键控的行对象,
//             并合并表头上方的元数据 (行级字段优先)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::header_locator;
use crate::importer::importer_trait::SheetParser;
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use serde_json::Value;
use std::fs::File;
use std::path::Path;

// ==========================================
// CellValue - 鸭子类型单元格
// ==========================================
// 报表单元格只有三种有效形态: 空 / 文本 / 数值
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// 是否为空 (空单元格或空白文本)
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// 行过滤语义: 空值与数值 0 都视为"无内容"
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Empty => false,
            CellValue::Text(s) => !s.trim().is_empty(),
            CellValue::Number(n) => *n != 0.0,
        }
    }

    /// 文本视图 (数值按十进制格式化)
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                // 整数值不带小数点,与电子表格显示一致
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }

    /// 转为 JSON 值 (元数据存储形态)
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Empty => Value::String(String::new()),
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(n.to_string())),
        }
    }

    /// 从 JSON 值还原 (元数据合并进行级字段时使用)
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Number(n) => n
                .as_f64()
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::Text(n.to_string())),
            Value::Null => CellValue::Empty,
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// 原始行: 有序单元格序列
pub type RawRow = Vec<CellValue>;

/// 键控行: 列名 → 单元格,保持表格列序
pub type KeyedRow = Vec<(String, CellValue)>;

/// 按列名取值
pub fn row_get<'a>(row: &'a KeyedRow, key: &str) -> Option<&'a CellValue> {
    row.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

/// 列是否存在
pub fn row_has(row: &KeyedRow, key: &str) -> bool {
    row.iter().any(|(k, _)| k == key)
}

// ==========================================
// CSV 解析器
// ==========================================
pub struct CsvSheetParser;

impl SheetParser for CsvSheetParser {
    fn parse_raw(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false) // 前导元数据行也要参与表头定位,不能按首行取表头
            .flexible(true)     // 允许行长度不一致
            .from_reader(file);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: RawRow = record
                .iter()
                .map(|v| {
                    let trimmed = v.trim();
                    if trimmed.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(trimmed.to_string())
                    }
                })
                .collect();

            // 跳过完全空白的行
            if row.iter().all(|c| c.is_empty()) {
                continue;
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

// ==========================================
// Excel 解析器
// ==========================================
pub struct ExcelSheetParser;

impl SheetParser for ExcelSheetParser {
    fn parse_raw(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::InvalidOrEmptyFile("工作簿不含任何工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = Vec::new();
        for data_row in range.rows() {
            let row: RawRow = data_row.iter().map(cell_from_calamine).collect();
            if row.iter().all(|c| c.is_empty()) {
                continue;
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

/// calamine 单元格 → CellValue
fn cell_from_calamine(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(trimmed.to_string())
            }
        }
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}

// ==========================================
// 通用解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalSheetParser;

impl SheetParser for UniversalSheetParser {
    fn parse_raw(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvSheetParser.parse_raw(file_path),
            "xlsx" | "xls" => ExcelSheetParser.parse_raw(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

// ==========================================
// 键控模式: 表头行 + 上方元数据 → 行对象
// ==========================================

/// 将原始行按指定表头行转为键控行,并合并表头上方的元数据
///
/// # 规则
/// - 表头行单元格文本 (trim) 作为列名;数据行缺失的列补 Empty
/// - 表头上方按次级表头/值行对提取的元数据合并进每一行,
///   行级字段在键冲突时优先
/// - 无任何数据行视为无效文件
pub fn to_keyed_rows(raw: &[RawRow], header_row_index: usize) -> ImportResult<Vec<KeyedRow>> {
    if header_row_index >= raw.len() {
        return Err(ImportError::InvalidOrEmptyFile(format!(
            "表头行下标 {} 超出数据范围 ({} 行)",
            header_row_index,
            raw.len()
        )));
    }

    let headers: Vec<String> = raw[header_row_index]
        .iter()
        .map(|c| c.display_text().trim().to_string())
        .collect();

    let metadata = header_locator::extract_metadata(&raw[..header_row_index]);

    let mut keyed = Vec::new();
    for data_row in &raw[header_row_index + 1..] {
        let mut row: KeyedRow = metadata
            .iter()
            .map(|(k, v)| (k.clone(), CellValue::from_json(v)))
            .collect();

        for (col_idx, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = data_row.get(col_idx).cloned().unwrap_or(CellValue::Empty);
            // 行级字段覆盖同名元数据
            if let Some(entry) = row.iter_mut().find(|(k, _)| k == header) {
                entry.1 = value;
            } else {
                row.push((header.clone(), value));
            }
        }
        keyed.push(row);
    }

    if keyed.is_empty() {
        return Err(ImportError::InvalidOrEmptyFile(
            "表头行之后没有数据行".to_string(),
        ));
    }

    Ok(keyed)
}
