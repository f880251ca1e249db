// ==========================================
// 版税对账结算系统 - 导入层 Trait
// ==========================================
// 职责: 定义报表导入接口（不包含实现）
// ==========================================

use crate::domain::revenue::ManualReportRow;
use crate::domain::types::ReportPaymentStatus;
use crate::importer::error::ImportResult;
use crate::importer::sheet_parser::RawRow;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

// ==========================================
// SheetParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvSheetParser, ExcelSheetParser, UniversalSheetParser
pub trait SheetParser: Send + Sync {
    /// 解析文件为原始行（有序行×有序单元格,空白行已剔除）
    fn parse_raw(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

// ==========================================
// 请求/响应结构
// ==========================================

/// 报表预览结果 (供人工确认表头与映射)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementPreview {
    pub platform_name: String,
    pub file_name: String,
    /// None = 扫描未命中,须人工指定
    pub header_row_index: Option<usize>,
    pub detected_headers: Vec<String>,
    pub sample_rows: Vec<Vec<Value>>,
    /// 已有模板时给出建议映射 (规范字段 → 源列)
    pub suggested_mapping: Vec<(String, String)>,
}

/// 报表导入请求
#[derive(Debug, Clone)]
pub struct ImportStatementRequest {
    pub platform_id: String,
    /// 账期月份 (period_start = period_end = month)
    pub month: NaiveDate,
    /// 平台声明的控制总额 (可缺省,仅记录)
    pub total_amount: Option<f64>,
    /// 调用方覆写的列映射;提供时会连同检测到的表头行一起
    /// upsert 为该平台的映射模板
    pub mapping: Option<Vec<(String, String)>>,
    pub invoice_ref: Option<String>,
    pub payment_status: ReportPaymentStatus,
}

/// 手工报表请求
#[derive(Debug, Clone)]
pub struct ManualReportRequest {
    pub platform_id: String,
    pub month: NaiveDate,
    /// 控制总额,与行合计做 epsilon 校验
    pub total_amount: f64,
    pub rows: Vec<ManualReportRow>,
}

/// 导入完成结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementImported {
    pub report_id: String,
    pub total_records: usize,
}

// ==========================================
// StatementImporter Trait
// ==========================================
// 用途: 报表导入主接口
// 实现者: StatementImporterImpl
#[async_trait]
pub trait StatementImporter: Send + Sync {
    /// 预览报表: 定位表头,抽样数据,给出建议映射
    ///
    /// # 流程
    /// 1. 原始模式解析 (行×单元格)
    /// 2. 表头行: 平台已有模板 → 模板值;否则关键词扫描
    /// 3. 命中 → 表头 + 后续样例行;未命中 → 前部原始行供人工选择
    async fn preview_statement<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        platform_id: &str,
    ) -> ImportResult<StatementPreview>;

    /// 导入报表文件并落库
    ///
    /// # 策略优先级
    /// 1. 请求携带的映射 (同时 upsert 为平台模板)
    /// 2. 平台已持久化的映射模板
    /// 3. 平台内置固定策略
    /// 4. 皆无 → NoStrategyConfigured
    async fn import_statement<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        request: ImportStatementRequest,
    ) -> ImportResult<StatementImported>;

    /// 手工报表落库 (供应商已人工指定,带控制总额校验)
    async fn import_manual_report(
        &self,
        request: ManualReportRequest,
    ) -> ImportResult<StatementImported>;

    /// 批量导入多个文件（并发执行,单文件失败不影响其他文件）
    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
        request: ImportStatementRequest,
    ) -> Vec<Result<StatementImported, String>>;
}
