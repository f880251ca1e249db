// ==========================================
// 版税对账结算系统 - 报表导入器实现
// ==========================================
// 职责: 整合导入流程,从文件到数据库
// 流程: 解析 → 表头定位 → 列归一化 → 供应商匹配 → 事务落库
// ==========================================

use crate::config::{PREVIEW_RAW_ROWS, PREVIEW_SAMPLE_ROWS, SUM_VALIDATION_EPSILON};
use crate::domain::platform::{MappingTemplate, Platform};
use crate::domain::revenue::{NormalizedRecord, RevenueRecord, RevenueReport};
use crate::domain::types::RecordStatus;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::header_locator::locate_header;
use crate::importer::importer_trait::{
    ImportStatementRequest, ManualReportRequest, SheetParser, StatementImported,
    StatementImporter, StatementPreview,
};
use crate::importer::normalizer;
use crate::importer::sheet_parser::{to_keyed_rows, RawRow};
use crate::importer::strategy::{builtin_strategy, NormalizationStrategy};
use crate::importer::vendor_matcher::VendorMatcher;
use crate::repository::{PlatformRepository, RevenueRepository, VendorRepository};
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// StatementImporterImpl - 报表导入器实现
// ==========================================
pub struct StatementImporterImpl {
    // 数据访问层
    platform_repo: Arc<PlatformRepository>,
    vendor_repo: Arc<VendorRepository>,
    revenue_repo: Arc<RevenueRepository>,

    // 文件解析器
    sheet_parser: Box<dyn SheetParser>,
}

impl StatementImporterImpl {
    /// 创建新的 StatementImporter 实例
    pub fn new(
        platform_repo: Arc<PlatformRepository>,
        vendor_repo: Arc<VendorRepository>,
        revenue_repo: Arc<RevenueRepository>,
        sheet_parser: Box<dyn SheetParser>,
    ) -> Self {
        Self {
            platform_repo,
            vendor_repo,
            revenue_repo,
            sheet_parser,
        }
    }

    /// 平台查找 (不存在 → PlatformNotFound)
    fn require_platform(&self, platform_id: &str) -> ImportResult<Platform> {
        self.platform_repo
            .find_by_id(platform_id)?
            .ok_or_else(|| ImportError::PlatformNotFound(platform_id.to_string()))
    }

    /// 表头定位 (扫描未命中视为无效文件)
    fn require_header_row(&self, raw: &[RawRow]) -> ImportResult<usize> {
        locate_header(raw).ok_or_else(|| {
            ImportError::InvalidOrEmptyFile("未能在扫描深度内定位表头行".to_string())
        })
    }
}

#[async_trait::async_trait]
impl StatementImporter for StatementImporterImpl {
    /// 预览报表
    async fn preview_statement<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        platform_id: &str,
    ) -> ImportResult<StatementPreview> {
        let platform = self.require_platform(platform_id)?;
        let template = self.platform_repo.find_mapping_template(platform_id)?;

        let raw = self.sheet_parser.parse_raw(file_path.as_ref())?;
        if raw.is_empty() {
            return Err(ImportError::InvalidOrEmptyFile(
                "文件不含任何数据行".to_string(),
            ));
        }

        // 表头行: 已有模板优先,否则关键词扫描
        let header_row_index = match &template {
            Some(t) => Some(t.header_row_index),
            None => locate_header(&raw),
        };

        let (detected_headers, sample_rows) = match header_row_index {
            Some(idx) if idx < raw.len() => {
                let headers = raw[idx]
                    .iter()
                    .map(|c| c.display_text().trim().to_string())
                    .collect();
                let samples = raw[idx + 1..]
                    .iter()
                    .take(PREVIEW_SAMPLE_ROWS)
                    .map(|row| row.iter().map(|c| c.to_json()).collect())
                    .collect();
                (headers, samples)
            }
            // 未命中: 返回前部原始行供人工选择表头
            _ => (
                Vec::new(),
                raw.iter()
                    .take(PREVIEW_RAW_ROWS)
                    .map(|row| row.iter().map(|c| c.to_json()).collect())
                    .collect(),
            ),
        };

        Ok(StatementPreview {
            platform_name: platform.name,
            file_name: file_path
                .as_ref()
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string(),
            header_row_index,
            detected_headers,
            sample_rows,
            suggested_mapping: template.map(|t| t.mapping_rules).unwrap_or_default(),
        })
    }

    /// 导入报表文件并落库
    #[instrument(skip(self, file_path, request), fields(platform_id = %request.platform_id))]
    async fn import_statement<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        request: ImportStatementRequest,
    ) -> ImportResult<StatementImported> {
        let file_path = file_path.as_ref();
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let platform = self.require_platform(&request.platform_id)?;
        let template = self
            .platform_repo
            .find_mapping_template(&request.platform_id)?;

        info!(file = %file_name, platform = %platform.name, "开始导入报表");

        // === 步骤 1: 原始解析 ===
        let raw = self.sheet_parser.parse_raw(file_path)?;
        if raw.is_empty() {
            return Err(ImportError::InvalidOrEmptyFile(
                "文件不含任何数据行".to_string(),
            ));
        }
        debug!(rows = raw.len(), "原始解析完成");

        // === 步骤 2: 策略与表头行解析 ===
        // 优先级: 请求映射 > 平台模板 > 内置固定策略
        let (mapping_rules, header_row) = if let Some(mapping) = &request.mapping {
            // 调用方覆写映射: 重新检测表头行,并 upsert 为平台模板
            // (模板是辅助缓存,并发覆盖 last-writer-wins)
            let header_row = self.require_header_row(&raw)?;
            self.platform_repo.upsert_mapping_template(&MappingTemplate {
                platform_id: platform.platform_id.clone(),
                header_row_index: header_row,
                mapping_rules: mapping.clone(),
            })?;
            info!(header_row = header_row, "映射模板已保存");
            (Some(mapping.clone()), header_row)
        } else if let Some(template) = template {
            (Some(template.mapping_rules), template.header_row_index)
        } else if builtin_strategy(&platform.name).is_some() {
            (None, self.require_header_row(&raw)?)
        } else {
            return Err(ImportError::NoStrategyConfigured(platform.name.clone()));
        };

        // === 步骤 3: 键控解析 (合并表头上方元数据) ===
        let keyed = to_keyed_rows(&raw, header_row)?;
        debug!(rows = keyed.len(), header_row = header_row, "键控解析完成");

        // === 步骤 4: 列归一化 ===
        let strategy = match &mapping_rules {
            Some(rules) => NormalizationStrategy::Mapped(rules),
            // unwrap 安全: 步骤 2 已确认内置策略存在
            None => NormalizationStrategy::Fixed(builtin_strategy(&platform.name).unwrap()),
        };
        let mut normalized = normalizer::normalize(&keyed, &strategy, &platform.name)?;
        info!(
            parsed = keyed.len(),
            kept = normalized.len(),
            "列归一化完成"
        );

        // === 步骤 5: 供应商匹配 ===
        let vendors = self.vendor_repo.find_all()?;
        let matcher = VendorMatcher::new(&vendors);
        matcher.match_records(&mut normalized);

        let matched = normalized
            .iter()
            .filter(|r| r.status == RecordStatus::Matched)
            .count();
        info!(
            matched = matched,
            unmatched = normalized.len() - matched,
            "供应商匹配完成"
        );

        // === 步骤 6: 事务落库 (报表头 + 全部明细) ===
        let report = RevenueReport {
            report_id: Uuid::new_v4().to_string(),
            platform_id: platform.platform_id.clone(),
            filename: file_name,
            status: "PROCESSED".to_string(),
            total_amount: request.total_amount,
            month: request.month,
            invoice_ref: request.invoice_ref.clone(),
            payment_status: request.payment_status,
            created_at: Utc::now(),
        };

        let records = build_records(&report, &platform, normalized, request.month);
        let total_records = self
            .revenue_repo
            .insert_report_with_records(&report, &records)?;

        info!(
            report_id = %report.report_id,
            records = total_records,
            "报表导入完成"
        );

        Ok(StatementImported {
            report_id: report.report_id,
            total_records,
        })
    }

    /// 手工报表落库
    #[instrument(skip(self, request), fields(platform_id = %request.platform_id))]
    async fn import_manual_report(
        &self,
        request: ManualReportRequest,
    ) -> ImportResult<StatementImported> {
        let platform = self.require_platform(&request.platform_id)?;

        // === 步骤 1: 控制总额校验 (任何写库之前) ===
        let sum: f64 = request.rows.iter().map(|r| r.gross_revenue).sum();
        if (sum - request.total_amount).abs() > SUM_VALIDATION_EPSILON {
            return Err(ImportError::SumValidationFailed {
                expected: request.total_amount,
                actual: sum,
            });
        }

        // === 步骤 2: 严格供应商校验 ===
        let unique_ids: Vec<String> = request
            .rows
            .iter()
            .map(|r| r.vendor_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let vendors = self.vendor_repo.find_by_ids(&unique_ids)?;
        let found: HashSet<&str> = vendors.iter().map(|v| v.vendor_id.as_str()).collect();
        let missing: Vec<&str> = unique_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !found.contains(id))
            .collect();
        if !missing.is_empty() {
            return Err(ImportError::InvalidVendorIds(missing.join(", ")));
        }

        // vendor_id → 公司名,作为 raw_vendor_name 记录
        let name_of: std::collections::HashMap<&str, &str> = vendors
            .iter()
            .map(|v| (v.vendor_id.as_str(), v.company_name.as_str()))
            .collect();

        // === 步骤 3: 事务落库 ===
        let report = RevenueReport {
            report_id: Uuid::new_v4().to_string(),
            platform_id: platform.platform_id.clone(),
            filename: "MANUAL_ENTRY".to_string(),
            status: "PROCESSED".to_string(),
            total_amount: Some(request.total_amount),
            month: request.month,
            invoice_ref: None,
            payment_status: crate::domain::types::ReportPaymentStatus::Pending,
            created_at: Utc::now(),
        };

        let records: Vec<RevenueRecord> = request
            .rows
            .iter()
            .map(|row| RevenueRecord {
                record_id: Uuid::new_v4().to_string(),
                report_id: Some(report.report_id.clone()),
                platform_id: platform.platform_id.clone(),
                vendor_id: Some(row.vendor_id.clone()),
                payout_id: None,
                raw_vendor_name: name_of
                    .get(row.vendor_id.as_str())
                    .copied()
                    .unwrap_or_default()
                    .to_string(),
                gross_revenue: row.gross_revenue,
                line_item_name: row
                    .line_item_name
                    .clone()
                    .unwrap_or_else(|| "Manual Entry".to_string()),
                metadata: serde_json::Map::new(),
                period_start: request.month,
                period_end: request.month,
                status: RecordStatus::Matched,
                commission_amount: None,
                net_amount: None,
                created_at: Utc::now(),
            })
            .collect();

        let total_records = self
            .revenue_repo
            .insert_report_with_records(&report, &records)?;

        info!(
            report_id = %report.report_id,
            records = total_records,
            "手工报表落库完成"
        );

        Ok(StatementImported {
            report_id: report.report_id,
            total_records,
        })
    }

    /// 批量导入多个文件（并发执行）
    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
        request: ImportStatementRequest,
    ) -> Vec<Result<StatementImported, String>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入报表");

        let import_tasks = file_paths.iter().map(|path| {
            let path_str = path.as_ref().to_str().unwrap_or("unknown").to_string();
            let request = request.clone();
            async move {
                match self.import_statement(path.as_ref(), request).await {
                    Ok(result) => {
                        info!(file = %path_str, records = result.total_records, "文件导入成功");
                        Ok(result)
                    }
                    Err(e) => {
                        warn!(file = %path_str, error = %e, "文件导入失败");
                        Err(format!("文件 {} 导入失败: {}", path_str, e))
                    }
                }
            }
        });

        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        results
    }
}

/// 归一化记录 → 持久化明细 (账期统一盖月份戳)
fn build_records(
    report: &RevenueReport,
    platform: &Platform,
    normalized: Vec<NormalizedRecord>,
    month: chrono::NaiveDate,
) -> Vec<RevenueRecord> {
    normalized
        .into_iter()
        .map(|n| RevenueRecord {
            record_id: Uuid::new_v4().to_string(),
            report_id: Some(report.report_id.clone()),
            platform_id: platform.platform_id.clone(),
            vendor_id: n.vendor_id,
            payout_id: None,
            raw_vendor_name: n.raw_vendor_name,
            gross_revenue: n.gross_revenue,
            line_item_name: n.line_item_name,
            metadata: n.metadata,
            period_start: month,
            period_end: month,
            status: n.status,
            commission_amount: None,
            net_amount: None,
            created_at: Utc::now(),
        })
        .collect()
}
