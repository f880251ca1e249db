// ==========================================
// 版税对账结算系统 - 营收报表业务接口
// ==========================================
// 职责: 包装导入层,把 ImportError 翻译为 ApiError
// ==========================================

use crate::api::error::ApiResult;
use crate::importer::{
    ImportStatementRequest, ManualReportRequest, StatementImported, StatementImporter,
    StatementImporterImpl, StatementPreview,
};
use std::path::Path;

// ==========================================
// RevenueApi
// ==========================================
pub struct RevenueApi {
    importer: StatementImporterImpl,
}

impl RevenueApi {
    pub fn new(importer: StatementImporterImpl) -> Self {
        Self { importer }
    }

    /// 预览报表: 表头定位 + 样例行 + 建议映射
    pub async fn preview_statement<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        platform_id: &str,
    ) -> ApiResult<StatementPreview> {
        Ok(self
            .importer
            .preview_statement(file_path, platform_id)
            .await?)
    }

    /// 导入报表文件
    pub async fn save_statement<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        request: ImportStatementRequest,
    ) -> ApiResult<StatementImported> {
        Ok(self.importer.import_statement(file_path, request).await?)
    }

    /// 手工报表录入 (带控制总额校验)
    pub async fn save_manual_report(
        &self,
        request: ManualReportRequest,
    ) -> ApiResult<StatementImported> {
        Ok(self.importer.import_manual_report(request).await?)
    }

    /// 批量导入多个文件
    pub async fn save_statements<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
        request: ImportStatementRequest,
    ) -> Vec<Result<StatementImported, String>> {
        self.importer.batch_import(file_paths, request).await
    }
}
