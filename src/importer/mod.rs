// ==========================================
// 版税对账结算系统 - 导入层
// ==========================================
// 职责: 外部报表数据导入,生成归一化明细
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod header_locator;
pub mod importer_trait;
pub mod normalizer;
pub mod sheet_parser;
pub mod statement_importer;
pub mod strategy;
pub mod vendor_matcher;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use header_locator::{extract_metadata, locate_header, row_score, HEADER_KEYWORDS};
pub use sheet_parser::{
    row_get, row_has, to_keyed_rows, CellValue, CsvSheetParser, ExcelSheetParser, KeyedRow,
    RawRow, UniversalSheetParser,
};
pub use statement_importer::StatementImporterImpl;
pub use strategy::{builtin_strategy, NormalizationStrategy, PlatformStrategy};
pub use vendor_matcher::VendorMatcher;

// 重导出 Trait 接口与请求/响应结构
pub use importer_trait::{
    ImportStatementRequest, ManualReportRequest, SheetParser, StatementImported,
    StatementImporter, StatementPreview,
};
