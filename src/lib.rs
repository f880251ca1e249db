// ==========================================
// 版税对账结算系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 分销平台版税报表归一化 → 供应商匹配 → 结算出账
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 佣金与汇总规则
pub mod engine;

// 导入层 - 外部报表数据
pub mod importer;

// 配置层 - 启发式参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{PayoutStatus, RecordStatus, ReportPaymentStatus};

// 领域实体
pub use domain::{
    MappingTemplate, NormalizedRecord, Payout, PayoutSummary, Platform, PlatformSplit,
    RevenueRecord, RevenueReport, Vendor,
};

// 导入层
pub use importer::{
    CellValue, ImportError, KeyedRow, NormalizationStrategy, StatementImporter,
    StatementImporterImpl, UniversalSheetParser, VendorMatcher,
};

// API
pub use api::{ApiError, PayoutApi, RevenueApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "版税对账结算系统";
