// ==========================================
// 版税对账结算系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 传播策略: 解析/校验错误在任何写库之前同步返回,
//           携带足以修正输入的细节 (缺哪些列/哪些 id 非法)
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    /// 解析库内部失败（损坏的工作簿/空表）统一收敛到该类型,
    /// 不向调用方泄漏底层异常细节
    #[error("文件无效或为空: {0}")]
    InvalidOrEmptyFile(String),

    // ===== 引用查找错误 =====
    #[error("平台不存在: {0}")]
    PlatformNotFound(String),

    // ===== 列归一化错误 =====
    #[error("平台 {platform} 缺少必需列: {columns}")]
    MissingRequiredColumns { platform: String, columns: String },

    #[error("平台 {0} 未配置解析策略,请先提供列映射")]
    NoStrategyConfigured(String),

    // ===== 手工报表校验错误 =====
    #[error("控制总额校验失败: 行合计 {actual},声明总额 {expected}")]
    SumValidationFailed { expected: f64, actual: f64 },

    #[error("存在无效的供应商 ID: {0}")]
    InvalidVendorIds(String),

    // ===== 存储错误 =====
    #[error("数据库错误: {0}")]
    Storage(#[from] crate::repository::RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::InvalidOrEmptyFile(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::InvalidOrEmptyFile(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
