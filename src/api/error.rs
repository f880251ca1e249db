// ==========================================
// 版税对账结算系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型,转换 Repository/Import 错误为
//       用户可处置的业务错误
// 约定: 校验错误与并发冲突是两类错误,后者可重试,绝不混淆
// ==========================================

use crate::importer::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 引用查找错误
    // ==========================================
    #[error("供应商不存在: {0}")]
    VendorNotFound(String),

    #[error("平台不存在: {0}")]
    PlatformNotFound(String),

    #[error("出账单不存在: {0}")]
    PayoutNotFound(String),

    /// 请求的明细部分无效: id 不存在、属于其他供应商,或已被其他出账认领
    #[error("部分记录无效或已被认领: {0}")]
    RecordsNotFound(String),

    // ==========================================
    // 并发控制错误 (可重试)
    // ==========================================
    #[error("并发认领冲突: {0}")]
    ConcurrentClaimConflict(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    /// 非 PENDING 出账单不允许结清,付款日期不可被覆盖
    #[error("出账单已结清,不允许重复结清 (当前状态: {status})")]
    AlreadySettled { status: String },

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户可处置的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::ConcurrentClaimConflict { message } => {
                ApiError::ConcurrentClaimConflict(message)
            }

            // 引用查找错误: 按实体名路由到具体变体
            RepositoryError::NotFound { entity, id } => match entity.as_str() {
                "Vendor" => ApiError::VendorNotFound(id),
                "Platform" => ApiError::PlatformNotFound(id),
                "Payout" => ApiError::PayoutNotFound(id),
                _ => ApiError::DatabaseError(format!("{}(id={})不存在", entity, id)),
            },

            // 状态机守卫: 目前唯一来源是重复结清
            RepositoryError::InvalidStateTransition { from, .. } => {
                ApiError::AlreadySettled { status: from }
            }

            // 数据库错误
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::LockError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::ForeignKeyViolation(msg) => ApiError::DatabaseError(msg),

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::PlatformNotFound(id) => ApiError::PlatformNotFound(id),
            ImportError::Storage(repo_err) => repo_err.into(),

            // 输入可修正的校验错误: 保留完整细节 (缺哪些列/哪些 id 非法)
            ImportError::MissingRequiredColumns { .. }
            | ImportError::NoStrategyConfigured(_)
            | ImportError::SumValidationFailed { .. }
            | ImportError::InvalidVendorIds(_) => ApiError::ValidationError(err.to_string()),

            // 文件层错误
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
