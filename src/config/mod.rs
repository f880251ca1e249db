// ==========================================
// 版税对账结算系统 - 配置层
// ==========================================
// 职责: 导入/结算启发式参数的具名常量
// ==========================================

pub mod import_config;

pub use import_config::{
    ImportTuning, AMOUNT_UPDATE_BATCH_SIZE, HEADER_SCAN_DEPTH, HEADER_SCORE_MIN,
    PREVIEW_RAW_ROWS, PREVIEW_SAMPLE_ROWS, SUM_VALIDATION_EPSILON,
};
