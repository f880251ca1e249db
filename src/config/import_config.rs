// ==========================================
// 版税对账结算系统 - 导入启发式参数
// ==========================================
// 职责: 集中声明表头识别/金额回写/控制总额校验的调优常量
// 红线: 逻辑代码不得内嵌这些字面量
// ==========================================

/// 表头扫描深度: 只在前 N 行内寻找表头
pub const HEADER_SCAN_DEPTH: usize = 40;

/// 表头判定阈值: 行内命中关键词数 ≥ 该值才视为表头候选
pub const HEADER_SCORE_MIN: usize = 2;

/// 出账金额回写批大小
///
/// 每行 3 个绑定参数 (record_id, commission, net);
/// SQLite bundled 的参数上限为 32766, 2000×3=6000 留有余量
pub const AMOUNT_UPDATE_BATCH_SIZE: usize = 2000;

/// 手工报表控制总额允许的浮点误差
pub const SUM_VALIDATION_EPSILON: f64 = 0.02;

/// 预览: 表头定位成功时返回的样例数据行数
pub const PREVIEW_SAMPLE_ROWS: usize = 5;

/// 预览: 表头定位失败时返回的原始行数 (供人工选择)
pub const PREVIEW_RAW_ROWS: usize = 10;

// ==========================================
// ImportTuning - 参数快照
// ==========================================
// 测试中可替换,生产路径使用 Default
#[derive(Debug, Clone, Copy)]
pub struct ImportTuning {
    pub header_scan_depth: usize,
    pub header_score_min: usize,
    pub amount_update_batch_size: usize,
    pub sum_validation_epsilon: f64,
}

impl Default for ImportTuning {
    fn default() -> Self {
        Self {
            header_scan_depth: HEADER_SCAN_DEPTH,
            header_score_min: HEADER_SCORE_MIN,
            amount_update_batch_size: AMOUNT_UPDATE_BATCH_SIZE,
            sum_validation_epsilon: SUM_VALIDATION_EPSILON,
        }
    }
}
