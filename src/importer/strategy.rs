// ==========================================
// 版税对账结算系统 - 平台解析策略表
// ==========================================
// 职责: 数据驱动的按平台列声明 (固定策略),
//       以及"固定策略 vs 动态映射"的带标签选择
// ==========================================

// ==========================================
// PlatformStrategy - 固定策略
// ==========================================
// 每个已知平台一条静态声明: 供应商列 / 金额列 (可有别名) /
// 可选标题列 / 必需列清单 / 可选的固定表头行
#[derive(Debug, Clone)]
pub struct PlatformStrategy {
    pub vendor_col: &'static str,
    pub amount_cols: &'static [&'static str], // 按声明顺序尝试的金额列别名
    pub title_col: Option<&'static str>,
    pub required_cols: &'static [&'static str],
    pub header_row: Option<usize>, // 该平台报表固定的表头行下标
}

// ==========================================
// 内置策略表 (来自各平台报表的实际格式分析)
// ==========================================

static AEBN: PlatformStrategy = PlatformStrategy {
    vendor_col: "Studio",
    amount_cols: &["Total"],
    title_col: Some("Title"),
    required_cols: &["Studio", "Total", "Title"],
    header_row: None,
};

static AVE: PlatformStrategy = PlatformStrategy {
    vendor_col: "Studio",
    amount_cols: &["Total"],
    title_col: Some("Title"),
    required_cols: &["Studio", "Total", "Title"],
    header_row: Some(18), // 明细文件表头在第 19 行 (下标 18)
};

static SEXLIKEREAL: PlatformStrategy = PlatformStrategy {
    vendor_col: "Studio",
    amount_cols: &["Payouts, $"],
    title_col: None,
    required_cols: &["Studio", "Payouts, $"],
    header_row: Some(3), // 表头在第 4 行 (下标 3)
};

static VELVET: PlatformStrategy = PlatformStrategy {
    vendor_col: "Label",
    // 金额列在不同批次间变动,按别名顺序取首个存在者
    amount_cols: &["Total Sale net vat", "Netsales (CC)"],
    title_col: Some("Title"),
    required_cols: &["Label", "Title"],
    header_row: None,
};

static AECASH: PlatformStrategy = PlatformStrategy {
    vendor_col: "Studio",
    amount_cols: &["Total"],
    title_col: Some("Title"),
    required_cols: &["Studio", "Total", "Title"],
    header_row: None,
};

/// 按平台名查找内置固定策略
///
/// 未知平台返回 None,由调用方要求动态映射
pub fn builtin_strategy(platform_name: &str) -> Option<&'static PlatformStrategy> {
    match platform_name {
        "AEBN" => Some(&AEBN),
        "AVE" => Some(&AVE),
        "SEXLIKEREAL" => Some(&SEXLIKEREAL),
        "Velvet" => Some(&VELVET),
        "AECASH" => Some(&AECASH),
        _ => None,
    }
}

// ==========================================
// NormalizationStrategy - 归一化方式选择
// ==========================================
// 带标签变体,而非依赖可选字段的存在性分支:
// - Fixed: 内置固定策略
// - Mapped: 调用方/模板提供的 规范字段→源列 映射
#[derive(Debug, Clone)]
pub enum NormalizationStrategy<'a> {
    Fixed(&'static PlatformStrategy),
    Mapped(&'a [(String, String)]),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_strategy_lookup() {
        let slr = builtin_strategy("SEXLIKEREAL").unwrap();
        assert_eq!(slr.vendor_col, "Studio");
        assert_eq!(slr.amount_cols, &["Payouts, $"]);
        assert_eq!(slr.header_row, Some(3));
        assert!(slr.title_col.is_none());

        assert!(builtin_strategy("UnknownPlatform").is_none());
    }

    #[test]
    fn test_velvet_amount_aliases_ordered() {
        let velvet = builtin_strategy("Velvet").unwrap();
        assert_eq!(velvet.amount_cols.len(), 2);
        assert_eq!(velvet.amount_cols[0], "Total Sale net vat");
    }
}
