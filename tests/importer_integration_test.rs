// ==========================================
// 报表导入集成测试
// ==========================================
// 职责: 真实 CSV 文件走完整导入管道的端到端验证
// 覆盖: 固定策略 / 动态映射+模板 / 预览 / 错误路径
// ==========================================


use royalty_settlement::domain::types::{RecordStatus, ReportPaymentStatus};
use royalty_settlement::importer::{
    ImportError, ImportStatementRequest, StatementImporter, StatementImporterImpl,
    UniversalSheetParser,
};
use royalty_settlement::repository::{PlatformRepository, RevenueRepository, VendorRepository};
use std::io::Write;
use std::sync::Arc;
use test_helpers::*;

// ==========================================
// 测试环境
// ==========================================

struct TestEnv {
    _temp_file: tempfile::NamedTempFile,
    platform_repo: Arc<PlatformRepository>,
    vendor_repo: Arc<VendorRepository>,
    revenue_repo: Arc<RevenueRepository>,
    importer: StatementImporterImpl,
}

fn setup() -> TestEnv {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared_conn(&db_path);

    let platform_repo = Arc::new(PlatformRepository::new(conn.clone()));
    let vendor_repo = Arc::new(VendorRepository::new(conn.clone()));
    let revenue_repo = Arc::new(RevenueRepository::new(conn.clone()));

    let importer = StatementImporterImpl::new(
        platform_repo.clone(),
        vendor_repo.clone(),
        revenue_repo.clone(),
        Box::new(UniversalSheetParser),
    );

    TestEnv {
        _temp_file: temp_file,
        platform_repo,
        vendor_repo,
        revenue_repo,
        importer,
    }
}

fn write_csv(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn import_request(platform_id: &str) -> ImportStatementRequest {
    ImportStatementRequest {
        platform_id: platform_id.to_string(),
        month: month(2025, 7),
        total_amount: None,
        mapping: None,
        invoice_ref: None,
        payment_status: ReportPaymentStatus::Pending,
    }
}

/// 带品牌行与元数据块的平台报表 (表头在第 4 行,下标 3)
const STATEMENT_WITH_PREAMBLE: &str = "\
SEXLIKEREAL,,
\"Pay Period\",,,\"Amount, $\"
\"July, 2025\",,,\"1,963.99\"
Studio,\"Payouts, $\",Vendor ID
Rome Major,2.77,V-17
Unknown Studio,5.00,V-99
,,
";

// ==========================================
// 固定策略路径
// ==========================================

#[tokio::test]
async fn test_import_fixed_strategy_end_to_end() {
    let env = setup();
    let platform_id = seed_platform(&env.platform_repo, "SEXLIKEREAL", 0.2);
    seed_vendor(&env.vendor_repo, "Rome Major Studio", "V001", &["Rome Major"]);

    let file = write_csv(STATEMENT_WITH_PREAMBLE);
    let result = env
        .importer
        .import_statement(file.path(), import_request(&platform_id))
        .await
        .unwrap();

    // 空白分隔行被丢弃,两条有效明细落库
    assert_eq!(result.total_records, 2);

    let report = env
        .revenue_repo
        .find_report_by_id(&result.report_id)
        .unwrap()
        .unwrap();
    assert_eq!(report.status, "PROCESSED");
    assert_eq!(report.month, month(2025, 7));

    // 已匹配供应商的明细
    let vendors = env.vendor_repo.find_all().unwrap();
    let matched = env
        .revenue_repo
        .find_unpaid_by_vendor(&vendors[0].vendor_id)
        .unwrap();
    assert_eq!(matched.len(), 1);

    let record = &matched[0];
    assert_eq!(record.raw_vendor_name, "Rome Major");
    assert_eq!(record.gross_revenue, 2.77);
    assert_eq!(record.status, RecordStatus::Matched);
    assert_eq!(record.period_start, month(2025, 7));

    // 表头上方元数据合并进每条明细;规范列绝不出现在元数据里
    assert_eq!(
        record.metadata.get("Pay Period").and_then(|v| v.as_str()),
        Some("July, 2025")
    );
    assert_eq!(
        record.metadata.get("Amount, $").and_then(|v| v.as_str()),
        Some("1,963.99")
    );
    assert_eq!(
        record.metadata.get("Vendor ID").and_then(|v| v.as_str()),
        Some("V-17")
    );
    assert!(!record.metadata.contains_key("Studio"));
    assert!(!record.metadata.contains_key("Payouts, $"));
}

#[tokio::test]
async fn test_import_unmatched_vendor_stays_unassigned() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared_conn(&db_path);
    let platform_repo = Arc::new(PlatformRepository::new(conn.clone()));
    let vendor_repo = Arc::new(VendorRepository::new(conn.clone()));
    let revenue_repo = Arc::new(RevenueRepository::new(conn.clone()));
    let importer = StatementImporterImpl::new(
        platform_repo.clone(),
        vendor_repo.clone(),
        revenue_repo.clone(),
        Box::new(UniversalSheetParser),
    );

    let platform_id = seed_platform(&platform_repo, "SEXLIKEREAL", 0.2);
    // 只认识 Rome Major,Unknown Studio 应落为 UNMATCHED
    seed_vendor(&vendor_repo, "Rome Major Studio", "V001", &["Rome Major"]);

    let file = write_csv(STATEMENT_WITH_PREAMBLE);
    importer
        .import_statement(file.path(), import_request(&platform_id))
        .await
        .unwrap();

    // 匹配失败的明细: vendor_id 为空,状态 UNMATCHED,无出账挂接
    let (status, vendor_id, payout_id): (String, Option<String>, Option<String>) = conn
        .lock()
        .unwrap()
        .query_row(
            "SELECT status, vendor_id, payout_id FROM revenue_record
             WHERE raw_vendor_name = 'Unknown Studio'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();

    assert_eq!(status, "UNMATCHED");
    assert_eq!(vendor_id, None);
    assert_eq!(payout_id, None);
}

#[tokio::test]
async fn test_import_missing_required_columns() {
    let env = setup();
    let platform_id = seed_platform(&env.platform_repo, "SEXLIKEREAL", 0.2);

    // 表头可定位 (studio+title+amount) 但缺少 "Payouts, $"
    let file = write_csv("Studio,Amount,Title\nAcme,5,Clip\n");
    let result = env
        .importer
        .import_statement(file.path(), import_request(&platform_id))
        .await;

    match result {
        Err(ImportError::MissingRequiredColumns { platform, columns }) => {
            assert_eq!(platform, "SEXLIKEREAL");
            assert!(columns.contains("Payouts, $"));
        }
        other => panic!("expected MissingRequiredColumns, got {other:?}"),
    }
}

#[tokio::test]
async fn test_import_unknown_platform_without_mapping() {
    let env = setup();
    let platform_id = seed_platform(&env.platform_repo, "NewVR", 0.2);

    let file = write_csv("Creator,Earnings,Video\nAcme,5,Clip\n");
    let result = env
        .importer
        .import_statement(file.path(), import_request(&platform_id))
        .await;

    assert!(matches!(result, Err(ImportError::NoStrategyConfigured(_))));
}

#[tokio::test]
async fn test_import_platform_not_found() {
    let env = setup();
    let file = write_csv("Studio,Total\nAcme,5\n");
    let result = env
        .importer
        .import_statement(file.path(), import_request("no-such-platform"))
        .await;
    assert!(matches!(result, Err(ImportError::PlatformNotFound(_))));
}

#[tokio::test]
async fn test_import_unparseable_file_is_invalid_or_empty() {
    let env = setup();
    let platform_id = seed_platform(&env.platform_repo, "SEXLIKEREAL", 0.2);

    // 无法定位表头的纯噪声文件
    let file = write_csv("hello,world\nfoo,bar\n");
    let result = env
        .importer
        .import_statement(file.path(), import_request(&platform_id))
        .await;
    assert!(matches!(result, Err(ImportError::InvalidOrEmptyFile(_))));
}

// ==========================================
// 动态映射路径 + 模板持久化
// ==========================================

#[tokio::test]
async fn test_import_with_mapping_persists_template() {
    let env = setup();
    let platform_id = seed_platform(&env.platform_repo, "NewVR", 0.2);
    seed_vendor(&env.vendor_repo, "Acme Inc", "V001", &["AcmeXXX"]);

    let mapping = vec![
        ("rawVendorName".to_string(), "Creator".to_string()),
        ("grossRevenue".to_string(), "Earnings".to_string()),
        ("lineItemName".to_string(), "Video".to_string()),
    ];

    let file = write_csv("Creator,Earnings,Video,Views\nAcmeXXX,12.5,Clip B,300\n");
    let mut request = import_request(&platform_id);
    request.mapping = Some(mapping.clone());

    let result = env
        .importer
        .import_statement(file.path(), request)
        .await
        .unwrap();
    assert_eq!(result.total_records, 1);

    // 映射连同检测到的表头行一起持久化为平台模板
    let template = env
        .platform_repo
        .find_mapping_template(&platform_id)
        .unwrap()
        .unwrap();
    assert_eq!(template.header_row_index, 0);
    assert_eq!(template.mapping_rules, mapping);

    // 明细字段路由正确,未映射列进元数据
    let vendors = env.vendor_repo.find_all().unwrap();
    let records = env
        .revenue_repo
        .find_unpaid_by_vendor(&vendors[0].vendor_id)
        .unwrap();
    let record = &records[0];
    assert_eq!(record.raw_vendor_name, "AcmeXXX");
    assert_eq!(record.gross_revenue, 12.5);
    assert_eq!(record.line_item_name, "Clip B");
    assert_eq!(
        record.metadata.get("Views").and_then(|v| v.as_str()),
        Some("300")
    );
    assert!(!record.metadata.contains_key("Creator"));
}

#[tokio::test]
async fn test_second_upload_reuses_persisted_template() {
    let env = setup();
    let platform_id = seed_platform(&env.platform_repo, "NewVR", 0.2);
    seed_vendor(&env.vendor_repo, "Acme Inc", "V001", &["AcmeXXX"]);

    let mapping = vec![
        ("rawVendorName".to_string(), "Creator".to_string()),
        ("grossRevenue".to_string(), "Earnings".to_string()),
    ];

    // 首次上传携带映射
    let file = write_csv("Creator,Earnings,Video\nAcmeXXX,12.5,Clip B\n");
    let mut request = import_request(&platform_id);
    request.mapping = Some(mapping);
    env.importer
        .import_statement(file.path(), request)
        .await
        .unwrap();

    // 二次上传同版式文件: 不带映射也能走模板导入
    let file2 = write_csv("Creator,Earnings,Video\nAcmeXXX,7.5,Clip C\n");
    let result = env
        .importer
        .import_statement(file2.path(), import_request(&platform_id))
        .await
        .unwrap();
    assert_eq!(result.total_records, 1);
}

// ==========================================
// 预览
// ==========================================

#[tokio::test]
async fn test_preview_locates_header_and_samples() {
    let env = setup();
    let platform_id = seed_platform(&env.platform_repo, "SEXLIKEREAL", 0.2);

    let file = write_csv(STATEMENT_WITH_PREAMBLE);
    let preview = env
        .importer
        .preview_statement(file.path(), &platform_id)
        .await
        .unwrap();

    assert_eq!(preview.platform_name, "SEXLIKEREAL");
    assert_eq!(preview.header_row_index, Some(3));
    assert_eq!(
        preview.detected_headers,
        vec!["Studio", "Payouts, $", "Vendor ID"]
    );
    assert_eq!(preview.sample_rows.len(), 2);
    assert!(preview.suggested_mapping.is_empty());
}

#[tokio::test]
async fn test_preview_falls_back_to_raw_rows_when_no_header() {
    let env = setup();
    let platform_id = seed_platform(&env.platform_repo, "NewVR", 0.2);

    let file = write_csv("hello,world\nfoo,bar\nbaz,qux\n");
    let preview = env
        .importer
        .preview_statement(file.path(), &platform_id)
        .await
        .unwrap();

    assert_eq!(preview.header_row_index, None);
    assert!(preview.detected_headers.is_empty());
    assert_eq!(preview.sample_rows.len(), 3);
}
