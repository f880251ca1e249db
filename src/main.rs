// ==========================================
// 版税对账结算系统 - 命令行入口
// ==========================================
// 用法:
//   royalty-settlement preview   <platform_id> <file>
//   royalty-settlement import    <platform_id> <file> <YYYY-MM-DD>
//   royalty-settlement summaries <vendor_id>
// ==========================================

use chrono::NaiveDate;
use royalty_settlement::api::{PayoutApi, RevenueApi};
use royalty_settlement::domain::types::ReportPaymentStatus;
use royalty_settlement::importer::{
    ImportStatementRequest, StatementImporterImpl, UniversalSheetParser,
};
use royalty_settlement::repository::{
    PayoutRepository, PlatformRepository, RevenueRepository, VendorRepository,
};
use royalty_settlement::{db, logging};
use std::sync::{Arc, Mutex};

/// 解析数据库路径
///
/// 优先级: 环境变量 ROYALTY_SETTLEMENT_DB_PATH > 用户数据目录 > 当前目录
fn default_db_path() -> String {
    if let Ok(path) = std::env::var("ROYALTY_SETTLEMENT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("royalty-settlement");
        let _ = std::fs::create_dir_all(&dir);
        return dir.join("royalty_settlement.db").display().to_string();
    }

    "./royalty_settlement.db".to_string()
}

fn usage() -> ! {
    eprintln!("用法:");
    eprintln!("  royalty-settlement preview   <platform_id> <file>");
    eprintln!("  royalty-settlement import    <platform_id> <file> <YYYY-MM-DD>");
    eprintln!("  royalty-settlement summaries <vendor_id>");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", royalty_settlement::APP_NAME);
    tracing::info!("系统版本: {}", royalty_settlement::VERSION);
    tracing::info!("==================================================");

    let db_path = default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let platform_repo = Arc::new(PlatformRepository::new(conn.clone()));
    let vendor_repo = Arc::new(VendorRepository::new(conn.clone()));
    let revenue_repo = Arc::new(RevenueRepository::new(conn.clone()));
    let payout_repo = Arc::new(PayoutRepository::new(conn.clone()));

    let revenue_api = RevenueApi::new(StatementImporterImpl::new(
        platform_repo.clone(),
        vendor_repo.clone(),
        revenue_repo.clone(),
        Box::new(UniversalSheetParser),
    ));
    let payout_api = PayoutApi::new(
        vendor_repo.clone(),
        platform_repo.clone(),
        revenue_repo.clone(),
        payout_repo.clone(),
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("preview") => {
            let [_, platform_id, file] = args.as_slice() else { usage() };
            let preview = revenue_api.preview_statement(file, platform_id).await?;
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        Some("import") => {
            let [_, platform_id, file, month] = args.as_slice() else { usage() };
            let month = NaiveDate::parse_from_str(month, "%Y-%m-%d")?;
            let result = revenue_api
                .save_statement(
                    file,
                    ImportStatementRequest {
                        platform_id: platform_id.clone(),
                        month,
                        total_amount: None,
                        mapping: None,
                        invoice_ref: None,
                        payment_status: ReportPaymentStatus::Pending,
                    },
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Some("summaries") => {
            let [_, vendor_id] = args.as_slice() else { usage() };
            let summaries = payout_api.get_unpaid_summaries(vendor_id)?;
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        _ => usage(),
    }

    Ok(())
}
