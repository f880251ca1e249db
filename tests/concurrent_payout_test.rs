// ==========================================
// 并发认领控制测试
// ==========================================
// 职责: 验证两个重叠的出账认领恰好一个成功,
//       失败方观察到乐观复核冲突,明细只挂接一次
// ==========================================


use royalty_settlement::repository::payout_repo::RecordAmounts;
use royalty_settlement::repository::{
    PayoutRepository, PlatformRepository, RepositoryError, RevenueRepository, VendorRepository,
};
use std::sync::{Arc, Barrier};
use std::thread;
use test_helpers::*;

/// 预计算认领参数 (读取阶段在竞争开始前完成,
/// 使两个线程都带着"记录未被认领"的旧视图进入写入阶段)
fn amounts_for(record_ids: &[String], rate: f64, gross: f64) -> (Vec<RecordAmounts>, f64) {
    let mut total = 0.0;
    let updates = record_ids
        .iter()
        .map(|id| {
            let commission = gross * rate;
            let net = gross - commission;
            total += net;
            RecordAmounts {
                record_id: id.clone(),
                commission_amount: commission,
                net_amount: net,
            }
        })
        .collect();
    (updates, total)
}

#[test]
fn test_overlapping_claims_exactly_one_wins() {
    let (_temp_file, db_path) = create_test_db().unwrap();

    // 种子数据走独立连接
    let seed_conn = open_shared_conn(&db_path);
    let platform_repo = PlatformRepository::new(seed_conn.clone());
    let vendor_repo = VendorRepository::new(seed_conn.clone());
    let revenue_repo = RevenueRepository::new(seed_conn.clone());

    let platform_id = seed_platform(&platform_repo, "AEBN", 0.2);
    let vendor_id = seed_vendor(&vendor_repo, "Acme Inc", "V001", &[]);
    let record_ids = seed_matched_records(
        &revenue_repo,
        &platform_id,
        &vendor_id,
        month(2025, 7),
        &[100.0],
    );

    // 两个线程各持独立连接,同时认领同一条明细
    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for _ in 0..2 {
        let db_path = db_path.clone();
        let vendor_id = vendor_id.clone();
        let record_ids = record_ids.clone();
        let barrier = barrier.clone();

        handles.push(thread::spawn(move || {
            let conn = open_shared_conn(&db_path);
            let payout_repo = PayoutRepository::new(conn);
            let (updates, total) = amounts_for(&record_ids, 0.2, 100.0);

            barrier.wait();
            payout_repo.create_payout_with_records(&vendor_id, &updates, total)
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let successes: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
    let failures: Vec<_> = results.iter().filter(|r| r.is_err()).collect();

    // 恰好一个成功
    assert_eq!(successes.len(), 1, "恰好一个认领应当成功: {results:?}");
    assert_eq!(failures.len(), 1);

    // 失败方必须观察到乐观复核冲突,而非其他错误
    match failures[0] {
        Err(RepositoryError::ConcurrentClaimConflict { .. }) => {}
        other => panic!("expected ConcurrentClaimConflict, got {other:?}"),
    }

    // 明细最终只挂在获胜者的出账单上
    let winner_payout_id = successes[0].as_ref().unwrap().payout_id.clone();
    let record = revenue_repo
        .find_by_id(&record_ids[0])
        .unwrap()
        .unwrap();
    assert_eq!(record.payout_id.as_deref(), Some(winner_payout_id.as_str()));

    // 全库只有一个出账单
    let payout_repo = PayoutRepository::new(seed_conn);
    assert_eq!(payout_repo.find_all().unwrap().len(), 1);
}

#[test]
fn test_disjoint_claims_proceed_independently() {
    let (_temp_file, db_path) = create_test_db().unwrap();

    let seed_conn = open_shared_conn(&db_path);
    let platform_repo = PlatformRepository::new(seed_conn.clone());
    let vendor_repo = VendorRepository::new(seed_conn.clone());
    let revenue_repo = RevenueRepository::new(seed_conn.clone());

    let platform_id = seed_platform(&platform_repo, "AEBN", 0.2);
    let vendor_id = seed_vendor(&vendor_repo, "Acme Inc", "V001", &[]);
    let batch_a = seed_matched_records(
        &revenue_repo,
        &platform_id,
        &vendor_id,
        month(2025, 6),
        &[10.0],
    );
    let batch_b = seed_matched_records(
        &revenue_repo,
        &platform_id,
        &vendor_id,
        month(2025, 7),
        &[20.0],
    );

    // 不相交的两批明细并发认领: 都应成功
    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for batch in [batch_a, batch_b] {
        let db_path = db_path.clone();
        let vendor_id = vendor_id.clone();
        let barrier = barrier.clone();

        handles.push(thread::spawn(move || {
            let conn = open_shared_conn(&db_path);
            let payout_repo = PayoutRepository::new(conn);
            let (updates, total) = amounts_for(&batch, 0.2, 15.0);

            barrier.wait();
            payout_repo.create_payout_with_records(&vendor_id, &updates, total)
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(
        results.iter().all(|r| r.is_ok()),
        "不相交认领不应互相阻塞: {results:?}"
    );

    // 顺序编号不重号
    let numbers: std::collections::HashSet<i64> = results
        .iter()
        .map(|r| r.as_ref().unwrap().payout_number)
        .collect();
    assert_eq!(numbers.len(), 2);
}
