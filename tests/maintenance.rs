use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use tempfile::TempDir;

use franchise_bi::db::Database;
use franchise_bi::models::{
    AnomalyBlock, CustomerBlock, DailySummary, DemandBlock, FinancialBlock, OperationsBlock,
    PredictiveBlock, RevenueBlock, ServiceBlock, StaffBlock, StatisticalBlock, TaxBlock,
    TrendBlock,
};
use franchise_bi::{BiConfig, CalculationPolicy, MaintenanceService};

fn summary_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
}

fn test_config(dir: &TempDir) -> BiConfig {
    BiConfig {
        db_path: dir.path().join("franchise.sqlite"),
        backups_dir: dir.path().join("backups"),
        archive_dir: dir.path().join("log-archive"),
        log_retention_days: 90,
        backup_retention_count: 2,
    }
}

/// Creates the store (running migrations) and hands back a raw connection
/// for seeding, the way the CRUD layer would populate it.
fn seeded_store(config: &BiConfig) -> Connection {
    let db = Database::new(config.db_path.clone()).expect("create store");
    drop(db);
    Connection::open(&config.db_path).expect("open for seeding")
}

fn seed_franchise(conn: &Connection, id: &str, name: &str) {
    conn.execute(
        "INSERT INTO franchises (id, name, active, created_at, updated_at)
         VALUES (?1, ?2, 1, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
        params![id, name],
    )
    .unwrap();
}

fn seed_customer(conn: &Connection, id: &str, franchise: &str, spend: f64, orders: i64) {
    conn.execute(
        "INSERT INTO customers
         (id, franchise_id, name, total_spend, order_count, first_order_at, last_order_at, created_at)
         VALUES (?1, ?2, ?1, ?3, ?4, '2026-06-01T09:00:00Z', '2026-08-24T09:00:00Z',
                 '2026-06-01T09:00:00Z')",
        params![id, franchise, spend, orders],
    )
    .unwrap();
}

#[allow(clippy::too_many_arguments)]
fn seed_order(
    conn: &Connection,
    id: &str,
    franchise: &str,
    customer: &str,
    employee: &str,
    created_at: &str,
    amount: f64,
    status: &str,
) {
    conn.execute(
        "INSERT INTO orders
         (id, franchise_id, customer_id, employee_id, created_at, due_at, completed_at,
          total_amount, status, payment_method, payment_status, tax_rate, interstate)
         VALUES (?1, ?2, ?3, ?4, ?5, NULL, NULL, ?6, ?7, 'cash', 'paid', 0.18, 0)",
        params![id, franchise, customer, employee, created_at, amount, status],
    )
    .unwrap();
}

fn seed_working_franchise(conn: &Connection, franchise: &str, name: &str) {
    seed_franchise(conn, franchise, name);
    seed_customer(conn, &format!("{franchise}-cust"), franchise, 900.0, 9);
    conn.execute(
        "INSERT INTO employees (id, franchise_id, name, active) VALUES (?1, ?2, 'Asha', 1)",
        params![format!("{franchise}-emp"), franchise],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO services (id, franchise_id, name, unit_price, active)
         VALUES (?1, ?2, 'Dry Clean', 100.0, 1)",
        params![format!("{franchise}-svc"), franchise],
    )
    .unwrap();

    // A week of history plus three orders on the summary day.
    for day in 17..24 {
        let order_id = format!("{franchise}-hist-{day}");
        seed_order(
            conn,
            &order_id,
            franchise,
            &format!("{franchise}-cust"),
            &format!("{franchise}-emp"),
            &format!("2026-08-{day:02}T10:00:00Z"),
            200.0,
            "completed",
        );
    }
    for (i, amount) in [(1, 1180.0), (2, 590.0), (3, 236.0)] {
        let order_id = format!("{franchise}-day-{i}");
        seed_order(
            conn,
            &order_id,
            franchise,
            &format!("{franchise}-cust"),
            &format!("{franchise}-emp"),
            &format!("2026-08-24T1{i}:30:00Z"),
            amount,
            "completed",
        );
        conn.execute(
            "INSERT INTO order_items (id, order_id, service_id, quantity, subtotal)
             VALUES (?1, ?2, ?3, 2, ?4)",
            params![format!("{order_id}-item"), order_id, format!("{franchise}-svc"), amount],
        )
        .unwrap();
    }
}

fn empty_summary(franchise: &str, date: NaiveDate, total_revenue: f64) -> DailySummary {
    DailySummary {
        franchise_id: franchise.to_string(),
        summary_date: date,
        revenue: RevenueBlock {
            total_revenue,
            ..RevenueBlock::default()
        },
        predictive: PredictiveBlock::default(),
        customers: CustomerBlock::default(),
        services: ServiceBlock::default(),
        operations: OperationsBlock::default(),
        staff: StaffBlock::default(),
        tax: TaxBlock::default(),
        financial: FinancialBlock::default(),
        anomalies: AnomalyBlock::default(),
        statistics: StatisticalBlock::default(),
        demand: DemandBlock::default(),
        trend: TrendBlock::default(),
        computation_ms: 0,
        data_quality_score: 100.0,
    }
}

fn sqlite_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "sqlite"))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn upsert_replaces_by_franchise_and_date() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let conn = seeded_store(&config);
    seed_franchise(&conn, "f1", "Riverside");
    drop(conn);

    let db = Database::new(config.db_path.clone()).unwrap();
    db.upsert_daily_summary(&empty_summary("f1", summary_date(), 100.0))
        .unwrap();
    db.upsert_daily_summary(&empty_summary("f1", summary_date(), 999.0))
        .unwrap();

    assert_eq!(db.count_daily_summaries("f1").unwrap(), 1);
    let stored = db
        .get_daily_summary("f1", summary_date())
        .unwrap()
        .expect("summary row");
    assert_eq!(stored.revenue.total_revenue, 999.0);
}

#[test]
fn full_run_generates_summary_backup_and_audit() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let conn = seeded_store(&config);
    seed_working_franchise(&conn, "f1", "Riverside");
    drop(conn);

    let service = MaintenanceService::new(config.clone(), CalculationPolicy::default());
    let result = service.run_for(summary_date());

    assert!(result.success, "errors: {:?}", result.errors);
    assert!(result.operations.compaction);
    assert!(result.operations.statistics_refresh);
    assert!(result.operations.backup);
    assert!(result.operations.log_archival);
    assert!(result.operations.backup_rotation);
    assert!(result.operations.bi_calculation);
    assert_eq!(result.stats.summaries_generated, vec!["Riverside".to_string()]);
    assert!(result.stats.db_size_before > 0);

    // Snapshot plus checksum sidecar on disk.
    let snapshots = sqlite_files(&config.backups_dir);
    assert_eq!(snapshots.len(), 1);
    assert!(snapshots[0].with_extension("sqlite.sha256").exists());

    let db = Database::new(config.db_path.clone()).unwrap();
    let summary = db
        .get_daily_summary("f1", summary_date())
        .unwrap()
        .expect("summary row");
    assert_eq!(summary.revenue.order_count, 3);
    assert!((summary.revenue.total_revenue - 2006.0).abs() < 1e-9);
    assert!(
        (summary.revenue.avg_order_value - 2006.0 / 3.0).abs() < 1e-9,
        "avg order value must equal revenue / count"
    );
    assert!(summary.predictive.regression_r2 >= 0.0 && summary.predictive.regression_r2 <= 1.0);
    assert!(summary.predictive.forecast.iter().all(|v| *v >= 0.0));
    assert_eq!(summary.demand.peak_day.as_deref(), Some("Monday"));
    assert_eq!(summary.services.top_service_name.as_deref(), Some("Dry Clean"));
    let tier_total: i64 = summary.customers.tier_counts.values().sum();
    assert_eq!(tier_total, summary.customers.active_customers);

    // One audit entry for the run.
    let conn = Connection::open(&config.db_path).unwrap();
    let audits: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM audit_logs WHERE actor = 'SYSTEM' AND action = 'bi_maintenance'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(audits, 1);
}

#[test]
fn zero_order_day_yields_zeroed_summary() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let conn = seeded_store(&config);
    seed_franchise(&conn, "quiet", "Quiet Branch");
    drop(conn);

    let service = MaintenanceService::new(config.clone(), CalculationPolicy::default());
    let result = service.run_for(summary_date());
    assert!(result.success);
    assert_eq!(result.stats.summaries_generated, vec!["Quiet Branch".to_string()]);

    let db = Database::new(config.db_path.clone()).unwrap();
    let summary = db
        .get_daily_summary("quiet", summary_date())
        .unwrap()
        .expect("summary row");
    assert_eq!(summary.revenue.order_count, 0);
    assert_eq!(summary.revenue.avg_order_value, 0.0);
    assert_eq!(summary.anomalies.anomaly_count, 0);
    assert!(summary.statistics.mean == 0.0);
    assert!(summary.data_quality_score < 100.0);
}

#[test]
fn failing_franchise_does_not_abort_the_run() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let conn = seeded_store(&config);
    seed_working_franchise(&conn, "good", "Alpha Branch");
    seed_franchise(&conn, "bad", "Zeta Branch");
    // Malformed row: text where the calculator expects a numeric amount.
    conn.execute(
        "INSERT INTO orders
         (id, franchise_id, created_at, total_amount, status, payment_method,
          payment_status, tax_rate, interstate)
         VALUES ('bad-order', 'bad', '2026-08-24T10:00:00Z', 'garbage', 'completed',
                 'cash', 'paid', 0.18, 0)",
        [],
    )
    .unwrap();
    drop(conn);

    let service = MaintenanceService::new(config.clone(), CalculationPolicy::default());
    let result = service.run_for(summary_date());

    assert!(result.success, "step failures must not flip success");
    assert_eq!(result.stats.summaries_generated, vec!["Alpha Branch".to_string()]);
    assert!(result.errors.iter().any(|e| e.contains("Zeta Branch")));
}

#[test]
fn missing_store_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let service = MaintenanceService::new(config, CalculationPolicy::default());
    let result = service.run_for(summary_date());

    assert!(!result.success);
    assert!(result.errors[0].contains("database missing"));
    assert!(result.stats.summaries_generated.is_empty());
}

#[test]
fn backup_rotation_keeps_newest_snapshots() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let conn = seeded_store(&config);
    seed_franchise(&conn, "f1", "Riverside");
    drop(conn);

    std::fs::create_dir_all(&config.backups_dir).unwrap();
    for i in 0..3 {
        std::fs::write(
            config.backups_dir.join(format!("backup_2026010{i}_000000.sqlite")),
            b"stale snapshot",
        )
        .unwrap();
    }

    let service = MaintenanceService::new(config.clone(), CalculationPolicy::default());
    let result = service.run_for(summary_date());
    assert!(result.success);

    // Three stale + one fresh, pruned down to the retention count of two.
    assert_eq!(result.stats.backups_deleted, 2);
    assert_eq!(sqlite_files(&config.backups_dir).len(), 2);
}

#[test]
fn old_audit_rows_are_archived_before_deletion() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let conn = seeded_store(&config);
    seed_franchise(&conn, "f1", "Riverside");
    conn.execute(
        "INSERT INTO audit_logs (id, actor, action, details, created_at)
         VALUES ('ancient', 'SYSTEM', 'bi_maintenance', '{}', '2020-01-01T00:00:00+00:00')",
        [],
    )
    .unwrap();
    drop(conn);

    let service = MaintenanceService::new(config.clone(), CalculationPolicy::default());
    let result = service.run_for(summary_date());
    assert!(result.success);
    assert_eq!(result.stats.logs_archived, 1);
    assert_eq!(result.stats.logs_deleted, 1);

    let archives: Vec<_> = std::fs::read_dir(&config.archive_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(archives.len(), 1);
    let contents = std::fs::read_to_string(archives[0].path()).unwrap();
    assert!(contents.contains("ancient"));

    let conn = Connection::open(&config.db_path).unwrap();
    let remaining: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM audit_logs WHERE id = 'ancient'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn recomputation_is_reproducible() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let conn = seeded_store(&config);
    seed_working_franchise(&conn, "f1", "Riverside");
    drop(conn);

    let db = Database::new(config.db_path.clone()).unwrap();
    let policy = CalculationPolicy::default();
    let mut first =
        franchise_bi::compute_summary(&db, &policy, "f1", summary_date()).unwrap();
    let mut second =
        franchise_bi::compute_summary(&db, &policy, "f1", summary_date()).unwrap();

    // Identical except for the recorded duration.
    first.computation_ms = 0;
    second.computation_ms = 0;
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
