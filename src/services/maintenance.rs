//! Maintenance Orchestrator: storage upkeep followed by the per-franchise
//! BI calculation, with per-step and per-franchise fault isolation.

use std::fs;
use std::path::PathBuf;
use std::time::{Instant, SystemTime};

use chrono::{Duration, NaiveDate, Utc};
use tracing::{info, warn};

use crate::config::{BiConfig, CalculationPolicy};
use crate::db::Database;
use crate::models::{MaintenanceResult, MaintenanceStats, StepOutcomes};
use crate::services::summary::compute_summary;
use crate::utils::sha256_file;

pub const AUDIT_ACTOR: &str = "SYSTEM";
pub const AUDIT_ACTION: &str = "bi_maintenance";

pub struct MaintenanceService {
    config: BiConfig,
    policy: CalculationPolicy,
}

impl MaintenanceService {
    pub fn new(config: BiConfig, policy: CalculationPolicy) -> Self {
        MaintenanceService { config, policy }
    }

    /// Runs the nightly sequence for yesterday's data.
    pub fn run(&self) -> MaintenanceResult {
        self.run_for(Utc::now().date_naive() - Duration::days(1))
    }

    /// Runs the full sequence, computing summaries for `date`. Only a store
    /// that cannot be opened at all makes the run unsuccessful; every other
    /// failure is recorded and the run continues.
    pub fn run_for(&self, date: NaiveDate) -> MaintenanceResult {
        let mut result = MaintenanceResult {
            success: true,
            operations: StepOutcomes::default(),
            errors: Vec::new(),
            stats: MaintenanceStats::default(),
        };

        if !self.config.db_path.exists() {
            result.success = false;
            result
                .errors
                .push(format!("database missing: {}", self.config.db_path.display()));
            return result;
        }
        let db = match Database::new(self.config.db_path.clone()) {
            Ok(db) => db,
            Err(err) => {
                result.success = false;
                result.errors.push(format!("database open: {err}"));
                return result;
            }
        };

        result.stats.db_size_before = self.db_file_size();

        // Compaction runs first so its exclusive window stays clear of the
        // read-heavy calculation phase.
        info!("step 1/6: storage compaction");
        match db.vacuum() {
            Ok(()) => result.operations.compaction = true,
            Err(err) => {
                warn!("compaction failed: {err}");
                result.errors.push(format!("compaction: {err}"));
            }
        }

        info!("step 2/6: planner statistics refresh");
        match db.refresh_statistics() {
            Ok(()) => result.operations.statistics_refresh = true,
            Err(err) => {
                warn!("statistics refresh failed: {err}");
                result.errors.push(format!("statistics refresh: {err}"));
            }
        }

        info!("step 3/6: backup snapshot");
        match self.create_backup(&db) {
            Ok(path) => {
                info!("backup written to {}", path.display());
                result.operations.backup = true;
            }
            Err(err) => {
                warn!("backup failed: {err}");
                result.errors.push(format!("backup: {err}"));
            }
        }

        info!("step 4/6: audit log archival");
        match self.archive_old_logs(&db) {
            Ok((archived, deleted)) => {
                result.stats.logs_archived = archived;
                result.stats.logs_deleted = deleted;
                result.operations.log_archival = true;
            }
            Err(err) => {
                warn!("log archival failed: {err}");
                result.errors.push(format!("log archival: {err}"));
            }
        }

        info!("step 5/6: backup rotation");
        match self.rotate_backups() {
            Ok(deleted) => {
                result.stats.backups_deleted = deleted;
                result.operations.backup_rotation = true;
            }
            Err(err) => {
                warn!("backup rotation failed: {err}");
                result.errors.push(format!("backup rotation: {err}"));
            }
        }

        info!("step 6/6: BI calculation for {date}");
        let calc_started = Instant::now();
        match db.get_active_franchises() {
            Ok(franchises) => {
                result.operations.bi_calculation = true;
                for franchise in franchises {
                    match compute_summary(&db, &self.policy, &franchise.id, date)
                        .and_then(|summary| {
                            let anomalies = summary.anomalies.anomaly_count;
                            db.upsert_daily_summary(&summary)?;
                            Ok(anomalies)
                        }) {
                        Ok(anomalies) => {
                            info!("summary written for {}", franchise.name);
                            result.stats.summaries_generated.push(franchise.name);
                            result.stats.anomalies_detected += anomalies;
                        }
                        Err(err) => {
                            warn!("summary failed for {}: {err}", franchise.name);
                            result.errors.push(format!("{}: {err}", franchise.name));
                        }
                    }
                }
            }
            Err(err) => {
                warn!("franchise listing failed: {err}");
                result.errors.push(format!("franchise listing: {err}"));
            }
        }
        result.stats.calculation_ms = calc_started.elapsed().as_millis() as i64;
        result.stats.db_size_after = self.db_file_size();

        if let Err(err) = self.write_audit_entry(&db, &result) {
            warn!("audit entry failed: {err}");
            result.errors.push(format!("audit entry: {err}"));
        }

        info!(
            "maintenance finished: {} summaries, {} errors",
            result.stats.summaries_generated.len(),
            result.errors.len()
        );
        result
    }

    fn db_file_size(&self) -> u64 {
        fs::metadata(&self.config.db_path).map(|m| m.len()).unwrap_or(0)
    }

    /// Consistent snapshot plus a sha256 sidecar for integrity checks.
    fn create_backup(&self, db: &Database) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.config.backups_dir)?;
        let name = format!("backup_{}.sqlite", Utc::now().format("%Y%m%d_%H%M%S"));
        let target = self.config.backups_dir.join(&name);
        db.snapshot_to(&target)?;

        let digest = sha256_file(&target)?;
        fs::write(
            target.with_extension("sqlite.sha256"),
            format!("{digest}  {name}\n"),
        )?;
        Ok(target)
    }

    /// Archive-to-file happens strictly before deletion; rows are only
    /// pruned once the archive file is on disk.
    fn archive_old_logs(&self, db: &Database) -> anyhow::Result<(u64, u64)> {
        let cutoff = (Utc::now() - Duration::days(self.config.log_retention_days)).to_rfc3339();
        let old_entries = db.get_audit_entries_before(&cutoff)?;
        if old_entries.is_empty() {
            return Ok((0, 0));
        }

        fs::create_dir_all(&self.config.archive_dir)?;
        let archive_path = self.config.archive_dir.join(format!(
            "audit_archive_{}.json",
            Utc::now().format("%Y%m%d_%H%M%S")
        ));
        fs::write(&archive_path, serde_json::to_string_pretty(&old_entries)?)?;

        let deleted = db.delete_audit_entries_before(&cutoff)?;
        Ok((old_entries.len() as u64, deleted as u64))
    }

    /// Deletes snapshots beyond the retention count, oldest first by
    /// modification time, along with their checksum sidecars.
    fn rotate_backups(&self) -> anyhow::Result<u64> {
        if !self.config.backups_dir.exists() {
            return Ok(0);
        }

        let mut snapshots: Vec<(PathBuf, SystemTime)> = walkdir::WalkDir::new(&self.config.backups_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("sqlite"))
                    .unwrap_or(false)
            })
            .filter_map(|e| {
                let modified = e.metadata().ok()?.modified().ok()?;
                Some((e.path().to_path_buf(), modified))
            })
            .collect();

        if snapshots.len() <= self.config.backup_retention_count {
            return Ok(0);
        }

        snapshots.sort_by_key(|(_, modified)| *modified);
        let excess = snapshots.len() - self.config.backup_retention_count;
        let mut deleted = 0u64;
        for (path, _) in snapshots.into_iter().take(excess) {
            fs::remove_file(&path)?;
            let sidecar = path.with_extension("sqlite.sha256");
            if sidecar.exists() {
                fs::remove_file(&sidecar)?;
            }
            deleted += 1;
        }
        Ok(deleted)
    }

    fn write_audit_entry(&self, db: &Database, result: &MaintenanceResult) -> anyhow::Result<()> {
        let details = serde_json::json!({
            "success": result.success,
            "summaries_generated": result.stats.summaries_generated,
            "anomalies_detected": result.stats.anomalies_detected,
            "logs_archived": result.stats.logs_archived,
            "logs_deleted": result.stats.logs_deleted,
            "backups_deleted": result.stats.backups_deleted,
            "db_size_before": result.stats.db_size_before,
            "db_size_after": result.stats.db_size_after,
            "calculation_ms": result.stats.calculation_ms,
            "errors": result.errors,
        });
        db.insert_audit_entry(AUDIT_ACTOR, AUDIT_ACTION, &details.to_string())?;
        Ok(())
    }
}
