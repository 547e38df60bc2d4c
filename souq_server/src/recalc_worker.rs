use chrono::Duration;
use log::*;
use souq_engine::{LedgerApi, RecalculationReport, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the ledger recalculation worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every `interval`, the ledger generator is re-run over all paid orders. Entries that have been reversed by a refund
/// are never touched.
pub fn start_recalc_worker(db: SqliteDatabase, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = interval.to_std().unwrap_or_else(|_| std::time::Duration::from_secs(24 * 3600));
        let mut timer = tokio::time::interval(period);
        // The first tick completes immediately. Skip it so that start-up is not slowed by a full sweep.
        timer.tick().await;
        let api = LedgerApi::new(db);
        info!("🕰️ Ledger recalculation worker started. Sweeping every {} hrs", interval.num_hours());
        loop {
            timer.tick().await;
            info!("🕰️ Running ledger recalculation job");
            match api.recalculate(None, None).await {
                Ok(report) => {
                    info!("🕰️ {} orders recalculated", report.orders_processed);
                    debug!("🕰️ {}", report_summary(&report));
                },
                Err(e) => {
                    error!("🕰️ Error running ledger recalculation job: {e}");
                },
            }
        }
    })
}

fn report_summary(report: &RecalculationReport) -> String {
    let failures = report
        .failures
        .iter()
        .map(|f| format!("[{}] {}", f.order_id, f.error))
        .collect::<Vec<String>>()
        .join(", ");
    format!(
        "{} entries written, {} frozen, {} lines skipped. Failures: {}",
        report.entries_written,
        report.frozen_entries,
        report.skipped_lines.len(),
        if failures.is_empty() { "none".to_string() } else { failures }
    )
}
