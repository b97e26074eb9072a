use anyhow::Result;
use tokio::sync::watch;
use triangle_arb_monitor::{
    aggregator::{ScanSnapshot, Scanner, spawn_scanner},
    config::AppConfig,
    export::ExportReport,
    feeds::build_feeds,
    utils,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let cfg = AppConfig::load()?;
    tracing::info!(
        venues = cfg.venues.len(),
        source = ?cfg.price_source,
        min_profit_percent = cfg.settings.min_profit_percent,
        min_liquidity = cfg.settings.min_liquidity,
        interval_ms = cfg.settings.update_interval_ms,
        "[INIT] triangle-arb-monitor starting"
    );

    let feeds = build_feeds(&cfg)?;
    let scanner = Scanner::new(feeds, cfg.settings.clone());

    let (snapshot_tx, mut snapshot_rx) = watch::channel(ScanSnapshot::default());
    let (stop_tx, stop_rx) = watch::channel(false);
    let _signal = utils::spawn_ctrl_c_watcher(stop_tx);
    let scanner_task = spawn_scanner(scanner, snapshot_tx, stop_rx);

    // Status line per published snapshot; ends when the scanner drops its sender.
    let status_task = tokio::spawn(async move {
        while snapshot_rx.changed().await.is_ok() {
            let snap = snapshot_rx.borrow_and_update().clone();
            let viable = snap.opportunities.iter().filter(|o| o.is_viable()).count();
            tracing::info!(
                passes = snap.passes,
                retained = snap.opportunities.len(),
                viable,
                api_calls = snap.api_calls_total,
                success_rate = utils::round_to(snap.success_rate, 2),
                best_profit = utils::round_to(snap.best_profit, 4),
                total_volume = utils::round_to(snap.analytics.total_volume, 2),
                "[STATUS] snapshot"
            );
        }
    });

    let scanner = scanner_task.await?;
    let _ = status_task.await;

    if let Some(path) = cfg.export_path.as_deref() {
        let report = ExportReport::new(
            scanner.history().to_vec(),
            scanner.analytics().clone(),
            scanner.settings().clone(),
            scanner.venues(),
            scanner.api_calls_total(),
        );
        let written = report.write_to(path)?;
        tracing::info!(path = %written.display(), "[SHUTDOWN] export complete");
    }
    Ok(())
}
