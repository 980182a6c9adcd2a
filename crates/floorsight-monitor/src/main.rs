use std::time::Duration;

use tracing_subscriber::EnvFilter;

use floorsight_api::ApiClient;
use floorsight_core::time::now_ms;
use floorsight_monitor::config::MonitorConfig;
use floorsight_monitor::connection::{Backoff, ConnectionManager};
use floorsight_monitor::monitor::Monitor;
use floorsight_monitor::timeline_range::{TimelineData, TimelineRange, resolve_timeline};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = MonitorConfig::load();
    config.validate();
    tracing::info!(ws_url = %config.ws_url, api = %config.api_base_url, "Floorsight monitor starting");

    let api = ApiClient::new(&config.api_base_url);
    let (connection, frames, connected) =
        ConnectionManager::open(config.ws_url.clone(), Backoff::from_config(&config.reconnect));
    let mut handle = Monitor::spawn(frames, connected, api.clone());

    let mut view_rx = handle.subscribe_view();
    let mut last_kpis = view_rx.borrow().kpis;
    let mut last_connected = view_rx.borrow().connected;
    let mut chart_tick = tokio::time::interval(Duration::from_secs(60));
    chart_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(alert) = handle.alerts.recv() => {
                tracing::warn!(id = %alert.id, workers = ?alert.worker_ids, "New at-risk alert");
            },
            _ = chart_tick.tick() => {
                let events = view_rx.borrow().timeline.clone();
                if let TimelineData::Ready(buckets) =
                    resolve_timeline(TimelineRange::TenMinutes, &events, &api, now_ms()).await
                {
                    let updates: u32 = buckets.iter().map(|b| b.total()).sum();
                    tracing::info!(updates, "Activity in the last 10 minutes");
                }
            },
            Ok(()) = view_rx.changed() => {
                let view = view_rx.borrow_and_update();
                if view.connected != last_connected {
                    last_connected = view.connected;
                    if view.connected {
                        tracing::info!("Live feed connected");
                    } else {
                        tracing::warn!("Live feed disconnected, showing stale data");
                    }
                }
                if view.kpis != last_kpis {
                    last_kpis = view.kpis;
                    tracing::info!(
                        live = view.kpis.live,
                        working = view.kpis.working,
                        idle = view.kpis.idle,
                        at_risk = view.kpis.at_risk,
                        sample = view.kpis.sample,
                        "KPIs changed"
                    );
                }
            },
        }
    }

    handle.dispose();
    connection.dispose();
    tracing::info!("Floorsight monitor stopped");
}
