use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use floorsight_api::{ApiClient, ApiError};
use floorsight_core::net::protocol::decode_frame;
use floorsight_core::reconcile::{
    AlertNotification, AlertTracker, FilterCriteria, RosterWorker, at_risk_keys,
};
use floorsight_core::stores::LiveStores;
use floorsight_core::time::now_ms;
use floorsight_core::timeline::TimelineBuffer;
use floorsight_core::view::{DashboardView, RosterPhase, build_view};

/// Inputs that change the view without new wire data.
#[derive(Debug)]
pub enum MonitorCommand {
    SetFilters(FilterCriteria),
    /// Manual retry after a failed roster fetch.
    RefetchRoster,
}

/// Handle to a running monitor loop.
pub struct MonitorHandle {
    token: CancellationToken,
    commands: mpsc::UnboundedSender<MonitorCommand>,
    view: watch::Receiver<DashboardView>,
    /// Edge-triggered at-risk notifications.
    pub alerts: mpsc::UnboundedReceiver<AlertNotification>,
}

impl MonitorHandle {
    pub fn subscribe_view(&self) -> watch::Receiver<DashboardView> {
        self.view.clone()
    }

    pub fn set_filters(&self, criteria: FilterCriteria) {
        let _ = self.commands.send(MonitorCommand::SetFilters(criteria));
    }

    pub fn refetch_roster(&self) {
        let _ = self.commands.send(MonitorCommand::RefetchRoster);
    }

    /// Idempotent teardown of the monitor loop.
    pub fn dispose(&self) {
        self.token.cancel();
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// The monitor loop: one task owning all mutable state. Every event (frame,
/// roster response, connected transition, command) runs to completion
/// before the next, so no mutation interleaves with another.
pub struct Monitor {
    stores: LiveStores,
    timeline: TimelineBuffer,
    roster: Vec<RosterWorker>,
    roster_phase: RosterPhase,
    criteria: FilterCriteria,
    alert_tracker: AlertTracker,
    connected: bool,
}

impl Monitor {
    /// Spawn the loop over the connection manager's outputs. The roster
    /// fetch starts immediately; its failure collapses to an empty roster
    /// with a retryable `Failed` phase.
    pub fn spawn(
        frames: mpsc::UnboundedReceiver<String>,
        connected: watch::Receiver<bool>,
        api: ApiClient,
    ) -> MonitorHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (alert_tx, alert_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(DashboardView::default());
        let token = CancellationToken::new();

        let monitor = Monitor {
            stores: LiveStores::new(),
            timeline: TimelineBuffer::new(),
            roster: Vec::new(),
            roster_phase: RosterPhase::Loading,
            criteria: FilterCriteria::default(),
            alert_tracker: AlertTracker::new(),
            connected: *connected.borrow(),
        };
        tokio::spawn(monitor.run(
            frames,
            connected,
            api,
            command_rx,
            alert_tx,
            view_tx,
            token.clone(),
        ));

        MonitorHandle {
            token,
            commands: command_tx,
            view: view_rx,
            alerts: alert_rx,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run(
        mut self,
        mut frames: mpsc::UnboundedReceiver<String>,
        mut connected: watch::Receiver<bool>,
        api: ApiClient,
        mut commands: mpsc::UnboundedReceiver<MonitorCommand>,
        alert_tx: mpsc::UnboundedSender<AlertNotification>,
        view_tx: watch::Sender<DashboardView>,
        token: CancellationToken,
    ) {
        let (roster_tx, mut roster_rx) = mpsc::unbounded_channel();
        spawn_roster_fetch(api.clone(), roster_tx.clone());

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                Some(raw) = frames.recv() => {
                    let now = now_ms();
                    if let Some(event) = self.stores.apply(decode_frame(&raw, now)) {
                        self.timeline.record(event, now);
                    }
                },
                Ok(()) = connected.changed() => {
                    self.connected = *connected.borrow_and_update();
                },
                Some(result) = roster_rx.recv() => {
                    match result {
                        Ok(roster) => {
                            tracing::info!(workers = roster.len(), "Roster loaded");
                            self.roster = roster;
                            self.roster_phase = RosterPhase::Ready;
                        },
                        Err(e) => {
                            tracing::warn!(error = %e, "Roster fetch failed");
                            self.roster = Vec::new();
                            self.roster_phase = RosterPhase::Failed;
                        },
                    }
                },
                Some(command) = commands.recv() => match command {
                    MonitorCommand::SetFilters(criteria) => self.criteria = criteria,
                    MonitorCommand::RefetchRoster => {
                        self.roster_phase = RosterPhase::Loading;
                        spawn_roster_fetch(api.clone(), roster_tx.clone());
                    },
                },
            }

            let view = build_view(
                &self.stores,
                &self.timeline,
                &self.roster,
                self.roster_phase,
                self.connected,
                &self.criteria,
                now_ms(),
            );
            if let Some(alert) = self.alert_tracker.observe(at_risk_keys(&view.at_risk), now_ms()) {
                tracing::warn!(workers = ?alert.worker_ids, "Workers newly at risk");
                let _ = alert_tx.send(alert);
            }
            let _ = view_tx.send(view);
        }
    }
}

fn spawn_roster_fetch(
    api: ApiClient,
    tx: mpsc::UnboundedSender<Result<Vec<RosterWorker>, ApiError>>,
) {
    tokio::spawn(async move {
        // A send failure means the monitor loop is gone; the late result is
        // simply discarded.
        let _ = tx.send(api.workers().await);
    });
}
