use std::collections::HashMap;

use serde::Serialize;

use crate::reconcile::{
    FilterCriteria, Kpis, ReconciledWorker, RosterWorker, filter_live, filter_sample, reconcile,
};
use crate::stores::LiveStores;
use crate::timeline::{TimelineBuffer, TimelineEvent};
use crate::worker::{Activity, SensorSnapshot};

/// Lifecycle of the roster fetch. `Failed` is distinguishable from an empty
/// roster so the surface can offer a manual retry instead of showing "no
/// workers".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterPhase {
    #[default]
    Loading,
    Ready,
    Failed,
}

/// One slice of the current-state donut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSlice {
    pub activity: Activity,
    pub count: usize,
}

/// The complete view model consumed by any rendering surface. Pure
/// projection of the stores, the roster, and the filter criteria,
/// recomputed wholesale on every input change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardView {
    pub connected: bool,
    pub roster: RosterPhase,
    /// Live partition after filters and sort.
    pub live: Vec<ReconciledWorker>,
    /// Sample partition after the search filter, name-sorted.
    pub sample: Vec<ReconciledWorker>,
    /// Unfiltered live workers currently at risk, for the alerts panel and
    /// the transition detector.
    pub at_risk: Vec<ReconciledWorker>,
    /// Counts over the unfiltered partitions.
    pub kpis: Kpis,
    /// Newest `updated_at` across live workers; 0 when none.
    pub last_update: u64,
    /// True when any live worker has an explicit device-link `false`.
    pub missing_device: bool,
    /// Latest sensor snapshot per live worker key.
    pub sensors: HashMap<String, SensorSnapshot>,
    /// Current-state distribution over all reconciled workers.
    pub state_distribution: Vec<StateSlice>,
    /// Events retained in the live trend window, for bucket aggregation.
    pub timeline: Vec<TimelineEvent>,
}

/// Assemble the view model from the live stores and the roster.
pub fn build_view(
    stores: &LiveStores,
    timeline: &TimelineBuffer,
    roster: &[RosterWorker],
    phase: RosterPhase,
    connected: bool,
    criteria: &FilterCriteria,
    now: u64,
) -> DashboardView {
    let workers = reconcile(roster, stores.workers());
    let live_partition: Vec<ReconciledWorker> =
        workers.iter().filter(|w| !w.is_sample).cloned().collect();

    let last_update = live_partition.iter().map(|w| w.updated_at).max().unwrap_or(0);
    let missing_device = live_partition
        .iter()
        .any(|w| stores.device_links().get(&w.worker_id) == Some(&false));
    let sensors: HashMap<String, SensorSnapshot> = live_partition
        .iter()
        .filter_map(|w| {
            stores
                .sensors()
                .get(&w.worker_id)
                .map(|s| (w.worker_id.clone(), s.clone()))
        })
        .collect();

    let state_distribution = Activity::ALL
        .iter()
        .map(|&activity| StateSlice {
            activity,
            count: workers.iter().filter(|w| w.activity == activity).count(),
        })
        .collect();

    let at_risk: Vec<ReconciledWorker> = live_partition
        .iter()
        .filter(|w| w.at_risk())
        .cloned()
        .collect();

    DashboardView {
        connected,
        roster: phase,
        live: filter_live(&live_partition, criteria),
        sample: filter_sample(
            &workers.iter().filter(|w| w.is_sample).cloned().collect::<Vec<_>>(),
            &criteria.search,
        ),
        at_risk,
        kpis: Kpis::compute(&workers),
        last_update,
        missing_device,
        sensors,
        state_distribution,
        timeline: timeline.snapshot(now, timeline.window_ms()),
    }
}
