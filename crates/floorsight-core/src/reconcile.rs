use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::worker::{Activity, WorkerStatus};

/// One roster entry from the workers endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterWorker {
    pub id: String,
    pub name: String,
}

/// Join of one roster entry with at most one live status entry. When no live
/// entry matches, the worker is a "sample": shown with historical data only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledWorker {
    pub worker_id: String,
    pub name: String,
    pub activity: Activity,
    pub risk_ergo: bool,
    pub risk_fatigue: bool,
    pub updated_at: u64,
    pub is_sample: bool,
}

impl ReconciledWorker {
    pub fn at_risk(&self) -> bool {
        self.risk_ergo || self.risk_fatigue
    }
}

/// Merge the roster with the live status store. The join key is the roster
/// display name looked up against live worker keys; the reconciled entity
/// keeps the roster name as its key. Pure projection; owns no state.
pub fn reconcile(
    roster: &[RosterWorker],
    live: &HashMap<String, WorkerStatus>,
) -> Vec<ReconciledWorker> {
    roster
        .iter()
        .map(|entry| match live.get(&entry.name) {
            Some(status) => ReconciledWorker {
                worker_id: entry.name.clone(),
                name: entry.name.clone(),
                activity: status.activity,
                risk_ergo: status.risk_ergo,
                risk_fatigue: status.risk_fatigue,
                updated_at: status.updated_at,
                is_sample: false,
            },
            None => ReconciledWorker {
                worker_id: entry.name.clone(),
                name: entry.name.clone(),
                activity: Activity::Idle,
                risk_ergo: false,
                risk_fatigue: false,
                updated_at: 0,
                is_sample: true,
            },
        })
        .collect()
}

/// Primary view tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewTab {
    #[default]
    All,
    Working,
    Idle,
    AtRisk,
}

/// Risk filter, composed with the tab filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFilter {
    #[default]
    All,
    AtRisk,
    Ok,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Name,
    State,
    Updated,
}

/// View filter and sort criteria. All filters compose with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub tab: ViewTab,
    pub activity: Option<Activity>,
    pub risk: RiskFilter,
    pub search: String,
    pub sort: SortBy,
}

fn matches_search(worker: &ReconciledWorker, search: &str) -> bool {
    let query = search.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    worker.name.to_lowercase().contains(&query)
        || worker.worker_id.to_lowercase().contains(&query)
}

fn matches(worker: &ReconciledWorker, criteria: &FilterCriteria) -> bool {
    match criteria.tab {
        ViewTab::All => {},
        ViewTab::Working => {
            if !worker.activity.is_working() {
                return false;
            }
        },
        ViewTab::Idle => {
            if !worker.activity.is_idle_like() {
                return false;
            }
        },
        ViewTab::AtRisk => {
            if !worker.at_risk() {
                return false;
            }
        },
    }
    if let Some(activity) = criteria.activity
        && worker.activity != activity
    {
        return false;
    }
    match criteria.risk {
        RiskFilter::All => {},
        RiskFilter::AtRisk => {
            if !worker.at_risk() {
                return false;
            }
        },
        RiskFilter::Ok => {
            if worker.at_risk() {
                return false;
            }
        },
    }
    matches_search(worker, &criteria.search)
}

/// Filter and sort the live partition. The sort is stable, so workers equal
/// under the sort key keep their roster order.
pub fn filter_live(workers: &[ReconciledWorker], criteria: &FilterCriteria) -> Vec<ReconciledWorker> {
    let mut list: Vec<ReconciledWorker> = workers
        .iter()
        .filter(|w| matches(w, criteria))
        .cloned()
        .collect();
    match criteria.sort {
        SortBy::Name => list.sort_by(|a, b| a.name.cmp(&b.name)),
        SortBy::State => list.sort_by(|a, b| a.activity.label().cmp(b.activity.label())),
        SortBy::Updated => list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
    }
    list
}

/// Sample workers get the search filter and a name sort only.
pub fn filter_sample(workers: &[ReconciledWorker], search: &str) -> Vec<ReconciledWorker> {
    let mut list: Vec<ReconciledWorker> = workers
        .iter()
        .filter(|w| matches_search(w, search))
        .cloned()
        .collect();
    list.sort_by(|a, b| a.name.cmp(&b.name));
    list
}

/// Headline counts over the unfiltered reconciled list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub live: usize,
    pub working: usize,
    pub idle: usize,
    pub at_risk: usize,
    pub sample: usize,
}

impl Kpis {
    pub fn compute(workers: &[ReconciledWorker]) -> Self {
        let mut kpis = Kpis::default();
        for w in workers {
            if w.is_sample {
                kpis.sample += 1;
                continue;
            }
            kpis.live += 1;
            if w.activity.is_working() {
                kpis.working += 1;
            } else {
                kpis.idle += 1;
            }
            if w.at_risk() {
                kpis.at_risk += 1;
            }
        }
        kpis
    }
}

/// Worker keys of the live partition currently at risk.
pub fn at_risk_keys(workers: &[ReconciledWorker]) -> HashSet<String> {
    workers
        .iter()
        .filter(|w| !w.is_sample && w.at_risk())
        .map(|w| w.worker_id.clone())
        .collect()
}

/// Keys present in `current` but not in `previous`, sorted for determinism.
pub fn newly_at_risk(previous: &HashSet<String>, current: &HashSet<String>) -> Vec<String> {
    let mut added: Vec<String> = current.difference(previous).cloned().collect();
    added.sort();
    added
}

/// One-shot notification that workers newly entered the at-risk set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertNotification {
    pub id: String,
    pub worker_ids: Vec<String>,
    pub ts: u64,
}

impl AlertNotification {
    fn new(worker_ids: Vec<String>, ts: u64) -> Self {
        Self {
            id: format!("alert-{}", &uuid::Uuid::new_v4().to_string()[..8]),
            worker_ids,
            ts,
        }
    }
}

/// Edge-triggered at-risk transition detector.
///
/// Fires when keys enter the at-risk set, except on the very first non-empty
/// population after startup. An already-at-risk worker never re-fires; the
/// set emptying and later repopulating does fire, because the tracker has
/// been primed by the first population.
#[derive(Debug, Default)]
pub struct AlertTracker {
    previous: HashSet<String>,
    primed: bool,
}

impl AlertTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the current at-risk set, returning a notification when new
    /// keys entered it (subject to the startup suppression above).
    pub fn observe(&mut self, current: HashSet<String>, now: u64) -> Option<AlertNotification> {
        let added = newly_at_risk(&self.previous, &current);
        let fired = self.primed && !added.is_empty();
        self.primed = self.primed || !current.is_empty();
        self.previous = current;
        if fired {
            Some(AlertNotification::new(added, now))
        } else {
            None
        }
    }

    pub fn previous(&self) -> &HashSet<String> {
        &self.previous
    }
}
