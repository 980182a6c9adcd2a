use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::time::{minute_floor, minute_label};
use crate::worker::Activity;

/// Trailing window of activity retained for live trend charts.
pub const TIMELINE_WINDOW_MS: u64 = 10 * 60 * 1000;

/// Hard cap on retained events regardless of age.
pub const MAX_TIMELINE_EVENTS: usize = 2000;

/// One worker-status transition, derived 1:1 from accepted status frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub ts: u64,
    pub worker_id: String,
    pub activity: Activity,
    pub risk: bool,
}

/// Bounded, time-windowed append log of worker-status transitions.
///
/// The log keeps delivery order and prunes by age only; it never re-sorts,
/// so out-of-order server timestamps are retained as delivered.
#[derive(Debug)]
pub struct TimelineBuffer {
    events: VecDeque<TimelineEvent>,
    window_ms: u64,
    max_entries: usize,
}

impl Default for TimelineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineBuffer {
    pub fn new() -> Self {
        Self::with_limits(TIMELINE_WINDOW_MS, MAX_TIMELINE_EVENTS)
    }

    pub fn with_limits(window_ms: u64, max_entries: usize) -> Self {
        Self {
            events: VecDeque::new(),
            window_ms,
            max_entries,
        }
    }

    /// Append one event, then prune entries older than the trailing window
    /// and enforce the entry cap, oldest first.
    pub fn record(&mut self, event: TimelineEvent, now: u64) {
        self.events.push_back(event);
        let cutoff = now.saturating_sub(self.window_ms);
        self.events.retain(|e| e.ts >= cutoff);
        while self.events.len() > self.max_entries {
            self.events.pop_front();
        }
    }

    /// Retained events within a trailing window ending at `now`. Consumers
    /// may pass a window narrower than the buffer's own.
    pub fn snapshot(&self, now: u64, window_ms: u64) -> Vec<TimelineEvent> {
        let cutoff = now.saturating_sub(window_ms);
        self.events.iter().filter(|e| e.ts >= cutoff).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }
}

/// Per-minute activity counts. Matches the historical timeline endpoint's
/// bucket shape, so live and historical charts consume one type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinuteBucket {
    pub minute: String,
    #[serde(default)]
    pub sewing: u32,
    #[serde(default)]
    pub adjusting: u32,
    #[serde(default)]
    pub idle: u32,
    #[serde(default, rename = "break")]
    pub break_: u32,
    #[serde(default)]
    pub error: u32,
}

impl MinuteBucket {
    fn slot(&mut self, activity: Activity) -> &mut u32 {
        match activity {
            Activity::Sewing => &mut self.sewing,
            Activity::Adjusting => &mut self.adjusting,
            Activity::Idle => &mut self.idle,
            Activity::Break => &mut self.break_,
            Activity::Error => &mut self.error,
        }
    }

    pub fn total(&self) -> u32 {
        self.sewing + self.adjusting + self.idle + self.break_ + self.error
    }
}

/// Per-minute count of at-risk updates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertBucket {
    pub minute: String,
    pub alerts: u32,
}

/// Dense minute slots covering `[now - window, now]`. Every slot in range is
/// present even when zero; a 10-minute window always yields 11 slots.
fn minute_slots(now: u64, window_ms: u64) -> Vec<u64> {
    let cutoff = now.saturating_sub(window_ms);
    let mut slots = Vec::new();
    let mut t = minute_floor(cutoff);
    while t <= now {
        slots.push(t);
        t += 60_000;
    }
    slots
}

/// Per-minute counts by activity label over the trailing window.
pub fn bucket_by_minute(events: &[TimelineEvent], now: u64, window_ms: u64) -> Vec<MinuteBucket> {
    let cutoff = now.saturating_sub(window_ms);
    let mut buckets: BTreeMap<u64, MinuteBucket> = minute_slots(now, window_ms)
        .into_iter()
        .map(|t| (t, MinuteBucket::default()))
        .collect();
    for event in events {
        if event.ts < cutoff {
            continue;
        }
        let bucket = buckets.entry(minute_floor(event.ts)).or_default();
        *bucket.slot(event.activity) += 1;
    }
    buckets
        .into_iter()
        .map(|(t, mut b)| {
            b.minute = minute_label(t);
            b
        })
        .collect()
}

/// Per-minute counts of risk-true updates only, same dense-calendar rule.
pub fn bucket_alerts_by_minute(events: &[TimelineEvent], now: u64, window_ms: u64) -> Vec<AlertBucket> {
    let cutoff = now.saturating_sub(window_ms);
    let mut buckets: BTreeMap<u64, u32> =
        minute_slots(now, window_ms).into_iter().map(|t| (t, 0)).collect();
    for event in events.iter().filter(|e| e.risk) {
        if event.ts < cutoff {
            continue;
        }
        if let Some(count) = buckets.get_mut(&minute_floor(event.ts)) {
            *count += 1;
        }
    }
    buckets
        .into_iter()
        .map(|(t, alerts)| AlertBucket {
            minute: minute_label(t),
            alerts,
        })
        .collect()
}
