use serde::{Deserialize, Serialize};

/// Recognized activity labels reported by the wearables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Sewing,
    Adjusting,
    #[default]
    Idle,
    Break,
    Error,
}

impl Activity {
    /// All labels, in the display order used by the timeline chart.
    pub const ALL: [Activity; 5] = [
        Activity::Sewing,
        Activity::Adjusting,
        Activity::Idle,
        Activity::Break,
        Activity::Error,
    ];

    /// Parse a raw label. Unrecognized or absent labels normalize to `Idle`.
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some("sewing") => Activity::Sewing,
            Some("adjusting") => Activity::Adjusting,
            Some("break") => Activity::Break,
            Some("error") => Activity::Error,
            _ => Activity::Idle,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Activity::Sewing => "sewing",
            Activity::Adjusting => "adjusting",
            Activity::Idle => "idle",
            Activity::Break => "break",
            Activity::Error => "error",
        }
    }

    /// Sewing and adjusting count as productive work.
    pub fn is_working(&self) -> bool {
        matches!(self, Activity::Sewing | Activity::Adjusting)
    }

    /// Idle, break, and error all count as non-working for the idle tab.
    pub fn is_idle_like(&self) -> bool {
        !self.is_working()
    }
}

/// Latest known status for one worker, overwritten wholesale per update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub worker_id: String,
    pub name: String,
    pub activity: Activity,
    pub risk_ergo: bool,
    pub risk_fatigue: bool,
    pub updated_at: u64,
}

impl WorkerStatus {
    pub fn at_risk(&self) -> bool {
        self.risk_ergo || self.risk_fatigue
    }
}

/// Latest sensor readings for one worker. A `None` field means the edge did
/// not report it in this frame, not that the reading was zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub temp: Option<f64>,
    pub accel_mag: Option<f64>,
    pub ts: u64,
}
