use std::collections::HashMap;

use crate::net::frames::Frame;
use crate::timeline::TimelineEvent;
use crate::worker::{SensorSnapshot, WorkerStatus};

/// The three per-kind live state maps, keyed by worker key. Writes are total
/// overwrites; no partial-field merge and no history beyond the timeline
/// buffer. Mutation is serialized by the monitor loop's event ordering, so
/// there is no interior locking.
#[derive(Debug, Default)]
pub struct LiveStores {
    workers: HashMap<String, WorkerStatus>,
    sensors: HashMap<String, SensorSnapshot>,
    device_links: HashMap<String, bool>,
}

impl LiveStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one classified frame. Returns the derived timeline event when
    /// the frame was a worker-status update, `None` otherwise.
    pub fn apply(&mut self, frame: Frame) -> Option<TimelineEvent> {
        match frame {
            Frame::Sensor(s) => {
                self.sensors.insert(
                    s.worker_id.clone(),
                    SensorSnapshot {
                        temp: s.temp,
                        accel_mag: s.accel_mag,
                        ts: s.ts,
                    },
                );
                None
            },
            Frame::DeviceStatus(d) => {
                self.device_links.insert(d.worker_id, d.mpu_connected);
                None
            },
            Frame::WorkerStatus(w) => {
                let event = TimelineEvent {
                    ts: w.updated_at,
                    worker_id: w.worker_id.clone(),
                    activity: w.activity,
                    risk: w.risk(),
                };
                // Receiving a status update is taken as proof of an active
                // device link, even though the frame carries no device
                // evidence of its own.
                self.device_links.insert(w.worker_id.clone(), true);
                self.workers.insert(
                    w.worker_id.clone(),
                    WorkerStatus {
                        worker_id: w.worker_id,
                        name: w.name,
                        activity: w.activity,
                        risk_ergo: w.risk_ergo,
                        risk_fatigue: w.risk_fatigue,
                        updated_at: w.updated_at,
                    },
                );
                Some(event)
            },
            Frame::Unrecognized => None,
        }
    }

    pub fn workers(&self) -> &HashMap<String, WorkerStatus> {
        &self.workers
    }

    pub fn sensors(&self) -> &HashMap<String, SensorSnapshot> {
        &self.sensors
    }

    pub fn device_links(&self) -> &HashMap<String, bool> {
        &self.device_links
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty() && self.sensors.is_empty() && self.device_links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::decode_frame;
    use crate::worker::Activity;

    const NOW: u64 = 1_700_000_000_000;

    fn apply_raw(stores: &mut LiveStores, raw: &str) -> Option<TimelineEvent> {
        stores.apply(decode_frame(raw, NOW))
    }

    #[test]
    fn status_update_overwrites_wholesale() {
        let mut stores = LiveStores::new();
        apply_raw(
            &mut stores,
            r#"{"worker_id":"W01","current_state":"sewing","risk_ergo":true,"updated_at":1}"#,
        );
        apply_raw(
            &mut stores,
            r#"{"worker_id":"W01","current_state":"break","updated_at":2}"#,
        );

        let w = &stores.workers()["W01"];
        assert_eq!(w.activity, Activity::Break);
        // risk_ergo was absent in the second frame, so it resets to false.
        assert!(!w.risk_ergo);
        assert_eq!(w.updated_at, 2);
        assert_eq!(stores.workers().len(), 1);
    }

    #[test]
    fn status_update_yields_timeline_event() {
        let mut stores = LiveStores::new();
        let event = apply_raw(
            &mut stores,
            r#"{"worker_id":"W01","current_state":"sewing","risk_fatigue":true,"updated_at":7}"#,
        )
        .unwrap();
        assert_eq!(event.ts, 7);
        assert_eq!(event.worker_id, "W01");
        assert_eq!(event.activity, Activity::Sewing);
        assert!(event.risk);
    }

    #[test]
    fn status_update_implies_device_link() {
        let mut stores = LiveStores::new();
        apply_raw(
            &mut stores,
            r#"{"type":"device_status","worker_id":"W01","mpu_connected":false}"#,
        );
        assert!(!stores.device_links()["W01"]);

        apply_raw(&mut stores, r#"{"worker_id":"W01","current_state":"idle"}"#);
        assert!(stores.device_links()["W01"]);
    }

    #[test]
    fn sensor_frame_only_touches_sensor_store() {
        let mut stores = LiveStores::new();
        let event = apply_raw(
            &mut stores,
            r#"{"type":"sensor","worker_id":"W02","temp":35.2,"ts":9}"#,
        );
        assert!(event.is_none());
        assert!(stores.workers().is_empty());
        let s = &stores.sensors()["W02"];
        assert_eq!(s.temp, Some(35.2));
        assert_eq!(s.accel_mag, None);
        assert_eq!(s.ts, 9);
    }

    #[test]
    fn sensor_overwrite_drops_previously_reported_fields() {
        let mut stores = LiveStores::new();
        apply_raw(
            &mut stores,
            r#"{"type":"sensor","worker_id":"W02","temp":35.2,"accel_mag":1.5,"ts":1}"#,
        );
        apply_raw(&mut stores, r#"{"type":"sensor","worker_id":"W02","temp":36.0,"ts":2}"#);
        let s = &stores.sensors()["W02"];
        assert_eq!(s.temp, Some(36.0));
        assert_eq!(s.accel_mag, None);
    }

    #[test]
    fn malformed_frame_leaves_all_stores_unchanged() {
        let mut stores = LiveStores::new();
        for raw in ["garbage", r#"{"type":"sensor"}"#, r#"{"no_worker":true}"#] {
            assert!(apply_raw(&mut stores, raw).is_none(), "raw: {raw}");
        }
        assert!(stores.is_empty());
    }
}
