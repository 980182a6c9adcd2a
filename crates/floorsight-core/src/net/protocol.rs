use serde_json::Value;

use crate::worker::Activity;

use super::frames::{DeviceStatusFrame, Frame, SensorFrame, WorkerStatusFrame};

/// Classify one raw text frame. `received_at` (epoch ms) fills in for
/// timestamps the frame does not carry.
///
/// Classification order on the `type` discriminant, first match wins:
/// `sensor`, then `device_status`, then an implicit worker-status attempt.
/// Parse failures and frames matching no discriminant come back as
/// `Frame::Unrecognized`; malformed input never terminates the connection.
pub fn decode_frame(raw: &str, received_at: u64) -> Frame {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        tracing::debug!("Discarding unparseable frame");
        return Frame::Unrecognized;
    };
    let Some(obj) = value.as_object() else {
        tracing::debug!("Discarding non-object frame");
        return Frame::Unrecognized;
    };

    let kind = obj.get("type").and_then(Value::as_str);

    if kind == Some("sensor")
        && let Some(worker_id) = obj.get("worker_id").and_then(Value::as_str)
    {
        return Frame::Sensor(SensorFrame {
            worker_id: worker_id.to_string(),
            temp: obj.get("temp").and_then(Value::as_f64),
            accel_mag: obj.get("accel_mag").and_then(Value::as_f64),
            ts: obj.get("ts").and_then(Value::as_u64).unwrap_or(received_at),
        });
    }

    if kind == Some("device_status")
        && let Some(worker_id) = obj.get("worker_id").and_then(Value::as_str)
    {
        // Only an exact boolean true counts as connected.
        return Frame::DeviceStatus(DeviceStatusFrame {
            worker_id: worker_id.to_string(),
            mpu_connected: obj.get("mpu_connected") == Some(&Value::Bool(true)),
        });
    }

    let Some(worker_id) = obj.get("worker_id").and_then(Value::as_str) else {
        tracing::debug!("Discarding frame without worker key");
        return Frame::Unrecognized;
    };
    if worker_id.is_empty() {
        return Frame::Unrecognized;
    }

    let updated_at = obj
        .get("updated_at")
        .and_then(Value::as_u64)
        .unwrap_or(received_at);
    Frame::WorkerStatus(WorkerStatusFrame {
        worker_id: worker_id.to_string(),
        name: obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(worker_id)
            .to_string(),
        activity: Activity::from_label(obj.get("current_state").and_then(Value::as_str)),
        risk_ergo: obj.get("risk_ergo").and_then(Value::as_bool).unwrap_or(false),
        risk_fatigue: obj
            .get("risk_fatigue")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        updated_at,
    })
}
