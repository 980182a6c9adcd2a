pub mod net;
pub mod reconcile;
pub mod stores;
pub mod time;
pub mod timeline;
pub mod view;
pub mod worker;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    /// Raw worker-status frame as the backend broadcasts it.
    pub fn status_frame(worker_id: &str, state: &str, ergo: bool, fatigue: bool, ts: u64) -> String {
        format!(
            r#"{{"worker_id":"{worker_id}","name":"{worker_id}","current_state":"{state}","risk_ergo":{ergo},"risk_fatigue":{fatigue},"updated_at":{ts}}}"#
        )
    }

    /// Raw sensor frame with both readings present.
    pub fn sensor_frame(worker_id: &str, temp: f64, accel_mag: f64, ts: u64) -> String {
        format!(
            r#"{{"type":"sensor","worker_id":"{worker_id}","temp":{temp},"accel_mag":{accel_mag},"ts":{ts}}}"#
        )
    }

    /// Raw device-status frame.
    pub fn device_frame(worker_id: &str, mpu_connected: bool) -> String {
        format!(
            r#"{{"type":"device_status","worker_id":"{worker_id}","mpu_connected":{mpu_connected}}}"#
        )
    }
}
