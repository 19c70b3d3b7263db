//! Static fallback dataset substituted by the dashboard when the backend
//! is unreachable, so the screens keep rendering plausible values instead
//! of going blank.

use chrono::{Duration, Utc};

use crate::api::dto::CurrentDataResponse;
use crate::db::models::{Alert, AlertSeverity, ControlSettings, DeviceStatus, SensorReading};

pub fn sensor_reading() -> SensorReading {
    SensorReading {
        id: 0,
        recorded_at: Utc::now(),
        temperature: 25.5,
        humidity: 68.2,
        ph: 6.1,
        tds: 850.0,
        light_intensity: 75.0,
        co2: 450.0,
        soil_moisture: Some(82.0),
        water_level: Some(90.0),
    }
}

pub fn device_status() -> DeviceStatus {
    let now = Utc::now();
    DeviceStatus {
        id: 0,
        esp32_connected: true,
        last_heartbeat: Some(now),
        battery_level: 85.0,
        solar_power: 120.0,
        updated_at: now,
    }
}

pub fn current_data() -> CurrentDataResponse {
    CurrentDataResponse {
        sensor_data: Some(sensor_reading()),
        device_status: Some(device_status()),
        timestamp: Utc::now(),
    }
}

pub fn control_settings() -> ControlSettings {
    ControlSettings {
        id: 0,
        pump_auto: true,
        fan_auto: true,
        curtain_auto: true,
        pump_status: false,
        fan_status: true,
        curtain_status: false,
        temp_threshold_min: 20.0,
        temp_threshold_max: 30.0,
        humidity_threshold_min: 60.0,
        humidity_threshold_max: 80.0,
        ph_threshold_min: 5.5,
        ph_threshold_max: 6.5,
        updated_at: Utc::now(),
    }
}

pub fn alerts() -> Vec<Alert> {
    let now = Utc::now();
    vec![
        Alert {
            id: 1,
            recorded_at: now,
            alert_type: "TEMPERATURE".to_owned(),
            message: "Temperature is within optimal range".to_owned(),
            severity: AlertSeverity::Info,
        },
        Alert {
            id: 2,
            recorded_at: now - Duration::hours(1),
            alert_type: "PH".to_owned(),
            message: "pH level needs adjustment: 7.2".to_owned(),
            severity: AlertSeverity::Warning,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{classify, Status, ThresholdBand};

    #[test]
    fn fallback_reading_is_within_default_bands() {
        // The fallback must not light up warnings on its own.
        let r = sensor_reading();
        let s = control_settings();
        let temp = ThresholdBand::new(s.temp_threshold_min, s.temp_threshold_max);
        let hum = ThresholdBand::new(s.humidity_threshold_min, s.humidity_threshold_max);
        let ph = ThresholdBand::new(s.ph_threshold_min, s.ph_threshold_max);

        assert_eq!(classify(r.temperature, Some(&temp)), Status::Normal);
        assert_eq!(classify(r.humidity, Some(&hum)), Status::Normal);
        assert_eq!(classify(r.ph, Some(&ph)), Status::Normal);
    }

    #[test]
    fn fallback_alerts_are_ordered_newest_first() {
        let alerts = alerts();
        assert!(alerts[0].recorded_at >= alerts[1].recorded_at);
    }
}
