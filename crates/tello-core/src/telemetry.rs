//! Tello state datagrams (UDP port 8890).
//!
//! The drone broadcasts a `key:value;` list roughly ten times per second:
//! `pitch:0;roll:0;yaw:0;vgx:0;vgy:0;vgz:0;templ:60;temph:63;tof:10;h:0;bat:87;baro:12.34;time:0;agx:-1.00;agy:0.00;agz:-999.00;`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parsed state packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelloTelemetry {
    pub pitch: i32,
    pub roll: i32,
    pub yaw: i32,
    /// Velocities in dm/s
    pub vgx: i32,
    pub vgy: i32,
    pub vgz: i32,
    pub temp_low: i32,
    pub temp_high: i32,
    /// Time-of-flight distance in cm
    pub tof_cm: i32,
    /// Height in cm
    pub height_cm: i32,
    /// Battery percentage
    pub battery: i32,
    /// Barometer altitude in meters
    pub baro_m: f64,
    /// Motor-on time in seconds
    pub flight_time_s: i32,
    pub agx: f64,
    pub agy: f64,
    pub agz: f64,
    pub received_at: DateTime<Utc>,
}

impl Default for TelloTelemetry {
    fn default() -> Self {
        Self {
            pitch: 0,
            roll: 0,
            yaw: 0,
            vgx: 0,
            vgy: 0,
            vgz: 0,
            temp_low: 0,
            temp_high: 0,
            tof_cm: 0,
            height_cm: 0,
            battery: 0,
            baro_m: 0.0,
            flight_time_s: 0,
            agx: 0.0,
            agy: 0.0,
            agz: 0.0,
            received_at: Utc::now(),
        }
    }
}

impl TelloTelemetry {
    /// Parse a state datagram. Returns `None` if no known field is present.
    pub fn parse(packet: &str) -> Option<Self> {
        let mut telemetry = TelloTelemetry::default();
        let mut recognised = 0;

        for field in packet.trim().split(';') {
            let Some((key, value)) = field.split_once(':') else {
                continue;
            };
            let value = value.trim();
            let int = || value.parse::<f64>().map(|v| v as i32).ok();
            let float = || value.parse::<f64>().ok();

            let parsed = match key.trim() {
                "pitch" => int().map(|v| telemetry.pitch = v),
                "roll" => int().map(|v| telemetry.roll = v),
                "yaw" => int().map(|v| telemetry.yaw = v),
                "vgx" => int().map(|v| telemetry.vgx = v),
                "vgy" => int().map(|v| telemetry.vgy = v),
                "vgz" => int().map(|v| telemetry.vgz = v),
                "templ" => int().map(|v| telemetry.temp_low = v),
                "temph" => int().map(|v| telemetry.temp_high = v),
                "tof" => int().map(|v| telemetry.tof_cm = v),
                "h" => int().map(|v| telemetry.height_cm = v),
                "bat" => int().map(|v| telemetry.battery = v),
                "baro" => float().map(|v| telemetry.baro_m = v),
                "time" => int().map(|v| telemetry.flight_time_s = v),
                "agx" => float().map(|v| telemetry.agx = v),
                "agy" => float().map(|v| telemetry.agy = v),
                "agz" => float().map(|v| telemetry.agz = v),
                _ => None,
            };
            if parsed.is_some() {
                recognised += 1;
            }
        }

        (recognised > 0).then_some(telemetry)
    }
}
