//! Time, GPS, temperature and TLE value groups.

/// Loop timing value group. Written once per control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeData {
    /// Monotonic loop timestamp [µs].
    pub timestamp_us: u64,
    /// Duration of the last loop iteration [µs].
    pub loop_duration_us: u64,
}

/// GPS UTC time `[year, month, day, hours, minutes, seconds]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UtcTime {
    /// Calendar year.
    pub year: u16,
    /// Month, 1-12.
    pub month: u8,
    /// Day of month, 1-31.
    pub day: u8,
    /// Hours, 0-23.
    pub hour: u8,
    /// Minutes, 0-59.
    pub minute: u8,
    /// Seconds, 0-60.
    pub second: u8,
}

impl UtcTime {
    /// Six-field wire layout.
    pub const fn to_fields(self) -> [u32; 6] {
        [
            self.year as u32,
            self.month as u32,
            self.day as u32,
            self.hour as u32,
            self.minute as u32,
            self.second as u32,
        ]
    }
}

/// GPS value group.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GpsData {
    /// UTC time of the last fix.
    pub utc: UtcTime,
    /// A 3D fix is available.
    pub fix: bool,
    /// Receiver is connected. Independent of `fix`.
    pub connected: bool,
    /// Latitude [deg].
    pub latitude: f64,
    /// Longitude [deg].
    pub longitude: f64,
    /// Altitude [m].
    pub altitude: f64,
    /// System clock synchronized to GPS time.
    pub sync: bool,
}

impl GpsData {
    /// Coordinates are finite and within WGS84 ranges.
    pub fn coordinates_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.altitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Temperature value group.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TemperatureData {
    /// CPU temperature [°C].
    pub cpu_c: f32,
    /// External sensor temperature [°C].
    pub external_c: f32,
}

/// Tracking-target ephemeris. Reserved; carries no fields yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct TleData {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_wire_layout() {
        let utc = UtcTime {
            year: 2026,
            month: 10,
            day: 17,
            hour: 8,
            minute: 30,
            second: 5,
        };
        assert_eq!(utc.to_fields(), [2026, 10, 17, 8, 30, 5]);
    }

    #[test]
    fn coordinate_ranges() {
        let mut gps = GpsData {
            latitude: 35.7,
            longitude: 51.4,
            altitude: 1200.0,
            ..Default::default()
        };
        assert!(gps.coordinates_valid());

        gps.latitude = 91.0;
        assert!(!gps.coordinates_valid());

        gps.latitude = 0.0;
        gps.longitude = f64::NAN;
        assert!(!gps.coordinates_valid());
    }
}
