//! Calibration value group.
//!
//! The operator writes a [`CalibrationRequest`]; the calibration engine
//! mirrors it into the active status and owns the sample buffer.

use antenna::consts::MAX_CALIBRATION_SAMPLES;
use antenna::state::CalibrationKind;

/// One `{AZM, ELM, AZA, ELA}` angle tuple [deg].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CalibrationSample {
    /// Azimuth, mechanical.
    pub az_mechanical: f64,
    /// Elevation, mechanical.
    pub el_mechanical: f64,
    /// Azimuth, astronomical.
    pub az_astronomical: f64,
    /// Elevation, astronomical.
    pub el_astronomical: f64,
}

impl CalibrationSample {
    /// Build from the `{AZM, ELM, AZA, ELA}` wire order.
    pub const fn from_array(v: [f64; 4]) -> Self {
        Self {
            az_mechanical: v[0],
            el_mechanical: v[1],
            az_astronomical: v[2],
            el_astronomical: v[3],
        }
    }

    /// `{AZM, ELM, AZA, ELA}` wire order.
    pub const fn to_array(self) -> [f64; 4] {
        [
            self.az_mechanical,
            self.el_mechanical,
            self.az_astronomical,
            self.el_astronomical,
        ]
    }
}

/// Operator request to run a calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibrationRequest {
    /// Calibration requested.
    pub enabled: bool,
    /// Requested calibration type.
    pub kind: CalibrationKind,
    /// Requested freedom mode.
    pub freedom_mode: u8,
}

/// Engine-owned calibration status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibrationStatus {
    /// Calibration running.
    pub active: bool,
    /// Active calibration type.
    pub kind: CalibrationKind,
    /// Active freedom mode.
    pub freedom_mode: u8,
}

/// Input queued by an operator for the calibration engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationInput {
    /// Append a sample.
    Sample(CalibrationSample),
    /// Empty the sample buffer.
    Reset,
}

/// Calibration value group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalibrationData {
    /// Operator request.
    pub request: CalibrationRequest,
    /// Engine status.
    pub status: CalibrationStatus,
    /// Most recently accepted sample.
    pub last_sample: CalibrationSample,
    /// Number of stored samples.
    pub sample_count: u32,
    /// Stored samples in arrival order.
    pub samples: heapless::Vec<CalibrationSample, MAX_CALIBRATION_SAMPLES>,
}

impl CalibrationData {
    /// Append `sample`. Returns it back when the buffer is full.
    pub fn push_sample(&mut self, sample: CalibrationSample) -> Result<(), CalibrationSample> {
        self.samples.push(sample)?;
        self.last_sample = sample;
        self.sample_count = self.samples.len() as u32;
        Ok(())
    }

    /// Empty the sample buffer and zero the count.
    pub fn reset_samples(&mut self) {
        self.samples.clear();
        self.sample_count = 0;
        self.last_sample = CalibrationSample::default();
    }

    /// `sample_count` matches the stored buffer.
    #[inline]
    pub fn count_consistent(&self) -> bool {
        self.sample_count as usize == self.samples.len()
    }
}
