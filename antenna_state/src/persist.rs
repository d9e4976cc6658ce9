//! Parameter persistence boundary.
//!
//! The store never touches the disk itself. The persistence collaborator
//! consumes `SAVE_PARAMS`, `LOAD_PARAMS` and `RESET_DEFAULTS` and moves a
//! [`PersistentParameters`] record through a [`ParameterStore`].

use crate::command::CommandFlags;
use crate::data::{CalibrationSample, VarData, bounded_text};
use crate::error::{StateError, StateResult};
use crate::ownership::{GroupId, Owner};
use crate::snapshot::Generation;
use crate::store::StateStore;
use antenna::consts::MAX_CALIBRATION_SAMPLES;
use antenna::state::CalibrationKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Operator parameters that survive a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PersistentParameters {
    /// System identification string.
    pub system_id: String,
    /// Tracking azimuth offset [deg].
    pub az_offset: f64,
    /// Tracking elevation offset [deg].
    pub el_offset: f64,
    /// Azimuth preset [deg].
    pub az_preset: f64,
    /// Elevation preset [deg].
    pub el_preset: f64,
    /// Calibration type.
    pub calibration_kind: CalibrationKind,
    /// Calibration freedom mode.
    pub freedom_mode: u8,
    /// Stored calibration samples, `[az_mech, el_mech, az_astro, el_astro]`.
    pub samples: Vec<[f64; 4]>,
}

impl PersistentParameters {
    /// Capture the persistable fields of `data`.
    pub fn capture(data: &VarData) -> Self {
        let request = &data.system.request;
        Self {
            system_id: request.system_id.as_str().to_owned(),
            az_offset: request.az_offset,
            el_offset: request.el_offset,
            az_preset: request.az_preset,
            el_preset: request.el_preset,
            calibration_kind: data.calibration.request.kind,
            freedom_mode: data.calibration.request.freedom_mode,
            samples: data
                .calibration
                .samples
                .iter()
                .map(|s| s.to_array())
                .collect(),
        }
    }

    /// Write these parameters into `data`. Returns the number of samples
    /// that did not fit the buffer.
    fn apply_to(&self, data: &mut VarData) -> usize {
        let request = &mut data.system.request;
        request.system_id = bounded_text(&self.system_id);
        request.az_offset = self.az_offset;
        request.el_offset = self.el_offset;
        request.az_preset = self.az_preset;
        request.el_preset = self.el_preset;

        let cal = &mut data.calibration;
        cal.request.kind = self.calibration_kind;
        cal.request.freedom_mode = self.freedom_mode;
        cal.reset_samples();
        let mut dropped = 0;
        for sample in &self.samples {
            if cal.push_sample(CalibrationSample::from_array(*sample)).is_err() {
                dropped += 1;
            }
        }
        dropped
    }
}

/// Backing store for [`PersistentParameters`].
pub trait ParameterStore {
    /// Load saved parameters. `Ok(None)` when nothing was saved yet.
    fn load(&mut self) -> StateResult<Option<PersistentParameters>>;

    /// Replace saved parameters.
    fn save(&mut self, params: &PersistentParameters) -> StateResult<()>;
}

/// TOML file parameter store.
#[derive(Debug, Clone)]
pub struct TomlParameterFile {
    path: PathBuf,
}

impl TomlParameterFile {
    /// Store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ParameterStore for TomlParameterFile {
    fn load(&mut self) -> StateResult<Option<PersistentParameters>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&text)
            .map(Some)
            .map_err(|e| StateError::ParameterFormat {
                reason: e.to_string(),
            })
    }

    fn save(&mut self, params: &PersistentParameters) -> StateResult<()> {
        let text = toml::to_string(params).map_err(|e| StateError::ParameterFormat {
            reason: e.to_string(),
        })?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        // Write-then-rename so a crash never leaves a truncated file.
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StateStore {
    /// Apply `params` as one commit. Persistence only.
    pub fn apply_parameters(
        &self,
        owner: Owner,
        params: &PersistentParameters,
    ) -> StateResult<Generation> {
        if owner != Owner::Persistence {
            warn!(owner = %owner, "parameter apply denied");
            return Err(StateError::PermissionDenied {
                owner,
                group: GroupId::OperatorRequest,
            });
        }
        let mut dropped = 0;
        let generation = self.commit_with(owner, &[Owner::Calibration], |data| {
            dropped = params.apply_to(data);
            Ok(())
        })?;
        if dropped > 0 {
            warn!(
                dropped,
                capacity = MAX_CALIBRATION_SAMPLES,
                "saved calibration samples exceed buffer"
            );
        }
        Ok(generation)
    }

    /// Persistence collaborator step.
    ///
    /// Services the parameter commands in the order save, reset to
    /// defaults, load, consuming each one just before acting on it. A
    /// failure stops the step and leaves the later commands pending.
    /// Returns the commands serviced.
    pub fn service_parameter_commands<S: ParameterStore>(
        &self,
        owner: Owner,
        store: &mut S,
    ) -> StateResult<CommandFlags> {
        let mut serviced = CommandFlags::empty();

        let saved = self.service_command(owner, CommandFlags::SAVE_PARAMS, || {
            let params = PersistentParameters::capture(&self.read_snapshot());
            store.save(&params)?;
            info!(samples = params.samples.len(), "parameters saved");
            Ok(())
        })?;
        serviced.set(CommandFlags::SAVE_PARAMS, saved.is_some());

        let reset = self.service_command(owner, CommandFlags::RESET_DEFAULTS, || {
            self.apply_parameters(owner, &PersistentParameters::default())?;
            info!("parameters reset to defaults");
            Ok(())
        })?;
        serviced.set(CommandFlags::RESET_DEFAULTS, reset.is_some());

        let loaded = self.service_command(owner, CommandFlags::LOAD_PARAMS, || {
            match store.load()? {
                Some(params) => {
                    self.apply_parameters(owner, &params)?;
                    info!(samples = params.samples.len(), "parameters loaded");
                }
                None => warn!("load requested but no parameters saved"),
            }
            Ok(())
        })?;
        serviced.set(CommandFlags::LOAD_PARAMS, loaded.is_some());

        Ok(serviced)
    }
}
