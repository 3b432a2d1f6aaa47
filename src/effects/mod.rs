//! Effect actuators
//!
//! The four platform effect stages, each behind an [`EffectActuator`], and
//! the [`EffectRack`] that groups them for the controller.

mod actuator;
mod bass_boost;
mod equalizer;
mod reverb;
mod virtualizer;

pub use actuator::{EffectActuator, EffectEngine};
pub use bass_boost::{BassBoostActuator, BassBoostEngine, MAX_BASS_BOOST_STRENGTH};
pub use equalizer::{EqualizerActuator, EqualizerEngine};
pub use reverb::{ReverbActuator, ReverbEngine, ReverbPreset};
pub use virtualizer::{VirtualizerActuator, VirtualizerEngine, MAX_VIRTUALIZER_STRENGTH};

use serde::Serialize;

use crate::curve::{DeviceCapabilities, EffectTargets};
use crate::error::Result;

/// Platform engine handles injected at construction
pub struct EffectHandles {
    pub equalizer: Box<dyn EqualizerEngine>,
    pub bass_boost: Box<dyn BassBoostEngine>,
    pub reverb: Box<dyn ReverbEngine>,
    pub virtualizer: Box<dyn VirtualizerEngine>,
}

/// Outcome of pushing one set of targets through the rack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Stages that issued at least one driver write
    pub written: Vec<&'static str>,
    /// Stages whose engine rejected the write
    pub failed: Vec<&'static str>,
}

impl ApplyReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, stage: &'static str, result: Result<bool>) {
        match result {
            Ok(true) => self.written.push(stage),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("[{}] write skipped this tick: {}", stage, e);
                self.failed.push(stage);
            }
        }
    }
}

/// Serializable view of every stage's flag and last applied value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RackSnapshot {
    pub equalizer_enabled: bool,
    pub band_levels: Vec<Option<i16>>,
    pub bass_boost_enabled: bool,
    pub bass_boost_strength: Option<u16>,
    pub reverb_enabled: bool,
    pub reverb_preset: Option<ReverbPreset>,
    pub virtualizer_enabled: bool,
    pub virtualizer_strength: Option<u16>,
}

/// The four effect stages of the downstream pipeline
pub struct EffectRack {
    equalizer: EqualizerActuator,
    bass_boost: BassBoostActuator,
    reverb: ReverbActuator,
    virtualizer: VirtualizerActuator,
}

impl EffectRack {
    pub fn new(handles: EffectHandles) -> Result<Self> {
        Ok(Self {
            equalizer: EqualizerActuator::new(handles.equalizer)?,
            bass_boost: BassBoostActuator::new(handles.bass_boost),
            reverb: ReverbActuator::new(handles.reverb),
            virtualizer: VirtualizerActuator::new(handles.virtualizer),
        })
    }

    pub fn capabilities(&self) -> DeviceCapabilities {
        self.equalizer.capabilities()
    }

    /// Push targets to every stage.
    ///
    /// Stages are independent: a failure in one is logged and reported but
    /// never prevents the others from being written.
    pub fn apply_targets(&mut self, targets: &EffectTargets) -> ApplyReport {
        let mut report = ApplyReport::default();
        report.record("equalizer", self.equalizer.apply(&targets.band_levels));
        report.record("bass_boost", self.bass_boost.apply(&targets.bass_boost_strength));
        report.record("reverb", self.reverb.apply(&targets.reverb_preset));
        report.record("virtualizer", self.virtualizer.apply(&targets.virtualizer_strength));
        report
    }

    pub fn snapshot(&self) -> RackSnapshot {
        RackSnapshot {
            equalizer_enabled: self.equalizer.is_enabled(),
            band_levels: (0..self.equalizer.band_count())
                .map(|band| self.equalizer.band_level(band))
                .collect(),
            bass_boost_enabled: self.bass_boost.is_enabled(),
            bass_boost_strength: self.bass_boost.strength(),
            reverb_enabled: self.reverb.is_enabled(),
            reverb_preset: self.reverb.preset(),
            virtualizer_enabled: self.virtualizer.is_enabled(),
            virtualizer_strength: self.virtualizer.strength(),
        }
    }

    pub fn equalizer(&self) -> &EqualizerActuator {
        &self.equalizer
    }

    pub fn equalizer_mut(&mut self) -> &mut EqualizerActuator {
        &mut self.equalizer
    }

    pub fn bass_boost(&self) -> &BassBoostActuator {
        &self.bass_boost
    }

    pub fn bass_boost_mut(&mut self) -> &mut BassBoostActuator {
        &mut self.bass_boost
    }

    pub fn reverb(&self) -> &ReverbActuator {
        &self.reverb
    }

    pub fn reverb_mut(&mut self) -> &mut ReverbActuator {
        &mut self.reverb
    }

    pub fn virtualizer(&self) -> &VirtualizerActuator {
        &self.virtualizer
    }

    pub fn virtualizer_mut(&mut self) -> &mut VirtualizerActuator {
        &mut self.virtualizer
    }
}
