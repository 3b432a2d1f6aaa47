//! Preset reverb stage

use std::fmt;

use serde::{Deserialize, Serialize};

use super::actuator::{EffectActuator, EffectEngine};
use crate::error::{EffectsError, Result};
use crate::impl_actuator_common;

/// Reverb presets, numbered the way platform preset reverbs number them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReverbPreset {
    None,
    SmallRoom,
    MediumRoom,
    LargeRoom,
    MediumHall,
    LargeHall,
    Plate,
}

impl ReverbPreset {
    pub fn as_raw(self) -> u16 {
        match self {
            ReverbPreset::None => 0,
            ReverbPreset::SmallRoom => 1,
            ReverbPreset::MediumRoom => 2,
            ReverbPreset::LargeRoom => 3,
            ReverbPreset::MediumHall => 4,
            ReverbPreset::LargeHall => 5,
            ReverbPreset::Plate => 6,
        }
    }
}

impl TryFrom<u16> for ReverbPreset {
    type Error = EffectsError;

    fn try_from(raw: u16) -> Result<Self> {
        match raw {
            0 => Ok(ReverbPreset::None),
            1 => Ok(ReverbPreset::SmallRoom),
            2 => Ok(ReverbPreset::MediumRoom),
            3 => Ok(ReverbPreset::LargeRoom),
            4 => Ok(ReverbPreset::MediumHall),
            5 => Ok(ReverbPreset::LargeHall),
            6 => Ok(ReverbPreset::Plate),
            _ => Err(EffectsError::InvalidPreset { raw }),
        }
    }
}

impl fmt::Display for ReverbPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReverbPreset::None => write!(f, "None"),
            ReverbPreset::SmallRoom => write!(f, "Small Room"),
            ReverbPreset::MediumRoom => write!(f, "Medium Room"),
            ReverbPreset::LargeRoom => write!(f, "Large Room"),
            ReverbPreset::MediumHall => write!(f, "Medium Hall"),
            ReverbPreset::LargeHall => write!(f, "Large Hall"),
            ReverbPreset::Plate => write!(f, "Plate"),
        }
    }
}

/// Platform preset reverb engine
pub trait ReverbEngine: EffectEngine {
    fn preset(&self) -> Result<ReverbPreset>;

    fn set_preset(&mut self, preset: ReverbPreset) -> Result<()>;
}

/// Reverb actuator
pub struct ReverbActuator {
    engine: Box<dyn ReverbEngine>,
    enabled: bool,
    last_applied: Option<ReverbPreset>,
}

impl ReverbActuator {
    pub fn new(engine: Box<dyn ReverbEngine>) -> Self {
        let last_applied = engine.preset().ok();
        Self {
            engine,
            enabled: false,
            last_applied,
        }
    }

    pub fn preset(&self) -> Option<ReverbPreset> {
        self.last_applied
    }

    /// Select a preset regardless of the enabled flag.
    ///
    /// Used to stage the soft-mode preset right before the stage is
    /// switched on. Still suppressed when unchanged.
    pub fn stage_preset(&mut self, preset: ReverbPreset) -> Result<bool> {
        if self.last_applied == Some(preset) {
            return Ok(false);
        }
        self.engine.set_preset(preset)?;
        self.last_applied = Some(preset);
        Ok(true)
    }
}

impl EffectActuator for ReverbActuator {
    type Params = ReverbPreset;

    impl_actuator_common!("reverb");

    fn apply(&mut self, preset: &ReverbPreset) -> Result<bool> {
        if !self.enabled {
            return Ok(false);
        }
        self.stage_preset(*preset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockReverb;

    #[test]
    fn test_raw_round_trip() {
        for raw in 0..=6 {
            assert_eq!(ReverbPreset::try_from(raw).unwrap().as_raw(), raw);
        }
        assert!(matches!(
            ReverbPreset::try_from(7),
            Err(EffectsError::InvalidPreset { raw: 7 })
        ));
    }

    #[test]
    fn test_preset_written_once() {
        let mock = MockReverb::new(ReverbPreset::None);
        let mut reverb = ReverbActuator::new(Box::new(mock.clone()));
        reverb.enable().unwrap();

        assert!(reverb.apply(&ReverbPreset::MediumRoom).unwrap());
        assert!(!reverb.apply(&ReverbPreset::MediumRoom).unwrap());
        assert_eq!(mock.preset_writes(), 1);
        assert_eq!(mock.preset(), ReverbPreset::MediumRoom);
    }

    #[test]
    fn test_disabled_apply_is_noop_but_staging_writes() {
        let mock = MockReverb::new(ReverbPreset::None);
        let mut reverb = ReverbActuator::new(Box::new(mock.clone()));

        assert!(!reverb.apply(&ReverbPreset::LargeRoom).unwrap());
        assert_eq!(mock.preset_writes(), 0);

        assert!(reverb.stage_preset(ReverbPreset::SmallRoom).unwrap());
        assert_eq!(mock.preset(), ReverbPreset::SmallRoom);
        assert!(!reverb.is_enabled());
    }

    #[test]
    fn test_display() {
        assert_eq!(ReverbPreset::SmallRoom.to_string(), "Small Room");
        assert_eq!(ReverbPreset::LargeHall.to_string(), "Large Hall");
    }
}
