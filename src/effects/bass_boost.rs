//! Bass boost stage

use super::actuator::{EffectActuator, EffectEngine};
use crate::error::{EffectsError, Result};
use crate::impl_actuator_common;

/// Highest strength accepted by bass boost engines
pub const MAX_BASS_BOOST_STRENGTH: u16 = 1000;

/// Platform bass boost engine
pub trait BassBoostEngine: EffectEngine {
    /// Current strength, rounded to the engine's supported resolution
    fn rounded_strength(&self) -> Result<u16>;

    fn set_strength(&mut self, strength: u16) -> Result<()>;
}

/// Bass boost actuator
pub struct BassBoostActuator {
    engine: Box<dyn BassBoostEngine>,
    enabled: bool,
    last_applied: Option<u16>,
}

impl BassBoostActuator {
    pub fn new(engine: Box<dyn BassBoostEngine>) -> Self {
        let last_applied = engine.rounded_strength().ok();
        Self {
            engine,
            enabled: false,
            last_applied,
        }
    }

    pub fn strength(&self) -> Option<u16> {
        self.last_applied
    }
}

impl EffectActuator for BassBoostActuator {
    type Params = u16;

    impl_actuator_common!("bass_boost");

    fn apply(&mut self, strength: &u16) -> Result<bool> {
        let strength = *strength;
        if strength > MAX_BASS_BOOST_STRENGTH {
            return Err(EffectsError::StrengthOutOfRange {
                effect: "bass_boost",
                strength,
                max: MAX_BASS_BOOST_STRENGTH,
            });
        }
        if !self.enabled || self.last_applied == Some(strength) {
            return Ok(false);
        }
        self.engine.set_strength(strength)?;
        self.last_applied = Some(strength);
        Ok(true)
    }
}
