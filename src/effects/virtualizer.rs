//! Virtualizer (stereo widening) stage

use super::actuator::{EffectActuator, EffectEngine};
use crate::error::{EffectsError, Result};
use crate::impl_actuator_common;

/// Highest strength accepted by virtualizer engines
pub const MAX_VIRTUALIZER_STRENGTH: u16 = 1500;

/// Platform virtualizer engine
pub trait VirtualizerEngine: EffectEngine {
    fn rounded_strength(&self) -> Result<u16>;

    fn set_strength(&mut self, strength: u16) -> Result<()>;
}

/// Virtualizer actuator
pub struct VirtualizerActuator {
    engine: Box<dyn VirtualizerEngine>,
    enabled: bool,
    last_applied: Option<u16>,
}

impl VirtualizerActuator {
    pub fn new(engine: Box<dyn VirtualizerEngine>) -> Self {
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

impl EffectActuator for VirtualizerActuator {
    type Params = u16;

    impl_actuator_common!("virtualizer");

    fn apply(&mut self, strength: &u16) -> Result<bool> {
        let strength = *strength;
        if strength > MAX_VIRTUALIZER_STRENGTH {
            return Err(EffectsError::StrengthOutOfRange {
                effect: "virtualizer",
                strength,
                max: MAX_VIRTUALIZER_STRENGTH,
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
