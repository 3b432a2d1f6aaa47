//! Actuator trait definition
//!
//! Every effect stage wraps a platform engine handle, tracks its own
//! enabled flag, and remembers what it last wrote so unchanged parameters
//! never reach the driver.

use crate::error::Result;

/// Platform-side effect engine (the black box being configured).
pub trait EffectEngine: Send {
    /// Switch the engine in or out of the signal chain
    fn set_enabled(&mut self, enabled: bool) -> Result<()>;
}

/// Base trait for the four effect stages
pub trait EffectActuator: Send {
    /// Parameter set accepted by [`EffectActuator::apply`]
    type Params: ?Sized;

    /// Short identifier used in logs and errors
    fn name(&self) -> &'static str;

    /// Check if the stage is enabled
    fn is_enabled(&self) -> bool;

    /// Enable the stage. Returns `true` if the state changed.
    fn enable(&mut self) -> Result<bool>;

    /// Disable the stage. Returns `true` if the state changed.
    fn disable(&mut self) -> Result<bool>;

    /// Write parameters to the engine.
    ///
    /// A no-op while the stage is disabled or when `params` equals what was
    /// last applied. Returns `true` if at least one driver write happened.
    fn apply(&mut self, params: &Self::Params) -> Result<bool>;
}

/// Implements name/is_enabled/enable/disable for a stage holding
/// `engine` and `enabled` fields.
#[macro_export]
macro_rules! impl_actuator_common {
    ($name:expr) => {
        fn name(&self) -> &'static str {
            $name
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn enable(&mut self) -> $crate::error::Result<bool> {
            if self.enabled {
                return Ok(false);
            }
            self.engine.set_enabled(true)?;
            self.enabled = true;
            tracing::debug!("[{}] enabled", $name);
            Ok(true)
        }

        fn disable(&mut self) -> $crate::error::Result<bool> {
            if !self.enabled {
                return Ok(false);
            }
            self.engine.set_enabled(false)?;
            self.enabled = false;
            tracing::debug!("[{}] disabled", $name);
            Ok(true)
        }
    };
}
