//! Equalizer stage
//!
//! Band count and level range are device constants, read once when the
//! stage is built. Writes are diffed per band against the last applied
//! level.

use super::actuator::{EffectActuator, EffectEngine};
use crate::curve::DeviceCapabilities;
use crate::error::{EffectsError, Result};
use crate::impl_actuator_common;

/// Platform equalizer engine
pub trait EqualizerEngine: EffectEngine {
    fn number_of_bands(&self) -> Result<u16>;

    /// Inclusive `(min, max)` band level range in millibels
    fn band_level_range(&self) -> Result<(i16, i16)>;

    fn band_level(&self, band: u16) -> Result<i16>;

    fn set_band_level(&mut self, band: u16, level: i16) -> Result<()>;
}

/// Equalizer actuator with per-band write suppression
pub struct EqualizerActuator {
    engine: Box<dyn EqualizerEngine>,
    enabled: bool,
    capabilities: DeviceCapabilities,
    /// Last level written (or read back at startup) for each band
    last_applied: Vec<Option<i16>>,
}

impl EqualizerActuator {
    /// Query the device constants and current band levels.
    ///
    /// Fails if the band count or range cannot be read, since nothing
    /// downstream can be computed without them. Unreadable band levels are
    /// left unknown and will simply be written on first apply.
    pub fn new(engine: Box<dyn EqualizerEngine>) -> Result<Self> {
        let band_count = engine.number_of_bands()?;
        let (min_level, max_level) = engine.band_level_range()?;
        let capabilities = DeviceCapabilities::new(band_count, min_level, max_level)?;

        let last_applied = (0..band_count)
            .map(|band| engine.band_level(band).ok())
            .collect();

        Ok(Self {
            engine,
            enabled: false,
            capabilities,
            last_applied,
        })
    }

    pub fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    pub fn band_count(&self) -> u16 {
        self.capabilities.band_count
    }

    pub fn band_range(&self) -> (i16, i16) {
        (self.capabilities.min_level, self.capabilities.max_level)
    }

    /// Last level applied to `band`, if known
    pub fn band_level(&self, band: u16) -> Option<i16> {
        self.last_applied.get(usize::from(band)).copied().flatten()
    }

    /// Check a band index and level against the device constants.
    pub fn validate(&self, band: u16, level: i16) -> Result<()> {
        if band >= self.capabilities.band_count {
            return Err(EffectsError::InvalidBand {
                band,
                band_count: self.capabilities.band_count,
            });
        }
        let (min, max) = self.band_range();
        if level < min || level > max {
            return Err(EffectsError::LevelOutOfRange {
                band,
                level,
                min,
                max,
            });
        }
        Ok(())
    }

    /// Write a single band. Same suppression rules as [`EffectActuator::apply`].
    pub fn set_band(&mut self, band: u16, level: i16) -> Result<bool> {
        self.validate(band, level)?;
        if !self.enabled {
            return Ok(false);
        }
        self.write_band(band, level)
    }

    fn write_band(&mut self, band: u16, level: i16) -> Result<bool> {
        let slot = &mut self.last_applied[usize::from(band)];
        if *slot == Some(level) {
            tracing::debug!("[equalizer] band {} already at {}", band, level);
            return Ok(false);
        }
        self.engine.set_band_level(band, level)?;
        *slot = Some(level);
        Ok(true)
    }
}

impl EffectActuator for EqualizerActuator {
    type Params = [i16];

    impl_actuator_common!("equalizer");

    fn apply(&mut self, levels: &[i16]) -> Result<bool> {
        if levels.len() > usize::from(self.capabilities.band_count) {
            return Err(EffectsError::InvalidBand {
                band: self.capabilities.band_count,
                band_count: self.capabilities.band_count,
            });
        }
        for (band, &level) in levels.iter().enumerate() {
            self.validate(band as u16, level)?;
        }
        if !self.enabled {
            return Ok(false);
        }

        let mut wrote = false;
        for (band, &level) in levels.iter().enumerate() {
            wrote |= self.write_band(band as u16, level)?;
        }
        Ok(wrote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEqualizer;

    fn enabled_eq(mock: &MockEqualizer) -> EqualizerActuator {
        let mut eq = EqualizerActuator::new(Box::new(mock.clone())).unwrap();
        eq.enable().unwrap();
        eq
    }

    #[test]
    fn test_capabilities_cached_at_startup() {
        let mock = MockEqualizer::new(5, -1500, 1500);
        let eq = EqualizerActuator::new(Box::new(mock.clone())).unwrap();
        assert_eq!(eq.band_count(), 5);
        assert_eq!(eq.band_range(), (-1500, 1500));
        assert_eq!(eq.band_level(0), Some(0));
        assert_eq!(eq.band_level(5), None);
    }

    #[test]
    fn test_enable_is_idempotent() {
        let mock = MockEqualizer::new(5, -1500, 1500);
        let mut eq = EqualizerActuator::new(Box::new(mock.clone())).unwrap();
        assert!(eq.enable().unwrap());
        assert!(!eq.enable().unwrap());
        assert_eq!(mock.enable_calls(), 1);

        assert!(eq.disable().unwrap());
        assert!(!eq.disable().unwrap());
        assert_eq!(mock.enable_calls(), 2);
    }

    #[test]
    fn test_apply_diffs_per_band() {
        let mock = MockEqualizer::new(3, -1500, 1500);
        let mut eq = enabled_eq(&mock);

        assert!(eq.apply(&[100, 0, 300]).unwrap());
        // band 1 already at 0 from the startup read
        assert_eq!(mock.band_writes(), 2);

        assert!(!eq.apply(&[100, 0, 300]).unwrap());
        assert_eq!(mock.band_writes(), 2);

        assert!(eq.apply(&[100, 50, 300]).unwrap());
        assert_eq!(mock.band_writes(), 3);
        assert_eq!(mock.level(1), 50);
    }

    #[test]
    fn test_disabled_stage_ignores_writes() {
        let mock = MockEqualizer::new(3, -1500, 1500);
        let mut eq = EqualizerActuator::new(Box::new(mock.clone())).unwrap();
        assert!(!eq.apply(&[100, 200, 300]).unwrap());
        assert!(!eq.set_band(0, 100).unwrap());
        assert_eq!(mock.band_writes(), 0);
    }

    #[test]
    fn test_set_band_validates() {
        let mock = MockEqualizer::new(3, -1500, 1500);
        let mut eq = enabled_eq(&mock);

        let err = eq.set_band(3, 0).unwrap_err();
        assert!(matches!(err, EffectsError::InvalidBand { band: 3, band_count: 3 }));

        let err = eq.set_band(1, 1501).unwrap_err();
        assert!(matches!(err, EffectsError::LevelOutOfRange { level: 1501, .. }));

        assert_eq!(mock.band_writes(), 0);
    }

    #[test]
    fn test_apply_rejects_too_many_bands() {
        let mock = MockEqualizer::new(2, -1500, 1500);
        let mut eq = enabled_eq(&mock);
        assert!(eq.apply(&[0, 0, 0]).is_err());
        assert_eq!(mock.band_writes(), 0);
    }

    #[test]
    fn test_failed_write_keeps_cache_unknown() {
        let mock = MockEqualizer::new(2, -1500, 1500);
        let mut eq = enabled_eq(&mock);

        mock.set_available(false);
        assert!(eq.apply(&[700, 700]).is_err());
        assert_eq!(eq.band_level(0), Some(0));

        mock.set_available(true);
        assert!(eq.apply(&[700, 700]).unwrap());
        assert_eq!(mock.band_writes(), 2);
    }

    #[test]
    fn test_unreadable_capabilities_fail_construction() {
        let mock = MockEqualizer::new(2, -1500, 1500);
        mock.set_available(false);
        assert!(EqualizerActuator::new(Box::new(mock)).is_err());
    }
}
