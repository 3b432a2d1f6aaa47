//! Volume sensing
//!
//! Wraps the platform volume query for the fixed music stream and turns it
//! into a normalized 0-100 level.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EffectsError, Result};

/// Normalized output volume, `current * 100 / max`, in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeLevel(u8);

impl VolumeLevel {
    pub const MIN: VolumeLevel = VolumeLevel(0);
    pub const MAX: VolumeLevel = VolumeLevel(100);

    /// Create a level, saturating anything above 100.
    pub fn new(percent: u8) -> Self {
        VolumeLevel(percent.min(100))
    }

    /// Floor of `current * 100 / max`.
    ///
    /// A current volume above the reported maximum saturates to 100.
    pub fn from_stream(current: u32, max: u32) -> Result<Self> {
        if max == 0 {
            return Err(EffectsError::sensor("stream reports a maximum volume of 0"));
        }
        let percent = (u64::from(current) * 100 / u64::from(max)).min(100);
        Ok(VolumeLevel(percent as u8))
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// Level as a fraction in `[0.0, 1.0]`.
    pub fn fraction(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl fmt::Display for VolumeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Platform volume query for the single logical output stream.
pub trait VolumeSource: Send {
    /// Current stream volume in platform steps
    fn stream_volume(&self) -> Result<u32>;

    /// Maximum stream volume in platform steps
    fn stream_max_volume(&self) -> Result<u32>;
}

/// Reads the normalized level, failing closed to the last good reading.
pub struct VolumeSensor {
    source: Box<dyn VolumeSource>,
    last_known: VolumeLevel,
}

impl VolumeSensor {
    pub fn new(source: Box<dyn VolumeSource>) -> Self {
        Self {
            source,
            last_known: VolumeLevel::MIN,
        }
    }

    /// Query the platform, propagating failures.
    pub fn try_level(&self) -> Result<VolumeLevel> {
        let current = self.source.stream_volume()?;
        let max = self.source.stream_max_volume()?;
        VolumeLevel::from_stream(current, max)
    }

    /// Current level, or the last good reading (initially 0) if the
    /// platform query fails. Never returns an error.
    pub fn current_level(&mut self) -> VolumeLevel {
        match self.try_level() {
            Ok(level) => {
                self.last_known = level;
                level
            }
            Err(e) => {
                tracing::warn!(
                    "Volume query failed, keeping last known level {}: {}",
                    self.last_known,
                    e
                );
                self.last_known
            }
        }
    }

    pub fn last_known(&self) -> VolumeLevel {
        self.last_known
    }
}

impl fmt::Debug for VolumeSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VolumeSensor")
            .field("last_known", &self.last_known)
            .finish_non_exhaustive()
    }
}
