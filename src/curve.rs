//! Response curves
//!
//! Maps a normalized volume level onto target parameters for each effect
//! stage. Everything here is pure: the same level and device constants
//! always give the same targets, and every value is clamped into the
//! device's legal range before it leaves this module.
//!
//! The shape follows loudness compensation: at low listening levels the
//! low end is lifted relative to the highs and bass boost is strongest,
//! while the room size and stereo width grow as volume rises.

use serde::{Deserialize, Serialize};

use crate::effects::{ReverbPreset, MAX_BASS_BOOST_STRENGTH, MAX_VIRTUALIZER_STRENGTH};
use crate::error::{EffectsError, Result};
use crate::sensor::VolumeLevel;

/// Gain multiplier for the lower half of the bands
pub const LOW_BAND_FACTOR: f64 = 1.1;

/// Gain multiplier for the mid/high half of the bands
pub const MID_HIGH_BAND_FACTOR: f64 = 1.2;

/// Volume adjustment at level 0
const VOLUME_ADJUSTMENT_FLOOR: f64 = 0.85;

/// Volume adjustment gained between level 0 and level 100
const VOLUME_ADJUSTMENT_SPAN: f64 = 0.6;

/// Levels below this select a small room
pub const SMALL_ROOM_CEILING: u8 = 33;

/// Levels at or above this select a large room
pub const LARGE_ROOM_FLOOR: u8 = 66;

const BASS_BOOST_BASE: i32 = 1000;
const BASS_BOOST_SLOPE: i32 = 5;
const VIRTUALIZER_BASE: i32 = 800;
const VIRTUALIZER_SLOPE: i32 = 2;

/// Equalizer constants reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub band_count: u16,
    pub min_level: i16,
    pub max_level: i16,
}

impl DeviceCapabilities {
    pub fn new(band_count: u16, min_level: i16, max_level: i16) -> Result<Self> {
        if min_level > max_level {
            return Err(EffectsError::actuator(
                "equalizer",
                format!("inverted band level range [{}, {}]", min_level, max_level),
            ));
        }
        Ok(Self {
            band_count,
            min_level,
            max_level,
        })
    }

    fn span(&self) -> f64 {
        f64::from(self.max_level) - f64::from(self.min_level)
    }
}

/// Parameters for every stage at one volume level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectTargets {
    pub level: VolumeLevel,
    pub band_levels: Vec<i16>,
    pub bass_boost_strength: u16,
    pub reverb_preset: ReverbPreset,
    pub virtualizer_strength: u16,
}

/// `0.85` at level 0 rising linearly to `1.45` at level 100
pub fn volume_adjustment(level: VolumeLevel) -> f64 {
    VOLUME_ADJUSTMENT_FLOOR + level.fraction() * VOLUME_ADJUSTMENT_SPAN
}

/// Target level for one equalizer band.
///
/// Truncated toward zero into the device's integer unit.
pub fn band_level(band: u16, level: VolumeLevel, caps: DeviceCapabilities) -> i16 {
    let factor = if band < caps.band_count / 2 {
        LOW_BAND_FACTOR
    } else {
        MID_HIGH_BAND_FACTOR
    };
    let min = f64::from(caps.min_level);
    let max = f64::from(caps.max_level);
    let target = min + factor * volume_adjustment(level) * caps.span();
    target.clamp(min, max) as i16
}

pub fn band_levels(level: VolumeLevel, caps: DeviceCapabilities) -> Vec<i16> {
    (0..caps.band_count)
        .map(|band| band_level(band, level, caps))
        .collect()
}

/// `1000 - 5v`: strongest at low volume, halved at full volume
pub fn bass_boost_strength(level: VolumeLevel) -> u16 {
    let strength = BASS_BOOST_BASE - i32::from(level.percent()) * BASS_BOOST_SLOPE;
    strength.clamp(0, i32::from(MAX_BASS_BOOST_STRENGTH)) as u16
}

/// Three-bucket step function with no smoothing
pub fn reverb_preset(level: VolumeLevel) -> ReverbPreset {
    match level.percent() {
        v if v < SMALL_ROOM_CEILING => ReverbPreset::SmallRoom,
        v if v < LARGE_ROOM_FLOOR => ReverbPreset::MediumRoom,
        _ => ReverbPreset::LargeRoom,
    }
}

/// Step function that holds `previous` until the level has moved more
/// than `band` points past the threshold it would otherwise cross.
///
/// With `band == 0` or no previous preset this is [`reverb_preset`].
pub fn reverb_preset_with_hysteresis(
    level: VolumeLevel,
    previous: Option<ReverbPreset>,
    band: u8,
) -> ReverbPreset {
    let plain = reverb_preset(level);
    let previous = match previous {
        Some(previous) if band > 0 && previous != plain => previous,
        _ => return plain,
    };

    let v = u16::from(level.percent());
    let band = u16::from(band);
    let small_ceiling = u16::from(SMALL_ROOM_CEILING);
    let large_floor = u16::from(LARGE_ROOM_FLOOR);

    let hold = match previous {
        ReverbPreset::SmallRoom => v < small_ceiling + band,
        ReverbPreset::MediumRoom => v + band >= small_ceiling && v < large_floor + band,
        ReverbPreset::LargeRoom => v + band >= large_floor,
        _ => false,
    };
    if hold {
        previous
    } else {
        plain
    }
}

/// `800 + 2v`, capped at the device maximum
pub fn virtualizer_strength(level: VolumeLevel) -> u16 {
    let strength = VIRTUALIZER_BASE + i32::from(level.percent()) * VIRTUALIZER_SLOPE;
    strength.clamp(0, i32::from(MAX_VIRTUALIZER_STRENGTH)) as u16
}

/// Make-up gain for hosts that drive an output gain stage.
///
/// Twice a fifth of the level span at level 0, falling to a fifth of it at
/// level 100, limited to the device range. Not written by the loop.
pub fn output_gain(level: VolumeLevel, caps: DeviceCapabilities) -> i16 {
    let gain_factor = 1.0 + (1.0 - level.fraction());
    let gain = (gain_factor * caps.span() / 5.0) as i32;
    gain.clamp(i32::from(caps.min_level), i32::from(caps.max_level)) as i16
}

/// The full curve family, with the optional reverb hysteresis band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseCurve {
    reverb_hysteresis: u8,
}

impl ResponseCurve {
    pub fn new(reverb_hysteresis: u8) -> Self {
        Self { reverb_hysteresis }
    }

    pub fn reverb_hysteresis(&self) -> u8 {
        self.reverb_hysteresis
    }

    /// Targets for `level` with no reverb history
    pub fn compute(&self, level: VolumeLevel, caps: DeviceCapabilities) -> EffectTargets {
        self.compute_after(level, caps, None)
    }

    /// Targets for `level` given the reverb preset chosen on the last apply
    pub fn compute_after(
        &self,
        level: VolumeLevel,
        caps: DeviceCapabilities,
        previous_reverb: Option<ReverbPreset>,
    ) -> EffectTargets {
        EffectTargets {
            level,
            band_levels: band_levels(level, caps),
            bass_boost_strength: bass_boost_strength(level),
            reverb_preset: reverb_preset_with_hysteresis(
                level,
                previous_reverb,
                self.reverb_hysteresis,
            ),
            virtualizer_strength: virtualizer_strength(level),
        }
    }
}
