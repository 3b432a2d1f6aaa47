//! Mock platform implementations for testing
//!
//! In-memory stand-ins for the platform volume query and the four effect
//! engines. Each mock is a cheap cloneable handle over shared state, so a
//! test can hand one clone to the controller and keep another to inspect
//! the driver calls that were made or to inject failures.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::effects::{
    BassBoostEngine, EffectEngine, EffectHandles, EqualizerEngine, ReverbEngine, ReverbPreset,
    VirtualizerEngine,
};
use crate::error::{EffectsError, Result};
use crate::sensor::VolumeSource;

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unavailable(effect: &'static str) -> EffectsError {
    EffectsError::actuator(effect, "mock engine marked unavailable")
}

#[derive(Debug)]
struct VolumeState {
    current: u32,
    max: u32,
    available: bool,
}

/// Mock stream volume
#[derive(Debug, Clone)]
pub struct MockVolume {
    state: Arc<Mutex<VolumeState>>,
}

impl MockVolume {
    pub fn new(current: u32, max: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(VolumeState {
                current,
                max,
                available: true,
            })),
        }
    }

    pub fn set_volume(&self, current: u32) {
        lock(&self.state).current = current;
    }

    pub fn set_max_volume(&self, max: u32) {
        lock(&self.state).max = max;
    }

    /// Make every query fail until re-enabled
    pub fn set_available(&self, available: bool) {
        lock(&self.state).available = available;
    }
}

impl VolumeSource for MockVolume {
    fn stream_volume(&self) -> Result<u32> {
        let state = lock(&self.state);
        if !state.available {
            return Err(EffectsError::sensor("mock volume marked unavailable"));
        }
        Ok(state.current)
    }

    fn stream_max_volume(&self) -> Result<u32> {
        let state = lock(&self.state);
        if !state.available {
            return Err(EffectsError::sensor("mock volume marked unavailable"));
        }
        Ok(state.max)
    }
}

#[derive(Debug)]
struct EqualizerState {
    levels: Vec<i16>,
    range: (i16, i16),
    enabled: bool,
    enable_calls: usize,
    band_writes: usize,
    available: bool,
}

/// Mock equalizer engine, all bands starting at 0 (or `min` if 0 is out of range)
#[derive(Debug, Clone)]
pub struct MockEqualizer {
    state: Arc<Mutex<EqualizerState>>,
}

impl MockEqualizer {
    pub fn new(band_count: u16, min: i16, max: i16) -> Self {
        let initial = 0i16.clamp(min.min(max), max.max(min));
        Self {
            state: Arc::new(Mutex::new(EqualizerState {
                levels: vec![initial; usize::from(band_count)],
                range: (min, max),
                enabled: false,
                enable_calls: 0,
                band_writes: 0,
                available: true,
            })),
        }
    }

    pub fn level(&self, band: u16) -> i16 {
        lock(&self.state).levels[usize::from(band)]
    }

    pub fn levels(&self) -> Vec<i16> {
        lock(&self.state).levels.clone()
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.state).enabled
    }

    /// Number of `set_enabled` calls received
    pub fn enable_calls(&self) -> usize {
        lock(&self.state).enable_calls
    }

    /// Number of `set_band_level` calls received
    pub fn band_writes(&self) -> usize {
        lock(&self.state).band_writes
    }

    pub fn set_available(&self, available: bool) {
        lock(&self.state).available = available;
    }
}

impl EffectEngine for MockEqualizer {
    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.available {
            return Err(unavailable("equalizer"));
        }
        state.enabled = enabled;
        state.enable_calls += 1;
        Ok(())
    }
}

impl EqualizerEngine for MockEqualizer {
    fn number_of_bands(&self) -> Result<u16> {
        let state = lock(&self.state);
        if !state.available {
            return Err(unavailable("equalizer"));
        }
        Ok(state.levels.len() as u16)
    }

    fn band_level_range(&self) -> Result<(i16, i16)> {
        let state = lock(&self.state);
        if !state.available {
            return Err(unavailable("equalizer"));
        }
        Ok(state.range)
    }

    fn band_level(&self, band: u16) -> Result<i16> {
        let state = lock(&self.state);
        if !state.available {
            return Err(unavailable("equalizer"));
        }
        state
            .levels
            .get(usize::from(band))
            .copied()
            .ok_or_else(|| unavailable("equalizer"))
    }

    fn set_band_level(&mut self, band: u16, level: i16) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.available {
            return Err(unavailable("equalizer"));
        }
        let slot = state
            .levels
            .get_mut(usize::from(band))
            .ok_or_else(|| unavailable("equalizer"))?;
        *slot = level;
        state.band_writes += 1;
        Ok(())
    }
}

#[derive(Debug)]
struct StrengthState {
    strength: u16,
    enabled: bool,
    enable_calls: usize,
    strength_writes: usize,
    available: bool,
}

/// Mock strength-driven engine, usable as bass boost or virtualizer
#[derive(Debug, Clone)]
pub struct MockStrengthEngine {
    state: Arc<Mutex<StrengthState>>,
}

impl MockStrengthEngine {
    pub fn new(strength: u16) -> Self {
        Self {
            state: Arc::new(Mutex::new(StrengthState {
                strength,
                enabled: false,
                enable_calls: 0,
                strength_writes: 0,
                available: true,
            })),
        }
    }

    pub fn strength(&self) -> u16 {
        lock(&self.state).strength
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.state).enabled
    }

    pub fn enable_calls(&self) -> usize {
        lock(&self.state).enable_calls
    }

    pub fn strength_writes(&self) -> usize {
        lock(&self.state).strength_writes
    }

    pub fn set_available(&self, available: bool) {
        lock(&self.state).available = available;
    }

    fn read(&self) -> Result<u16> {
        let state = lock(&self.state);
        if !state.available {
            return Err(unavailable("strength"));
        }
        Ok(state.strength)
    }

    fn write(&self, strength: u16) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.available {
            return Err(unavailable("strength"));
        }
        state.strength = strength;
        state.strength_writes += 1;
        Ok(())
    }
}

impl EffectEngine for MockStrengthEngine {
    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.available {
            return Err(unavailable("strength"));
        }
        state.enabled = enabled;
        state.enable_calls += 1;
        Ok(())
    }
}

impl BassBoostEngine for MockStrengthEngine {
    fn rounded_strength(&self) -> Result<u16> {
        self.read()
    }

    fn set_strength(&mut self, strength: u16) -> Result<()> {
        self.write(strength)
    }
}

impl VirtualizerEngine for MockStrengthEngine {
    fn rounded_strength(&self) -> Result<u16> {
        self.read()
    }

    fn set_strength(&mut self, strength: u16) -> Result<()> {
        self.write(strength)
    }
}

#[derive(Debug)]
struct ReverbState {
    preset: ReverbPreset,
    enabled: bool,
    enable_calls: usize,
    preset_writes: usize,
    available: bool,
}

/// Mock preset reverb engine
#[derive(Debug, Clone)]
pub struct MockReverb {
    state: Arc<Mutex<ReverbState>>,
}

impl MockReverb {
    pub fn new(preset: ReverbPreset) -> Self {
        Self {
            state: Arc::new(Mutex::new(ReverbState {
                preset,
                enabled: false,
                enable_calls: 0,
                preset_writes: 0,
                available: true,
            })),
        }
    }

    pub fn preset(&self) -> ReverbPreset {
        lock(&self.state).preset
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.state).enabled
    }

    pub fn enable_calls(&self) -> usize {
        lock(&self.state).enable_calls
    }

    pub fn preset_writes(&self) -> usize {
        lock(&self.state).preset_writes
    }

    pub fn set_available(&self, available: bool) {
        lock(&self.state).available = available;
    }
}

impl EffectEngine for MockReverb {
    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.available {
            return Err(unavailable("reverb"));
        }
        state.enabled = enabled;
        state.enable_calls += 1;
        Ok(())
    }
}

impl ReverbEngine for MockReverb {
    fn preset(&self) -> Result<ReverbPreset> {
        let state = lock(&self.state);
        if !state.available {
            return Err(unavailable("reverb"));
        }
        Ok(state.preset)
    }

    fn set_preset(&mut self, preset: ReverbPreset) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.available {
            return Err(unavailable("reverb"));
        }
        state.preset = preset;
        state.preset_writes += 1;
        Ok(())
    }
}

/// Driver write counters across the whole mock platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteCounts {
    pub band_writes: usize,
    pub bass_boost_writes: usize,
    pub reverb_writes: usize,
    pub virtualizer_writes: usize,
}

impl WriteCounts {
    pub fn total(&self) -> usize {
        self.band_writes + self.bass_boost_writes + self.reverb_writes + self.virtualizer_writes
    }
}

/// A complete mock device: volume stream plus the four effect engines
#[derive(Debug, Clone)]
pub struct MockPlatform {
    pub volume: MockVolume,
    pub equalizer: MockEqualizer,
    pub bass_boost: MockStrengthEngine,
    pub reverb: MockReverb,
    pub virtualizer: MockStrengthEngine,
}

impl Default for MockPlatform {
    /// 15-step music stream, 5-band equalizer over ±15 dB
    fn default() -> Self {
        Self::new(15, 5, -1500, 1500)
    }
}

impl MockPlatform {
    pub fn new(max_volume: u32, band_count: u16, min_level: i16, max_level: i16) -> Self {
        Self {
            volume: MockVolume::new(0, max_volume),
            equalizer: MockEqualizer::new(band_count, min_level, max_level),
            bass_boost: MockStrengthEngine::new(0),
            reverb: MockReverb::new(ReverbPreset::None),
            virtualizer: MockStrengthEngine::new(0),
        }
    }

    pub fn volume_source(&self) -> Box<dyn VolumeSource> {
        Box::new(self.volume.clone())
    }

    pub fn handles(&self) -> EffectHandles {
        EffectHandles {
            equalizer: Box::new(self.equalizer.clone()),
            bass_boost: Box::new(self.bass_boost.clone()),
            reverb: Box::new(self.reverb.clone()),
            virtualizer: Box::new(self.virtualizer.clone()),
        }
    }

    pub fn write_counts(&self) -> WriteCounts {
        WriteCounts {
            band_writes: self.equalizer.band_writes(),
            bass_boost_writes: self.bass_boost.strength_writes(),
            reverb_writes: self.reverb.preset_writes(),
            virtualizer_writes: self.virtualizer.strength_writes(),
        }
    }

    pub fn total_writes(&self) -> usize {
        self.write_counts().total()
    }
}
