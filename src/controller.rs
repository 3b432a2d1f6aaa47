//! Audio effects controller
//!
//! Public surface for the host: flag-gated setters for each effect stage
//! and the dynamic mode state machine.
//!
//! ```text
//!   Disabled --enable_dynamic_mode--> Enabled
//!   Enabled --disable_dynamic_mode--> Disabled
//! ```
//!
//! While enabled, a [`DynamicModeTask`] samples the volume every tick and,
//! when the level moved, pushes freshly computed targets to every stage.
//! The loop is the only writer of effect parameters while it runs; the
//! public setters refuse with [`EffectsError::DynamicModeActive`].

use std::fmt;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ControllerConfig;
use crate::curve::{DeviceCapabilities, ResponseCurve};
use crate::effects::{
    EffectActuator, EffectHandles, EffectRack, RackSnapshot, ReverbPreset,
    MAX_BASS_BOOST_STRENGTH, MAX_VIRTUALIZER_STRENGTH,
};
use crate::error::{EffectsError, Result};
use crate::scheduler::{PeriodicTask, Ticker};
use crate::sensor::{VolumeLevel, VolumeSensor, VolumeSource};

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Dynamic mode states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicModeState {
    #[default]
    Disabled,
    Enabled,
}

impl fmt::Display for DynamicModeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicModeState::Disabled => write!(f, "Disabled"),
            DynamicModeState::Enabled => write!(f, "Enabled"),
        }
    }
}

/// Counters kept by the loop across enable cycles
#[derive(Debug, Clone, Default)]
struct TickStats {
    ticks: u64,
    applies: u64,
    last_level: Option<VolumeLevel>,
    last_applied_at: Option<DateTime<Utc>>,
}

/// Point-in-time view of dynamic mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DynamicModeStatus {
    pub state: DynamicModeState,
    /// Level the curves were last applied for
    pub last_level: Option<VolumeLevel>,
    /// Ticks run since construction
    pub ticks: u64,
    /// Ticks that issued at least one driver write
    pub applies: u64,
    pub last_applied_at: Option<DateTime<Utc>>,
}

/// State shared between the public API and the loop
struct Shared {
    rack: Mutex<EffectRack>,
    sensor: Mutex<VolumeSensor>,
    stats: Mutex<TickStats>,
}

/// One sampling-and-apply loop.
///
/// Holds only the previous-level memo and what it needs to recompute the
/// targets; a new task is built every time dynamic mode is enabled.
pub struct DynamicModeTask {
    shared: Arc<Shared>,
    running: Arc<AtomicBool>,
    curve: ResponseCurve,
    capabilities: DeviceCapabilities,
    last_level: Option<VolumeLevel>,
    last_reverb: Option<ReverbPreset>,
}

impl DynamicModeTask {
    fn new(
        shared: Arc<Shared>,
        running: Arc<AtomicBool>,
        curve: ResponseCurve,
        capabilities: DeviceCapabilities,
    ) -> Self {
        Self {
            shared,
            running,
            curve,
            capabilities,
            last_level: None,
            last_reverb: None,
        }
    }
}

impl PeriodicTask for DynamicModeTask {
    fn tick(&mut self) -> ControlFlow<()> {
        if !self.running.load(Ordering::Acquire) {
            tracing::debug!("[DYNAMIC] disabled since scheduling, ending loop");
            return ControlFlow::Break(());
        }

        let level = lock(&self.shared.sensor).current_level();
        lock(&self.shared.stats).ticks += 1;

        if self.last_level == Some(level) {
            return ControlFlow::Continue(());
        }

        let targets = self
            .curve
            .compute_after(level, self.capabilities, self.last_reverb);
        let report = lock(&self.shared.rack).apply_targets(&targets);

        if !report.failed.contains(&"reverb") {
            self.last_reverb = Some(targets.reverb_preset);
        }
        if report.is_complete() {
            self.last_level = Some(level);
        }

        tracing::debug!(
            "[DYNAMIC] level {} -> bass {} reverb {} virtualizer {} (wrote {:?})",
            level,
            targets.bass_boost_strength,
            targets.reverb_preset,
            targets.virtualizer_strength,
            report.written
        );

        let mut stats = lock(&self.shared.stats);
        stats.last_level = Some(level);
        if !report.written.is_empty() {
            stats.applies += 1;
            stats.last_applied_at = Some(Utc::now());
        }
        ControlFlow::Continue(())
    }

    fn resync(&mut self) {
        self.last_level = None;
    }
}

/// A running dynamic mode loop and its cancellation flag
struct DynamicLoop {
    ticker: Ticker,
    running: Arc<AtomicBool>,
}

impl DynamicLoop {
    fn cancel(&self) {
        self.running.store(false, Ordering::Release);
        self.ticker.stop();
    }
}

/// Controller for the four effect stages and dynamic mode.
///
/// Owns its sensor and effect handles; there is no global instance.
/// Every method takes `&self`, so the controller can be shared behind an
/// `Arc` between the host and other callers.
pub struct AudioEffectsController {
    config: ControllerConfig,
    curve: ResponseCurve,
    capabilities: DeviceCapabilities,
    shared: Arc<Shared>,
    /// `Some` exactly while dynamic mode is enabled. Always locked before
    /// the rack.
    dynamic: Mutex<Option<DynamicLoop>>,
}

impl AudioEffectsController {
    /// Build a controller, reading the device constants once.
    ///
    /// Every stage starts disabled with its device-reported values.
    pub fn new(
        config: ControllerConfig,
        volume: Box<dyn VolumeSource>,
        handles: EffectHandles,
    ) -> Result<Self> {
        config.validate()?;
        let rack = EffectRack::new(handles)?;
        let capabilities = rack.capabilities();

        tracing::info!(
            "Audio effects controller ready: {} bands in [{}, {}], tick {:?}",
            capabilities.band_count,
            capabilities.min_level,
            capabilities.max_level,
            config.tick_interval()
        );

        Ok(Self {
            curve: ResponseCurve::new(config.reverb_hysteresis),
            config,
            capabilities,
            shared: Arc::new(Shared {
                rack: Mutex::new(rack),
                sensor: Mutex::new(VolumeSensor::new(volume)),
                stats: Mutex::new(TickStats::default()),
            }),
            dynamic: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    /// Sample the volume sensor now
    pub fn current_level(&self) -> VolumeLevel {
        lock(&self.shared.sensor).current_level()
    }

    pub fn snapshot(&self) -> RackSnapshot {
        lock(&self.shared.rack).snapshot()
    }

    // ========================================================================
    // Equalizer
    // ========================================================================

    pub fn enable_equalizer(&self) -> Result<bool> {
        self.set_stage_enabled(EffectRack::equalizer_mut, true)
    }

    pub fn disable_equalizer(&self) -> Result<bool> {
        self.set_stage_enabled(EffectRack::equalizer_mut, false)
    }

    /// Set one band. Ignored while the equalizer is disabled.
    pub fn set_equalization(&self, band: u16, level: i16) -> Result<bool> {
        let dynamic = lock(&self.dynamic);
        let mut rack = lock(&self.shared.rack);
        rack.equalizer().validate(band, level)?;
        if dynamic.is_some() {
            return Err(EffectsError::DynamicModeActive {
                operation: "set equalization",
            });
        }
        rack.equalizer_mut().set_band(band, level)
    }

    // ========================================================================
    // Bass boost
    // ========================================================================

    pub fn enable_bass_boost(&self) -> Result<bool> {
        self.set_stage_enabled(EffectRack::bass_boost_mut, true)
    }

    pub fn disable_bass_boost(&self) -> Result<bool> {
        self.set_stage_enabled(EffectRack::bass_boost_mut, false)
    }

    /// Set the bass boost strength in `[0, 1000]`. Ignored while disabled.
    pub fn set_bass_boost_strength(&self, strength: u16) -> Result<bool> {
        check_strength("bass_boost", strength, MAX_BASS_BOOST_STRENGTH)?;
        let dynamic = lock(&self.dynamic);
        if dynamic.is_some() {
            return Err(EffectsError::DynamicModeActive {
                operation: "set bass boost strength",
            });
        }
        lock(&self.shared.rack).bass_boost_mut().apply(&strength)
    }

    // ========================================================================
    // Soft mode (reverb)
    // ========================================================================

    /// Switch the reverb on with the small room preset.
    ///
    /// While dynamic mode runs the preset is left to the loop.
    pub fn enable_soft_mode(&self) -> Result<bool> {
        let dynamic = lock(&self.dynamic);
        let mut rack = lock(&self.shared.rack);
        let reverb = rack.reverb_mut();
        if reverb.is_enabled() {
            return Ok(false);
        }
        if dynamic.is_none() {
            reverb.stage_preset(ReverbPreset::SmallRoom)?;
        }
        reverb.enable()?;
        tracing::info!("Soft mode enabled");
        if let Some(active) = dynamic.as_ref() {
            active.ticker.resync();
        }
        Ok(true)
    }

    pub fn disable_soft_mode(&self) -> Result<bool> {
        self.set_stage_enabled(EffectRack::reverb_mut, false)
    }

    // ========================================================================
    // Virtualizer
    // ========================================================================

    pub fn enable_virtualizer(&self) -> Result<bool> {
        self.set_stage_enabled(EffectRack::virtualizer_mut, true)
    }

    pub fn disable_virtualizer(&self) -> Result<bool> {
        self.set_stage_enabled(EffectRack::virtualizer_mut, false)
    }

    /// Set the virtualizer strength in `[0, 1500]`. Ignored while disabled.
    pub fn set_virtualizer_strength(&self, strength: u16) -> Result<bool> {
        check_strength("virtualizer", strength, MAX_VIRTUALIZER_STRENGTH)?;
        let dynamic = lock(&self.dynamic);
        if dynamic.is_some() {
            return Err(EffectsError::DynamicModeActive {
                operation: "set virtualizer strength",
            });
        }
        lock(&self.shared.rack).virtualizer_mut().apply(&strength)
    }

    // ========================================================================
    // Dynamic mode
    // ========================================================================

    /// Start the sampling loop. Returns `false` if it was already running.
    pub fn enable_dynamic_mode(&self) -> Result<bool> {
        let mut dynamic = lock(&self.dynamic);
        if dynamic.is_some() {
            return Ok(false);
        }

        let running = Arc::new(AtomicBool::new(true));
        let task = DynamicModeTask::new(
            Arc::clone(&self.shared),
            Arc::clone(&running),
            self.curve,
            self.capabilities,
        );
        let ticker = Ticker::spawn(&self.config.worker_name, self.config.tick_interval(), task)?;
        *dynamic = Some(DynamicLoop { ticker, running });

        tracing::info!("Dynamic mode enabled");
        Ok(true)
    }

    /// Stop the sampling loop without waiting for an in-flight tick.
    ///
    /// Parameters already applied stay in place. Returns `false` if the
    /// loop was not running.
    pub fn disable_dynamic_mode(&self) -> bool {
        let Some(active) = lock(&self.dynamic).take() else {
            return false;
        };
        active.cancel();
        tracing::info!("Dynamic mode disabled");
        true
    }

    pub fn is_dynamic_mode_enabled(&self) -> bool {
        lock(&self.dynamic).is_some()
    }

    pub fn dynamic_mode_state(&self) -> DynamicModeState {
        if self.is_dynamic_mode_enabled() {
            DynamicModeState::Enabled
        } else {
            DynamicModeState::Disabled
        }
    }

    pub fn status(&self) -> DynamicModeStatus {
        let state = self.dynamic_mode_state();
        let stats = lock(&self.shared.stats).clone();
        DynamicModeStatus {
            state,
            last_level: stats.last_level,
            ticks: stats.ticks,
            applies: stats.applies,
            last_applied_at: stats.last_applied_at,
        }
    }

    /// Stop dynamic mode and wait for the worker thread to exit.
    pub fn shutdown(self) {
        let active = lock(&self.dynamic).take();
        if let Some(active) = active {
            active.running.store(false, Ordering::Release);
            active.ticker.join();
            tracing::info!("Dynamic mode stopped for shutdown");
        }
    }

    fn set_stage_enabled<A: EffectActuator>(
        &self,
        stage: fn(&mut EffectRack) -> &mut A,
        enable: bool,
    ) -> Result<bool> {
        let dynamic = lock(&self.dynamic);
        let mut rack = lock(&self.shared.rack);
        let actuator = stage(&mut *rack);

        let changed = if enable {
            actuator.enable()?
        } else {
            actuator.disable()?
        };
        if !changed {
            return Ok(false);
        }

        tracing::info!(
            "{} {}",
            actuator.name(),
            if enable { "enabled" } else { "disabled" }
        );
        if enable {
            if let Some(active) = dynamic.as_ref() {
                active.ticker.resync();
            }
        }
        Ok(true)
    }
}

impl Drop for AudioEffectsController {
    fn drop(&mut self) {
        if let Some(active) = lock(&self.dynamic).take() {
            active.cancel();
        }
    }
}

fn check_strength(effect: &'static str, strength: u16, max: u16) -> Result<()> {
    if strength > max {
        return Err(EffectsError::StrengthOutOfRange {
            effect,
            strength,
            max,
        });
    }
    Ok(())
}
