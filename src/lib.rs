//! Adaptive FX - Volume-Reactive Loudness Compensation
//!
//! Continuously samples the output volume and maps it onto a coordinated
//! set of platform audio-effect parameters, so the perceived tonal balance
//! stays pleasant as the volume changes.
//!
//! # Architecture
//!
//! - [`sensor`]: normalized 0-100 volume level from the platform stream
//! - [`effects`]: equalizer, bass boost, reverb and virtualizer actuators,
//!   each suppressing redundant driver writes
//! - [`curve`]: pure mapping from volume level to effect targets
//! - [`controller`]: public API and the dynamic mode loop
//!
//! No audio is processed here; the effect engines downstream do that.

pub mod cli;
pub mod config;
pub mod controller;
pub mod curve;
pub mod effects;
pub mod error;
pub mod mock;
pub mod scheduler;
pub mod sensor;
pub mod service;

pub use config::ControllerConfig;
pub use controller::{AudioEffectsController, DynamicModeState, DynamicModeStatus, DynamicModeTask};
pub use curve::{DeviceCapabilities, EffectTargets, ResponseCurve};
pub use effects::{EffectActuator, EffectHandles, ReverbPreset};
pub use error::{EffectsError, Result};
pub use sensor::{VolumeLevel, VolumeSensor, VolumeSource};
pub use service::AudioEffectService;
