//! Error handling for adaptive-fx
//!
//! Three families of failure exist: unavailable sensors, unavailable
//! actuators, and invalid parameters. Only the last one is ever surfaced
//! to callers of the public API as a rejected input; the first two are
//! absorbed by the dynamic-mode loop and retried on the next tick.

use thiserror::Error;

/// Result type alias for adaptive-fx operations
pub type Result<T> = std::result::Result<T, EffectsError>;

/// Main error type for adaptive-fx operations
#[derive(Error, Debug)]
pub enum EffectsError {
    // Parameter Errors
    #[error("Invalid equalizer band {band} (device has {band_count} bands)")]
    InvalidBand { band: u16, band_count: u16 },

    #[error("Band {band} level {level} outside device range [{min}, {max}]")]
    LevelOutOfRange {
        band: u16,
        level: i16,
        min: i16,
        max: i16,
    },

    #[error("{effect} strength {strength} exceeds maximum {max}")]
    StrengthOutOfRange {
        effect: &'static str,
        strength: u16,
        max: u16,
    },

    #[error("Unknown reverb preset: {raw}")]
    InvalidPreset { raw: u16 },

    #[error("Cannot {operation} while dynamic mode is enabled")]
    DynamicModeActive { operation: &'static str },

    // Platform Errors
    #[error("Volume sensor unavailable: {reason}")]
    SensorUnavailable { reason: String },

    #[error("{effect} actuator unavailable: {reason}")]
    ActuatorUnavailable {
        effect: &'static str,
        reason: String,
    },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Failed to start dynamic mode scheduler: {0}")]
    SchedulerSpawn(#[source] std::io::Error),

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EffectsError {
    /// Shorthand for an actuator failure
    pub fn actuator(effect: &'static str, reason: impl Into<String>) -> Self {
        EffectsError::ActuatorUnavailable {
            effect,
            reason: reason.into(),
        }
    }

    /// Shorthand for a sensor failure
    pub fn sensor(reason: impl Into<String>) -> Self {
        EffectsError::SensorUnavailable {
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            EffectsError::InvalidBand { .. } => "INVALID_BAND",
            EffectsError::LevelOutOfRange { .. } => "LEVEL_OUT_OF_RANGE",
            EffectsError::StrengthOutOfRange { .. } => "STRENGTH_OUT_OF_RANGE",
            EffectsError::InvalidPreset { .. } => "INVALID_PRESET",
            EffectsError::DynamicModeActive { .. } => "DYNAMIC_MODE_ACTIVE",
            EffectsError::SensorUnavailable { .. } => "SENSOR_UNAVAILABLE",
            EffectsError::ActuatorUnavailable { .. } => "ACTUATOR_UNAVAILABLE",
            EffectsError::InvalidConfig { .. } => "INVALID_CONFIG",
            EffectsError::SchedulerSpawn(_) => "SCHEDULER_SPAWN",
            EffectsError::Io(_) => "IO_ERROR",
            EffectsError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable by simply trying again later
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EffectsError::SensorUnavailable { .. }
                | EffectsError::ActuatorUnavailable { .. }
                | EffectsError::DynamicModeActive { .. }
        )
    }

    /// Check if this error is a rejected input rather than a platform failure
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(
            self,
            EffectsError::InvalidBand { .. }
                | EffectsError::LevelOutOfRange { .. }
                | EffectsError::StrengthOutOfRange { .. }
                | EffectsError::InvalidPreset { .. }
        )
    }
}
