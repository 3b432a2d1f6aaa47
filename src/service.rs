//! Host service glue
//!
//! Brings the controller up the way the system service does at boot: the
//! equalizer is switched on and dynamic mode starts adapting right away.

use crate::config::ControllerConfig;
use crate::controller::AudioEffectsController;
use crate::effects::EffectHandles;
use crate::error::Result;
use crate::sensor::VolumeSource;

/// Lifecycle wrapper owning one controller
pub struct AudioEffectService {
    controller: Option<AudioEffectsController>,
}

impl AudioEffectService {
    /// Build the controller and start it.
    pub fn start(
        config: ControllerConfig,
        volume: Box<dyn VolumeSource>,
        handles: EffectHandles,
    ) -> Result<Self> {
        let controller = AudioEffectsController::new(config, volume, handles)?;
        controller.enable_equalizer()?;
        controller.enable_dynamic_mode()?;
        tracing::info!("Audio effect service started");
        Ok(Self {
            controller: Some(controller),
        })
    }

    /// The running controller, until [`AudioEffectService::stop`] is called
    pub fn controller(&self) -> Option<&AudioEffectsController> {
        self.controller.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_some()
    }

    /// Stop dynamic mode and release the controller. Idempotent.
    pub fn stop(&mut self) {
        if let Some(controller) = self.controller.take() {
            controller.shutdown();
            tracing::info!("Audio effect service stopped");
        }
    }
}

impl Drop for AudioEffectService {
    fn drop(&mut self) {
        self.stop();
    }
}
