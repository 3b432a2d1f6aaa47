//! Integration Tests
//!
//! End-to-end tests driving the controller through its public API against
//! the mock platform.

use std::thread;
use std::time::{Duration, Instant};

use adaptive_fx::mock::MockPlatform;
use adaptive_fx::{
    AudioEffectsController, ControllerConfig, DynamicModeState, EffectsError, ReverbPreset,
};

const TICK: Duration = Duration::from_millis(10);

/// Helper to build a controller with a fast tick over the default mock device
fn create_controller(platform: &MockPlatform) -> AudioEffectsController {
    AudioEffectsController::new(
        ControllerConfig::with_interval(TICK),
        platform.volume_source(),
        platform.handles(),
    )
    .unwrap()
}

fn enable_all(controller: &AudioEffectsController) {
    controller.enable_equalizer().unwrap();
    controller.enable_bass_boost().unwrap();
    controller.enable_soft_mode().unwrap();
    controller.enable_virtualizer().unwrap();
}

/// Poll until `condition` holds or five seconds pass
fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

// === Flag-Gated Setters ===

#[test]
fn test_equalizer_setter_requires_enable() {
    let platform = MockPlatform::default();
    let controller = create_controller(&platform);

    assert!(!controller.set_equalization(0, 300).unwrap());
    assert_eq!(platform.equalizer.band_writes(), 0);

    assert!(controller.enable_equalizer().unwrap());
    assert!(!controller.enable_equalizer().unwrap());
    assert_eq!(platform.equalizer.enable_calls(), 1);

    assert!(controller.set_equalization(0, 300).unwrap());
    assert!(!controller.set_equalization(0, 300).unwrap());
    assert_eq!(platform.equalizer.band_writes(), 1);
    assert_eq!(platform.equalizer.level(0), 300);
}

#[test]
fn test_equalizer_rejects_invalid_input() {
    let platform = MockPlatform::default();
    let controller = create_controller(&platform);
    controller.enable_equalizer().unwrap();

    let err = controller.set_equalization(5, 0).unwrap_err();
    assert!(matches!(err, EffectsError::InvalidBand { band: 5, band_count: 5 }));

    let err = controller.set_equalization(0, -1501).unwrap_err();
    assert!(err.is_invalid_parameter());

    assert_eq!(platform.equalizer.band_writes(), 0);
}

#[test]
fn test_bass_boost_setter() {
    let platform = MockPlatform::default();
    let controller = create_controller(&platform);

    assert!(!controller.set_bass_boost_strength(400).unwrap());
    controller.enable_bass_boost().unwrap();
    assert!(controller.set_bass_boost_strength(400).unwrap());
    assert!(!controller.set_bass_boost_strength(400).unwrap());
    assert_eq!(platform.bass_boost.strength_writes(), 1);

    let err = controller.set_bass_boost_strength(1001).unwrap_err();
    assert_eq!(err.error_code(), "STRENGTH_OUT_OF_RANGE");

    assert!(controller.disable_bass_boost().unwrap());
    assert!(!controller.disable_bass_boost().unwrap());
    assert!(!platform.bass_boost.is_enabled());
}

#[test]
fn test_soft_mode_selects_small_room() {
    let platform = MockPlatform::default();
    let controller = create_controller(&platform);

    assert!(controller.enable_soft_mode().unwrap());
    assert!(platform.reverb.is_enabled());
    assert_eq!(platform.reverb.preset(), ReverbPreset::SmallRoom);

    assert!(!controller.enable_soft_mode().unwrap());
    assert_eq!(platform.reverb.preset_writes(), 1);

    assert!(controller.disable_soft_mode().unwrap());
    assert!(!controller.disable_soft_mode().unwrap());
    assert!(!platform.reverb.is_enabled());
}

#[test]
fn test_virtualizer_setter() {
    let platform = MockPlatform::default();
    let controller = create_controller(&platform);
    controller.enable_virtualizer().unwrap();

    assert!(controller.set_virtualizer_strength(1500).unwrap());
    assert!(controller.set_virtualizer_strength(1501).is_err());
    assert_eq!(platform.virtualizer.strength(), 1500);
}

#[test]
fn test_enable_failure_leaves_flag_clear() {
    let platform = MockPlatform::default();
    let controller = create_controller(&platform);
    platform.bass_boost.set_available(false);

    let err = controller.enable_bass_boost().unwrap_err();
    assert!(err.is_recoverable());
    assert!(!controller.snapshot().bass_boost_enabled);

    platform.bass_boost.set_available(true);
    assert!(controller.enable_bass_boost().unwrap());
}

// === Dynamic Mode ===

#[test]
fn test_dynamic_mode_follows_volume() {
    let platform = MockPlatform::default();
    let controller = create_controller(&platform);
    enable_all(&controller);
    controller.enable_dynamic_mode().unwrap();

    // 15-step stream: 0 -> level 0
    assert!(wait_for(|| platform.bass_boost.strength() == 1000));
    assert_eq!(platform.virtualizer.strength(), 800);
    assert_eq!(platform.reverb.preset(), ReverbPreset::SmallRoom);

    // 15/15 -> level 100
    platform.volume.set_volume(15);
    assert!(wait_for(|| platform.bass_boost.strength() == 500));
    assert!(wait_for(|| platform.virtualizer.strength() == 1000));
    assert_eq!(platform.reverb.preset(), ReverbPreset::LargeRoom);
    assert!(platform.equalizer.levels().iter().all(|&l| l == 1500));

    controller.shutdown();
}

#[test]
fn test_static_volume_writes_once() {
    let platform = MockPlatform::default();
    platform.volume.set_volume(7);
    let controller = create_controller(&platform);
    enable_all(&controller);
    controller.enable_dynamic_mode().unwrap();

    assert!(wait_for(|| controller.status().ticks >= 10));
    let writes = platform.write_counts();
    assert_eq!(writes.bass_boost_writes, 1);
    assert_eq!(writes.virtualizer_writes, 1);
    assert_eq!(controller.status().applies, 1);

    controller.shutdown();
}

#[test]
fn test_double_enable_runs_one_loop() {
    let platform = MockPlatform::default();
    let controller = create_controller(&platform);

    assert!(controller.enable_dynamic_mode().unwrap());
    assert!(!controller.enable_dynamic_mode().unwrap());
    assert_eq!(controller.dynamic_mode_state(), DynamicModeState::Enabled);

    assert!(wait_for(|| controller.status().ticks >= 5));
    assert!(controller.disable_dynamic_mode());
    let ticks = controller.status().ticks;
    thread::sleep(TICK * 5);
    // no orphaned loop keeps ticking
    assert!(controller.status().ticks <= ticks + 1);
}

#[test]
fn test_disable_keeps_last_parameters() {
    let platform = MockPlatform::default();
    platform.volume.set_volume(15);
    let controller = create_controller(&platform);
    enable_all(&controller);
    controller.enable_dynamic_mode().unwrap();
    assert!(wait_for(|| platform.bass_boost.strength() == 500));

    assert!(controller.disable_dynamic_mode());
    assert!(!controller.disable_dynamic_mode());
    let writes_at_disable = platform.total_writes();

    platform.volume.set_volume(0);
    thread::sleep(TICK * 5);

    assert_eq!(platform.total_writes(), writes_at_disable);
    assert_eq!(platform.bass_boost.strength(), 500);
    assert_eq!(platform.reverb.preset(), ReverbPreset::LargeRoom);
    assert!(platform.bass_boost.is_enabled());
}

#[test]
fn test_reenable_after_disable() {
    let platform = MockPlatform::default();
    let controller = create_controller(&platform);
    controller.enable_bass_boost().unwrap();

    controller.enable_dynamic_mode().unwrap();
    assert!(wait_for(|| platform.bass_boost.strength() == 1000));
    controller.disable_dynamic_mode();

    platform.volume.set_volume(15);
    controller.enable_dynamic_mode().unwrap();
    assert!(wait_for(|| platform.bass_boost.strength() == 500));
    controller.shutdown();
}

#[test]
fn test_enabling_effect_mid_loop_resyncs() {
    let platform = MockPlatform::default();
    platform.volume.set_volume(6);
    let controller = create_controller(&platform);
    controller.enable_dynamic_mode().unwrap();
    assert!(wait_for(|| controller.status().ticks >= 3));
    assert_eq!(platform.virtualizer.strength_writes(), 0);

    // volume has not moved, but the newly enabled stage must catch up
    controller.enable_virtualizer().unwrap();
    assert!(wait_for(|| platform.virtualizer.strength() == 880));

    controller.shutdown();
}

#[test]
fn test_sensor_failure_keeps_loop_alive() {
    let platform = MockPlatform::default();
    platform.volume.set_volume(15);
    let controller = create_controller(&platform);
    controller.enable_bass_boost().unwrap();
    controller.enable_dynamic_mode().unwrap();
    assert!(wait_for(|| platform.bass_boost.strength() == 500));

    platform.volume.set_available(false);
    let ticks = controller.status().ticks;
    assert!(wait_for(|| controller.status().ticks >= ticks + 3));
    // fails closed to the last reading, so nothing changes
    assert_eq!(platform.bass_boost.strength(), 500);
    assert!(controller.is_dynamic_mode_enabled());

    platform.volume.set_available(true);
    platform.volume.set_volume(0);
    assert!(wait_for(|| platform.bass_boost.strength() == 1000));
    controller.shutdown();
}

#[test]
fn test_actuator_failure_isolated() {
    let platform = MockPlatform::default();
    let controller = create_controller(&platform);
    enable_all(&controller);
    platform.reverb.set_available(false);
    platform.volume.set_volume(15);

    controller.enable_dynamic_mode().unwrap();
    assert!(wait_for(|| platform.bass_boost.strength() == 500));
    assert!(wait_for(|| platform.equalizer.levels().iter().all(|&l| l == 1500)));
    assert_eq!(platform.reverb.preset(), ReverbPreset::SmallRoom);

    // recovers on a later tick without a volume change
    platform.reverb.set_available(true);
    assert!(wait_for(|| platform.reverb.preset() == ReverbPreset::LargeRoom));
    controller.shutdown();
}

#[test]
fn test_setters_resume_after_dynamic_mode() {
    let platform = MockPlatform::default();
    let controller = create_controller(&platform);
    controller.enable_bass_boost().unwrap();
    controller.enable_dynamic_mode().unwrap();

    let err = controller.set_bass_boost_strength(200).unwrap_err();
    assert!(matches!(err, EffectsError::DynamicModeActive { .. }));

    assert!(wait_for(|| platform.bass_boost.strength() == 1000));
    controller.disable_dynamic_mode();
    assert!(controller.set_bass_boost_strength(200).unwrap());
    assert_eq!(platform.bass_boost.strength(), 200);
}

#[test]
fn test_reverb_hysteresis_from_config() {
    let platform = MockPlatform::new(100, 5, -1500, 1500);
    let config = ControllerConfig {
        reverb_hysteresis: 3,
        ..ControllerConfig::with_interval(TICK)
    };
    let controller =
        AudioEffectsController::new(config, platform.volume_source(), platform.handles()).unwrap();
    controller.enable_soft_mode().unwrap();
    controller.enable_bass_boost().unwrap();

    platform.volume.set_volume(40);
    controller.enable_dynamic_mode().unwrap();
    assert!(wait_for(|| platform.reverb.preset() == ReverbPreset::MediumRoom));

    // just under the threshold: held by the hysteresis band
    platform.volume.set_volume(31);
    assert!(wait_for(|| platform.bass_boost.strength() == 845));
    assert_eq!(platform.reverb.preset(), ReverbPreset::MediumRoom);

    platform.volume.set_volume(29);
    assert!(wait_for(|| platform.reverb.preset() == ReverbPreset::SmallRoom));
    controller.shutdown();
}

#[test]
fn test_invalid_config_rejected() {
    let platform = MockPlatform::default();
    let config = ControllerConfig {
        tick_interval_ms: 0,
        ..ControllerConfig::default()
    };
    let result = AudioEffectsController::new(config, platform.volume_source(), platform.handles());
    assert!(matches!(result, Err(EffectsError::InvalidConfig { .. })));
}
