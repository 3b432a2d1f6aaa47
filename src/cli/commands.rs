//! CLI Command Implementations

use std::path::Path;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::config::ControllerConfig;
use crate::controller::{AudioEffectsController, DynamicModeStatus};
use crate::curve::{output_gain, DeviceCapabilities, EffectTargets, ResponseCurve};
use crate::effects::RackSnapshot;
use crate::error::{EffectsError, Result};
use crate::mock::{MockPlatform, WriteCounts};
use crate::sensor::VolumeLevel;

use super::DeviceArgs;

/// One row of the curve table
#[derive(Debug, Clone, Serialize)]
pub struct CurveRow {
    #[serde(flatten)]
    pub targets: EffectTargets,
    pub output_gain: i16,
}

/// One volume step of a simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationStep {
    pub level: VolumeLevel,
    pub effects: RackSnapshot,
}

/// Result of a simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub steps: Vec<SimulationStep>,
    pub writes: WriteCounts,
    pub status: DynamicModeStatus,
}

fn capabilities(device: DeviceArgs) -> Result<DeviceCapabilities> {
    DeviceCapabilities::new(device.bands, device.min_level, device.max_level)
}

/// Volume levels from `from` to `to` (either direction) in `step` increments,
/// always ending exactly on `to`.
pub fn ramp(from: u8, to: u8, step: u8) -> Result<Vec<VolumeLevel>> {
    if step == 0 {
        return Err(EffectsError::InvalidConfig {
            reason: "step must be greater than zero".to_string(),
        });
    }
    let (from, to) = (from.min(100), to.min(100));
    let mut levels = Vec::new();
    let mut current = i16::from(from);
    let target = i16::from(to);
    let delta = if to >= from { i16::from(step) } else { -i16::from(step) };
    while (delta > 0 && current < target) || (delta < 0 && current > target) {
        levels.push(VolumeLevel::new(current as u8));
        current += delta;
    }
    levels.push(VolumeLevel::new(to));
    Ok(levels)
}

/// Compute the curve table for a device profile
pub fn curve_table(device: DeviceArgs, step: u8, hysteresis: u8) -> Result<Vec<CurveRow>> {
    let caps = capabilities(device)?;
    let curve = ResponseCurve::new(hysteresis);
    let mut previous = None;
    let rows = ramp(0, 100, step)?
        .into_iter()
        .map(|level| {
            let targets = curve.compute_after(level, caps, previous);
            previous = Some(targets.reverb_preset);
            CurveRow {
                output_gain: output_gain(level, caps),
                targets,
            }
        })
        .collect();
    Ok(rows)
}

/// Print the response curves
pub fn curve(device: DeviceArgs, step: u8, hysteresis: u8, json: bool) -> Result<()> {
    let rows = curve_table(device, step, hysteresis)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:>6}  {:>6}  {:>12}  {:>11}  {:>6}  bands",
        "volume", "bass", "reverb", "virtualizer", "gain"
    );
    for row in rows {
        let bands: Vec<String> = row
            .targets
            .band_levels
            .iter()
            .map(|level| level.to_string())
            .collect();
        println!(
            "{:>6}  {:>6}  {:>12}  {:>11}  {:>6}  [{}]",
            row.targets.level.to_string(),
            row.targets.bass_boost_strength,
            row.targets.reverb_preset.to_string(),
            row.targets.virtualizer_strength,
            row.output_gain,
            bands.join(", ")
        );
    }
    Ok(())
}

/// Run the controller against a mock device while ramping the volume
pub fn run_simulation(
    device: DeviceArgs,
    config: ControllerConfig,
    levels: &[VolumeLevel],
    dwell: Duration,
) -> Result<SimulationReport> {
    // 100 volume steps so a percent maps onto exactly one step
    let platform = MockPlatform::new(100, device.bands, device.min_level, device.max_level);

    let controller =
        AudioEffectsController::new(config, platform.volume_source(), platform.handles())?;
    controller.enable_equalizer()?;
    controller.enable_bass_boost()?;
    controller.enable_soft_mode()?;
    controller.enable_virtualizer()?;
    controller.enable_dynamic_mode()?;

    let mut steps = Vec::with_capacity(levels.len());
    for &level in levels {
        platform.volume.set_volume(u32::from(level.percent()));
        thread::sleep(dwell);
        steps.push(SimulationStep {
            level,
            effects: controller.snapshot(),
        });
    }

    let status = controller.status();
    controller.shutdown();

    Ok(SimulationReport {
        steps,
        writes: platform.write_counts(),
        status,
    })
}

/// Simulate dynamic mode and print what the device received
pub fn simulate(
    device: DeviceArgs,
    config_path: Option<&Path>,
    from: u8,
    to: u8,
    step: u8,
    dwell_ms: u64,
    json: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => {
            info!("Loading controller config: {}", path.display());
            ControllerConfig::from_file(path)?
        }
        None => ControllerConfig::default(),
    };
    let levels = ramp(from, to, step)?;
    info!(
        "Simulating {} volume steps, {} ms each, tick {:?}",
        levels.len(),
        dwell_ms,
        config.tick_interval()
    );

    let report = run_simulation(device, config, &levels, Duration::from_millis(dwell_ms))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for step in &report.steps {
        let fx = &step.effects;
        println!(
            "{:>5}  bass {:>5}  reverb {:>12}  virtualizer {:>5}  bands {:?}",
            step.level.to_string(),
            fmt_option(fx.bass_boost_strength),
            fmt_option(fx.reverb_preset),
            fmt_option(fx.virtualizer_strength),
            fx.band_levels
        );
    }
    println!();
    println!(
        "Driver writes: {} band, {} bass boost, {} reverb, {} virtualizer ({} total)",
        report.writes.band_writes,
        report.writes.bass_boost_writes,
        report.writes.reverb_writes,
        report.writes.virtualizer_writes,
        report.writes.total()
    );
    println!(
        "Ticks: {} ({} applied)",
        report.status.ticks, report.status.applies
    );
    Ok(())
}

fn fmt_option<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
