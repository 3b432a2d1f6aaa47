//! CLI Module
//!
//! Command-line front end for inspecting the response curves and for
//! running the controller against a simulated device.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Adaptive FX - volume-reactive loudness compensation
#[derive(Parser, Debug)]
#[command(name = "adaptive-fx")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Equalizer profile of the device being modelled
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct DeviceArgs {
    /// Number of equalizer bands
    #[arg(long, default_value_t = 5)]
    pub bands: u16,

    /// Lowest band level in millibels
    #[arg(long, default_value_t = -1500, allow_hyphen_values = true)]
    pub min_level: i16,

    /// Highest band level in millibels
    #[arg(long, default_value_t = 1500, allow_hyphen_values = true)]
    pub max_level: i16,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the effect targets across the volume range
    #[command(name = "curve")]
    Curve {
        #[command(flatten)]
        device: DeviceArgs,

        /// Volume step between rows, in percent
        #[arg(short, long, default_value_t = 10)]
        step: u8,

        /// Reverb hysteresis band in volume points (0 = off)
        #[arg(long, default_value_t = 0)]
        hysteresis: u8,
    },

    /// Run dynamic mode against a simulated device while ramping volume
    #[command(name = "simulate")]
    Simulate {
        #[command(flatten)]
        device: DeviceArgs,

        /// Controller configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Starting volume in percent
        #[arg(long, default_value_t = 0)]
        from: u8,

        /// Final volume in percent
        #[arg(long, default_value_t = 100)]
        to: u8,

        /// Volume step in percent
        #[arg(short, long, default_value_t = 10)]
        step: u8,

        /// Time spent at each volume step, in milliseconds
        #[arg(long, default_value_t = 1200)]
        dwell_ms: u64,
    },
}
