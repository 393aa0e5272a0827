// nereus_node/src/scenario/mod.rs

//! A synthetic event producer: noisy gyro samples from a constant-rate body
//! and a piecewise-constant command script. Lets the loop run without hardware.

pub mod prng;

use crate::config::ScenarioConfig;
use anyhow::{ensure, Context};
use nalgebra::{UnitQuaternion, Vector3};
use nereus_core::messages::{AccelCommand, InertialMeasurement, InputEvent};
use prng::SimulationRng;
use rand_distr::{Distribution, Normal};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on `duration_seconds * rate_hz`; one hour at 100 Hz.
pub const MAX_SCENARIO_TICKS: f64 = 360_000.0;

pub struct ScenarioSource {
    config: ScenarioConfig,
    rng: SimulationRng,
    gyro_noise: [Normal<f64>; 3],
}

impl ScenarioSource {
    pub fn new(config: &ScenarioConfig) -> anyhow::Result<Self> {
        ensure!(
            config.rate_hz.is_finite() && config.rate_hz > 0.0,
            "scenario.rate_hz must be positive, got {}",
            config.rate_hz
        );
        ensure!(
            config.duration_seconds.is_finite() && config.duration_seconds >= 0.0,
            "scenario.duration_seconds must be non-negative, got {}",
            config.duration_seconds
        );
        ensure!(
            config.duration_seconds * config.rate_hz <= MAX_SCENARIO_TICKS,
            "scenario of {} s at {} Hz exceeds the limit of {} ticks",
            config.duration_seconds,
            config.rate_hz,
            MAX_SCENARIO_TICKS
        );

        let [sx, sy, sz] = config.gyro_noise_stddev;
        let gyro_noise = [
            Normal::new(0.0, sx).context("invalid gyro noise on x")?,
            Normal::new(0.0, sy).context("invalid gyro noise on y")?,
            Normal::new(0.0, sz).context("invalid gyro noise on z")?,
        ];

        let mut config = config.clone();
        config
            .commands
            .sort_by(|a, b| a.at.total_cmp(&b.at));

        Ok(Self {
            rng: SimulationRng::from_seed(config.seed),
            config,
            gyro_noise,
        })
    }

    /// The full event timeline: one inertial sample and one command per tick,
    /// then `Shutdown`.
    pub fn events(&mut self) -> Vec<InputEvent> {
        let dt = 1.0 / self.config.rate_hz;
        let ticks = (self.config.duration_seconds * self.config.rate_hz).floor() as usize;
        let true_rate = self.config.angular_velocity;
        let step = UnitQuaternion::from_scaled_axis(true_rate * dt);

        let mut orientation = UnitQuaternion::identity();
        let mut events = Vec::with_capacity(2 * (ticks + 1) + 1);
        for k in 0..=ticks {
            let t = k as f64 * dt;
            let noise = Vector3::new(
                self.gyro_noise[0].sample(&mut self.rng.0),
                self.gyro_noise[1].sample(&mut self.rng.0),
                self.gyro_noise[2].sample(&mut self.rng.0),
            );
            events.push(InputEvent::Inertial(InertialMeasurement::new(
                t,
                orientation.into_inner(),
                true_rate + noise,
            )));
            events.push(InputEvent::Command(self.command_at(t)));
            orientation *= step;
        }
        events.push(InputEvent::Shutdown);
        debug!("Scenario produced {} events over {} ticks.", events.len(), ticks + 1);
        events
    }

    /// The scripted command in force at time `t`; zero before the first entry.
    pub fn command_at(&self, t: f64) -> AccelCommand {
        self.config
            .commands
            .iter()
            .take_while(|c| c.at <= t)
            .last()
            .map(|c| AccelCommand::new(t, c.linear, c.angular))
            .unwrap_or_else(|| AccelCommand::zero(t))
    }

    /// Sends the timeline from a producer thread, paced at the scenario rate
    /// when `realtime` is set.
    pub fn spawn(mut self, sender: Sender<InputEvent>) -> JoinHandle<()> {
        let pace = self
            .config
            .realtime
            .then(|| Duration::from_secs_f64(1.0 / self.config.rate_hz));
        let events = self.events();
        thread::spawn(move || {
            for event in events {
                let is_command = matches!(event, InputEvent::Command(_));
                if sender.send(event).is_err() {
                    warn!("Event consumer hung up; stopping the scenario early.");
                    return;
                }
                if let (true, Some(pace)) = (is_command, pace) {
                    thread::sleep(pace);
                }
            }
        })
    }
}
