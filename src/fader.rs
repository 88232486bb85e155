//! Temperature fader: maps the hottest of a group of sensors onto a PWM output.
//!
//! Temperatures at or below `min_fade_temp` drive the output to
//! `min_fade_pwm`, temperatures at or above `max_fade_temp` drive it to
//! `max_fade_pwm`, and everything in between is linearly interpolated. How
//! often the sensors are sampled depends on which of those three regimes the
//! last reading fell into.

use std::sync::Arc;

use anyhow::{Result, bail};
use log::{debug, warn};
use serde::Serialize;

use crate::{
    sensors::{SensorHandle, SensorSource},
    switches::{Actuator, SwitchHandle},
};

pub const DEFAULT_MIN_FADE_TEMP: f32 = 50.0;
pub const DEFAULT_MAX_FADE_TEMP: f32 = 150.0;
pub const DEFAULT_MIN_FADE_PWM: u8 = 0;
pub const DEFAULT_MAX_FADE_PWM: u8 = 255;
pub const DEFAULT_HEATUP_POLL: u16 = 15;
pub const DEFAULT_COOLDOWN_POLL: u16 = 60;
pub const DEFAULT_FADING_POLL: u16 = 1;

/// Transfer function and polling cadence of one fader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaderSettings {
    pub min_fade_temp: f32,
    pub max_fade_temp: f32,
    pub min_fade_pwm: u8,
    pub max_fade_pwm: u8,
    /// Ticks between samples while below the fade range.
    pub heatup_poll: u16,
    /// Ticks between samples while at or above the fade range.
    pub cooldown_poll: u16,
    /// Ticks between samples while inside the fade range.
    pub fading_poll: u16,
}

impl Default for FaderSettings {
    fn default() -> Self {
        Self {
            min_fade_temp: DEFAULT_MIN_FADE_TEMP,
            max_fade_temp: DEFAULT_MAX_FADE_TEMP,
            min_fade_pwm: DEFAULT_MIN_FADE_PWM,
            max_fade_pwm: DEFAULT_MAX_FADE_PWM,
            heatup_poll: DEFAULT_HEATUP_POLL,
            cooldown_poll: DEFAULT_COOLDOWN_POLL,
            fading_poll: DEFAULT_FADING_POLL,
        }
    }
}

impl FaderSettings {
    /// Raises inverted upper bounds to their lower bound and zero polls to one.
    pub fn normalized(mut self) -> Self {
        if self.max_fade_temp < self.min_fade_temp {
            self.max_fade_temp = self.min_fade_temp;
        }
        if self.max_fade_pwm < self.min_fade_pwm {
            self.max_fade_pwm = self.min_fade_pwm;
        }
        self.heatup_poll = self.heatup_poll.max(1);
        self.cooldown_poll = self.cooldown_poll.max(1);
        self.fading_poll = self.fading_poll.max(1);
        self
    }

    /// Output value for `temp` and the regime it falls into.
    ///
    /// The interpolated part is truncated toward zero, never rounded.
    pub fn fade(&self, temp: f32) -> (f32, Regime) {
        if temp <= self.min_fade_temp {
            (f32::from(self.min_fade_pwm), Regime::Heatup)
        } else if temp >= self.max_fade_temp {
            (f32::from(self.max_fade_pwm), Regime::Cooldown)
        } else {
            // min < temp < max here, so the span is strictly positive
            let frac = (temp - self.min_fade_temp) / (self.max_fade_temp - self.min_fade_temp);
            let span = f32::from(self.max_fade_pwm - self.min_fade_pwm);
            let pwm = f32::from(self.min_fade_pwm) + (frac * span).trunc();
            (pwm, Regime::Fading)
        }
    }
}

/// Where the last reading sat relative to the fade range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    /// At or below `min_fade_temp`.
    Heatup,
    /// Strictly inside the fade range.
    Fading,
    /// At or above `max_fade_temp`.
    Cooldown,
}

impl Regime {
    /// Ticks to wait before the next sample.
    pub fn poll_interval(self, settings: &FaderSettings) -> u16 {
        match self {
            Regime::Heatup => settings.heatup_poll,
            Regime::Fading => settings.fading_poll,
            Regime::Cooldown => settings.cooldown_poll,
        }
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Regime::Heatup => "heatup",
            Regime::Fading => "fading",
            Regime::Cooldown => "cooldown",
        })
    }
}

/// Outcome of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub temperature: f32,
    pub pwm: f32,
    pub regime: Regime,
    pub next_poll: u16,
    /// Whether the actuator was written to.
    pub written: bool,
    pub switch_on: bool,
}

/// One configured fader instance.
pub struct FaderController {
    name: String,
    sensors: Vec<SensorHandle>,
    switch: SwitchHandle,
    settings: FaderSettings,
    countdown: u16,
    last_pwm: f32,
    last_state: bool,
    sensor_source: Arc<dyn SensorSource>,
    actuator: Arc<dyn Actuator>,
}

impl std::fmt::Debug for FaderController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaderController")
            .field("name", &self.name)
            .field("sensors", &self.sensors)
            .field("switch", &self.switch)
            .field("settings", &self.settings)
            .field("countdown", &self.countdown)
            .field("last_pwm", &self.last_pwm)
            .field("last_state", &self.last_state)
            .finish_non_exhaustive()
    }
}

impl FaderController {
    /// Creates a fader watching `sensors` and driving `switch`.
    ///
    /// # Errors
    ///
    /// Fails when `sensors` is empty.
    pub fn new(
        name: impl Into<String>,
        sensors: Vec<SensorHandle>,
        switch: SwitchHandle,
        settings: FaderSettings,
        sensor_source: Arc<dyn SensorSource>,
        actuator: Arc<dyn Actuator>,
    ) -> Result<Self> {
        let name = name.into();
        if sensors.is_empty() {
            bail!("Fader '{name}' has no sensors");
        }
        let settings = settings.normalized();

        Ok(Self {
            name,
            sensors,
            switch,
            countdown: settings.heatup_poll,
            settings,
            last_pwm: 0.0,
            last_state: false,
            sensor_source,
            actuator,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sensors(&self) -> &[SensorHandle] {
        &self.sensors
    }

    pub fn switch(&self) -> &SwitchHandle {
        &self.switch
    }

    pub fn settings(&self) -> &FaderSettings {
        &self.settings
    }

    /// Ticks remaining until the next sample.
    pub fn countdown(&self) -> u16 {
        self.countdown
    }

    /// Last value sent to the switch, whether or not the write succeeded.
    pub fn last_pwm(&self) -> f32 {
        self.last_pwm
    }

    pub fn switch_state(&self) -> bool {
        self.last_state
    }

    /// Advances the fader by one tick.
    ///
    /// Returns the evaluation when this tick sampled the sensors.
    pub fn on_tick(&mut self) -> Option<Evaluation> {
        if self.countdown > 1 {
            self.countdown -= 1;
            return None;
        }
        Some(self.evaluate())
    }

    /// Samples the sensors, updates the output and rearms the countdown.
    pub fn evaluate(&mut self) -> Evaluation {
        let temperature = self.highest_temperature();
        let (pwm, regime) = self.settings.fade(temperature);
        self.countdown = regime.poll_interval(&self.settings);

        let written = self.apply_output(pwm);
        debug!(
            "Fader '{}': {temperature:.1}°C -> {pwm} ({regime}), next sample in {}",
            self.name, self.countdown
        );

        Evaluation {
            temperature,
            pwm,
            regime,
            next_poll: self.countdown,
            written,
            switch_on: self.last_state,
        }
    }

    /// Highest reading among this fader's sensors.
    ///
    /// Sensors that fail to read are left out; `0.0` when none can be read.
    pub fn highest_temperature(&self) -> f32 {
        self.sensors
            .iter()
            .filter_map(|&handle| self.sensor_source.current_temperature(handle))
            .reduce(f32::max)
            .unwrap_or(0.0)
    }

    /// Sends `pwm` to the switch unless it is exactly the last value sent.
    ///
    /// The on/off state is written first whenever it changes. Failed writes
    /// are logged and still recorded, so the same value is not resent.
    /// Returns whether anything was written.
    pub fn apply_output(&mut self, pwm: f32) -> bool {
        if pwm.to_bits() == self.last_pwm.to_bits() {
            return false;
        }

        let on = pwm > f32::from(self.settings.min_fade_pwm);
        if on != self.last_state {
            self.last_state = on;
            if let Err(e) = self.actuator.set_state(&self.switch, on) {
                warn!("Fader '{}' failed updating switch state: {e:#}", self.name);
            }
        }

        self.last_pwm = pwm;
        if let Err(e) = self.actuator.set_value(&self.switch, pwm) {
            warn!("Fader '{}' failed updating pwm value: {e:#}", self.name);
        }
        true
    }
}
