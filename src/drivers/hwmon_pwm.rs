//! hwmon PWM channel driver.
//!
//! Writes to `<dir>/pwmN` and `<dir>/pwmN_enable` of a Linux hwmon device.
//! Enabling the switch puts the channel into manual mode (`pwmN_enable = 1`);
//! disabling it drives the duty to zero.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
#[cfg(debug_assertions)]
use log::debug;

use crate::switches::SwitchOutput;

/// Manual PWM control mode in the hwmon sysfs ABI.
const PWM_MODE_MANUAL: &str = "1";

#[derive(Debug)]
pub struct HwmonPwm {
    key: String,
    pwm: PathBuf,
    enable: PathBuf,
}

impl HwmonPwm {
    pub fn new(key: &str, dir: &Path, channel: u8) -> Self {
        Self {
            key: key.to_string(),
            pwm: dir.join(format!("pwm{channel}")),
            enable: dir.join(format!("pwm{channel}_enable")),
        }
    }

    fn write(path: &Path, value: &str) -> Result<()> {
        #[cfg(debug_assertions)]
        {
            debug!("hwmon write {} <- {value}", path.display());
        }
        fs::write(path, value).with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// Converts a duty value to the 0-255 integer hwmon expects.
fn duty(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

impl SwitchOutput for HwmonPwm {
    fn key(&self) -> &str {
        &self.key
    }

    fn set_state(&self, on: bool) -> Result<()> {
        if on {
            Self::write(&self.enable, PWM_MODE_MANUAL)
        } else {
            Self::write(&self.pwm, "0")
        }
    }

    fn set_value(&self, value: f32) -> Result<()> {
        Self::write(&self.pwm, &duty(value).to_string())
    }
}
