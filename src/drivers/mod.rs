//! Switch output drivers.

pub mod hwmon_pwm;
pub mod virtual_switch;

use log::info;

use crate::{config::SwitchCfg, switches::SwitchOutput};

/// Instantiates one driver per configured switch.
pub fn build_switches(cfg: &[SwitchCfg]) -> Vec<Box<dyn SwitchOutput>> {
    cfg.iter()
        .map(|c| match c {
            SwitchCfg::HwmonPwm { id, path, channel } => {
                info!("Using hwmon PWM switch '{id}': {}/pwm{channel}", path.display());
                Box::new(hwmon_pwm::HwmonPwm::new(id, path, *channel)) as Box<dyn SwitchOutput>
            }
            SwitchCfg::Virtual { id } => {
                info!("Using virtual switch '{id}'");
                Box::new(virtual_switch::VirtualSwitch::new(id)) as Box<dyn SwitchOutput>
            }
        })
        .collect()
}
