//! Builds fader instances from the `temperaturefader` configuration sections.

use std::{collections::BTreeMap, fmt, sync::Arc};

use log::{info, warn};

use crate::{
    config::FaderSection,
    fader::{FaderController, FaderSettings},
    sensors::SensorSource,
    switches::{Actuator, SwitchHandle},
};

/// Configuration namespace holding fader sections.
pub const FADER_NAMESPACE: &str = "temperaturefader";

/// Section that predates the `designator` key and implies [`LEGACY_HOTEND_DESIGNATOR`].
pub const LEGACY_HOTEND_SECTION: &str = "hotend";
pub const LEGACY_HOTEND_DESIGNATOR: char = 'T';

/// Why a section did not produce a fader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    MissingDesignator,
    NoMatchingSensors(char),
    MissingSwitch,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Disabled => f.write_str("disabled"),
            SkipReason::MissingDesignator => f.write_str("no designator specified"),
            SkipReason::NoMatchingSensors(d) => write!(f, "no sensors with designator '{d}'"),
            SkipReason::MissingSwitch => f.write_str("no switch specified"),
        }
    }
}

/// Creates a fader for every enabled, valid section.
///
/// Invalid sections are logged and dropped; they never abort startup.
pub fn load_faders(
    sections: &BTreeMap<String, FaderSection>,
    sensors: &Arc<dyn SensorSource>,
    actuator: &Arc<dyn Actuator>,
) -> Vec<FaderController> {
    sections
        .iter()
        .filter_map(|(name, section)| match build_fader(name, section, sensors, actuator) {
            Ok(fader) => {
                info!(
                    "Loaded {FADER_NAMESPACE}.{name}: {} sensor(s) -> switch '{}'",
                    fader.sensors().len(),
                    fader.switch()
                );
                Some(fader)
            }
            Err(SkipReason::Disabled) => {
                info!("Skipping {FADER_NAMESPACE}.{name}: disabled");
                None
            }
            Err(reason) => {
                warn!("Ignoring {FADER_NAMESPACE}.{name}: {reason}");
                None
            }
        })
        .collect()
}

/// Builds the fader described by one section.
pub fn build_fader(
    name: &str,
    section: &FaderSection,
    sensors: &Arc<dyn SensorSource>,
    actuator: &Arc<dyn Actuator>,
) -> Result<FaderController, SkipReason> {
    if !section.enable {
        return Err(SkipReason::Disabled);
    }

    let designator = resolve_designator(name, section).ok_or(SkipReason::MissingDesignator)?;

    let handles = sensors.matching(designator);
    if handles.is_empty() {
        return Err(SkipReason::NoMatchingSensors(designator));
    }

    let switch = SwitchHandle::new(resolve_switch(section).ok_or(SkipReason::MissingSwitch)?);
    if !actuator.contains(&switch) {
        warn!("{FADER_NAMESPACE}.{name}: switch '{switch}' is not configured, writes will fail");
    }

    FaderController::new(
        name,
        handles,
        switch,
        resolve_settings(name, section),
        sensors.clone(),
        actuator.clone(),
    )
    .map_err(|_| SkipReason::NoMatchingSensors(designator))
}

/// First character of `designator`, or the legacy default for the `hotend` section.
pub fn resolve_designator(name: &str, section: &FaderSection) -> Option<char> {
    match section.designator.as_deref().and_then(|s| s.chars().next()) {
        Some(c) => Some(c),
        None if name == LEGACY_HOTEND_SECTION => Some(LEGACY_HOTEND_DESIGNATOR),
        None => None,
    }
}

/// `switch`, falling back to the older `type` key. Empty values count as unset.
pub fn resolve_switch(section: &FaderSection) -> Option<&str> {
    [section.switch.as_deref(), section.legacy_type.as_deref()]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
}

/// Applies defaults and the ordering invariants to a section's numbers.
pub fn resolve_settings(name: &str, section: &FaderSection) -> FaderSettings {
    let defaults = FaderSettings::default();
    let raw = FaderSettings {
        min_fade_temp: section.min_fade_temp.unwrap_or(defaults.min_fade_temp),
        max_fade_temp: section.max_fade_temp.unwrap_or(defaults.max_fade_temp),
        min_fade_pwm: section.min_fade_pwm.map_or(defaults.min_fade_pwm, pwm_bound),
        max_fade_pwm: section.max_fade_pwm.map_or(defaults.max_fade_pwm, pwm_bound),
        heatup_poll: section.heatup_poll.unwrap_or(defaults.heatup_poll),
        cooldown_poll: section.cooldown_poll.unwrap_or(defaults.cooldown_poll),
        fading_poll: section.fading_poll.unwrap_or(defaults.fading_poll),
    };

    if raw.max_fade_temp < raw.min_fade_temp {
        warn!(
            "{FADER_NAMESPACE}.{name}: max_fade_temp {} below min_fade_temp {}, clamping",
            raw.max_fade_temp, raw.min_fade_temp
        );
    }
    if raw.max_fade_pwm < raw.min_fade_pwm {
        warn!(
            "{FADER_NAMESPACE}.{name}: max_fade_pwm {} below min_fade_pwm {}, clamping",
            raw.max_fade_pwm, raw.min_fade_pwm
        );
    }

    raw.normalized()
}

/// Truncates a configured pwm bound into `0..=255`.
fn pwm_bound(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}
