//! Switch outputs and the actuator capability.
//!
//! A switch has an on/off state and a PWM duty value. Drivers implement
//! [`SwitchOutput`]; the [`SwitchPool`] owns them and exposes the
//! [`Actuator`] capability that faders write through.

use anyhow::{Result, anyhow};
use serde::Serialize;

/// A single switchable output.
pub trait SwitchOutput: Send + Sync {
    /// Unique switch id from the configuration.
    fn key(&self) -> &str;

    /// Turns the output on or off.
    fn set_state(&self, on: bool) -> Result<()>;

    /// Sets the duty value (0-255 scale).
    fn set_value(&self, value: f32) -> Result<()>;
}

/// Opaque reference to a switch, resolved by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SwitchHandle(String);

impl SwitchHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SwitchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Write-side capability handed to faders at construction.
#[cfg_attr(test, mockall::automock)]
pub trait Actuator: Send + Sync {
    /// Whether `handle` names a known switch.
    fn contains(&self, handle: &SwitchHandle) -> bool;

    fn set_state(&self, handle: &SwitchHandle, on: bool) -> Result<()>;

    fn set_value(&self, handle: &SwitchHandle, value: f32) -> Result<()>;
}

/// Owns all configured switch outputs.
#[derive(Default)]
pub struct SwitchPool {
    switches: Vec<Box<dyn SwitchOutput>>,
}

impl SwitchPool {
    pub fn new(switches: Vec<Box<dyn SwitchOutput>>) -> Self {
        Self { switches }
    }

    pub fn len(&self) -> usize {
        self.switches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }

    fn get(&self, handle: &SwitchHandle) -> Result<&dyn SwitchOutput> {
        self.switches
            .iter()
            .find(|s| s.key() == handle.name())
            .map(|s| s.as_ref())
            .ok_or_else(|| anyhow!("Switch '{handle}' not found"))
    }
}

impl std::fmt::Debug for SwitchPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.switches.iter().map(|s| s.key()))
            .finish()
    }
}

impl Actuator for SwitchPool {
    fn contains(&self, handle: &SwitchHandle) -> bool {
        self.get(handle).is_ok()
    }

    fn set_state(&self, handle: &SwitchHandle, on: bool) -> Result<()> {
        self.get(handle)?.set_state(on)
    }

    fn set_value(&self, handle: &SwitchHandle, value: f32) -> Result<()> {
        self.get(handle)?.set_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::virtual_switch::VirtualSwitch;
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_reach_named_switch() {
        let pool = SwitchPool::new(vec![
            Box::new(VirtualSwitch::new("fan")),
            Box::new(VirtualSwitch::new("light")),
        ]);
        let fan = SwitchHandle::new("fan");

        pool.set_state(&fan, true).unwrap();
        pool.set_value(&fan, 127.0).unwrap();

        assert!(pool.contains(&fan));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn unknown_switch_fails() {
        let pool = SwitchPool::new(vec![Box::new(VirtualSwitch::new("fan"))]);
        let missing = SwitchHandle::new("pump");

        assert!(!pool.contains(&missing));
        let err = pool.set_value(&missing, 10.0).unwrap_err();
        assert!(err.to_string().contains("pump"));
        assert!(pool.set_state(&missing, true).is_err());
    }
}
