//! Switch that has no hardware behind it.
//!
//! Useful for bench setups and dry runs: every write is logged and the last
//! state and value are kept for inspection.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use anyhow::Result;
use log::info;

use crate::switches::SwitchOutput;

#[derive(Debug)]
pub struct VirtualSwitch {
    key: String,
    state: AtomicBool,
    value: AtomicU32,
}

impl VirtualSwitch {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            state: AtomicBool::new(false),
            value: AtomicU32::new(0f32.to_bits()),
        }
    }

    pub fn state(&self) -> bool {
        self.state.load(Ordering::Relaxed)
    }

    pub fn value(&self) -> f32 {
        f32::from_bits(self.value.load(Ordering::Relaxed))
    }
}

impl SwitchOutput for VirtualSwitch {
    fn key(&self) -> &str {
        &self.key
    }

    fn set_state(&self, on: bool) -> Result<()> {
        info!("Switch '{}' turned {}", self.key, if on { "on" } else { "off" });
        self.state.store(on, Ordering::Relaxed);
        Ok(())
    }

    fn set_value(&self, value: f32) -> Result<()> {
        info!("Switch '{}' set to {value}", self.key);
        self.value.store(value.to_bits(), Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_last_write() {
        let switch = VirtualSwitch::new("light");
        assert!(!switch.state());
        assert_eq!(switch.value(), 0.0);

        switch.set_state(true).unwrap();
        switch.set_value(63.0).unwrap();

        assert!(switch.state());
        assert_eq!(switch.value(), 63.0);
    }
}
