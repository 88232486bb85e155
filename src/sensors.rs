//! Temperature sensor abstractions.
//!
//! Drivers implement [`TemperatureSensor`]. The [`SensorPool`] owns every
//! configured driver and exposes them to faders through the [`SensorSource`]
//! capability, addressed by opaque [`SensorHandle`]s.

use anyhow::Result;
use log::debug;
use serde::Serialize;

/// A single temperature input.
pub trait TemperatureSensor: Send + Sync {
    /// Unique sensor id from the configuration.
    fn key(&self) -> &str;

    /// One-character tag used by faders to select sensors.
    fn designator(&self) -> char;

    /// Reads the current temperature in degrees Celsius.
    fn read_temperature(&self) -> Result<f32>;
}

/// Opaque reference to a sensor owned by a [`SensorSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SensorHandle(pub usize);

/// Static description of a sensor, as enumerated by a [`SensorSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorInfo {
    pub handle: SensorHandle,
    pub key: String,
    pub designator: char,
}

/// Read-side capability handed to faders at construction.
#[cfg_attr(test, mockall::automock)]
pub trait SensorSource: Send + Sync {
    /// Lists every sensor this source knows about.
    fn sensors(&self) -> Vec<SensorInfo>;

    /// Current temperature of `handle`, or `None` when the read fails.
    fn current_temperature(&self, handle: SensorHandle) -> Option<f32>;

    /// Handles of every sensor whose designator equals `designator`.
    fn matching(&self, designator: char) -> Vec<SensorHandle> {
        self.sensors()
            .into_iter()
            .filter(|s| s.designator == designator)
            .map(|s| s.handle)
            .collect()
    }
}

/// Owns all configured temperature sensors.
#[derive(Default)]
pub struct SensorPool {
    sensors: Vec<Box<dyn TemperatureSensor>>,
}

impl SensorPool {
    pub fn new(sensors: Vec<Box<dyn TemperatureSensor>>) -> Self {
        Self { sensors }
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Sensor id behind `handle`, if any.
    pub fn key_of(&self, handle: SensorHandle) -> Option<&str> {
        self.sensors.get(handle.0).map(|s| s.key())
    }
}

impl std::fmt::Debug for SensorPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sensors.iter().map(|s| (s.key(), s.designator())))
            .finish()
    }
}

impl SensorSource for SensorPool {
    fn sensors(&self) -> Vec<SensorInfo> {
        self.sensors
            .iter()
            .enumerate()
            .map(|(idx, s)| SensorInfo {
                handle: SensorHandle(idx),
                key: s.key().to_string(),
                designator: s.designator(),
            })
            .collect()
    }

    fn current_temperature(&self, handle: SensorHandle) -> Option<f32> {
        let sensor = self.sensors.get(handle.0)?;
        match sensor.read_temperature() {
            Ok(t) => Some(t),
            Err(e) => {
                debug!("Temperature read from '{}' failed: {e}", sensor.key());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;

    struct StubSensor {
        key: &'static str,
        designator: char,
        reading: Option<f32>,
    }

    impl TemperatureSensor for StubSensor {
        fn key(&self) -> &str {
            self.key
        }

        fn designator(&self) -> char {
            self.designator
        }

        fn read_temperature(&self) -> Result<f32> {
            self.reading.ok_or_else(|| anyhow!("sensor unplugged"))
        }
    }

    fn pool() -> SensorPool {
        SensorPool::new(vec![
            Box::new(StubSensor { key: "hotend", designator: 'T', reading: Some(210.0) }),
            Box::new(StubSensor { key: "bed", designator: 'B', reading: Some(60.0) }),
            Box::new(StubSensor { key: "hotend2", designator: 'T', reading: None }),
        ])
    }

    #[test]
    fn matching_selects_by_designator() {
        let pool = pool();
        assert_eq!(pool.matching('T'), vec![SensorHandle(0), SensorHandle(2)]);
        assert_eq!(pool.matching('B'), vec![SensorHandle(1)]);
        assert!(pool.matching('X').is_empty());
    }

    #[test]
    fn failed_read_yields_none() {
        let pool = pool();
        assert_eq!(pool.current_temperature(SensorHandle(0)), Some(210.0));
        assert_eq!(pool.current_temperature(SensorHandle(2)), None);
    }

    #[test]
    fn unknown_handle_yields_none() {
        assert_eq!(pool().current_temperature(SensorHandle(42)), None);
    }

    #[test]
    fn key_lookup() {
        let pool = pool();
        assert_eq!(pool.key_of(SensorHandle(1)), Some("bed"));
        assert_eq!(pool.key_of(SensorHandle(3)), None);
        assert_eq!(pool.len(), 3);
    }
}
