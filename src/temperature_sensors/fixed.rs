use anyhow::Result;

use crate::sensors::TemperatureSensor;

/// Sensor that always reports the configured temperature.
#[derive(Debug)]
pub struct FixedSensor {
    key: String,
    designator: char,
    temperature: f32,
}

impl FixedSensor {
    pub fn new(key: &str, designator: char, temperature: f32) -> Self {
        Self {
            key: key.to_string(),
            designator,
            temperature,
        }
    }
}

impl TemperatureSensor for FixedSensor {
    fn key(&self) -> &str {
        &self.key
    }

    fn designator(&self) -> char {
        self.designator
    }

    fn read_temperature(&self) -> Result<f32> {
        Ok(self.temperature)
    }
}
