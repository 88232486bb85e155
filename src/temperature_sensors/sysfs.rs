use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::sensors::TemperatureSensor;

/// Reads a numeric sysfs attribute and scales it to degrees Celsius.
#[derive(Debug)]
pub struct SysfsSensor {
    key: String,
    designator: char,
    path: PathBuf,
    scale: f32,
}

impl SysfsSensor {
    pub fn new(key: &str, designator: char, path: &Path, scale: f32) -> Self {
        Self {
            key: key.to_string(),
            designator,
            path: path.to_path_buf(),
            scale,
        }
    }
}

impl TemperatureSensor for SysfsSensor {
    fn key(&self) -> &str {
        &self.key
    }

    fn designator(&self) -> char {
        self.designator
    }

    fn read_temperature(&self) -> Result<f32> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let value: f32 = raw
            .trim()
            .parse()
            .with_context(|| format!("Non-numeric value {:?} in {}", raw.trim(), self.path.display()))?;
        Ok(value * self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sensor_with(content: &str, scale: f32) -> (NamedTempFile, SysfsSensor) {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), content).unwrap();
        let sensor = SysfsSensor::new("hotend", 'T', file.path(), scale);
        (file, sensor)
    }

    #[test]
    fn reads_millidegrees() {
        let (_file, sensor) = sensor_with("42500\n", 0.001);
        assert!((sensor.read_temperature().unwrap() - 42.5).abs() < 1e-4);
    }

    #[test]
    fn reads_plain_degrees() {
        let (_file, sensor) = sensor_with("215.5", 1.0);
        assert_eq!(sensor.read_temperature().unwrap(), 215.5);
    }

    #[test]
    fn garbage_is_an_error() {
        let (_file, sensor) = sensor_with("N/A\n", 1.0);
        let err = sensor.read_temperature().unwrap_err();
        assert!(err.to_string().contains("Non-numeric"));
    }
}
