//! Temperature sensor drivers.

pub mod fixed;
pub mod sysfs;

use log::{info, warn};

use crate::{config::SensorCfg, sensors::TemperatureSensor};

/// Instantiates one driver per configured sensor.
///
/// A sysfs path that does not exist yet is kept: the device may appear later,
/// and until then its reads simply fail.
pub fn discover(cfg: &[SensorCfg]) -> Vec<Box<dyn TemperatureSensor>> {
    cfg.iter()
        .map(|c| match c {
            SensorCfg::Sysfs { id, designator, path, scale } => {
                if path.exists() {
                    info!("Found sysfs sensor '{id}' ({designator}): {}", path.display());
                } else {
                    warn!("Sensor '{id}' path {} does not exist yet", path.display());
                }
                Box::new(sysfs::SysfsSensor::new(id, *designator, path, *scale))
                    as Box<dyn TemperatureSensor>
            }
            SensorCfg::Fixed { id, designator, temperature } => {
                info!("Using fixed sensor '{id}' ({designator}) at {temperature}°C");
                Box::new(fixed::FixedSensor::new(id, *designator, *temperature))
                    as Box<dyn TemperatureSensor>
            }
        })
        .collect()
}
