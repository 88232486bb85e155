//! Configuration management for the tempfaderd daemon.
//!
//! Handles loading, parsing, and validation of the YAML configuration file
//! that declares sensors, switches, and the `temperaturefader` sections.
//! Configuration is read once at startup and never changes afterwards.

use anyhow::{Context, Result, bail};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashSet},
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Main configuration structure for the tempfaderd daemon.
///
/// # Example
///
/// ```yaml
/// version: 1
/// tick_seconds: 1
///
/// sensors:
///   - kind: sysfs
///     id: hotend
///     designator: T
///     path: /sys/class/hwmon/hwmon1/temp1_input
///
/// switches:
///   - kind: hwmon-pwm
///     id: fan
///     path: /sys/class/hwmon/hwmon2
///     channel: 1
///
/// temperaturefader:
///   hotend:
///     enable: true
///     designator: T
///     switch: fan
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version for compatibility checking.
    pub version: u8,

    /// Length of one controller tick in seconds.
    #[serde(default = "defaults::tick_seconds")]
    pub tick_seconds: u16,

    /// Temperature inputs.
    #[serde(default)]
    pub sensors: Vec<SensorCfg>,

    /// Switchable PWM outputs.
    #[serde(default)]
    pub switches: Vec<SwitchCfg>,

    /// Fader sections keyed by section name.
    #[serde(default)]
    pub temperaturefader: BTreeMap<String, FaderSection>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            tick_seconds: defaults::tick_seconds(),
            sensors: Vec::new(),
            switches: Vec::new(),
            temperaturefader: BTreeMap::new(),
        }
    }
}

/// Temperature sensor configuration variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SensorCfg {
    /// Numeric sysfs attribute such as `hwmonN/tempM_input`.
    Sysfs {
        id: String,
        designator: char,
        path: PathBuf,
        /// Multiplier applied to the raw value (millidegrees by default).
        #[serde(default = "defaults::sysfs_scale")]
        scale: f32,
    },
    /// Constant reading.
    Fixed {
        id: String,
        designator: char,
        temperature: f32,
    },
}

impl SensorCfg {
    pub fn id(&self) -> &str {
        match self {
            SensorCfg::Sysfs { id, .. } | SensorCfg::Fixed { id, .. } => id,
        }
    }
}

/// Switch output configuration variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SwitchCfg {
    /// PWM channel of a hwmon device directory.
    HwmonPwm {
        id: String,
        path: PathBuf,
        channel: u8,
    },
    /// Output that only records and logs writes.
    Virtual { id: String },
}

impl SwitchCfg {
    pub fn id(&self) -> &str {
        match self {
            SwitchCfg::HwmonPwm { id, .. } | SwitchCfg::Virtual { id } => id,
        }
    }
}

/// One `temperaturefader.<name>` section, exactly as written in the file.
///
/// Every key is optional; defaults and legacy fallbacks are resolved by
/// [`crate::loader`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaderSection {
    #[serde(default)]
    pub enable: bool,

    #[serde(default)]
    pub designator: Option<String>,

    #[serde(default)]
    pub switch: Option<String>,

    /// Older name for `switch`.
    #[serde(default, rename = "type")]
    pub legacy_type: Option<String>,

    #[serde(default)]
    pub min_fade_temp: Option<f32>,

    #[serde(default)]
    pub max_fade_temp: Option<f32>,

    #[serde(default)]
    pub min_fade_pwm: Option<f64>,

    #[serde(default)]
    pub max_fade_pwm: Option<f64>,

    #[serde(default)]
    pub heatup_poll: Option<u16>,

    #[serde(default)]
    pub cooldown_poll: Option<u16>,

    #[serde(default)]
    pub fading_poll: Option<u16>,
}

impl Config {
    /// Validates the configuration for consistency.
    pub fn validate(&self) -> Result<()> {
        if self.tick_seconds == 0 {
            bail!("tick_seconds must be greater than zero");
        }

        let mut sensor_ids = HashSet::new();
        for sensor in &self.sensors {
            if !sensor_ids.insert(sensor.id()) {
                bail!("Duplicate sensor id '{}'", sensor.id());
            }
            if let SensorCfg::Sysfs { id, scale, .. } = sensor {
                if !scale.is_finite() || *scale == 0.0 {
                    bail!("Sensor '{id}' has invalid scale {scale}");
                }
            }
        }

        let mut switch_ids = HashSet::new();
        for switch in &self.switches {
            if !switch_ids.insert(switch.id()) {
                bail!("Duplicate switch id '{}'", switch.id());
            }
            if let SwitchCfg::HwmonPwm { id, channel: 0, .. } = switch {
                bail!("Switch '{id}' has channel 0, hwmon channels start at 1");
            }
        }

        Ok(())
    }
}

mod defaults {
    /// One tick per second.
    pub fn tick_seconds() -> u16 {
        1
    }

    /// hwmon reports millidegrees Celsius.
    pub fn sysfs_scale() -> f32 {
        0.001
    }
}

fn locate_config() -> Result<PathBuf> {
    if let Ok(env_path) = env::var("TEMPFADERD_CONFIG") {
        return Ok(PathBuf::from(env_path));
    }

    if let Some(mut cfg_dir) = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|h| Path::new(&h).join(".config")))
    {
        cfg_dir.push("tempfaderd/config.yml");
        if cfg_dir.exists() {
            return Ok(cfg_dir);
        }
    }

    let etc = Path::new("/etc/tempfaderd/config.yml");
    if etc.exists() {
        return Ok(etc.to_path_buf());
    }

    bail!("Configuration file not found in any standard location")
}

/// Holds the loaded configuration together with the file it came from.
///
/// # Example
///
/// ```no_run
/// use tempfaderd::config::ConfigManager;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config_manager = ConfigManager::load(None).await?;
/// let tick_seconds = config_manager.get().tick_seconds;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: Arc<Config>,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            path,
        }
    }

    /// Loads configuration from file or standard locations.
    ///
    /// Searches for configuration in the following order:
    /// 1. Provided path parameter
    /// 2. TEMPFADERD_CONFIG environment variable
    /// 3. XDG_CONFIG_HOME/tempfaderd/config.yml or ~/.config/tempfaderd/config.yml
    /// 4. /etc/tempfaderd/config.yml
    pub async fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => locate_config().context("No configuration file found")?,
        };

        info!("Loading config from: {}", config_path.display());
        let config = Self::load_config_from_path(&config_path)?;

        Ok(Self::new(config, config_path))
    }

    pub fn get(&self) -> &Config {
        &self.config
    }

    pub fn shared(&self) -> Arc<Config> {
        self.config.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_config_from_path(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML in: {}", path.display()))?;

        if config.version != 1 {
            bail!(
                "Unsupported config version {} in file: {}",
                config.version,
                path.display()
            );
        }

        config
            .validate()
            .with_context(|| format!("Configuration validation failed for: {}", path.display()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    const FULL_CONFIG: &str = r#"
version: 1
tick_seconds: 2

sensors:
  - kind: sysfs
    id: hotend
    designator: T
    path: /sys/class/hwmon/hwmon1/temp1_input
  - kind: fixed
    id: ambient
    designator: B
    temperature: 25.5

switches:
  - kind: hwmon-pwm
    id: fan
    path: /sys/class/hwmon/hwmon2
    channel: 1
  - kind: virtual
    id: light

temperaturefader:
  hotend:
    enable: true
    designator: T
    switch: fan
    min_fade_temp: 40
    max_fade_temp: 90.5
    min_fade_pwm: 20
    max_fade_pwm: 200
    heatup_poll: 10
    cooldown_poll: 30
    fading_poll: 2
  cabinet:
    enable: false
    type: light
"#;

    #[test]
    fn config_load_valid_yaml() {
        let temp_file = create_temp_config(FULL_CONFIG);

        let manager =
            tokio_test::block_on(ConfigManager::load(Some(temp_file.path().to_path_buf())))
                .unwrap();
        let config = manager.get();

        assert_eq!(config.version, 1);
        assert_eq!(config.tick_seconds, 2);
        assert_eq!(config.sensors.len(), 2);
        assert_eq!(config.switches.len(), 2);
        assert_eq!(config.temperaturefader.len(), 2);
        assert_eq!(manager.path(), temp_file.path());

        let hotend = &config.temperaturefader["hotend"];
        assert!(hotend.enable);
        assert_eq!(hotend.designator.as_deref(), Some("T"));
        assert_eq!(hotend.switch.as_deref(), Some("fan"));
        assert_eq!(hotend.min_fade_temp, Some(40.0));
        assert_eq!(hotend.max_fade_temp, Some(90.5));
        assert_eq!(hotend.min_fade_pwm, Some(20.0));
        assert_eq!(hotend.max_fade_pwm, Some(200.0));
        assert_eq!(hotend.heatup_poll, Some(10));
        assert_eq!(hotend.cooldown_poll, Some(30));
        assert_eq!(hotend.fading_poll, Some(2));

        let cabinet = &config.temperaturefader["cabinet"];
        assert!(!cabinet.enable);
        assert_eq!(cabinet.switch, None);
        assert_eq!(cabinet.legacy_type.as_deref(), Some("light"));
    }

    #[test]
    fn sysfs_scale_defaults_to_millidegrees() {
        let config: Config = serde_yaml::from_str(FULL_CONFIG).unwrap();
        match &config.sensors[0] {
            SensorCfg::Sysfs { scale, designator, .. } => {
                assert_eq!(*scale, 0.001);
                assert_eq!(*designator, 'T');
            }
            other => panic!("Expected sysfs sensor, got {other:?}"),
        }
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("version: 1\n").unwrap();
        assert_eq!(config.tick_seconds, 1);
        assert!(config.sensors.is_empty());
        assert!(config.switches.is_empty());
        assert!(config.temperaturefader.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_section_deserializes_to_defaults() {
        let config: Config =
            serde_yaml::from_str("version: 1\ntemperaturefader:\n  spare: {}\n").unwrap();
        assert_eq!(config.temperaturefader["spare"], FaderSection::default());
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let temp_file = create_temp_config("version: 2\n");
        let result =
            tokio_test::block_on(ConfigManager::load(Some(temp_file.path().to_path_buf())));
        let err = format!("{:#}", result.unwrap_err());
        assert!(err.contains("Unsupported config version 2"));
    }

    #[test]
    fn multi_char_designator_on_sensor_fails_to_parse() {
        let yaml = r#"
version: 1
sensors:
  - kind: fixed
    id: a
    designator: TT
    temperature: 1.0
"#;
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn validate_rejects_duplicate_sensor_ids() {
        let config = Config {
            sensors: vec![
                SensorCfg::Fixed { id: "a".into(), designator: 'T', temperature: 1.0 },
                SensorCfg::Fixed { id: "a".into(), designator: 'B', temperature: 2.0 },
            ],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate sensor id 'a'"));
    }

    #[test]
    fn validate_rejects_duplicate_switch_ids() {
        let config = Config {
            switches: vec![
                SwitchCfg::Virtual { id: "fan".into() },
                SwitchCfg::HwmonPwm { id: "fan".into(), path: "/tmp".into(), channel: 1 },
            ],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_channel_and_tick() {
        let config = Config {
            switches: vec![SwitchCfg::HwmonPwm { id: "fan".into(), path: "/tmp".into(), channel: 0 }],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config { tick_seconds: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn env_var_overrides_search_path() {
        let temp_file = create_temp_config("version: 1\ntick_seconds: 5\n");
        // SAFETY: tests touching the environment run serially.
        unsafe { env::set_var("TEMPFADERD_CONFIG", temp_file.path()) };

        let manager = tokio_test::block_on(ConfigManager::load(None));

        unsafe { env::remove_var("TEMPFADERD_CONFIG") };
        assert_eq!(manager.unwrap().get().tick_seconds, 5);
    }
}
