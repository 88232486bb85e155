//! Shared application state.

use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    config::{Config, ConfigManager},
    dispatcher::TickDispatcher,
    drivers,
    fader::FaderSettings,
    loader,
    sensors::{SensorPool, SensorSource},
    switches::{Actuator, SwitchPool},
    temperature_sensors,
};

/// Everything the services need, built once from the configuration.
pub struct AppState {
    pub config_manager: Arc<ConfigManager>,
    pub sensors: Arc<SensorPool>,
    pub switches: Arc<SwitchPool>,
    /// Only the tick service locks this, once per tick.
    pub dispatcher: Arc<Mutex<TickDispatcher>>,
}

impl AppState {
    /// Instantiates sensors and switches and loads every valid fader section.
    pub async fn new(config_manager: ConfigManager) -> Result<Self> {
        let config = config_manager.get();

        let sensors = Arc::new(SensorPool::new(temperature_sensors::discover(&config.sensors)));
        let switches = Arc::new(SwitchPool::new(drivers::build_switches(&config.switches)));

        let source: Arc<dyn SensorSource> = sensors.clone();
        let actuator: Arc<dyn Actuator> = switches.clone();
        let faders = loader::load_faders(&config.temperaturefader, &source, &actuator);

        if faders.is_empty() {
            warn!("No {} section produced a fader", loader::FADER_NAMESPACE);
        } else {
            info!("{} fader(s) active", faders.len());
        }

        Ok(Self {
            sensors,
            switches,
            dispatcher: Arc::new(Mutex::new(TickDispatcher::new(faders))),
            config_manager: Arc::new(config_manager),
        })
    }

    pub fn config(&self) -> &Config {
        self.config_manager.get()
    }

    /// Describes every loaded fader, for `--check`.
    pub async fn summary(&self) -> Vec<FaderSummary> {
        self.dispatcher
            .lock()
            .await
            .faders()
            .iter()
            .map(|fader| FaderSummary {
                name: fader.name().to_string(),
                sensors: fader
                    .sensors()
                    .iter()
                    .filter_map(|&h| self.sensors.key_of(h).map(str::to_string))
                    .collect(),
                switch: fader.switch().name().to_string(),
                switch_configured: self.switches.contains(fader.switch()),
                settings: *fader.settings(),
            })
            .collect()
    }
}

/// Resolved view of one fader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaderSummary {
    pub name: String,
    pub sensors: Vec<String>,
    pub switch: String,
    pub switch_configured: bool,
    pub settings: FaderSettings,
}
