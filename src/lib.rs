//! # tempfaderd
//!
//! A Linux daemon that fades PWM outputs (fans, lights) according to
//! temperature.
//!
//! Each `temperaturefader` section in the configuration becomes one
//! [`FaderController`](fader::FaderController): it watches every sensor
//! carrying its designator, takes the hottest reading, and maps it linearly
//! from a temperature range onto a PWM range. Below the range the output sits
//! at its minimum, above it at its maximum. Sampling is adaptive: slow while
//! cold or saturated, fast while fading.
//!
//! ## Architecture
//!
//! - [`SensorPool`](sensors::SensorPool) and [`SwitchPool`](switches::SwitchPool)
//!   own the hardware drivers and are injected into faders as the
//!   [`SensorSource`](sensors::SensorSource) and [`Actuator`](switches::Actuator)
//!   capabilities
//! - [`loader::load_faders`] turns configuration sections into faders
//! - [`TickDispatcher`](dispatcher::TickDispatcher) ticks every fader in turn
//! - [`SystemCoordinator`](coordinator::SystemCoordinator) runs the tick and
//!   report services and handles shutdown
//!
//! ## Example
//!
//! ```no_run
//! use tempfaderd::{application::Application, config::ConfigManager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config_manager = ConfigManager::load(None).await?;
//!     Application::builder()
//!         .with_config_manager(config_manager)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

pub mod app_context;
pub mod application;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod drivers;
pub mod event;
pub mod fader;
pub mod loader;
pub mod providers;
pub mod sensors;
pub mod switches;
pub mod task_manager;
pub mod temperature_sensors;
