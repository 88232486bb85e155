use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::{
    app_context::AppState,
    event::{Event, EventBus},
    providers::traits::ServiceProvider,
    task_manager::TaskManager,
};

/// Tick source for all faders.
///
/// Delivers one tick per `tick_seconds` to the [`TickDispatcher`] and
/// publishes every resulting evaluation on the event bus. Ticks that were
/// missed while the runtime was busy are delivered in a burst, so the
/// faders always see one call per elapsed period.
///
/// - **Priority**: 10 (highest)
/// - **Critical**: Yes
///
/// [`TickDispatcher`]: crate::dispatcher::TickDispatcher
pub struct TickServiceProvider {
    state: Arc<AppState>,
    event_bus: EventBus,
}

impl TickServiceProvider {
    pub fn new(state: Arc<AppState>, event_bus: EventBus) -> Self {
        Self { state, event_bus }
    }
}

#[async_trait]
impl ServiceProvider for TickServiceProvider {
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
        let state = self.state.clone();
        let event_bus = self.event_bus.clone();

        task_manager.spawn_task(self.name(), |cancel_token| async move {
            run_tick_service(state, event_bus, cancel_token).await
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "TickService"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn is_critical(&self) -> bool {
        true
    }
}

async fn run_tick_service(
    state: Arc<AppState>,
    event_bus: EventBus,
    cancel_token: CancellationToken,
) -> Result<()> {
    let period = Duration::from_secs(u64::from(state.config().tick_seconds));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                info!("Tick service cancelled");
                break;
            }
            _instant = ticker.tick() => {
                dispatch_tick(&state, &event_bus).await;
            }
        }
    }
    Ok(())
}

/// Runs one tick and publishes the evaluations. Returns how many faders sampled.
pub async fn dispatch_tick(state: &AppState, event_bus: &EventBus) -> usize {
    let reports = state.dispatcher.lock().await.tick();
    let sampled = reports.len();

    for report in reports {
        if event_bus.publish(Event::FaderEvaluated(report)).is_err() {
            debug!("No subscribers for fader evaluation");
        }
    }
    sampled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Config, ConfigManager, FaderSection, SensorCfg, SwitchCfg},
        fader::Regime,
    };
    use pretty_assertions::assert_eq;
    use tokio::time::timeout;

    async fn create_state(temperature: f32) -> Arc<AppState> {
        let mut config = Config {
            sensors: vec![SensorCfg::Fixed { id: "hotend".into(), designator: 'T', temperature }],
            switches: vec![SwitchCfg::Virtual { id: "fan".into() }],
            ..Default::default()
        };
        config.temperaturefader.insert(
            "hotend".into(),
            FaderSection {
                enable: true,
                switch: Some("fan".into()),
                heatup_poll: Some(2),
                ..Default::default()
            },
        );
        let config_manager = ConfigManager::new(config, "/tmp/test.yml".into());
        Arc::new(AppState::new(config_manager).await.unwrap())
    }

    #[tokio::test]
    async fn provider_metadata() {
        let provider = TickServiceProvider::new(create_state(20.0).await, EventBus::new());
        assert_eq!(provider.name(), "TickService");
        assert_eq!(provider.priority(), 10);
        assert!(provider.is_critical());
    }

    #[tokio::test]
    async fn dispatch_tick_publishes_evaluations() {
        let state = create_state(100.0).await;
        let event_bus = EventBus::new();
        let mut receiver = event_bus.subscribe();

        assert_eq!(dispatch_tick(&state, &event_bus).await, 0);
        assert_eq!(dispatch_tick(&state, &event_bus).await, 1);

        match receiver.recv().await.unwrap() {
            Event::FaderEvaluated(report) => {
                assert_eq!(report.fader, "hotend");
                assert_eq!(report.pwm, 127.0);
                assert_eq!(report.regime, Regime::Fading);
                assert!(report.switch_on);
            }
            other => panic!("Expected FaderEvaluated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dispatch_tick_without_subscribers_is_fine() {
        let state = create_state(100.0).await;
        let event_bus = EventBus::new();
        dispatch_tick(&state, &event_bus).await;
        assert_eq!(dispatch_tick(&state, &event_bus).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn service_ticks_on_the_configured_period() {
        let state = create_state(200.0).await;
        let event_bus = EventBus::new();
        let mut receiver = event_bus.subscribe();
        let mut task_manager = TaskManager::new();

        TickServiceProvider::new(state.clone(), event_bus)
            .start(&mut task_manager)
            .await
            .unwrap();
        assert!(task_manager.is_running("TickService"));

        let started = Instant::now();
        let event = timeout(Duration::from_secs(10), receiver.recv())
            .await
            .expect("evaluation within 10s")
            .unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));

        match event {
            Event::FaderEvaluated(report) => {
                assert_eq!(report.regime, Regime::Cooldown);
                assert_eq!(report.next_poll, 60);
            }
            other => panic!("Expected FaderEvaluated, got {other:?}"),
        }
        assert_eq!(state.dispatcher.lock().await.faders()[0].countdown(), 60);

        task_manager.shutdown_all().await.unwrap();
        assert_eq!(task_manager.active_count(), 0);
    }
}
