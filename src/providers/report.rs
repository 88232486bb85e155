use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::{
    dispatcher::FaderReport,
    event::{Event, EventBus},
    providers::traits::ServiceProvider,
    task_manager::TaskManager,
};

/// Logs every fader output change.
///
/// - **Priority**: 3 (low)
/// - **Critical**: No
pub struct ReportServiceProvider {
    event_bus: EventBus,
}

impl ReportServiceProvider {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

#[async_trait]
impl ServiceProvider for ReportServiceProvider {
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
        let receiver = self.event_bus.subscribe();
        task_manager.spawn_task(self.name(), |cancel_token| async move {
            run_report_service(receiver, cancel_token).await
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ReportService"
    }

    fn priority(&self) -> i32 {
        3
    }
}

async fn run_report_service(
    mut receiver: Receiver<Event>,
    cancel_token: CancellationToken,
) -> Result<()> {
    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            event = receiver.recv() => {
                match event {
                    Ok(Event::FaderEvaluated(report)) if report.written => log_change(&report),
                    Ok(Event::FaderEvaluated(_)) => {}
                    Ok(Event::SystemShutdown) | Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(n)) => warn!("Report service lagged by {n} events"),
                }
            }
        }
    }
    Ok(())
}

fn log_change(report: &FaderReport) {
    info!(
        "Fader '{}': {:.1}°C, output {} ({}), switch {}",
        report.fader,
        report.temperature,
        report.pwm,
        report.regime,
        if report.switch_on { "on" } else { "off" }
    );
}
