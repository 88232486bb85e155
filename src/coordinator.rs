//! System coordinator: builds the shared state, starts services, runs the main loop.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use log::{info, warn};
use tokio::{
    signal::unix::{SignalKind, signal},
    sync::broadcast::error::RecvError,
};

use crate::{
    app_context::AppState,
    config::ConfigManager,
    event::{Event, EventBus},
    providers::{
        AppStateProvider, AsyncProvider, ReportServiceProvider, ServiceProvider,
        TickServiceProvider,
    },
    task_manager::TaskManager,
};

/// Owns the services and their shared state for the daemon's lifetime.
pub struct SystemCoordinator {
    task_manager: TaskManager,
    event_bus: EventBus,
    shared_state: Option<Arc<AppState>>,
    service_providers: Vec<Box<dyn ServiceProvider>>,
}

impl Default for SystemCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCoordinator {
    pub fn new() -> Self {
        Self {
            task_manager: TaskManager::new(),
            event_bus: EventBus::new(),
            shared_state: None,
            service_providers: Vec::new(),
        }
    }

    /// Builds the application state and registers the service providers.
    pub async fn initialize(&mut self, config_manager: ConfigManager) -> Result<()> {
        info!("Initializing SystemCoordinator...");

        let state = AppStateProvider::new(config_manager)
            .provide()
            .await
            .context("Failed to initialize application state")?;

        self.register_service_providers(state.clone());
        self.shared_state = Some(state);

        info!("SystemCoordinator initialization completed");
        Ok(())
    }

    fn register_service_providers(&mut self, state: Arc<AppState>) {
        let mut providers: Vec<Box<dyn ServiceProvider>> = vec![
            Box::new(TickServiceProvider::new(state, self.event_bus.clone())),
            Box::new(ReportServiceProvider::new(self.event_bus.clone())),
        ];

        providers.sort_by_key(|p| std::cmp::Reverse(p.priority()));
        self.service_providers = providers;

        info!(
            "Registered {} service providers in priority order",
            self.service_providers.len()
        );
    }

    /// Starts all registered services in priority order.
    ///
    /// A critical service that fails to start aborts startup; the others are
    /// logged and skipped.
    pub async fn start_all_services(&mut self) -> Result<()> {
        for provider in &self.service_providers {
            match provider.start(&mut self.task_manager).await {
                Ok(()) => info!(
                    "Service '{}' started (priority: {}, critical: {})",
                    provider.name(),
                    provider.priority(),
                    provider.is_critical()
                ),
                Err(e) if provider.is_critical() => {
                    return Err(e).with_context(|| {
                        format!("Critical service '{}' failed to start", provider.name())
                    });
                }
                Err(e) => warn!(
                    "Non-critical service '{}' failed to start: {e:#}",
                    provider.name()
                ),
            }
        }

        info!("All critical services started successfully");
        Ok(())
    }

    /// Waits for Ctrl+C, SIGTERM or a shutdown event, then stops every task.
    pub async fn run_main_loop(&mut self) -> Result<()> {
        let mut event_rx = self.event_bus.subscribe();
        let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        info!("Starting main event loop");

        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result.context("Failed to listen for Ctrl+C")?;
                    info!("Received Ctrl+C, initiating graceful shutdown...");
                    break;
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown...");
                    break;
                }
                event = event_rx.recv() => {
                    if !self.handle_event(event)? {
                        break;
                    }
                }
            }
        }

        self.shutdown().await?;
        info!("Main event loop terminated");
        Ok(())
    }

    /// Returns `false` when the loop should stop.
    fn handle_event(&self, event: Result<Event, RecvError>) -> Result<bool> {
        match event {
            Ok(Event::SystemShutdown) => {
                info!("Processing SystemShutdown event");
                Ok(false)
            }
            Ok(Event::FaderEvaluated(_)) => Ok(true),
            Err(RecvError::Lagged(n)) => {
                warn!("Event bus lagged by {n} messages");
                Ok(true)
            }
            Err(RecvError::Closed) => bail!("Event bus channel closed unexpectedly"),
        }
    }

    async fn shutdown(&mut self) -> Result<()> {
        info!("Initiating graceful shutdown...");
        self.task_manager
            .shutdown_all()
            .await
            .context("Failed to shutdown gracefully")?;
        info!("Shutdown complete");
        Ok(())
    }

    pub const fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn state(&self) -> Result<&Arc<AppState>> {
        self.shared_state
            .as_ref()
            .ok_or_else(|| anyhow!("System not properly initialized"))
    }

    pub fn running_services(&self) -> Vec<&'static str> {
        self.service_providers.iter().map(|p| p.name()).collect()
    }
}
