//! Service providers started by the coordinator.

pub mod app_state;
pub mod report;
pub mod tick;
pub mod traits;

pub use app_state::AppStateProvider;
pub use report::ReportServiceProvider;
pub use tick::TickServiceProvider;
pub use traits::{AsyncProvider, ServiceProvider};
