//! Warden library for restart admission control
//!
//! This crate provides the core functionality for:
//! - Live census of restarting vs total pods
//! - Concurrency-bounded restart admission
//! - Sentinel-based restart triggering
//! - The reconnecting watch loop that drives decisions
//! - Health checks and observability

pub mod admission;
pub mod census;
pub mod gateway;
pub mod health;
pub mod models;
pub mod observability;
pub mod trigger;
pub mod watch;

pub use census::Census;
pub use gateway::{GatewayConfig, GatewayError, KubeGateway, PodGateway};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{StructuredLogger, WardenMetrics};
pub use trigger::RestartTrigger;
pub use watch::{WatchConfig, WatchLoop, WatchState};
