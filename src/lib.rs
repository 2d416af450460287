//! Crashprobe - Deliberate-Crash Web Application
//!
//! A minimal web application whose single control intentionally raises an
//! unrecoverable fault, used to validate a monitoring/alerting pipeline
//! end-to-end: press the button, fail the request, watch the alert fire.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                       crashprobe                         │
//! ├─────────────────────────────────────────────────────────┤
//! │  ┌────────────┐    ┌───────────────┐    ┌────────────┐  │
//! │  │    HTTP    │───▶│     Fault     │───▶│ Telemetry  │  │
//! │  │  Surface   │    │    Trigger    │    │   Bridge   │  │
//! │  └────────────┘    └───────────────┘    └────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`] - Frozen startup configuration
//! - [`error`] - Error types
//! - [`fault`] - The intentional fault trigger
//! - [`server`] - HTTP surface (page + crash endpoint)
//! - [`telemetry`] - Optional telemetry export bridge

pub mod config;
pub mod error;
pub mod fault;
pub mod server;
pub mod telemetry;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
pub use server::{HttpServer, ServerContext};
pub use telemetry::{Telemetry, TelemetrySink};
