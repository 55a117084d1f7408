//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, file I/O, metrics). Each
//! sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `activity`: activity sinks (tracing, channel, fan-out)
//! - `metrics`: Prometheus metrics export and health checks
//! - `opensea`: OpenSea v2 REST marketplace client
//! - `persistence`: settings file, account file, activity journal

pub mod activity;
pub mod metrics;
pub mod opensea;
pub mod persistence;
