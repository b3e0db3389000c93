//! # Compass Core
//!
//! Logic behind the COMPASS-DRIVE / CYCLE-F demo site.
//!
//! ## Architecture
//!
//! - `facade/` - Synthetic six-stage pipeline runs
//! - `plan/` - Static and live plan providers for the Learn stage
//! - `models` - Plan provider configuration
//! - `probe/` - HTTP probe with classified failures
//! - `catalog` - Heterogeneous catalog document parser
//! - `health` - Health badges derived from probe results
//! - `orchestrator` - Client for the probed orchestrator surface
//! - `config` - Persisted server and probe settings
//!
//! ## Usage
//!
//! ```rust,ignore
//! use compass_core::facade::FacadeGenerator;
//! use compass_core::models::PlanConfig;
//!
//! let generator = FacadeGenerator::from_config(&PlanConfig::from_env());
//! let trace = generator.run("Ship a demo", "p95_latency").await;
//! assert_eq!(trace.stages.len(), 6);
//! ```

pub mod catalog;
pub mod config;
pub mod facade;
pub mod health;
pub mod models;
pub mod orchestrator;
pub mod plan;
pub mod probe;
