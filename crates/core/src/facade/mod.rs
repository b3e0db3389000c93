//! # Facade Runs
//!
//! A synthetic CYCLE-F pipeline trace for demos.
//!
//! - `pipeline` - The six stages and their order
//! - `trace` - RunTrace / StageRecord shapes and request parsing
//! - `random` - Injectable source for cosmetic timings and run ids
//! - `generator` - Builds a trace, delegating the Learn stage to a plan provider

pub mod generator;
pub mod pipeline;
pub mod random;
pub mod trace;

pub use generator::{FacadeGenerator, FACTS, TRIGGER};
pub use pipeline::Stage;
pub use random::{FixedRandom, RandomSource, SeededRandom, ThreadRandom};
pub use trace::{Kpis, RunInput, RunTrace, StageRecord, DEFAULT_KPI, DEFAULT_TASK};
