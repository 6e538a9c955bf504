//! # cf-pipeline
//!
//! Orchestration of media transformation jobs.
//!
//! This crate provides:
//!
//! - **[`Orchestrator`]** -- validates, orders, and executes a batch of
//!   operations on one source, returning a uniform [`JobResult`].
//! - **[`BackendSelector`]** -- picks the remote processing service when it
//!   reports healthy, otherwise the local engine.
//! - **[`RemoteEngineClient`]** -- HTTP client for the processing service.
//! - **[`ArtifactLifecycle`]** -- fetches inputs, publishes outputs, and
//!   releases scratch files.
//! - **[`presets`]** -- named styles that expand into fixed operation lists.

pub mod artifacts;
pub mod job;
pub mod orchestrator;
pub mod presets;
pub mod remote;
pub mod selector;

pub use artifacts::ArtifactLifecycle;
pub use job::{JobResult, JobState, ProcessingJob};
pub use orchestrator::Orchestrator;
pub use presets::StylePreset;
pub use remote::{EngineHealth, RemoteEngineClient};
pub use selector::{BackendKind, BackendSelector};
