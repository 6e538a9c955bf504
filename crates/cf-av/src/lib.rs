//! # cf-av
//!
//! Everything that touches the media engine or the filesystem on behalf of
//! the clipforge pipeline.
//!
//! - **Operation catalog** ([`catalog`]) -- the registry of supported
//!   operations, wire parsing, validation, and compilation into a
//!   [`CompiledInvocation`].
//! - **Engine discovery** ([`EngineLocator`]) -- resolves and validates the
//!   `ffmpeg` binary once, producing a shared [`ResolvedEngine`].
//! - **Command execution** ([`ToolCommand`]) -- async subprocess builder with
//!   optional timeout.
//! - **Local execution** ([`LocalEngine`]) -- the [`MediaRunner`] backed by
//!   the resolved engine.
//! - **Scratch files** ([`Workspace`], [`TempArtifact`]) and **durable
//!   storage** ([`DurableStorage`]).

pub mod catalog;
pub mod command;
pub mod download;
pub mod local;
pub mod storage;
pub mod tools;
pub mod workspace;

pub use catalog::{CompileContext, CompiledInvocation};
pub use command::{ToolCommand, ToolOutput};
pub use local::{LocalEngine, MediaRunner, RunOutput};
pub use storage::{DurableStorage, HttpStorage, LocalDirStorage};
pub use tools::{EngineLocator, EngineSource, ResolvedEngine};
pub use workspace::{TempArtifact, Workspace};
