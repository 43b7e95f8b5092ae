//! ProofPix fingerprinting worker.
//!
//! Takes `{user_id, asset_id}` triggers for uploaded images and, for each,
//! runs the [`pipeline::Pipeline`]: authenticity analysis and embedding in
//! parallel, near-duplicate search and index update, asset record commit,
//! certificate issuance, transparency-log append and badge rendering.
//!
//! # Modules
//!
//! - [`analysis`] - parser for the analysis model's text answer
//! - [`pipeline`] - the per-asset stages and their report
//! - [`pool`] - bounded queue and concurrency limit for triggers
//! - [`clients`] - HTTP implementations of the model and log collaborators
//! - [`verify`] - transparency-log inclusion lookups
//! - [`scheduler`] - periodic index snapshots
//! - [`server`] - axum routes for triggers, verification and health

pub mod analysis;
pub mod clients;
pub mod pipeline;
pub mod pool;
pub mod scheduler;
pub mod server;
pub mod verify;

#[cfg(test)]
mod log_capture;

pub use analysis::{parse_analysis, ParseError, ParsedAnalysis};
pub use pipeline::{AssetTrigger, Collaborators, Outcome, Pipeline, PipelineReport, Stage, StageStatus};
pub use pool::{PoolError, PoolStats, TriggerHandler, WorkerPool};
pub use scheduler::SnapshotScheduler;
pub use server::{create_router, AppState};
pub use verify::{Verification, Verifier, VerifyError};
