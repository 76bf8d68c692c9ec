//! Player data reset: job submission, polling and batching.

mod client;
mod model;
mod orchestrator;
mod poller;

pub use client::JobClient;
pub use model::{
    BatchReport, ChunkReport, JobHandle, JobStatus, OverallStatus, ProviderState, ProviderStatus,
    ResetOutcome, ResetResult, parse_job_id,
};
pub use orchestrator::{
    BATCH_CHUNK_SIZE, BatchMode, ResetConfig, ResetConfigBuilder, ResetOrchestrator, plan_chunks,
};
pub use poller::{DEFAULT_POLL_INTERVAL, JobPoller, MAX_POLL_ATTEMPTS, PollOutcome};
