//! # xbldev-core
//!
//! Clients for Xbox Live title services used during development.
//!
//! ## Features
//!
//! - **Reset jobs**: submit a player data reset and poll it to completion
//!   within a fixed attempt budget
//! - **Batches**: reset many players in chunks, sequentially or overlapped
//!   for publisher accounts
//! - **Transport seam**: requests go through [`HttpTransport`], so every
//!   client can be driven by a scripted transport in tests
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use xbldev_core::{ReqwestTransport, ResetConfig, ResetOrchestrator};
//!
//! let orchestrator = ResetOrchestrator::new(
//!     Arc::new(ReqwestTransport::default()),
//!     ResetConfig::default(),
//! );
//! let outcome = orchestrator
//!     .reset_player_data(&session, scid, "XDKS.1", "2814641234567890")
//!     .await?;
//! println!("{}", outcome.result);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;

pub mod authorizer;
pub mod contract;
pub mod http;
pub mod reset;

pub use authorizer::Authorizer;
pub use error::{Error, ErrorKind, Result};
pub use http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use reset::{
    BATCH_CHUNK_SIZE, BatchMode, BatchReport, ChunkReport, DEFAULT_POLL_INTERVAL, JobClient,
    JobHandle, JobPoller, JobStatus, MAX_POLL_ATTEMPTS, OverallStatus, PollOutcome,
    ProviderState, ProviderStatus, ResetConfig, ResetConfigBuilder, ResetOrchestrator,
    ResetOutcome, ResetResult,
};
