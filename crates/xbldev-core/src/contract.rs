//! Wire constants shared by the title service clients.

/// Contract version of the player data reset job endpoints.
pub const JOB_CONTRACT_VERSION: &str = "100";

/// Header echoing the correlation id returned at job submission.
pub const CORRELATION_ID_HEADER: &str = "X-XblCorrelationId";

/// Default player data reset service.
pub const DEFAULT_JOB_SERVICE_URL: &str = "https://eraser.xboxlive.com/";

pub use xbldev_auth::header::{AUTHORIZATION_HEADER, CONTRACT_VERSION_HEADER};
