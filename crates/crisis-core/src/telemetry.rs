//! Tracing setup and metric names

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "CRISIS_LOG";

/// Counter: injects accepted and committed
pub const INJECTS_ACCEPTED: &str = "crisis_injects_accepted_total";
/// Counter: drafts rejected, labelled by failing check
pub const DRAFTS_REJECTED: &str = "crisis_drafts_rejected_total";
/// Counter: actions abandoned after exhausting refinements
pub const ACTIONS_ABANDONED: &str = "crisis_actions_abandoned_total";
/// Counter: collaborator timeouts, labelled by collaborator
pub const COLLABORATOR_TIMEOUTS: &str = "crisis_collaborator_timeouts_total";

/// Install the global subscriber
///
/// Filter comes from `CRISIS_LOG`, falling back to `default_level`. Returns
/// an error message if a subscriber is already installed.
pub fn init(default_level: &str, json: bool) -> Result<(), String> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    result.map_err(|e| e.to_string())
}
