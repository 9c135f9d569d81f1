//! Header names and problem type URIs.

/// Request correlation header.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

pub(crate) const PROBLEM_INTERNAL: &str = "https://reelfetch.dev/problems/internal";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://reelfetch.dev/problems/bad-request";
pub(crate) const PROBLEM_NOT_FOUND: &str = "https://reelfetch.dev/problems/not-found";
pub(crate) const PROBLEM_CAPACITY: &str = "https://reelfetch.dev/problems/capacity-exceeded";
pub(crate) const PROBLEM_NOT_CONFIGURED: &str = "https://reelfetch.dev/problems/not-configured";
pub(crate) const PROBLEM_UPSTREAM: &str = "https://reelfetch.dev/problems/upstream";
pub(crate) const PROBLEM_UPSTREAM_TIMEOUT: &str = "https://reelfetch.dev/problems/upstream-timeout";
