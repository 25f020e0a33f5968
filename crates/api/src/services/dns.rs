//! DNS resolution with timeouts and an explicit error policy.
//!
//! Reputation and authentication checks treat the resolver as a best-effort
//! oracle: a lookup failure must never fail the check itself. That choice is
//! encoded as an `ErrorPolicy` value instead of being implicit in each call
//! site.

use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::{Resolver, TokioResolver};
use std::time::Duration;
use thiserror::Error;

/// Default per-lookup timeout.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// What to do when a DNS lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Substitute a caller-provided default; a broken resolver reads as
    /// "nothing found" rather than failing the whole check.
    FailOpen,
    /// Propagate the error to the caller.
    FailClosed,
}

/// Applies an error policy to a lookup result.
pub fn apply_policy<T, E>(policy: ErrorPolicy, default: T, result: Result<T, E>) -> Result<T, E> {
    match (policy, result) {
        (_, Ok(value)) => Ok(value),
        (ErrorPolicy::FailOpen, Err(_)) => Ok(default),
        (ErrorPolicy::FailClosed, Err(err)) => Err(err),
    }
}

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("DNS lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("DNS lookup failed: {0}")]
    Lookup(String),
}

/// Resolver wrapper that bounds every lookup with a timeout.
///
/// NXDOMAIN and empty answers surface as errors from the underlying
/// resolver; callers decide how to treat them via `apply_policy`.
#[derive(Clone)]
pub struct CheckedResolver {
    resolver: TokioResolver,
    timeout: Duration,
}

impl CheckedResolver {
    /// Builds a resolver from the system configuration.
    pub fn from_system() -> Result<Self, DnsError> {
        let resolver = Resolver::builder_tokio()
            .map_err(|e| DnsError::Lookup(e.to_string()))?
            .build();

        Ok(Self {
            resolver,
            timeout: LOOKUP_TIMEOUT,
        })
    }

    /// Whether an A record exists for `name`.
    pub async fn has_a_record(&self, name: &str) -> Result<bool, DnsError> {
        let lookup = tokio::time::timeout(
            self.timeout,
            self.resolver.lookup(name, RecordType::A),
        )
        .await
        .map_err(|_| DnsError::Timeout(self.timeout))?
        .map_err(|e| DnsError::Lookup(e.to_string()))?;

        Ok(lookup.record_iter().next().is_some())
    }

    /// TXT records at `name`, each joined from its character strings.
    pub async fn txt_records(&self, name: &str) -> Result<Vec<String>, DnsError> {
        let lookup = tokio::time::timeout(self.timeout, self.resolver.txt_lookup(name))
            .await
            .map_err(|_| DnsError::Timeout(self.timeout))?
            .map_err(|e| DnsError::Lookup(e.to_string()))?;

        let records = lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|part| String::from_utf8_lossy(part).into_owned())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .collect();

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_open_substitutes_default() {
        let result: Result<bool, &str> = Err("resolver down");
        assert_eq!(apply_policy(ErrorPolicy::FailOpen, false, result), Ok(false));

        let result: Result<Vec<String>, &str> = Err("resolver down");
        assert_eq!(
            apply_policy(ErrorPolicy::FailOpen, Vec::new(), result),
            Ok(Vec::new())
        );
    }

    #[test]
    fn test_fail_open_passes_through_ok() {
        let result: Result<bool, &str> = Ok(true);
        assert_eq!(apply_policy(ErrorPolicy::FailOpen, false, result), Ok(true));
    }

    #[test]
    fn test_fail_closed_propagates_error() {
        let result: Result<bool, &str> = Err("resolver down");
        assert_eq!(
            apply_policy(ErrorPolicy::FailClosed, false, result),
            Err("resolver down")
        );
    }
}
