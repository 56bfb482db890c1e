//! Expectations evaluated against probe responses.

use std::fmt;

use tracing::{info, warn};

use super::{ProbeRequest, ProbeResponse, Prober};

/// Acceptable status codes for a check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StatusExpectation {
    /// Exactly this status.
    Exactly(u16),
    /// Any of these statuses.
    OneOf(Vec<u16>),
}

impl StatusExpectation {
    /// Returns `true` when `status` satisfies the expectation.
    #[must_use]
    pub fn matches(&self, status: u16) -> bool {
        match self {
            Self::Exactly(expected) => *expected == status,
            Self::OneOf(expected) => expected.contains(&status),
        }
    }
}

impl fmt::Display for StatusExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(expected) => write!(f, "{expected}"),
            Self::OneOf(expected) => {
                let rendered = expected
                    .iter()
                    .map(u16::to_string)
                    .collect::<Vec<_>>()
                    .join(" or ");
                f.write_str(&rendered)
            }
        }
    }
}

/// How a check ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CheckOutcome {
    /// Every response met the expectation.
    Passed,
    /// A response did not meet the expectation.
    Failed {
        /// Description of the mismatch.
        reason: String,
    },
    /// A transport error ended the check before it could be evaluated.
    Errored {
        /// Description of the transport error.
        reason: String,
    },
}

/// Result of running one [`Check`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CheckReport {
    /// Name of the check.
    pub name: String,
    /// How the check ended.
    pub outcome: CheckOutcome,
    /// Status codes observed, one per completed request.
    pub observed_statuses: Vec<u16>,
}

impl CheckReport {
    /// Returns `true` when the check passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.outcome, CheckOutcome::Passed)
    }
}

/// A named request plus the response it must produce.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Check {
    /// Name used in reports and logs.
    pub name: String,
    /// Request to send.
    pub request: ProbeRequest,
    /// Acceptable status codes.
    pub expected_status: StatusExpectation,
    /// Substring the body must contain, if any.
    pub body_contains: Option<String>,
    /// How many times to send the request. Values below one are treated as
    /// one. Every repetition must return the same status and body as the
    /// first.
    pub repetitions: u32,
}

impl Check {
    /// Creates a check that sends `request` once.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        request: ProbeRequest,
        expected_status: StatusExpectation,
    ) -> Self {
        Self {
            name: name.into(),
            request,
            expected_status,
            body_contains: None,
            repetitions: 1,
        }
    }

    /// Requires the body to contain `needle`.
    #[must_use]
    pub fn body_contains(mut self, needle: impl Into<String>) -> Self {
        self.body_contains = Some(needle.into());
        self
    }

    /// Sends the request `repetitions` times.
    #[must_use]
    pub const fn repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = repetitions;
        self
    }

    /// Runs the check sequentially against `prober`.
    ///
    /// A transport error ends the check immediately with
    /// [`CheckOutcome::Errored`]; the first mismatch ends it with
    /// [`CheckOutcome::Failed`].
    pub async fn run<P: Prober + ?Sized>(&self, prober: &P) -> CheckReport {
        let mut observed_statuses = Vec::new();
        let mut baseline: Option<ProbeResponse> = None;

        for attempt in 1..=self.repetitions.max(1) {
            let response = match prober.send(&self.request).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(check = %self.name, error = %err, "check aborted by transport error");
                    return self.report(
                        CheckOutcome::Errored {
                            reason: err.to_string(),
                        },
                        observed_statuses,
                    );
                }
            };
            observed_statuses.push(response.status);

            if let Some(reason) = self.mismatch(&response) {
                warn!(check = %self.name, status = response.status, %reason, "check failed");
                return self.report(CheckOutcome::Failed { reason }, observed_statuses);
            }

            match baseline.as_ref() {
                None => baseline = Some(response),
                Some(first) if *first != response => {
                    let reason = format!(
                        "attempt {attempt} returned status {} with a different body than the first attempt (status {})",
                        response.status, first.status
                    );
                    warn!(check = %self.name, %reason, "check failed");
                    return self.report(CheckOutcome::Failed { reason }, observed_statuses);
                }
                Some(_) => {}
            }
        }

        info!(check = %self.name, statuses = ?observed_statuses, "check passed");
        self.report(CheckOutcome::Passed, observed_statuses)
    }

    fn mismatch(&self, response: &ProbeResponse) -> Option<String> {
        let mut reasons = Vec::new();
        if !self.expected_status.matches(response.status) {
            reasons.push(format!(
                "expected status {} for {} {}, got {}",
                self.expected_status, self.request.method, self.request.url, response.status
            ));
        }
        if let Some(needle) = self.body_contains.as_deref()
            && !response.body.contains(needle)
        {
            reasons.push(format!("response body should contain '{needle}'"));
        }

        if reasons.is_empty() {
            None
        } else {
            Some(reasons.join("; "))
        }
    }

    fn report(&self, outcome: CheckOutcome, observed_statuses: Vec<u16>) -> CheckReport {
        CheckReport {
            name: self.name.clone(),
            outcome,
            observed_statuses,
        }
    }
}
