// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::store::ChallengeState;
use crate::validation::{self, AppraisalStatus, ValidationSummary};

/// Supply chain or quote validation result, as seen by the orchestrators
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Passed(ValidationSummary),
    Failed(ValidationSummary),
    /// Validation was not performed
    Skipped,
    /// The validator could not run; treated as a failure
    Errored(String),
}

impl ValidationOutcome {
    pub fn from_summary(r: Result<ValidationSummary, validation::Error>) -> Self {
        match r {
            Ok(s) if s.is_pass() => ValidationOutcome::Passed(s),
            Ok(s) => ValidationOutcome::Failed(s),
            Err(e) => ValidationOutcome::Errored(e.to_string()),
        }
    }

    pub fn from_optional(r: Result<Option<ValidationSummary>, validation::Error>) -> Self {
        match r {
            Ok(None) => ValidationOutcome::Skipped,
            Ok(Some(s)) => Self::from_summary(Ok(s)),
            Err(e) => ValidationOutcome::Errored(e.to_string()),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(
            self,
            ValidationOutcome::Passed(_) | ValidationOutcome::Skipped
        )
    }

    pub fn status(&self) -> AppraisalStatus {
        match self {
            ValidationOutcome::Passed(_) => AppraisalStatus::Pass,
            ValidationOutcome::Failed(_) | ValidationOutcome::Errored(_) => AppraisalStatus::Fail,
            ValidationOutcome::Skipped => AppraisalStatus::Unknown,
        }
    }

    pub fn summary(&self) -> Option<&ValidationSummary> {
        match self {
            ValidationOutcome::Passed(s) | ValidationOutcome::Failed(s) => Some(s),
            _ => None,
        }
    }
}

/// Result of presenting a nonce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemResult {
    Redeemed(ChallengeState),
    /// Never issued, already redeemed or expired
    NotFound,
}

impl From<Option<ChallengeState>> for RedeemResult {
    fn from(s: Option<ChallengeState>) -> Self {
        match s {
            Some(s) => RedeemResult::Redeemed(s),
            None => RedeemResult::NotFound,
        }
    }
}
