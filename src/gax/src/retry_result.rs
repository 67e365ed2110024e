// Copyright 2025 Basecamp SDK Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::error::Error;

/// The result of a retry policy decision.
///
/// The retry loop queries the [RetryPolicy][crate::retry_policy::RetryPolicy]
/// after each failed attempt. The policy examines the error, the number of
/// attempts, and the operation's idempotency, and returns one of these
/// variants.
#[derive(Debug)]
pub enum RetryResult {
    /// The failure cannot be recovered by retrying. Stop immediately.
    Permanent(Error),
    /// The error could be retried, but the policy is exhausted. Stop.
    Exhausted(Error),
    /// The error may recover on a later attempt. Continue the loop.
    Continue(Error),
}

impl RetryResult {
    /// Returns true for [Permanent][RetryResult::Permanent] results.
    pub fn is_permanent(&self) -> bool {
        matches!(self, RetryResult::Permanent(_))
    }

    /// Returns true for [Exhausted][RetryResult::Exhausted] results.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryResult::Exhausted(_))
    }

    /// Returns true for [Continue][RetryResult::Continue] results.
    pub fn is_continue(&self) -> bool {
        matches!(self, RetryResult::Continue(_))
    }
}
