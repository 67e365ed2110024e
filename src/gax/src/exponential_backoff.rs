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

//! Common implementation of exponential backoff.
//!
//! This module provides truncated [exponential backoff] with additive jitter.
//! It implements the [BackoffPolicy] trait.
//!
//! [exponential backoff]: https://en.wikipedia.org/wiki/Exponential_backoff
//! [BackoffPolicy]: crate::backoff_policy::BackoffPolicy

use std::time::Duration;

/// The error type for exponential backoff creation.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("the scaling value ({0}) should be >= 1.0")]
    InvalidScalingFactor(f64),
    #[error("the initial delay ({0:?}) should be greater than zero")]
    InvalidInitialDelay(Duration),
    #[error(
        "the maximum delay ({maximum:?}) should be greater than or equal to the initial delay ({initial:?})"
    )]
    EmptyRange {
        maximum: Duration,
        initial: Duration,
    },
}

/// Builds [ExponentialBackoff] policies.
#[derive(Clone, Debug)]
pub struct ExponentialBackoffBuilder {
    initial_delay: Duration,
    maximum_delay: Duration,
    scaling: f64,
    maximum_jitter: Duration,
}

impl ExponentialBackoffBuilder {
    /// Creates a builder with the default parameters.
    ///
    /// # Example
    /// ```
    /// # use basecamp_gax::exponential_backoff::Error;
    /// # use basecamp_gax::exponential_backoff::ExponentialBackoffBuilder;
    /// use std::time::Duration;
    ///
    /// let policy = ExponentialBackoffBuilder::new()
    ///         .with_initial_delay(Duration::from_millis(100))
    ///         .with_maximum_delay(Duration::from_secs(5))
    ///         .with_scaling(4.0)
    ///         .build()?;
    /// # Ok::<(), Error>(())
    /// ```
    pub fn new() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            maximum_delay: Duration::from_secs(60),
            scaling: 2.0,
            maximum_jitter: Duration::from_millis(100),
        }
    }

    /// Change the initial delay.
    pub fn with_initial_delay<V: Into<Duration>>(mut self, v: V) -> Self {
        self.initial_delay = v.into();
        self
    }

    /// Change the maximum delay.
    pub fn with_maximum_delay<V: Into<Duration>>(mut self, v: V) -> Self {
        self.maximum_delay = v.into();
        self
    }

    /// Change the scaling factor in this backoff policy.
    pub fn with_scaling<V: Into<f64>>(mut self, v: V) -> Self {
        self.scaling = v.into();
        self
    }

    /// Change the maximum jitter added to each delay.
    ///
    /// Each computed delay gets a uniformly random addition in
    /// `[0, maximum_jitter]`, so concurrent clients spread their retries.
    /// Set this to zero for fully deterministic delays.
    pub fn with_maximum_jitter<V: Into<Duration>>(mut self, v: V) -> Self {
        self.maximum_jitter = v.into();
        self
    }

    /// Creates a new exponential backoff policy.
    ///
    /// # Example
    /// ```
    /// # use basecamp_gax::exponential_backoff::Error;
    /// # use basecamp_gax::exponential_backoff::ExponentialBackoffBuilder;
    /// # use basecamp_gax::backoff_policy::BackoffPolicy;
    /// use std::time::{Duration, Instant};
    /// let backoff = ExponentialBackoffBuilder::new()
    ///     .with_initial_delay(Duration::from_secs(5))
    ///     .with_maximum_delay(Duration::from_secs(50))
    ///     .with_scaling(2.0)
    ///     .build()?;
    /// let p = backoff.on_failure(Instant::now(), 1);
    /// assert!(p >= Duration::from_secs(5));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn build(self) -> Result<ExponentialBackoff, Error> {
        if self.scaling < 1.0 {
            return Err(Error::InvalidScalingFactor(self.scaling));
        }
        if self.initial_delay.is_zero() {
            return Err(Error::InvalidInitialDelay(self.initial_delay));
        }
        if self.maximum_delay < self.initial_delay {
            return Err(Error::EmptyRange {
                maximum: self.maximum_delay,
                initial: self.initial_delay,
            });
        }
        Ok(ExponentialBackoff {
            initial_delay: self.initial_delay,
            maximum_delay: self.maximum_delay,
            scaling: self.scaling,
            maximum_jitter: self.maximum_jitter,
        })
    }

    /// Creates a new exponential backoff policy clamping the ranges towards
    /// usable values.
    ///
    /// The maximum delay is clamped first, to be between one second and one
    /// day (both inclusive). Then the initial delay is clamped to be between
    /// one millisecond and the maximum delay. Finally the scaling factor is
    /// clamped to the `[1.0, 32.0]` range.
    ///
    /// # Example
    /// ```
    /// # use basecamp_gax::exponential_backoff::ExponentialBackoffBuilder;
    /// # use basecamp_gax::backoff_policy::BackoffPolicy;
    /// use std::time::{Duration, Instant};
    /// let backoff = ExponentialBackoffBuilder::new().clamp();
    /// assert!(backoff.on_failure(Instant::now(), 1) > Duration::ZERO);
    /// ```
    pub fn clamp(self) -> ExponentialBackoff {
        let scaling = self.scaling.clamp(1.0, 32.0);
        let maximum_delay = self
            .maximum_delay
            .clamp(Duration::from_secs(1), Duration::from_secs(24 * 60 * 60));
        let initial_delay = self
            .initial_delay
            .clamp(Duration::from_millis(1), maximum_delay);
        ExponentialBackoff {
            initial_delay,
            maximum_delay,
            scaling,
            maximum_jitter: self.maximum_jitter.min(maximum_delay),
        }
    }
}

impl Default for ExponentialBackoffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Implements truncated exponential backoff with additive jitter.
#[derive(Debug)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    maximum_delay: Duration,
    scaling: f64,
    maximum_jitter: Duration,
}

impl ExponentialBackoff {
    fn delay(&self, _loop_start: std::time::Instant, attempt_count: u32) -> Duration {
        let exp = std::cmp::min(i32::MAX as u32, attempt_count) as i32;
        let exp = exp.saturating_sub(1);
        let scaling = self.scaling.powi(exp);
        if scaling >= self.maximum_delay.div_duration_f64(self.initial_delay) {
            self.maximum_delay
        } else {
            // .mul_f64() cannot panic because (1) we guarantee scaling >= 1.0,
            // and (2) we just checked that
            //     self.initial_delay * scaling < maximum_delay.
            self.initial_delay.mul_f64(scaling)
        }
    }

    fn delay_with_jitter(
        &self,
        loop_start: std::time::Instant,
        attempt_count: u32,
        rng: &mut impl rand::Rng,
    ) -> Duration {
        let delay = self.delay(loop_start, attempt_count);
        if self.maximum_jitter.is_zero() {
            return delay;
        }
        delay + rng.random_range(Duration::ZERO..=self.maximum_jitter)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            maximum_delay: Duration::from_secs(60),
            scaling: 2.0,
            maximum_jitter: Duration::from_millis(100),
        }
    }
}

impl crate::backoff_policy::BackoffPolicy for ExponentialBackoff {
    fn on_failure(&self, loop_start: std::time::Instant, attempt_count: u32) -> Duration {
        self.delay_with_jitter(loop_start, attempt_count, &mut rand::rng())
    }
}
