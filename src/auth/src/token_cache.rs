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

use crate::Result;
use crate::token::{Token, TokenProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
// Using tokio's wrapper makes the cache testable without relying on clock times.
use tokio::time::Instant;

// Tokens are refreshed this long before they actually expire, so a token
// handed out here does not lapse mid-request.
const EXPIRY_BUFFER: Duration = Duration::from_secs(300);

#[derive(Debug)]
pub(crate) struct TokenCache<T>
where
    T: TokenProvider,
{
    // The cached token, or the last seen error.
    token: Arc<Mutex<Result<Token>>>,

    // Tracks if a refresh is ongoing. If the lock is held, there is a refresh.
    refresh_in_progress: Arc<Mutex<()>>,
    // Allows us to await the result of a refresh in multiple tasks.
    refresh_notify: Arc<Notify>,

    // The token provider. This thing does the refreshing.
    inner: Arc<T>,
}

// Returns true if we are holding an error, or a token that has expired or is
// about to.
fn invalid(token: &Result<Token>) -> bool {
    match token {
        Ok(t) => t
            .expires_at
            .is_some_and(|e| e <= Instant::now() + EXPIRY_BUFFER),
        Err(_) => true,
    }
}

// We manually implement the `Clone` trait because the Rust compiler will
// squawk if `T` is not `Clone`, even though we only hold an `Arc<T>`.
impl<T: TokenProvider> Clone for TokenCache<T> {
    fn clone(&self) -> TokenCache<T> {
        TokenCache {
            token: self.token.clone(),
            refresh_in_progress: self.refresh_in_progress.clone(),
            refresh_notify: self.refresh_notify.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<T: TokenProvider> TokenCache<T> {
    pub fn new(inner: T) -> TokenCache<T> {
        TokenCache {
            token: Arc::new(Mutex::new(Err(crate::errors::CredentialsError::from_msg(
                true,
                "no token in the cache yet",
            )))),
            refresh_in_progress: Arc::new(Mutex::new(())),
            refresh_notify: Arc::new(Notify::new()),
            inner: Arc::new(inner),
        }
    }

    // Clones the current token, in a thread-safe manner. Releases the lock on return.
    async fn current_token(&self) -> Result<Token> {
        self.token.lock().await.clone()
    }

    // Drops the cached token so the next request triggers a refresh. Used
    // when the service rejects a token that has not expired yet, for example
    // after the user revokes access.
    pub async fn invalidate(&self) {
        *self.token.lock().await = Err(crate::errors::CredentialsError::from_msg(
            true,
            "token was rejected by the service",
        ));
    }
}

#[async_trait::async_trait]
impl<T: TokenProvider + 'static> TokenProvider for TokenCache<T> {
    async fn token(&self) -> Result<Token> {
        let token = self.current_token().await;

        if !invalid(&token) {
            return token;
        }

        match self.refresh_in_progress.try_lock() {
            // Check if there are any outstanding refreshes...
            Ok(guard) => {
                // No refreshes. We should start one.
                let token = self.inner.token().await;

                // Store the token, or an updated error.
                *self.token.lock().await = token.clone();

                // The refresh is complete. Release the refresh guard.
                drop(guard);

                // Notify any and all waiters.
                self.refresh_notify.notify_waiters();

                // Return here without asking for the token lock again.
                return token;
            }
            Err(_) => {
                // There is already a refresh. We will await its result.
                self.refresh_notify.notified().await;
            }
        }

        // The refresh operation has completed. We should have a new
        // error/token. Return it.
        self.current_token().await
    }
}
