// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Keep validation errors and the clear-history flag across a redirect

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use headers::{Cookie, HeaderMapExt as _};
use http::request::Parts;
use tokio::sync::Mutex;

use crate::{BoxError, ValidationErrors};

/// Stores data for the next request of the same client, usually in its
/// session
#[async_trait]
pub trait FlashProvider: Send + Sync {
    /// Keep validation errors for the next request
    async fn flash_errors(&self, parts: &Parts, errors: ValidationErrors) -> Result<(), BoxError>;

    /// Take the validation errors kept by the previous request
    async fn get_errors(&self, parts: &Parts) -> Result<ValidationErrors, BoxError>;

    /// Ask the next request to clear the client history
    async fn flash_clear_history(&self, _parts: &Parts) -> Result<(), BoxError> {
        Ok(())
    }

    /// Whether the previous request asked to clear the client history
    async fn should_clear_history(&self, _parts: &Parts) -> Result<bool, BoxError> {
        Ok(false)
    }
}

#[async_trait]
impl<T: FlashProvider + ?Sized> FlashProvider for Arc<T> {
    async fn flash_errors(&self, parts: &Parts, errors: ValidationErrors) -> Result<(), BoxError> {
        (**self).flash_errors(parts, errors).await
    }

    async fn get_errors(&self, parts: &Parts) -> Result<ValidationErrors, BoxError> {
        (**self).get_errors(parts).await
    }

    async fn flash_clear_history(&self, parts: &Parts) -> Result<(), BoxError> {
        (**self).flash_clear_history(parts).await
    }

    async fn should_clear_history(&self, parts: &Parts) -> Result<bool, BoxError> {
        (**self).should_clear_history(parts).await
    }
}

#[derive(Debug)]
struct Flashed {
    errors: ValidationErrors,
    clear_history: bool,
    flashed_at: Instant,
}

impl Flashed {
    fn new() -> Self {
        Self {
            errors: ValidationErrors::new(),
            clear_history: false,
            flashed_at: Instant::now(),
        }
    }
}

type SessionKey = dyn Fn(&Parts) -> Option<String> + Send + Sync;

/// A [`FlashProvider`] keeping the data in memory, keyed by a session
/// identifier extracted from the request.
///
/// Data is lost on restart and not shared between instances, which makes it
/// suitable for development and tests only. Entries which are not read
/// within [`MemoryFlashProvider::DEFAULT_TTL`] (see
/// [`MemoryFlashProvider::with_ttl`]) are evicted on the next write.
pub struct MemoryFlashProvider {
    session_key: Box<SessionKey>,
    ttl: Duration,
    store: Mutex<HashMap<String, Flashed>>,
}

impl std::fmt::Debug for MemoryFlashProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFlashProvider").finish_non_exhaustive()
    }
}

impl MemoryFlashProvider {
    /// How long flashed data is kept when nobody reads it
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

    /// Key the flashed data with the given function. Requests without a key
    /// don't get any flashed data.
    pub fn new(session_key: impl Fn(&Parts) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            session_key: Box::new(session_key),
            ttl: Self::DEFAULT_TTL,
            store: Mutex::default(),
        }
    }

    /// Evict flashed data which was not read after `ttl`
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Get the entry of the given session, evicting the expired ones
    fn entry<'a>(
        &self,
        store: &'a mut HashMap<String, Flashed>,
        key: String,
    ) -> &'a mut Flashed {
        store.retain(|_, flashed| flashed.flashed_at.elapsed() < self.ttl);
        let flashed = store.entry(key).or_insert_with(Flashed::new);
        flashed.flashed_at = Instant::now();
        flashed
    }

    /// Get the entry of the given session, if it has not expired
    fn get_mut<'a>(
        &self,
        store: &'a mut HashMap<String, Flashed>,
        key: &str,
    ) -> Option<&'a mut Flashed> {
        if store
            .get(key)
            .is_some_and(|flashed| flashed.flashed_at.elapsed() >= self.ttl)
        {
            store.remove(key);
        }

        store.get_mut(key)
    }

    /// Key the flashed data with the value of the given cookie
    #[must_use]
    pub fn with_cookie(name: &'static str) -> Self {
        Self::new(move |parts| {
            parts
                .headers
                .typed_get::<Cookie>()
                .and_then(|cookie| cookie.get(name).map(ToOwned::to_owned))
        })
    }
}

#[async_trait]
impl FlashProvider for MemoryFlashProvider {
    async fn flash_errors(&self, parts: &Parts, errors: ValidationErrors) -> Result<(), BoxError> {
        let Some(key) = (self.session_key)(parts) else {
            return Ok(());
        };

        let mut store = self.store.lock().await;
        self.entry(&mut store, key).errors.extend(errors);
        Ok(())
    }

    async fn get_errors(&self, parts: &Parts) -> Result<ValidationErrors, BoxError> {
        let Some(key) = (self.session_key)(parts) else {
            return Ok(ValidationErrors::new());
        };

        let mut store = self.store.lock().await;
        let Some(flashed) = self.get_mut(&mut store, &key) else {
            return Ok(ValidationErrors::new());
        };

        let errors = std::mem::take(&mut flashed.errors);
        if !flashed.clear_history {
            store.remove(&key);
        }
        Ok(errors)
    }

    async fn flash_clear_history(&self, parts: &Parts) -> Result<(), BoxError> {
        let Some(key) = (self.session_key)(parts) else {
            return Ok(());
        };

        let mut store = self.store.lock().await;
        self.entry(&mut store, key).clear_history = true;
        Ok(())
    }

    async fn should_clear_history(&self, parts: &Parts) -> Result<bool, BoxError> {
        let Some(key) = (self.session_key)(parts) else {
            return Ok(false);
        };

        let mut store = self.store.lock().await;
        let Some(flashed) = self.get_mut(&mut store, &key) else {
            return Ok(false);
        };

        let clear_history = std::mem::take(&mut flashed.clear_history);
        if flashed.errors.is_empty() {
            store.remove(&key);
        }
        Ok(clear_history)
    }
}
