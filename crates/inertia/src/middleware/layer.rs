// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use tower_layer::Layer;

use super::InertiaService;
use crate::Inertia;

/// A layer which wraps the handlers of an Inertia app.
///
/// It makes the adapter available to the handlers, and takes care of asset
/// versioning, flashed data and redirects.
#[derive(Debug, Clone)]
pub struct InertiaLayer {
    inertia: Inertia,
}

impl InertiaLayer {
    /// Create the layer from the adapter
    #[must_use]
    pub fn new(inertia: Inertia) -> Self {
        Self { inertia }
    }
}

impl<S> Layer<S> for InertiaLayer {
    type Service = InertiaService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InertiaService::new(inner, self.inertia.clone())
    }
}
