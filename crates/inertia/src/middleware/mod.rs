// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Tower middleware enforcing the Inertia protocol around the handlers

mod layer;
mod service;

pub use self::{layer::InertiaLayer, service::InertiaService};
