// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use figment::{Figment, Profile, error::Error as FigmentError};
use serde::de::DeserializeOwned;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A part of the configuration, which can be loaded on its own
pub trait ConfigurationSection: Sized + DeserializeOwned {
    /// Where this section lives relative to the root
    const PATH: Option<&'static str> = None;

    /// Validate the configuration section
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    fn validate(&self, _figment: &Figment) -> Result<(), BoxError> {
        Ok(())
    }

    /// Extract the section from a Figment instance, and validate it
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration could not be loaded, or is
    /// invalid
    fn extract(figment: &Figment) -> Result<Self, BoxError> {
        let this: Self = if let Some(path) = Self::PATH {
            figment.extract_inner(path)?
        } else {
            figment.extract()?
        };

        this.validate(figment)?;
        Ok(this)
    }
}

/// Extract a [`ConfigurationSection`], falling back to its default value
/// when it is absent
pub trait ConfigurationSectionExt: ConfigurationSection + Default {
    /// Extract the section from the given [`Figment`], or return the default
    /// value if the section is not present.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is present but invalid
    fn extract_or_default(figment: &Figment) -> Result<Self, BoxError> {
        let this: Self = if let Some(path) = Self::PATH {
            if !figment.contains(path) {
                return Ok(Self::default());
            }

            figment.extract_inner(path)?
        } else {
            figment.extract()?
        };

        this.validate(figment)?;
        Ok(this)
    }
}

impl<T: ConfigurationSection + Default> ConfigurationSectionExt for T {}

/// Point an error at a field of a section, so that it mentions where the
/// faulty value comes from
pub(crate) fn error_on_field(
    figment: &Figment,
    section: &'static str,
    field: &'static str,
    mut error: FigmentError,
) -> FigmentError {
    error.metadata = figment.find_metadata(section).cloned();
    error.profile = Some(Profile::Default);
    error.path = vec![section.to_owned(), field.to_owned()];
    error
}
