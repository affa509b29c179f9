// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Props passed to the page components

use std::{collections::BTreeMap, future::Future, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A type-erased error, as returned by prop resolvers and flash providers
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Validation errors, sent to the client in the `errors` prop
pub type ValidationErrors = BTreeMap<String, Value>;

/// Computes the value of a prop when the page is rendered.
///
/// Resolvers are only called if the prop ends up in the response, which
/// makes them the right place for expensive computations.
#[async_trait]
pub trait PropResolver: Send + Sync {
    /// Compute the value of the prop
    async fn resolve(&self) -> Result<Value, BoxError>;
}

struct AsyncFnResolver<F>(F);

#[async_trait]
impl<F, Fut, T, E> PropResolver for AsyncFnResolver<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Serialize + Send,
    E: Into<BoxError> + Send,
{
    async fn resolve(&self) -> Result<Value, BoxError> {
        let value = (self.0)().await.map_err(Into::into)?;
        Ok(serde_json::to_value(value)?)
    }
}

struct FnResolver<F>(F);

#[async_trait]
impl<F, T, E> PropResolver for FnResolver<F>
where
    F: Fn() -> Result<T, E> + Send + Sync,
    T: Serialize,
    E: Into<BoxError>,
{
    async fn resolve(&self) -> Result<Value, BoxError> {
        let value = (self.0)().map_err(Into::into)?;
        Ok(serde_json::to_value(value)?)
    }
}

/// How a prop behaves on first visits and partial reloads
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PropKind {
    /// Sent on first visits, and on partial reloads when requested
    #[default]
    Regular,

    /// Always sent, even when a partial reload did not request it
    Always,

    /// Never sent on first visits, only when a partial reload asks for it
    Optional,

    /// Not sent on first visits. The client fetches it right after, along
    /// with the other deferred props of the same group.
    Deferred {
        /// The group the prop is fetched with
        group: String,
    },
}

#[derive(Clone)]
enum PropValue {
    Ready(Value),
    Resolver(Arc<dyn PropResolver>),
}

/// A single prop, along with how it should be sent to the client
#[derive(Clone)]
pub struct Prop {
    value: PropValue,
    kind: PropKind,
    merge: bool,
}

impl std::fmt::Debug for Prop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Prop");
        match &self.value {
            PropValue::Ready(value) => debug.field("value", value),
            PropValue::Resolver(_) => debug.field("value", &"<resolver>"),
        };
        debug
            .field("kind", &self.kind)
            .field("merge", &self.merge)
            .finish()
    }
}

impl Prop {
    fn with_value(value: PropValue) -> Self {
        Self {
            value,
            kind: PropKind::Regular,
            merge: false,
        }
    }

    /// A prop with a known value
    pub fn value(value: impl Into<Value>) -> Self {
        Self::with_value(PropValue::Ready(value.into()))
    }

    /// A prop out of any serializable value
    ///
    /// # Errors
    ///
    /// Returns an error if the value fails to serialize
    pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::value(serde_json::to_value(value)?))
    }

    /// A prop computed by an async closure, only when it gets sent
    pub fn lazy<F, Fut, T, E>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        Self::resolver(AsyncFnResolver(f))
    }

    /// A prop computed by a closure, only when it gets sent
    pub fn from_fn<F, T, E>(f: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        T: Serialize + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::resolver(FnResolver(f))
    }

    /// A prop computed by a [`PropResolver`]
    pub fn resolver(resolver: impl PropResolver + 'static) -> Self {
        Self::with_value(PropValue::Resolver(Arc::new(resolver)))
    }

    /// A prop sent on every response, even on partial reloads which didn't
    /// ask for it
    pub fn always(prop: impl Into<Prop>) -> Self {
        Self {
            kind: PropKind::Always,
            ..prop.into()
        }
    }

    /// A prop only sent when a partial reload asks for it
    pub fn optional(prop: impl Into<Prop>) -> Self {
        Self {
            kind: PropKind::Optional,
            ..prop.into()
        }
    }

    /// A prop fetched by the client right after the first render, in the
    /// `default` group
    pub fn defer(prop: impl Into<Prop>) -> Self {
        Self::defer_in("default", prop)
    }

    /// A prop fetched by the client right after the first render, along
    /// with the other props of the same group
    pub fn defer_in(group: impl Into<String>, prop: impl Into<Prop>) -> Self {
        Self {
            kind: PropKind::Deferred {
                group: group.into(),
            },
            ..prop.into()
        }
    }

    /// A prop the client merges with its current value instead of replacing
    /// it
    pub fn mergeable(prop: impl Into<Prop>) -> Self {
        prop.into().merge()
    }

    /// Ask the client to merge this prop with its current value
    #[must_use]
    pub fn merge(mut self) -> Self {
        self.merge = true;
        self
    }

    /// How this prop behaves on first visits and partial reloads
    #[must_use]
    pub fn kind(&self) -> &PropKind {
        &self.kind
    }

    /// Whether the client should merge this prop
    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.merge
    }

    /// Compute the value of this prop
    ///
    /// # Errors
    ///
    /// Returns the error of the resolver, if any
    pub async fn resolve(&self) -> Result<Value, BoxError> {
        match &self.value {
            PropValue::Ready(value) => Ok(value.clone()),
            PropValue::Resolver(resolver) => resolver.resolve().await,
        }
    }
}

impl From<Value> for Prop {
    fn from(value: Value) -> Self {
        Self::value(value)
    }
}

macro_rules! impl_from_json {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Prop {
                fn from(value: $ty) -> Self {
                    Self::value(value)
                }
            }
        )*
    };
}

impl_from_json!(&str, String, bool, i32, i64, u32, u64, f64);

impl From<ValidationErrors> for Prop {
    fn from(errors: ValidationErrors) -> Self {
        Self::value(Value::Object(errors.into_iter().collect()))
    }
}

/// Failed to resolve a prop
#[derive(Debug, Error)]
#[error("failed to resolve prop {key:?}")]
pub struct PropError {
    /// The key of the prop
    pub key: String,

    /// The error returned by the resolver
    #[source]
    pub source: BoxError,
}

/// Props passed to a page component, keyed by name
#[derive(Debug, Clone, Default)]
pub struct Props {
    inner: BTreeMap<String, Prop>,
}

impl Props {
    /// An empty set of props
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a prop, returning the one it replaced
    pub fn insert(&mut self, key: impl Into<String>, prop: impl Into<Prop>) -> Option<Prop> {
        self.inner.insert(key.into(), prop.into())
    }

    /// Insert a prop, builder-style
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, prop: impl Into<Prop>) -> Self {
        self.insert(key, prop);
        self
    }

    /// Get a prop by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Prop> {
        self.inner.get(key)
    }

    /// Remove a prop by key
    pub fn remove(&mut self, key: &str) -> Option<Prop> {
        self.inner.remove(key)
    }

    /// Number of props
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether there are no props
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over the props, ordered by key
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Prop)> {
        self.inner.iter().map(|(key, prop)| (key.as_str(), prop))
    }

    pub(crate) fn retain(&mut self, f: impl FnMut(&String, &mut Prop) -> bool) {
        self.inner.retain(f);
    }

    /// Resolve all the props concurrently
    pub(crate) async fn resolve(self) -> Result<BTreeMap<String, Value>, PropError> {
        let futures = self.inner.into_iter().map(|(key, prop)| async move {
            match prop.resolve().await {
                Ok(value) => Ok((key, value)),
                Err(source) => Err(PropError { key, source }),
            }
        });

        let resolved = futures_util::future::try_join_all(futures).await?;
        Ok(resolved.into_iter().collect())
    }
}

impl<K: Into<String>, P: Into<Prop>> FromIterator<(K, P)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, P)>>(iter: I) -> Self {
        let mut props = Self::new();
        props.extend(iter);
        props
    }
}

impl<K: Into<String>, P: Into<Prop>> Extend<(K, P)> for Props {
    fn extend<I: IntoIterator<Item = (K, P)>>(&mut self, iter: I) {
        for (key, prop) in iter {
            self.insert(key, prop);
        }
    }
}

impl IntoIterator for Props {
    type Item = (String, Prop);
    type IntoIter = std::collections::btree_map::IntoIter<String, Prop>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

/// Build [`Props`] out of `key => prop` pairs
///
/// ```
/// use inertia::{Prop, props};
///
/// let props = props! {
///     "title" => "Home",
///     "count" => 3,
///     "users" => Prop::defer(serde_json::json!([])),
/// };
/// assert_eq!(props.len(), 3);
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::Props::new()
    };
    ($($key:expr => $prop:expr),+ $(,)?) => {{
        let mut props = $crate::Props::new();
        $(
            props.insert($key, $prop);
        )+
        props
    }};
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    struct Counter(AtomicUsize);

    #[async_trait]
    impl PropResolver for Counter {
        async fn resolve(&self) -> Result<Value, BoxError> {
            Ok(json!(self.0.fetch_add(1, Ordering::SeqCst)))
        }
    }

    #[tokio::test]
    async fn test_resolve() {
        assert_eq!(Prop::value("foo").resolve().await.unwrap(), json!("foo"));
        assert_eq!(
            Prop::lazy(|| async { Ok::<_, std::io::Error>(vec![1, 2]) })
                .resolve()
                .await
                .unwrap(),
            json!([1, 2])
        );
        assert_eq!(
            Prop::from_fn(|| Ok::<_, std::io::Error>("sync"))
                .resolve()
                .await
                .unwrap(),
            json!("sync")
        );

        let prop = Prop::resolver(Counter(AtomicUsize::new(0)));
        assert_eq!(prop.resolve().await.unwrap(), json!(0));
        assert_eq!(prop.resolve().await.unwrap(), json!(1));

        let err = Prop::from_fn(|| Err::<(), _>("nope")).resolve().await.unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Prop::value(1).kind(), &PropKind::Regular);
        assert_eq!(Prop::always(1).kind(), &PropKind::Always);
        assert_eq!(Prop::optional(1).kind(), &PropKind::Optional);
        assert_eq!(
            Prop::defer(1).kind(),
            &PropKind::Deferred {
                group: "default".to_owned()
            }
        );
        assert_eq!(
            Prop::defer_in("sidebar", 1).kind(),
            &PropKind::Deferred {
                group: "sidebar".to_owned()
            }
        );

        assert!(!Prop::value(1).is_merge());
        assert!(Prop::mergeable(json!([1])).is_merge());
        let prop = Prop::defer(json!([1])).merge();
        assert!(prop.is_merge());
        assert!(matches!(prop.kind(), PropKind::Deferred { .. }));
    }

    #[tokio::test]
    async fn test_resolve_all() {
        let props = props! {
            "a" => 1,
            "b" => Prop::lazy(|| async { Ok::<_, std::io::Error>("two") }),
        };
        let resolved = props.resolve().await.unwrap();
        assert_eq!(json!(resolved), json!({"a": 1, "b": "two"}));

        let props = props! {
            "ok" => 1,
            "broken" => Prop::from_fn(|| Err::<(), _>("boom")),
        };
        let err = props.resolve().await.unwrap_err();
        assert_eq!(err.key, "broken");
        assert_eq!(err.source.to_string(), "boom");
    }

    #[test]
    fn test_collect() {
        let props: Props = [("b", 2), ("a", 1)].into_iter().collect();
        let keys: Vec<_> = props.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["a", "b"]);
        assert!(props.get("a").is_some());
        assert!(props!().is_empty());
    }
}
