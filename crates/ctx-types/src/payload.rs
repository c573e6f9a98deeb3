//! Typed-or-generic values for context metadata and endpoint records.
//!
//! The store does not know the shape of a context's metadata or of any
//! endpoint record. A host registers Rust types for the kinds it understands;
//! everything else stays generic JSON so that unknown fields survive a
//! read/write cycle untouched.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::de::Deserializer;
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A value that can be stored inside a [`TypedPayload`].
///
/// Implemented for every `Serialize + Debug + Send + Sync + 'static` type.
pub trait ErasedPayload: Any + Send + Sync + fmt::Debug {
    /// Render the value back to JSON.
    fn to_json(&self) -> serde_json::Result<Value>;

    /// Access the concrete value for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T> ErasedPayload for T
where
    T: Serialize + Any + Send + Sync + fmt::Debug,
{
    fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A decoded value together with the kind it was decoded for.
#[derive(Clone, Debug)]
pub struct TypedPayload {
    kind: String,
    value: Arc<dyn ErasedPayload>,
}

impl TypedPayload {
    /// Wrap a concrete value.
    pub fn new<T>(kind: impl Into<String>, value: T) -> Self
    where
        T: Serialize + Send + Sync + fmt::Debug + 'static,
    {
        Self {
            kind: kind.into(),
            value: Arc::new(value),
        }
    }

    /// The kind name (endpoint kind, or the metadata kind) this value belongs to.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Borrow the concrete value if it is a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.as_any().downcast_ref::<T>()
    }

    /// Render the value as JSON.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        self.value.to_json()
    }
}

/// A metadata or endpoint record: generic JSON, or a registered Rust type.
///
/// Two payloads compare equal when their JSON renderings are equal, so a
/// typed value and the generic JSON it was decoded from are interchangeable
/// in comparisons.
#[derive(Clone, Debug)]
pub enum Payload {
    /// Generic JSON; used when no type is registered for the kind.
    Json(Value),
    /// A value decoded into a registered type.
    Typed(TypedPayload),
}

impl Payload {
    /// JSON `null`, the payload of a context with no metadata.
    pub fn null() -> Self {
        Self::Json(Value::Null)
    }

    /// Wrap a concrete value under the given kind.
    pub fn typed<T>(kind: impl Into<String>, value: T) -> Self
    where
        T: Serialize + Send + Sync + fmt::Debug + 'static,
    {
        Self::Typed(TypedPayload::new(kind, value))
    }

    /// Borrow the concrete value if this payload is typed as `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Typed(typed) => typed.downcast_ref::<T>(),
            Self::Json(_) => None,
        }
    }

    /// Borrow the generic JSON value, if this payload is untyped.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Typed(_) => None,
        }
    }

    /// Returns `true` if this payload holds a registered type.
    pub fn is_typed(&self) -> bool {
        matches!(self, Self::Typed(_))
    }

    /// Returns `true` for an untyped JSON `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Json(Value::Null))
    }

    /// Render as JSON regardless of representation.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        match self {
            Self::Json(value) => Ok(value.clone()),
            Self::Typed(typed) => typed.to_json(),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_json(), other.to_json()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Json(value) => value.serialize(serializer),
            Self::Typed(typed) => typed
                .to_json()
                .map_err(S::Error::custom)?
                .serialize(serializer),
        }
    }
}

/// Deserialization always yields [`Payload::Json`]; typed decoding is done
/// by the store's type registry.
impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::Json)
    }
}
