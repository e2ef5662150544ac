//! Core data model for the store: [`Key`], [`Item`], and [`OwnableItem`].
//!
//! A [`Key`] addresses a single record as `(bucket, id)`. An [`Item`] is the
//! wire-visible record: an id, an opaque JSON `data` document, and an
//! optional TTL in seconds. [`OwnableItem`] is the internal shape that pairs
//! an item with its owner label; the owner never appears on the wire.
//!
//! Shape invariants (id format, bucket format, owner format, data depth) are
//! enforced by [`crate::validation`], not by these types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifies a single stored record within its bucket.
///
/// # Examples
///
/// ```
/// use argus::model::Key;
///
/// let key = Key::new("bucket01", "a".repeat(64));
/// assert_eq!(key.bucket, "bucket01");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    /// The bucket the record lives in.
    pub bucket: String,
    /// The record id: a lower-case SHA-256 hex digest.
    pub id: String,
}

impl Key {
    /// Creates a key from a bucket name and record id.
    pub fn new(bucket: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.id)
    }
}

/// A stored JSON record as seen on the wire.
///
/// `data` is opaque to the store; only its nesting depth is bounded. `ttl`
/// is the remaining lifetime in seconds: on write it is the requested
/// lifetime (clamped by the transport), on read it is the time left until
/// expiry. Immortal records carry no `ttl` at all, and the field is omitted
/// from JSON when absent.
///
/// # Examples
///
/// ```
/// use argus::model::Item;
/// use serde_json::json;
///
/// let item: Item = serde_json::from_value(json!({
///     "id": "4c94485e0c21ae6c41ce1dfe7b6bfaceea5ab68e40a2476f50208e526f506080",
///     "data": { "k": "v" },
///     "ttl": 3600,
/// }))
/// .unwrap();
/// assert_eq!(item.ttl, Some(3600));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Lower-case SHA-256 hex digest identifying the record in its bucket.
    pub id: String,

    /// Opaque JSON document. Must be non-empty on writes.
    pub data: Map<String, Value>,

    /// Remaining lifetime in seconds. `None` means the record never
    /// expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
}

/// An [`Item`] paired with its owner label.
///
/// The owner is set when the record is first created and preserved across
/// updates of the same key. An empty owner means the record is public: any
/// caller may read and mutate it. This type never crosses the HTTP
/// boundary; encoders strip the owner before marshaling.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnableItem {
    /// The wire-visible record.
    pub item: Item,
    /// Owner label scoping visibility and mutation; empty means public.
    pub owner: String,
}

impl OwnableItem {
    /// Pairs an item with an owner label.
    pub fn new(item: Item, owner: impl Into<String>) -> Self {
        Self {
            item,
            owner: owner.into(),
        }
    }
}
