//! Input validation: id/bucket/owner formats, data depth, TTL clamping.
//!
//! The transport validates every piece of user input before it reaches the
//! storage layer. Formats are regex-bounded and configurable through
//! [`ValidationConfig`], with fixed defaults; [`Validators`] holds the
//! compiled set. The free functions validate against the defaults, for
//! callers (such as the client library) that have no configuration of
//! their own.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::model::Item;

/// Record ids are lower-case SHA-256 hex digests.
pub const DEFAULT_ID_PATTERN: &str = "^[0-9a-f]{64}$";

/// Bucket names: 3-63 chars of lower alphanumerics and hyphens, starting
/// and ending alphanumeric.
pub const DEFAULT_BUCKET_PATTERN: &str = "^[0-9a-z][0-9a-z-]{1,61}[0-9a-z]$";

/// Owner labels: 10-60 chars of alphanumerics, hyphen, underscore.
pub const DEFAULT_OWNER_PATTERN: &str = "^[0-9a-zA-Z_-]{10,60}$";

/// Default cap on a requested item TTL: 24 hours.
pub const DEFAULT_ITEM_MAX_TTL_SECS: i64 = 24 * 60 * 60;

/// Default cap on the nesting depth of item data.
pub const DEFAULT_ITEM_DATA_MAX_DEPTH: u32 = 30;

static DEFAULT_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DEFAULT_ID_PATTERN).expect("default id pattern is a valid regex")
});
static DEFAULT_BUCKET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DEFAULT_BUCKET_PATTERN).expect("default bucket pattern is a valid regex")
});
static DEFAULT_OWNER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DEFAULT_OWNER_PATTERN).expect("default owner pattern is a valid regex")
});

/// Checks an id against the default id pattern.
pub fn is_id_valid(id: &str) -> bool {
    DEFAULT_ID_REGEX.is_match(id)
}

/// Checks a bucket name against the default bucket pattern.
pub fn is_bucket_valid(bucket: &str) -> bool {
    DEFAULT_BUCKET_REGEX.is_match(bucket)
}

/// Checks an owner label against the default owner pattern. Empty owners
/// are valid: they mean "public / no owner claimed".
pub fn is_owner_valid(owner: &str) -> bool {
    owner.is_empty() || DEFAULT_OWNER_REGEX.is_match(owner)
}

/// Checks that no path through `data` nests mappings deeper than
/// `max_depth`. The root mapping counts as depth 1; every nested mapping
/// increments the count; arrays are traversed but do not count; leaves of
/// non-mapping type do not count.
pub fn valid_depth(data: &Map<String, Value>, max_depth: u32) -> bool {
    if max_depth == 0 {
        return false;
    }
    data.values().all(|value| value_depth_ok(value, 1, max_depth))
}

fn value_depth_ok(value: &Value, depth: u32, max_depth: u32) -> bool {
    match value {
        Value::Object(map) => {
            depth < max_depth
                && map
                    .values()
                    .all(|nested| value_depth_ok(nested, depth + 1, max_depth))
        }
        Value::Array(values) => values
            .iter()
            .all(|nested| value_depth_ok(nested, depth, max_depth)),
        _ => true,
    }
}

/// Validation limits and format patterns, all defaulted.
///
/// # Examples
///
/// ```
/// use argus::validation::{ValidationConfig, Validators};
///
/// let config = ValidationConfig::default().with_item_max_ttl_secs(3600);
/// let validators = Validators::new(&config).unwrap();
/// assert_eq!(validators.max_ttl_secs(), 3600);
/// ```
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Pattern for record ids.
    pub id_pattern: String,
    /// Pattern for bucket names.
    pub bucket_pattern: String,
    /// Pattern for non-empty owner labels.
    pub owner_pattern: String,
    /// Cap applied to requested item TTLs, in seconds.
    pub item_max_ttl_secs: i64,
    /// Cap on the nesting depth of item data.
    pub item_data_max_depth: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            id_pattern: DEFAULT_ID_PATTERN.to_string(),
            bucket_pattern: DEFAULT_BUCKET_PATTERN.to_string(),
            owner_pattern: DEFAULT_OWNER_PATTERN.to_string(),
            item_max_ttl_secs: DEFAULT_ITEM_MAX_TTL_SECS,
            item_data_max_depth: DEFAULT_ITEM_DATA_MAX_DEPTH,
        }
    }
}

impl ValidationConfig {
    /// Overrides the bucket name pattern.
    pub fn with_bucket_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.bucket_pattern = pattern.into();
        self
    }

    /// Overrides the owner label pattern.
    pub fn with_owner_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.owner_pattern = pattern.into();
        self
    }

    /// Overrides the TTL cap.
    pub fn with_item_max_ttl_secs(mut self, secs: i64) -> Self {
        self.item_max_ttl_secs = secs;
        self
    }

    /// Overrides the data depth cap.
    pub fn with_item_data_max_depth(mut self, depth: u32) -> Self {
        self.item_data_max_depth = depth;
        self
    }
}

/// Compiled validators for one configuration.
#[derive(Debug, Clone)]
pub struct Validators {
    id: Regex,
    bucket: Regex,
    owner: Regex,
    item_max_ttl_secs: i64,
    item_data_max_depth: u32,
}

impl Validators {
    /// Compiles the configured patterns.
    ///
    /// # Errors
    ///
    /// Returns the [`regex::Error`] of the first pattern that fails to
    /// compile.
    pub fn new(config: &ValidationConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            id: Regex::new(&config.id_pattern)?,
            bucket: Regex::new(&config.bucket_pattern)?,
            owner: Regex::new(&config.owner_pattern)?,
            item_max_ttl_secs: config.item_max_ttl_secs,
            item_data_max_depth: config.item_data_max_depth,
        })
    }

    /// Checks an id against the configured pattern.
    pub fn is_id_valid(&self, id: &str) -> bool {
        self.id.is_match(id)
    }

    /// Checks a bucket name against the configured pattern.
    pub fn is_bucket_valid(&self, bucket: &str) -> bool {
        self.bucket.is_match(bucket)
    }

    /// Checks an owner label against the configured pattern; empty is
    /// always valid.
    pub fn is_owner_valid(&self, owner: &str) -> bool {
        owner.is_empty() || self.owner.is_match(owner)
    }

    /// Checks item data against the configured depth cap.
    pub fn valid_depth(&self, data: &Map<String, Value>) -> bool {
        valid_depth(data, self.item_data_max_depth)
    }

    /// Clamps an item's TTL to the configured cap. Absent TTLs are set to
    /// the cap: a record written through the transport always expires.
    pub fn clamp_ttl(&self, item: &mut Item) {
        match item.ttl {
            Some(ttl) if ttl <= self.item_max_ttl_secs => {}
            _ => item.ttl = Some(self.item_max_ttl_secs),
        }
    }

    /// The configured TTL cap in seconds.
    pub fn max_ttl_secs(&self) -> i64 {
        self.item_max_ttl_secs
    }
}

impl Default for Validators {
    fn default() -> Self {
        Self {
            id: DEFAULT_ID_REGEX.clone(),
            bucket: DEFAULT_BUCKET_REGEX.clone(),
            owner: DEFAULT_OWNER_REGEX.clone(),
            item_max_ttl_secs: DEFAULT_ITEM_MAX_TTL_SECS,
            item_data_max_depth: DEFAULT_ITEM_DATA_MAX_DEPTH,
        }
    }
}
