use serde::{de::DeserializeOwned, Serialize};

use crate::{CacheError, CacheResult};

/// Characters a key may not contain.
pub const RESERVED_KEY_CHARACTERS: &str = "{}()/\\@:";

pub fn validate_key(key: &str) -> CacheResult<()> {
    if key.is_empty() || key.chars().any(|c| RESERVED_KEY_CHARACTERS.contains(c)) {
        return Err(CacheError::InvalidKey(key.to_owned()));
    }
    Ok(())
}

/// A single cache entry as handed out by a [`crate::CachePool`].
///
/// Values are kept as JSON text so one pool can hold tokens, entity lists and
/// single entities side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheItem {
    key: String,
    value: Option<String>,
    hit: bool,
    expires_after: Option<i64>,
}

impl CacheItem {
    pub fn miss(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            hit: false,
            expires_after: None,
        }
    }

    pub fn hit(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            hit: true,
            expires_after: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_hit(&self) -> bool {
        self.hit
    }

    /// Decode the stored value. Always `None` for a miss.
    pub fn get<T: DeserializeOwned>(&self) -> CacheResult<Option<T>> {
        match (&self.value, self.hit) {
            (Some(raw), true) => Ok(Some(serde_json::from_str(raw)?)),
            _ => Ok(None),
        }
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, value: &T) -> CacheResult<&mut Self> {
        self.value = Some(serde_json::to_string(value)?);
        Ok(self)
    }

    /// Expire the entry `seconds` after it is saved. Zero or negative values
    /// produce an entry that is already expired when saved.
    pub fn expires_after(&mut self, seconds: i64) -> &mut Self {
        self.expires_after = Some(seconds);
        self
    }

    pub fn ttl(&self) -> Option<i64> {
        self.expires_after
    }

    pub fn raw_value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}
