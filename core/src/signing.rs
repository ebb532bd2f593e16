//! Deterministic parameter encoding and request checksums.
//!
//! # Design
//! The server recomputes `sha1(operation + query + secret)` over the query
//! string it receives, so the client must hash exactly the bytes it sends.
//! `Params` keeps its entries in a `BTreeMap`, which makes [`Params::encode`]
//! a pure function of the mapping: the same entries always produce the same
//! string, whatever order they were inserted in. The checksum is appended as
//! the last pair and is never part of the hashed input.

use std::collections::BTreeMap;

use sha1::{Digest, Sha1};
use url::form_urlencoded;

/// Reserved query key carrying the request checksum.
pub const CHECKSUM_KEY: &str = "checksum";

/// Flat string-to-string parameter mapping for one API call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: BTreeMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Insert the parameter only when `value` is non-empty.
    pub fn set_non_empty(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.set(key, value);
        }
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, value.to_string());
    }

    /// Insert every entry of `entries` under `prefix + key`, e.g. `meta_`.
    pub fn set_prefixed(&mut self, prefix: &str, entries: &BTreeMap<String, String>) {
        for (key, value) in entries {
            self.set(format!("{prefix}{key}"), value.as_str());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encode as `application/x-www-form-urlencoded`, keys in sorted order.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.entries {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

/// Lowercase hex SHA-1 of `operation + encoded_params + secret`.
pub fn sign(operation: &str, encoded_params: &str, secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(operation.as_bytes());
    hasher.update(encoded_params.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Encoded parameters followed by the `checksum` pair.
pub fn signed_query(operation: &str, params: &Params, secret: &str) -> String {
    let encoded = params.encode();
    let checksum = sign(operation, &encoded, secret);
    if encoded.is_empty() {
        format!("{CHECKSUM_KEY}={checksum}")
    } else {
        format!("{encoded}&{CHECKSUM_KEY}={checksum}")
    }
}
