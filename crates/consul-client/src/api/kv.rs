// KV store client

use std::sync::Arc;

use consul_api::KeyValue;
use consul_api::constants::{api_path, param};

use crate::blocking::{BlockingQueryOptions, Indexed};
use crate::client::Requester;
use crate::error::{ConsulError, Result};
use crate::transport::HttpRequest;

/// Optional parameters of a KV write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueOptions {
    /// Opaque 64-bit value stored with the key
    pub flags: Option<u64>,
    /// Check-and-set: 0 writes only if the key does not exist, otherwise
    /// only if `ModifyIndex` still matches
    pub cas: Option<u64>,
    /// Session acquiring the lock on the key
    pub acquire: Option<String>,
    /// Session releasing the lock on the key
    pub release: Option<String>,
}

impl KeyValueOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flags(mut self, flags: u64) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn with_cas(mut self, index: u64) -> Self {
        self.cas = Some(index);
        self
    }

    pub fn with_acquire(mut self, session: &str) -> Self {
        self.acquire = Some(session.to_string());
        self
    }

    pub fn with_release(mut self, session: &str) -> Self {
        self.release = Some(session.to_string());
        self
    }
}

#[derive(Clone)]
pub struct KvClient {
    requester: Arc<Requester>,
}

impl KvClient {
    pub(crate) fn new(requester: Arc<Requester>) -> Self {
        Self { requester }
    }

    /// Read one key; `None` if it does not exist
    pub async fn get_value(
        &self,
        key: &str,
        options: &BlockingQueryOptions,
    ) -> Result<Indexed<Option<KeyValue>>> {
        require_key(key)?;
        let request = options.apply(HttpRequest::get(api_path::KV).key(key));
        let result = self.requester.read_optional::<Vec<KeyValue>>(request).await?;
        Ok(result.map(|entries| entries.and_then(|list| list.into_iter().next())))
    }

    /// Read every key under `prefix`, in the order Consul returns them
    pub async fn get_values(
        &self,
        prefix: &str,
        options: &BlockingQueryOptions,
    ) -> Result<Indexed<Vec<KeyValue>>> {
        let request = options.apply(
            HttpRequest::get(api_path::KV)
                .key(prefix)
                .flag(param::RECURSE, true),
        );
        let result = self.requester.read_optional::<Vec<KeyValue>>(request).await?;
        Ok(result.map(Option::unwrap_or_default))
    }

    /// List key names under `prefix`, optionally grouped up to `separator`
    pub async fn get_keys(
        &self,
        prefix: &str,
        separator: Option<&str>,
        options: &BlockingQueryOptions,
    ) -> Result<Indexed<Vec<String>>> {
        let request = options.apply(
            HttpRequest::get(api_path::KV)
                .key(prefix)
                .flag(param::KEYS, true)
                .query_opt(param::SEPARATOR, separator),
        );
        let result = self.requester.read_optional::<Vec<String>>(request).await?;
        Ok(result.map(Option::unwrap_or_default))
    }

    /// Write a key. Returns `false` when a CAS check or lock acquisition
    /// did not succeed.
    pub async fn put_value(
        &self,
        key: &str,
        value: impl Into<Vec<u8>>,
        options: Option<&KeyValueOptions>,
    ) -> Result<bool> {
        require_key(key)?;
        let mut request = HttpRequest::put(api_path::KV).key(key).body(value.into());
        if let Some(opts) = options {
            request = request
                .query_opt(param::FLAGS, opts.flags)
                .query_opt(param::CAS, opts.cas)
                .query_opt(param::ACQUIRE, opts.acquire.as_deref())
                .query_opt(param::RELEASE, opts.release.as_deref());
        }
        self.requester.write_bool(request).await
    }

    /// Delete one key; deleting a missing key succeeds
    pub async fn delete_value(&self, key: &str) -> Result<()> {
        require_key(key)?;
        self.requester
            .write_empty(HttpRequest::delete(api_path::KV).key(key))
            .await
    }

    /// Delete every key under `prefix`
    pub async fn delete_values(&self, prefix: &str) -> Result<()> {
        self.requester
            .write_empty(
                HttpRequest::delete(api_path::KV)
                    .key(prefix)
                    .flag(param::RECURSE, true),
            )
            .await
    }

    /// Delete `key` only if its `ModifyIndex` is still `index`
    pub async fn cas_delete(&self, key: &str, index: u64) -> Result<bool> {
        require_key(key)?;
        self.requester
            .write_bool(
                HttpRequest::delete(api_path::KV)
                    .key(key)
                    .query(param::CAS, index),
            )
            .await
    }
}

fn require_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(ConsulError::InvalidRequest("key must not be empty".into()));
    }
    Ok(())
}
