//! Blocking queries
//!
//! Consul long-polls a read when it carries `index`: the request is held
//! until the resource's modify index moves past it or `wait` elapses. The
//! response's `X-Consul-Index` becomes the baseline for the next call.
//!
//! Rules applied here:
//! - `index` and `wait` are only sent once a baseline exists
//! - a returned index of 0 is treated as 1 so the next call still blocks
//! - an index lower than the baseline (snapshot restore, leader change) is
//!   taken as the new baseline, never ignored
//! - without an explicit `wait` the agent holds the read for its default of
//!   five minutes, and the client deadline is sized for that

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use consul_api::constants::{header, param};
use consul_api::format_duration;
use reqwest::header::HeaderMap;
use tracing::debug;

use crate::error::Result;
use crate::transport::HttpRequest;

/// How long the agent holds a blocking read that carries no `wait`
pub const DEFAULT_BLOCKING_WAIT: Duration = Duration::from_secs(300);

/// Opaque, server-assigned modify index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConsistencyIndex(u64);

impl ConsistencyIndex {
    pub fn new(index: u64) -> Self {
        Self(index)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ConsistencyIndex {
    fn from(index: u64) -> Self {
        Self(index)
    }
}

impl fmt::Display for ConsistencyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata Consul attaches to read responses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMeta {
    pub index: Option<ConsistencyIndex>,
    pub known_leader: bool,
    pub last_contact: Duration,
}

impl QueryMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        Self {
            index: get(header::INDEX)
                .and_then(|v| v.parse::<u64>().ok())
                .map(ConsistencyIndex),
            known_leader: get(header::KNOWN_LEADER) == Some("true"),
            last_contact: get(header::LAST_CONTACT)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or_default(),
        }
    }

    pub fn with_index(index: Option<u64>) -> Self {
        Self {
            index: index.map(ConsistencyIndex),
            ..Default::default()
        }
    }
}

/// A read result together with its query metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexed<T> {
    pub value: T,
    pub meta: QueryMeta,
}

impl<T> Indexed<T> {
    pub fn new(value: T, meta: QueryMeta) -> Self {
        Self { value, meta }
    }

    pub fn index(&self) -> Option<ConsistencyIndex> {
        self.meta.index
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Indexed<U> {
        Indexed {
            value: f(self.value),
            meta: self.meta,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Blocking parameters of a read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockingQueryOptions {
    /// Baseline index; absent means "return immediately"
    pub index: Option<ConsistencyIndex>,
    /// Upper bound on how long the server holds the request
    pub wait: Option<Duration>,
}

impl BlockingQueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_index(index: impl Into<ConsistencyIndex>) -> Self {
        Self {
            index: Some(index.into()),
            wait: None,
        }
    }

    pub fn with_index(mut self, index: Option<ConsistencyIndex>) -> Self {
        self.index = index;
        self
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = Some(wait);
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.index.is_some()
    }

    pub(crate) fn apply(&self, mut request: HttpRequest) -> HttpRequest {
        if let Some(index) = self.index {
            request = request.query(param::INDEX, index.value());
            match self.wait {
                Some(wait) => {
                    request = request.query(param::WAIT, format_duration(wait));
                    request.wait = Some(wait);
                }
                None => request.wait = Some(DEFAULT_BLOCKING_WAIT),
            }
        }
        request
    }
}

/// Baseline to use after a response carrying `returned`
pub fn next_baseline(
    previous: Option<ConsistencyIndex>,
    returned: Option<ConsistencyIndex>,
) -> Option<ConsistencyIndex> {
    match returned {
        None => previous,
        Some(ConsistencyIndex(0)) => Some(ConsistencyIndex(1)),
        Some(index) => {
            if let Some(prev) = previous
                && index < prev
            {
                debug!("index went backwards ({} -> {}), resetting baseline", prev, index);
            }
            Some(index)
        }
    }
}

/// A resource that supports blocking reads
#[async_trait]
pub trait BlockingResource: Send + Sync {
    type Output: Send;

    async fn fetch(&self, options: &BlockingQueryOptions) -> Result<Indexed<Self::Output>>;

    /// Short label for logs
    fn describe(&self) -> String;
}

/// One blocking read against `resource`, waiting for a change past `last_index`
pub async fn poll<R>(
    resource: &R,
    last_index: Option<ConsistencyIndex>,
    wait: Option<Duration>,
) -> Result<Indexed<R::Output>>
where
    R: BlockingResource + ?Sized,
{
    let options = BlockingQueryOptions {
        index: last_index,
        wait,
    };
    let result = resource.fetch(&options).await?;
    debug!(
        "poll {} at {:?} returned index {:?}",
        resource.describe(),
        last_index,
        result.meta.index
    );
    Ok(result)
}

/// Caller-driven loop of blocking reads that keeps its own baseline
pub struct Poller<R> {
    resource: R,
    index: Option<ConsistencyIndex>,
    wait: Option<Duration>,
}

impl<R: BlockingResource> Poller<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            index: None,
            wait: None,
        }
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = Some(wait);
        self
    }

    pub fn starting_at(mut self, index: impl Into<ConsistencyIndex>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn index(&self) -> Option<ConsistencyIndex> {
        self.index
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Forget the baseline; the next call returns immediately
    pub fn reset(&mut self) {
        self.index = None;
    }

    /// Next result; blocks server-side once a baseline exists
    pub async fn next(&mut self) -> Result<Indexed<R::Output>> {
        let result = poll(&self.resource, self.index, self.wait).await?;
        self.index = next_baseline(self.index, result.meta.index);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(i: u64) -> Option<ConsistencyIndex> {
        Some(ConsistencyIndex::new(i))
    }

    #[test]
    fn test_options_without_index_send_nothing() {
        let opts = BlockingQueryOptions::new().with_wait(Duration::from_secs(30));
        let req = opts.apply(HttpRequest::get("/v1/kv"));
        assert!(req.query.is_empty());
        assert_eq!(req.wait, None);
    }

    #[test]
    fn test_options_with_index_and_wait() {
        let opts = BlockingQueryOptions::at_index(42u64).with_wait(Duration::from_secs(300));
        let req = opts.apply(HttpRequest::get("/v1/kv"));
        assert_eq!(
            req.query,
            vec![
                ("index".to_string(), "42".to_string()),
                ("wait".to_string(), "300s".to_string())
            ]
        );
        assert_eq!(req.wait, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_index_without_wait_budgets_agent_default() {
        let req = BlockingQueryOptions::at_index(7u64).apply(HttpRequest::get("/v1/kv"));
        assert_eq!(req.query, vec![("index".to_string(), "7".to_string())]);
        assert_eq!(req.wait, Some(DEFAULT_BLOCKING_WAIT));
    }

    #[test]
    fn test_sub_second_wait_keeps_precision() {
        let opts = BlockingQueryOptions::at_index(1u64).with_wait(Duration::from_millis(250));
        let req = opts.apply(HttpRequest::get("/v1/kv"));
        assert_eq!(req.query[1].1, "250ms");
    }

    #[test]
    fn test_next_baseline() {
        assert_eq!(next_baseline(None, idx(5)), idx(5));
        assert_eq!(next_baseline(idx(5), idx(9)), idx(9));
        // rollback is accepted
        assert_eq!(next_baseline(idx(9), idx(3)), idx(3));
        // zero never becomes a baseline
        assert_eq!(next_baseline(idx(9), idx(0)), idx(1));
        assert_eq!(next_baseline(idx(7), None), idx(7));
    }

    #[test]
    fn test_query_meta_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::INDEX, "120".parse().unwrap());
        headers.insert(header::KNOWN_LEADER, "true".parse().unwrap());
        headers.insert(header::LAST_CONTACT, "15".parse().unwrap());

        let meta = QueryMeta::from_headers(&headers);
        assert_eq!(meta.index, idx(120));
        assert!(meta.known_leader);
        assert_eq!(meta.last_contact, Duration::from_millis(15));

        let empty = QueryMeta::from_headers(&HeaderMap::new());
        assert_eq!(empty, QueryMeta::default());
    }

    #[test]
    fn test_indexed_map() {
        let indexed = Indexed::new(vec![1, 2, 3], QueryMeta::with_index(Some(8)));
        let mapped = indexed.map(|v| v.len());
        assert_eq!(mapped.value, 3);
        assert_eq!(mapped.index(), idx(8));
    }

    struct Scripted {
        indexes: parking_lot::Mutex<Vec<u64>>,
        seen: parking_lot::Mutex<Vec<BlockingQueryOptions>>,
    }

    #[async_trait]
    impl BlockingResource for Scripted {
        type Output = ();

        async fn fetch(&self, options: &BlockingQueryOptions) -> Result<Indexed<()>> {
            self.seen.lock().push(options.clone());
            let index = self.indexes.lock().remove(0);
            Ok(Indexed::new((), QueryMeta::with_index(Some(index))))
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    #[tokio::test]
    async fn test_poller_tracks_baseline() {
        let resource = Scripted {
            indexes: parking_lot::Mutex::new(vec![10, 12, 4, 0]),
            seen: parking_lot::Mutex::new(Vec::new()),
        };
        let mut poller = Poller::new(resource).with_wait(Duration::from_secs(1));

        for _ in 0..4 {
            poller.next().await.unwrap();
        }
        assert_eq!(poller.index(), idx(1));

        let seen: Vec<_> = poller
            .resource()
            .seen
            .lock()
            .iter()
            .map(|o| o.index)
            .collect();
        assert_eq!(seen, vec![None, idx(10), idx(12), idx(4)]);

        poller.reset();
        assert_eq!(poller.index(), None);
    }
}
