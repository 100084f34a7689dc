//! Typed resource clients
//!
//! Each client is a cheap handle obtained from [`crate::ConsulClient`].
//! Reads that support blocking take an options value carrying
//! [`crate::BlockingQueryOptions`].

mod acl;
mod agent;
mod catalog;
mod coordinate;
mod event;
mod health;
mod kv;
mod prepared_query;
mod session;
mod status;
mod txn;

pub use acl::AclClient;
pub use agent::AgentClient;
pub use catalog::{CatalogClient, NodeQueryOptions, ServiceQueryOptions};
pub use coordinate::CoordinateClient;
pub use event::{EventClient, EventListOptions};
pub use health::{CheckQueryOptions, HealthClient, HealthServiceOptions};
pub use kv::{KeyValueOptions, KvClient};
pub use prepared_query::{PreparedQueryClient, PreparedQueryExecuteOptions};
pub use session::SessionClient;
pub use status::StatusClient;
pub use txn::TxnClient;
