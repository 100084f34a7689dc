//! Consul API - wire models for the Consul v1 HTTP API
//!
//! This crate provides:
//! - Typed request and response bodies for KV, catalog, health, agent,
//!   sessions, events, ACL, coordinates, transactions and prepared queries
//! - Endpoint path, header and query parameter constants
//! - Codecs for Consul's Go-style duration strings and base64 payloads
//!
//! It performs no I/O; `consul-client` builds the HTTP layer on top.

pub mod acl;
pub mod agent;
pub mod catalog;
pub mod constants;
pub mod coordinate;
pub mod duration;
pub mod encoding;
pub mod event;
pub mod health;
pub mod kv;
pub mod prepared_query;
pub mod session;
pub mod txn;

pub use acl::{AclPolicy, AclToken, CloneAclTokenOptions, PolicyLink};
pub use agent::{AgentService, CheckOptions, CheckUpdate, ServiceRegistration};
pub use catalog::{
    CatalogDeregistration, CatalogRegistration, CatalogService, CatalogServiceRegistration, Node,
    NodeServices, ServiceTags,
};
pub use coordinate::{Coordinate, DcCoordinates};
pub use duration::{DurationError, format_duration, parse_duration};
pub use event::{EventOptions, UserEvent};
pub use health::{CheckStatus, HealthCheck, HealthState, ServiceEntry, aggregate_status};
pub use kv::KeyValue;
pub use prepared_query::{PreparedQueryDefinition, PreparedQueryExecuteResponse};
pub use session::{DEFAULT_LOCK_DELAY, Session, SessionBehavior, SessionOptions};
pub use txn::{
    TxnError, TxnKvOperation, TxnKvVerb, TxnOperation, TxnRequest, TxnResponse, TxnResult,
    TxnServiceOperation, TxnServiceVerb,
};
