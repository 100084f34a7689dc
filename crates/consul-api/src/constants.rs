// Consul v1 HTTP API constants

/// Endpoint paths. Entries ending in a resource segment take the key, name
/// or ID appended as further path segments.
pub mod api_path {
    // KV
    pub const KV: &str = "/v1/kv";
    pub const TXN: &str = "/v1/txn";

    // Catalog
    pub const CATALOG_DATACENTERS: &str = "/v1/catalog/datacenters";
    pub const CATALOG_NODES: &str = "/v1/catalog/nodes";
    pub const CATALOG_SERVICES: &str = "/v1/catalog/services";
    pub const CATALOG_SERVICE: &str = "/v1/catalog/service";
    pub const CATALOG_NODE: &str = "/v1/catalog/node";
    pub const CATALOG_REGISTER: &str = "/v1/catalog/register";
    pub const CATALOG_DEREGISTER: &str = "/v1/catalog/deregister";

    // Health
    pub const HEALTH_CHECKS: &str = "/v1/health/checks";
    pub const HEALTH_NODE: &str = "/v1/health/node";
    pub const HEALTH_STATE: &str = "/v1/health/state";
    pub const HEALTH_SERVICE: &str = "/v1/health/service";

    // Agent
    pub const AGENT_SELF: &str = "/v1/agent/self";
    pub const AGENT_SERVICES: &str = "/v1/agent/services";
    pub const AGENT_SERVICE: &str = "/v1/agent/service";
    pub const AGENT_SERVICE_REGISTER: &str = "/v1/agent/service/register";
    pub const AGENT_SERVICE_DEREGISTER: &str = "/v1/agent/service/deregister";
    pub const AGENT_SERVICE_MAINTENANCE: &str = "/v1/agent/service/maintenance";
    pub const AGENT_CHECKS: &str = "/v1/agent/checks";
    pub const AGENT_CHECK_REGISTER: &str = "/v1/agent/check/register";
    pub const AGENT_CHECK_DEREGISTER: &str = "/v1/agent/check/deregister";
    pub const AGENT_CHECK_PASS: &str = "/v1/agent/check/pass";
    pub const AGENT_CHECK_WARN: &str = "/v1/agent/check/warn";
    pub const AGENT_CHECK_FAIL: &str = "/v1/agent/check/fail";
    pub const AGENT_CHECK_UPDATE: &str = "/v1/agent/check/update";

    // Session
    pub const SESSION_CREATE: &str = "/v1/session/create";
    pub const SESSION_DESTROY: &str = "/v1/session/destroy";
    pub const SESSION_INFO: &str = "/v1/session/info";
    pub const SESSION_NODE: &str = "/v1/session/node";
    pub const SESSION_LIST: &str = "/v1/session/list";
    pub const SESSION_RENEW: &str = "/v1/session/renew";

    // Event
    pub const EVENT_FIRE: &str = "/v1/event/fire";
    pub const EVENT_LIST: &str = "/v1/event/list";

    // ACL
    pub const ACL_TOKEN: &str = "/v1/acl/token";
    pub const ACL_TOKEN_SELF: &str = "/v1/acl/token/self";
    pub const ACL_TOKENS: &str = "/v1/acl/tokens";
    pub const ACL_POLICY: &str = "/v1/acl/policy";
    pub const ACL_POLICY_NAME: &str = "/v1/acl/policy/name";
    pub const ACL_POLICIES: &str = "/v1/acl/policies";

    // Status
    pub const STATUS_LEADER: &str = "/v1/status/leader";
    pub const STATUS_PEERS: &str = "/v1/status/peers";

    // Coordinate
    pub const COORDINATE_DATACENTERS: &str = "/v1/coordinate/datacenters";
    pub const COORDINATE_NODES: &str = "/v1/coordinate/nodes";

    // Prepared query
    pub const QUERY: &str = "/v1/query";
}

/// Response headers carrying query metadata
pub mod header {
    pub const INDEX: &str = "X-Consul-Index";
    pub const KNOWN_LEADER: &str = "X-Consul-Knownleader";
    pub const LAST_CONTACT: &str = "X-Consul-Lastcontact";
    pub const TOKEN: &str = "X-Consul-Token";
}

/// Query parameter names
pub mod param {
    pub const INDEX: &str = "index";
    pub const WAIT: &str = "wait";
    pub const DC: &str = "dc";
    pub const TOKEN: &str = "token";
    pub const NEAR: &str = "near";
    pub const TAG: &str = "tag";
    pub const PASSING: &str = "passing";
    pub const RECURSE: &str = "recurse";
    pub const KEYS: &str = "keys";
    pub const SEPARATOR: &str = "separator";
    pub const FLAGS: &str = "flags";
    pub const CAS: &str = "cas";
    pub const ACQUIRE: &str = "acquire";
    pub const RELEASE: &str = "release";
    pub const NAME: &str = "name";
    pub const NODE: &str = "node";
    pub const SERVICE: &str = "service";
    pub const NOTE: &str = "note";
    pub const ENABLE: &str = "enable";
    pub const REASON: &str = "reason";
    pub const LIMIT: &str = "limit";
}
