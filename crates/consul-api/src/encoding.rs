// Base64 payload helpers
// Consul carries KV values, event payloads and transaction values as
// standard base64 inside JSON.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

pub fn encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

pub fn decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(s)
}

/// Serde adapter for `Option<Vec<u8>>` carried as a base64 string.
/// JSON `null` and a missing field both map to `None`.
pub mod opt_base64 {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_str(&super::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        opt.map(|s| super::decode(&s).map_err(D::Error::custom))
            .transpose()
    }
}

/// Deserialize `null` as the type's default. Older agents emit `null` for
/// empty tag lists and meta maps.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de> + Default,
{
    use serde::Deserialize;
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
