//! Structured view of the `http` app.
//!
//! Only the parts the assembler rewrites are typed: the server map and each
//! server's route list. Everything else rides along in `extra` maps and is
//! written back unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key holding the route rows of one server.
pub fn routes_key(server: &str) -> String {
    format!("config.apps.http.servers.{server}.routes")
}

/// Explicit `null` decodes like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The `http` app.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct HttpApp {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub servers: BTreeMap<String, HttpServer>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One server of the `http` app.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct HttpServer {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One route. `@id` is the caller-visible identifier admins use to address it.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Route {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(
        rename = "match",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub matchers: Vec<Value>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub handle: Vec<Value>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub terminal: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
