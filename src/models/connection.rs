// src/models/connection.rs
// DOCUMENTATION: Oracle endpoint descriptor supplied with each request
// PURPOSE: Identify which database (and which pool) a check runs against

use crate::errors::OjetError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use validator::Validate;

pub const DEFAULT_ORACLE_PORT: u16 = 1521;

/// Database endpoint descriptor
/// DOCUMENTATION: Not persisted. Pool identity is (host, port, sid, username);
/// the password is only used to open the pool.
#[derive(Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct DbDescriptor {
    #[validate(length(min = 1, message = "host is required"))]
    pub host: String,

    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    #[validate(range(min = 1, message = "port must be positive"))]
    pub port: u16,

    /// Service name or SID
    #[serde(alias = "service", alias = "serviceName")]
    #[validate(length(min = 1, message = "sid is required"))]
    pub sid: String,

    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,

    #[serde(skip_serializing)]
    pub password: String,
}

impl DbDescriptor {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        sid: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            sid: sid.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// EZConnect string `host:port/sid`
    pub fn connect_string(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.sid)
    }
}

// Never print credentials
impl fmt::Debug for DbDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("sid", &self.sid)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

fn default_port() -> u16 {
    DEFAULT_ORACLE_PORT
}

/// The dashboard sends the port as a string ("1521"); scripts send a number.
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    port_from_value(&value).map_err(serde::de::Error::custom)
}

/// Blank text means the listener default; anything else must be a valid port
fn port_from_value(value: &Value) -> Result<u16, String> {
    match value {
        Value::Null => Ok(DEFAULT_ORACLE_PORT),
        Value::Number(n) => n
            .as_u64()
            .and_then(|port| u16::try_from(port).ok())
            .ok_or_else(|| format!("invalid port: {}", n)),
        Value::String(text) if text.trim().is_empty() => Ok(DEFAULT_ORACLE_PORT),
        Value::String(text) => text
            .trim()
            .parse()
            .map_err(|_| format!("invalid port: {}", text)),
        other => Err(format!("invalid port: {}", other)),
    }
}

/// Descriptor fields as they arrive inline in a request body
/// DOCUMENTATION: Every field is optional so a body without any of them means
/// "use the default pool". Once one field is present the whole descriptor is
/// built strictly and errors are reported instead of falling back.
#[derive(Clone, Default, Deserialize)]
pub struct InlineDescriptor {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<Value>,

    #[serde(default, alias = "service", alias = "serviceName")]
    pub sid: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

impl InlineDescriptor {
    pub fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.port.as_ref().map_or(true, Value::is_null)
            && self.sid.is_none()
            && self.username.is_none()
            && self.password.is_none()
    }

    /// `None` when the body names no database, else a validated descriptor
    pub fn resolve(&self) -> Result<Option<DbDescriptor>, OjetError> {
        if self.is_empty() {
            return Ok(None);
        }

        let port = match &self.port {
            Some(value) => port_from_value(value).map_err(OjetError::ValidationError)?,
            None => DEFAULT_ORACLE_PORT,
        };
        let password = self
            .password
            .clone()
            .ok_or_else(|| OjetError::ValidationError("password is required".to_string()))?;

        let descriptor = DbDescriptor::new(
            self.host.clone().unwrap_or_default(),
            port,
            self.sid.clone().unwrap_or_default(),
            self.username.clone().unwrap_or_default(),
            password,
        );

        if let Err(e) = descriptor.validate() {
            return Err(OjetError::ValidationError(e.to_string()));
        }

        Ok(Some(descriptor))
    }
}

impl fmt::Debug for InlineDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("sid", &self.sid)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}
