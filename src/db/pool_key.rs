// src/db/pool_key.rs
// DOCUMENTATION: Pool key derivation
// PURPOSE: Map an endpoint descriptor to the key its pool is stored under

use crate::models::DbDescriptor;
use std::fmt;

const SEPARATOR: char = '|';

/// Registry key built from (host, port, sid, username)
/// DOCUMENTATION: The password is not part of the key. Fields are not escaped,
/// so a field containing `|` can collide with another tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolKey(String);

impl PoolKey {
    pub fn derive(descriptor: &DbDescriptor) -> Self {
        PoolKey(format!(
            "{host}{sep}{port}{sep}{sid}{sep}{user}",
            host = descriptor.host,
            port = descriptor.port,
            sid = descriptor.sid,
            user = descriptor.username,
            sep = SEPARATOR
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
