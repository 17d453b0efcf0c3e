//! GETINFO keys and reply lookup

use super::reply::Reply;

/// Address the daemon believes it is reachable at
pub const KEY_ADDRESS: &str = "address";
/// Total bytes read since startup
pub const KEY_TRAFFIC_READ: &str = "traffic/read";
/// Total bytes written since startup
pub const KEY_TRAFFIC_WRITTEN: &str = "traffic/written";
/// Daemon version string
pub const KEY_VERSION: &str = "version";

/// Keys exposed through the convenience queries
pub const KNOWN_KEYS: [&str; 4] = [KEY_ADDRESS, KEY_TRAFFIC_READ, KEY_TRAFFIC_WRITTEN, KEY_VERSION];

/// Value of the first `key=value` line whose key equals `key` exactly.
///
/// Values are returned verbatim; quoted values keep their quotes. A data-block
/// entry (`250+key=`) yields its block contents.
pub fn find_value(reply: &Reply, key: &str) -> Option<String> {
    reply.entries.iter().find_map(|entry| {
        let (k, v) = entry.text.split_once('=')?;
        if k != key {
            return None;
        }
        match &entry.data {
            Some(data) if v.is_empty() => Some(data.clone()),
            _ => Some(v.to_string()),
        }
    })
}
