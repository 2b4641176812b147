//! Row formatting helpers shared by the viewer surfaces.

use chrono::{DateTime, Local};

/// Strips the package and service prefix from a gRPC method or message name.
///
/// `/helloworld.Greeter/SayHello` becomes `SayHello` and
/// `helloworld.HelloRequest` becomes `HelloRequest`.
pub fn strip_namespace(name: &str) -> &str {
    let last_segment = name.rsplit('/').next().unwrap_or(name);
    last_segment.rsplit('.').next().unwrap_or(last_segment)
}

/// Formats an RFC 3339 timestamp as local `HH:MM:SS.mmm`.
///
/// Input that does not parse is returned unchanged.
pub fn format_timestamp(time: &str) -> String {
    match DateTime::parse_from_rfc3339(time) {
        Ok(parsed) => parsed
            .with_timezone(&Local)
            .format("%H:%M:%S%.3f")
            .to_string(),
        Err(_) => time.to_string(),
    }
}
