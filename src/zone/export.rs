//! BIND-style text rendering of a zone

use super::constants::{SOA_EXPIRE, SOA_MINIMUM, SOA_REFRESH, SOA_RETRY};
use super::record::{APEX, Record};
use super::zone::ZoneMeta;
use chrono::{DateTime, Datelike, Utc};
use std::fmt::Write;

/// Serial number in YYYYMMDDNN form derived from the last update
pub fn zone_serial(updated: &DateTime<Utc>) -> u32 {
    updated.year() as u32 * 1_000_000 + updated.month() * 10_000 + updated.day() * 100
}

/// Render a zone. Output depends only on its inputs.
pub fn render_zone(name: &str, meta: &ZoneMeta, records: &[Record], default_ttl: u32) -> String {
    let origin = format!("{}.", name);
    let mut out = String::new();

    // write! to a String cannot fail
    let _ = writeln!(out, "$ORIGIN {}", origin);
    let _ = writeln!(out, "$TTL {}", default_ttl);
    let _ = writeln!(
        out,
        "@ IN SOA ns1.{origin} hostmaster.{origin} ({} {} {} {} {})",
        zone_serial(&meta.updated),
        SOA_REFRESH,
        SOA_RETRY,
        SOA_EXPIRE,
        SOA_MINIMUM,
    );
    let _ = writeln!(out, "@ IN NS ns1.{}", origin);
    let _ = writeln!(out, "@ IN NS ns2.{}", origin);

    if !records.is_empty() {
        out.push('\n');
    }
    for record in records {
        out.push_str(&render_record(record, default_ttl));
        out.push('\n');
    }

    out
}

fn render_record(record: &Record, default_ttl: u32) -> String {
    let owner = if record.domain.is_empty() {
        APEX
    } else {
        record.domain.as_str()
    };
    let ttl = record.ttl.unwrap_or(default_ttl);

    match record.rtype.as_str() {
        "A" | "AAAA" | "CNAME" | "NS" => {
            format!("{} {} IN {} {}", owner, ttl, record.rtype, record.value)
        }
        "MX" => {
            let value = if record.value.split_whitespace().count() == 2 {
                record.value.clone()
            } else {
                format!("{} {}", record.mx_priority(), record.value)
            };
            format!("{} {} IN MX {}", owner, ttl, value)
        }
        "TXT" => format!(
            "{} {} IN TXT \"{}\"",
            owner,
            ttl,
            record.value.trim_matches('"')
        ),
        other => format!(
            "; {} {} IN {} {} ; unsupported record type",
            owner, ttl, other, record.value
        ),
    }
}
