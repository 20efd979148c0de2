use super::{Result, ZoneError};
use crate::dns::enums::{DNSResourceClass, DNSResourceType};
use crate::dns::resource::DNSResource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Apex marker for records owned by the zone name itself
pub const APEX: &str = "@";

/// Wildcard owner matching any domain in the zone
pub const WILDCARD: &str = "*";

/// Default MX preference when a record carries none
const DEFAULT_MX_PRIORITY: u16 = 10;

/// A resource record stored in a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Label relative to the zone, `@` for the apex or `*`
    pub domain: String,
    /// Upper-case RR type token
    #[serde(rename = "type")]
    pub rtype: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Caller-supplied record contents for an upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub domain: String,
    #[serde(rename = "type")]
    pub rtype: String,
    pub value: String,
    #[serde(default)]
    pub priority: Option<u16>,
    #[serde(default)]
    pub ttl: Option<u32>,
}

impl NewRecord {
    pub fn new(domain: &str, rtype: &str, value: &str) -> Self {
        Self {
            domain: domain.to_string(),
            rtype: rtype.to_string(),
            value: value.to_string(),
            priority: None,
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Normalize domain/type and reject empty fields
    pub fn normalized(mut self) -> Result<Self> {
        self.domain = normalize_domain(&self.domain);
        self.rtype = normalize_type(&self.rtype);
        self.value = self.value.trim().to_string();

        if self.rtype.is_empty() {
            return Err(ZoneError::InvalidRecord("record type is empty".to_string()));
        }
        if self.value.is_empty() {
            return Err(ZoneError::InvalidRecord(format!(
                "{} {} has an empty value",
                self.domain, self.rtype
            )));
        }
        if self.domain.split('.').any(|label| label.len() > 63) {
            return Err(ZoneError::InvalidRecord(format!(
                "label too long in {}",
                self.domain
            )));
        }
        Ok(self)
    }

    pub fn into_record(self, now: DateTime<Utc>) -> Record {
        Record {
            domain: self.domain,
            rtype: self.rtype,
            value: self.value,
            priority: self.priority,
            ttl: self.ttl,
            created: now,
            updated: now,
        }
    }
}

/// Lower-case, strip trailing dots; empty means the apex
pub fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim().trim_end_matches('.').to_lowercase();
    if domain.is_empty() {
        APEX.to_string()
    } else {
        domain
    }
}

pub fn normalize_type(rtype: &str) -> String {
    rtype.trim().to_uppercase()
}

/// Exact domain or wildcard owner, and exact type or an ANY query
pub fn slot_matches_query(owner: &str, owner_type: &str, domain: &str, rtype: &str) -> bool {
    let domain_match = owner.eq_ignore_ascii_case(domain) || owner == WILDCARD;
    let type_match = rtype.eq_ignore_ascii_case("ANY") || owner_type.eq_ignore_ascii_case(rtype);
    domain_match && type_match
}

impl Record {
    /// True when this record occupies the (domain, type) slot
    pub fn is_same_slot(&self, domain: &str, rtype: &str) -> bool {
        self.domain.eq_ignore_ascii_case(domain) && self.rtype.eq_ignore_ascii_case(rtype)
    }

    pub fn matches_query(&self, domain: &str, rtype: &str) -> bool {
        slot_matches_query(&self.domain, &self.rtype, domain, rtype)
    }

    /// Fully qualified owner name within `zone`
    pub fn owner_name(&self, zone: &str) -> String {
        if self.domain == APEX {
            zone.to_string()
        } else {
            format!("{}.{}", self.domain, zone)
        }
    }

    /// Preference used for MX rendering
    pub fn mx_priority(&self) -> u16 {
        self.priority.unwrap_or(DEFAULT_MX_PRIORITY)
    }

    /// Convert to a DNS resource owned by `owner` (the queried name)
    pub fn to_dns_resource(
        &self,
        owner: &str,
        default_ttl: u32,
    ) -> std::result::Result<DNSResource, String> {
        let rtype: DNSResourceType = self.rtype.parse()?;
        let (rdata, parsed_rdata) = self.parse_rdata(rtype)?;
        let rdlength = u16::try_from(rdata.len())
            .map_err(|_| format!("RDATA too long: {} bytes", rdata.len()))?;

        Ok(DNSResource {
            labels: crate::dns::name_to_labels(owner),
            rtype,
            rclass: DNSResourceClass::IN,
            ttl: self.ttl.unwrap_or(default_ttl),
            rdlength,
            rdata,
            parsed_rdata: Some(parsed_rdata),
        })
    }

    fn parse_rdata(&self, rtype: DNSResourceType) -> std::result::Result<(Vec<u8>, String), String> {
        match rtype {
            DNSResourceType::A => self.parse_a_record(),
            DNSResourceType::AAAA => self.parse_aaaa_record(),
            DNSResourceType::NS | DNSResourceType::CNAME | DNSResourceType::PTR => {
                encode_domain_name(&self.value)
            }
            DNSResourceType::MX => self.parse_mx_record(),
            DNSResourceType::TXT => Ok(self.parse_txt_record()),
            other => Err(format!("Unsupported record type for answers: {}", other)),
        }
    }

    fn parse_a_record(&self) -> std::result::Result<(Vec<u8>, String), String> {
        use std::net::Ipv4Addr;

        let addr: Ipv4Addr = self
            .value
            .parse()
            .map_err(|_| format!("Invalid IPv4 address: {}", self.value))?;
        Ok((addr.octets().to_vec(), addr.to_string()))
    }

    fn parse_aaaa_record(&self) -> std::result::Result<(Vec<u8>, String), String> {
        use std::net::Ipv6Addr;

        let addr: Ipv6Addr = self
            .value
            .parse()
            .map_err(|_| format!("Invalid IPv6 address: {}", self.value))?;
        Ok((addr.octets().to_vec(), addr.to_string()))
    }

    /// MX value is either `exchange` (priority from the record) or `priority exchange`
    fn parse_mx_record(&self) -> std::result::Result<(Vec<u8>, String), String> {
        let parts: Vec<&str> = self.value.split_whitespace().collect();
        let (priority, exchange) = match parts.as_slice() {
            [exchange] => (self.mx_priority(), *exchange),
            [priority, exchange] => (
                priority
                    .parse::<u16>()
                    .map_err(|_| format!("Invalid MX priority: {}", priority))?,
                *exchange,
            ),
            _ => return Err(format!("Invalid MX value: {}", self.value)),
        };

        let mut rdata = priority.to_be_bytes().to_vec();
        let (exchange_bytes, _) = encode_domain_name(exchange)?;
        rdata.extend_from_slice(&exchange_bytes);

        Ok((rdata, format!("{} {}", priority, exchange)))
    }

    fn parse_txt_record(&self) -> (Vec<u8>, String) {
        let text = self.value.trim_matches('"');

        let mut rdata = Vec::new();
        for chunk in text.as_bytes().chunks(255) {
            rdata.push(chunk.len() as u8);
            rdata.extend_from_slice(chunk);
        }

        (rdata, format!("\"{}\"", text))
    }
}

/// Encode a domain name to DNS wire format
fn encode_domain_name(name: &str) -> std::result::Result<(Vec<u8>, String), String> {
    let mut encoded = Vec::new();

    for label in name.trim_end_matches('.').split('.') {
        if label.is_empty() {
            continue;
        }
        if label.len() > 63 {
            return Err(format!("Label too long: {}", label));
        }
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);

    Ok((encoded, name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(domain: &str, rtype: &str, value: &str) -> Record {
        NewRecord::new(domain, rtype, value)
            .normalized()
            .unwrap()
            .into_record(Utc::now())
    }

    #[test]
    fn test_normalization() {
        let new = NewRecord::new(" WWW. ", "aaaa", " ::1 ").normalized().unwrap();
        assert_eq!(new.domain, "www");
        assert_eq!(new.rtype, "AAAA");
        assert_eq!(new.value, "::1");

        assert_eq!(normalize_domain(""), APEX);
        assert!(NewRecord::new("www", "", "x").normalized().is_err());
        assert!(NewRecord::new("www", "A", "  ").normalized().is_err());
    }

    #[test]
    fn test_query_matching() {
        let www = record("www", "A", "1.2.3.4");
        assert!(www.matches_query("www", "A"));
        assert!(www.matches_query("WWW", "any"));
        assert!(!www.matches_query("mail", "A"));
        assert!(!www.matches_query("www", "AAAA"));

        let wildcard = record("*", "A", "5.6.7.8");
        assert!(wildcard.matches_query("anything", "A"));
    }

    #[test]
    fn test_owner_name() {
        assert_eq!(record("@", "NS", "ns1.example.").owner_name("example"), "example");
        assert_eq!(record("www", "A", "1.2.3.4").owner_name("example"), "www.example");
    }

    #[test]
    fn test_a_resource() {
        let rr = record("www", "A", "192.0.2.1")
            .to_dns_resource("www.example", 300)
            .unwrap();
        assert_eq!(rr.rdata, vec![192, 0, 2, 1]);
        assert_eq!(rr.labels, vec!["www", "example"]);
        assert_eq!(rr.ttl, 300);
        assert_eq!(rr.parsed_rdata.as_deref(), Some("192.0.2.1"));
    }

    #[test]
    fn test_mx_resource() {
        let mut mx = record("@", "MX", "mail.example.");
        mx.priority = Some(20);
        let rr = mx.to_dns_resource("example", 300).unwrap();
        assert_eq!(&rr.rdata[..2], &20u16.to_be_bytes());
        assert_eq!(rr.parsed_rdata.as_deref(), Some("20 mail.example."));

        let inline = record("@", "MX", "5 mx.example.");
        let rr = inline.to_dns_resource("example", 300).unwrap();
        assert_eq!(&rr.rdata[..2], &5u16.to_be_bytes());
    }

    #[test]
    fn test_txt_and_unsupported() {
        let rr = record("@", "TXT", "\"v=spf1 -all\"")
            .to_dns_resource("example", 300)
            .unwrap();
        assert_eq!(rr.rdata[0] as usize, "v=spf1 -all".len());

        assert!(record("_sip", "SRV", "10 5 5060 sip.example.")
            .to_dns_resource("_sip.example", 300)
            .is_err());
        assert!(record("www", "A", "not-an-ip")
            .to_dns_resource("www.example", 300)
            .is_err());
    }

    #[test]
    fn test_oversized_txt_rejected() {
        let big = record("@", "TXT", &"x".repeat(70_000));
        assert!(big.to_dns_resource("example", 300).is_err());

        let fits = record("@", "TXT", &"x".repeat(65_000));
        let rr = fits.to_dns_resource("example", 300).unwrap();
        assert_eq!(rr.rdlength as usize, rr.rdata.len());
    }
}
