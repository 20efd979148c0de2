use super::enums::{DNSResourceClass, DNSResourceType};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DNSResource {
    pub labels: Vec<String>,
    pub rtype: DNSResourceType,
    pub rclass: DNSResourceClass,
    pub ttl: u32,
    pub rdlength: u16,
    /// Wire-format RDATA
    pub rdata: Vec<u8>,
    /// Presentation-format RDATA
    pub parsed_rdata: Option<String>,
}

impl DNSResource {
    /// Dotted, lower-cased owner name without the root label
    pub fn name(&self) -> String {
        super::labels_to_name(&self.labels)
    }

    /// TXT record carrying a single character-string
    pub fn txt(name: &str, ttl: u32, text: &str) -> Self {
        let mut rdata = Vec::with_capacity(text.len() + 1);
        for chunk in text.as_bytes().chunks(255) {
            rdata.push(chunk.len() as u8);
            rdata.extend_from_slice(chunk);
        }

        Self {
            labels: super::name_to_labels(name),
            rtype: DNSResourceType::TXT,
            rclass: DNSResourceClass::IN,
            ttl,
            rdlength: rdata.len() as u16,
            rdata,
            parsed_rdata: Some(format!("\"{}\"", text)),
        }
    }

    /// Presentation form used in signature payloads
    pub fn presentation_rdata(&self) -> String {
        match &self.parsed_rdata {
            Some(text) => text.clone(),
            None => hex::encode(&self.rdata),
        }
    }
}
