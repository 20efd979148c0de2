//! Pre-parsed DNS message model
//!
//! Messages reach this crate already decoded; these types carry them between the
//! transport layer, the zone store and the wire security layer.

pub mod edns;
pub mod enums;
pub mod header;
pub mod question;
pub mod resource;

use edns::EdnsOpt;
use enums::ResponseCode;
use header::DNSHeader;
use question::DNSQuestion;
use resource::DNSResource;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DNSPacket {
    pub header: DNSHeader,
    pub questions: Vec<DNSQuestion>,
    pub answers: Vec<DNSResource>,
    pub authorities: Vec<DNSResource>,
    pub resources: Vec<DNSResource>,
    /// EDNS0 OPT record if present (kept apart from additional records)
    pub edns: Option<EdnsOpt>,
}

impl DNSPacket {
    /// Build a query with a single question
    pub fn query(id: u16, name: &str, qtype: enums::DNSResourceType) -> Self {
        let mut packet = DNSPacket::default();
        packet.header.id = id;
        packet.header.rd = true;
        packet.questions.push(DNSQuestion::new(name, qtype));
        packet.sync_counts();
        packet
    }

    /// Empty response to `request`: same id and echoed questions
    pub fn response_to(request: &DNSPacket) -> Self {
        let mut packet = DNSPacket {
            header: DNSHeader {
                id: request.header.id,
                qr: true,
                opcode: request.header.opcode,
                rd: request.header.rd,
                ..Default::default()
            },
            questions: request.questions.clone(),
            ..Default::default()
        };
        packet.sync_counts();
        packet
    }

    /// Recompute the header section counts from the section contents
    pub fn sync_counts(&mut self) {
        self.header.qdcount = self.questions.len() as u16;
        self.header.ancount = self.answers.len() as u16;
        self.header.nscount = self.authorities.len() as u16;
        self.header.arcount = self.resources.len() as u16 + u16::from(self.edns.is_some());
    }

    pub fn set_rcode(&mut self, rcode: ResponseCode) {
        self.header.rcode = rcode.to_u8();
    }

    pub fn rcode(&self) -> Option<ResponseCode> {
        ResponseCode::from_u8(self.header.rcode)
    }

    /// EDNS record, inserted with defaults when missing
    pub fn edns_mut(&mut self) -> &mut EdnsOpt {
        self.edns.get_or_insert_with(EdnsOpt::new)
    }

    pub fn valid(&self) -> bool {
        if self.header.qdcount as usize != self.questions.len() {
            return false;
        }
        if self.header.ancount as usize != self.answers.len() {
            return false;
        }
        if self.header.nscount as usize != self.authorities.len() {
            return false;
        }
        let additional = self.resources.len() + usize::from(self.edns.is_some());
        if self.header.arcount as usize != additional {
            return false;
        }

        for question in &self.questions {
            let labels: Vec<&String> = question.labels.iter().filter(|l| !l.is_empty()).collect();
            if labels.is_empty() {
                return false;
            }
            // DNS names can't exceed 255 octets
            let total_length: usize = labels.iter().map(|l| l.len() + 1).sum();
            if total_length > 255 {
                return false;
            }
            if labels.iter().any(|l| l.len() > 63) {
                return false;
            }
        }

        self.header.opcode <= 2 && self.header.rcode <= 5
    }
}

/// Split a dotted name into labels, dropping empty ones
pub fn name_to_labels(name: &str) -> Vec<String> {
    name.split('.')
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect()
}

/// Join labels into a lower-cased dotted name, ignoring the root label
pub fn labels_to_name(labels: &[String]) -> String {
    labels
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| l.to_lowercase())
        .collect::<Vec<_>>()
        .join(".")
}
