use super::enums::{DNSResourceClass, DNSResourceType};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DNSQuestion {
    pub labels: Vec<String>,
    pub qtype: DNSResourceType,
    pub qclass: DNSResourceClass,
}

impl DNSQuestion {
    pub fn new(name: &str, qtype: DNSResourceType) -> Self {
        Self {
            labels: super::name_to_labels(name),
            qtype,
            qclass: DNSResourceClass::IN,
        }
    }

    /// Dotted, lower-cased name without the root label
    pub fn name(&self) -> String {
        super::labels_to_name(&self.labels)
    }
}
