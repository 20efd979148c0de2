use serde::{Deserialize, Serialize};

/// Authenticated Data bit within the three-bit `z` field
const AD_BIT: u8 = 0b010;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DNSHeader {
    pub id: u16,
    pub qr: bool,
    pub opcode: u8,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub z: u8,
    pub rcode: u8,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl DNSHeader {
    /// Check the AD (authenticated data) flag
    pub fn authenticated_data(&self) -> bool {
        self.z & AD_BIT != 0
    }

    pub fn set_authenticated_data(&mut self, value: bool) {
        if value {
            self.z |= AD_BIT;
        } else {
            self.z &= !AD_BIT;
        }
    }
}
