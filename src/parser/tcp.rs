pub const URG: u8 = 0x20;
pub const ACK: u8 = 0x10;
pub const PSH: u8 = 0x08;
pub const RST: u8 = 0x04;
pub const SYN: u8 = 0x02;
pub const FIN: u8 = 0x01;

const NAMED: [(u8, &str); 6] = [
    (URG, "URG"),
    (ACK, "ACK"),
    (PSH, "PSH"),
    (RST, "RST"),
    (SYN, "SYN"),
    (FIN, "FIN"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlBits(u8);

impl ControlBits {
    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0x3f)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    fn has(&self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn urg(&self) -> bool {
        self.has(URG)
    }

    pub fn ack(&self) -> bool {
        self.has(ACK)
    }

    pub fn psh(&self) -> bool {
        self.has(PSH)
    }

    pub fn rst(&self) -> bool {
        self.has(RST)
    }

    pub fn syn(&self) -> bool {
        self.has(SYN)
    }

    pub fn fin(&self) -> bool {
        self.has(FIN)
    }

    pub fn bit_string(&self) -> String {
        NAMED
            .iter()
            .map(|(flag, _)| if self.has(*flag) { '1' } else { '0' })
            .collect()
    }

    pub fn label(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if self.syn() && self.ack() {
            parts.push("SYN-ACK");
        }
        for (flag, name) in NAMED {
            if !self.has(flag) {
                continue;
            }
            if self.syn() && self.ack() && (flag == SYN || flag == ACK) {
                continue;
            }
            parts.push(name);
        }

        if parts.is_empty() {
            "NONE".to_string()
        } else {
            parts.join("-")
        }
    }
}
