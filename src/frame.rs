use std::fmt;

use crate::checksum::Checksum;
use crate::cid::UbxCID;

pub const SYNC_1: u8 = 0xB5;
pub const SYNC_2: u8 = 0x62;

/* a frame to be sent: cid plus payload, serialized with sync chars,
 * length and checksum */
#[derive(Default)]
pub struct UbxFrame {
    pub cid: UbxCID,
    pub data: Vec<u8>,
}

impl UbxFrame {
    pub fn construct(cid: UbxCID, data: Vec<u8>) -> Self {
        Self { cid, data }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut checksum = Checksum::new();
        let mut msg = Vec::with_capacity(self.data.len() + 8);

        msg.push(SYNC_1);
        msg.push(SYNC_2);

        let cls = self.cid.cls();
        let id = self.cid.id();
        msg.push(cls);
        msg.push(id);
        checksum.add(cls);
        checksum.add(id);

        let length = self.data.len();
        msg.push((length & 0xFF) as u8);
        msg.push(((length >> 8) & 0xFF) as u8);
        checksum.add((length & 0xFF) as u8);
        checksum.add(((length >> 8) & 0xFF) as u8);

        for d in &self.data {
            msg.push(*d);
            checksum.add(*d)
        }

        let (cka, ckb) = checksum.value();
        msg.push(cka);
        msg.push(ckb);

        msg
    }
}

impl fmt::Debug for UbxFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("cid", &self.cid)
            .field("len", &self.data.len())
            .field("data", &self.data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum;

    #[test]
    fn empty_frame() {
        let dut = UbxFrame::construct(UbxCID::new(0, 0), vec![]);
        let msg = dut.to_bytes();
        assert_eq!(msg, [0xb5, 0x62, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn ack_frame() {
        let dut = UbxFrame::construct(UbxCID::new(0x05, 0x01), [1, 2].to_vec());
        let msg = dut.to_bytes();
        assert_eq!(msg, [0xb5, 0x62, 0x05, 0x01, 0x02, 0x00, 1, 2, 11, 47]);
    }

    #[test]
    fn poll_mon_ver() {
        /* poll UBX-MON-VER: B5 62 0A 04 00 00 0E 34 */
        let dut = UbxFrame::construct(UbxCID::new(0x0A, 0x04), vec![]);
        let msg = dut.to_bytes();
        assert_eq!(msg, [0xb5, 0x62, 0x0a, 0x04, 0x00, 0x00, 0x0e, 0x34]);
    }

    #[test]
    fn checksum_always_verifies() {
        let dut = UbxFrame::construct(UbxCID::new(0x06, 0x3E), vec![0xAB; 17]);
        let msg = dut.to_bytes();
        assert_eq!(checksum::verify(&msg), true);
    }
}
