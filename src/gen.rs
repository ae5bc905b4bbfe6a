/*
 * CFG message generation from textual commands
 *
 * A command names a CFG message and lists its payload fields as
 * whitespace separated tokens:
 *
 *   "CFG-PRT   portid res0 res1 mode baudrate inmask outmask flags"
 *   "CFG-MSG   msgid rate0 rate1 rate2 rate3 rate4 rate5 rate6"
 *   "CFG-RATE  meas nav time"
 *   "CFG-VALSET version layer transaction rsv1 key val"
 *
 * The field type sequence of the catalogue is authoritative: missing
 * tokens encode as zero, surplus tokens append single bytes. VALSET
 * instead takes exactly one key/value pair resolved against the
 * configuration key catalogue.
 */

use log::debug;

use crate::cid::{UbxCID, CLS_CFG};
use crate::error::Error;
use crate::frame::UbxFrame;
use crate::valset;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FieldType {
    U1,
    U2,
    U4,
    I1,
    I2,
    I4,
    R4,
    R8,
    S32,
}

impl FieldType {
    pub fn size(self) -> usize {
        match self {
            FieldType::U1 | FieldType::I1 => 1,
            FieldType::U2 | FieldType::I2 => 2,
            FieldType::U4 | FieldType::I4 | FieldType::R4 => 4,
            FieldType::R8 => 8,
            FieldType::S32 => 32,
        }
    }
}

use FieldType::{I1, I2, I4, R4, R8, S32, U1, U2, U4};

struct CfgMsg {
    name: &'static str,
    id: u8,
    fields: &'static [FieldType],
}

/* catalogue of CFG messages, sorted by name for binary search */
const CFG_MSGS: &[CfgMsg] = &[
    CfgMsg { name: "ANT", id: 0x13, fields: &[U2, U2] },
    CfgMsg { name: "CFG", id: 0x09, fields: &[U4, U4, U4, U1] },
    CfgMsg { name: "DAT", id: 0x06, fields: &[R8, R8, R4, R4, R4, R4, R4, R4, R4] },
    CfgMsg { name: "EKF", id: 0x12, fields: &[U1, U1, U1, U1, U4, U2, U2, U1, U1, U2] },
    CfgMsg { name: "FXN", id: 0x0E, fields: &[U4, U4, U4, U4, U4, U4, U4, U4] },
    CfgMsg { name: "GNSS", id: 0x3E, fields: &[U1, U1, U1, U1, U1, U1, U1, U1, U4] },
    CfgMsg { name: "INF", id: 0x02, fields: &[U1, U1, U1, U1, U1, U1, U1, U1, U1, U1] },
    CfgMsg { name: "ITFM", id: 0x39, fields: &[U4, U4] },
    CfgMsg { name: "LIC", id: 0x80, fields: &[U2, U2, U2, U2, U2, U2] },
    CfgMsg { name: "LOGFILTER", id: 0x47, fields: &[U1, U1, U2, U2, U2, U4] },
    CfgMsg { name: "MSG", id: 0x01, fields: &[U1, U1, U1, U1, U1, U1, U1, U1] },
    CfgMsg {
        name: "NAV2",
        id: 0x1A,
        fields: &[
            U1, U1, U2, U1, U1, U1, U1, I4, U1, U1, U1, U1, U1, U1, U2, U2, U2, U2, U2, U1, U1,
            U2, U4, U4,
        ],
    },
    CfgMsg {
        name: "NAV5",
        id: 0x24,
        fields: &[
            U2, U1, U1, I4, U4, I1, U1, U2, U2, U2, U2, U1, U1, U1, U1, U1, U1, U2, U1, U1, U1,
            U1, U1, U1,
        ],
    },
    CfgMsg {
        name: "NAVX5",
        id: 0x23,
        fields: &[
            U2, U2, U4, U1, U1, U1, U1, U1, U1, U1, U1, U1, U1, U2, U1, U1, U1, U1, U1, U1, U1,
            U1, U1, U1, U2,
        ],
    },
    CfgMsg { name: "NMEA", id: 0x17, fields: &[U1, U1, U1, U1] },
    CfgMsg { name: "ODO", id: 0x1E, fields: &[U1, U1, U1, U1, U1, U1, U1, U1, U1] },
    CfgMsg { name: "PM2", id: 0x3B, fields: &[U1, U1, U1, U1, U4, U4, U4, U4, U2, U2] },
    CfgMsg { name: "PRT", id: 0x00, fields: &[U1, U1, U2, U4, U4, U2, U2, U2, U2] },
    CfgMsg { name: "PWR", id: 0x57, fields: &[U1, U1, U1, U1, U4] },
    CfgMsg { name: "RATE", id: 0x08, fields: &[U2, U2, U2] },
    CfgMsg { name: "RINV", id: 0x34, fields: &[U1, U1] },
    CfgMsg { name: "RST", id: 0x04, fields: &[U2, U1, U1] },
    CfgMsg { name: "RXM", id: 0x11, fields: &[U1, U1] },
    CfgMsg { name: "SBAS", id: 0x16, fields: &[U1, U1, U1, U1, U4] },
    CfgMsg {
        name: "SMGR",
        id: 0x62,
        fields: &[U1, U1, U2, U2, U1, U1, U2, U2, U2, U2, U4],
    },
    CfgMsg { name: "TM", id: 0x10, fields: &[U4, U4, U4] },
    CfgMsg { name: "TM2", id: 0x19, fields: &[U1, U1, U2, U4, U4] },
    CfgMsg { name: "TMODE", id: 0x1D, fields: &[U4, I4, I4, I4, U4, U4, U4] },
    CfgMsg { name: "TMODE2", id: 0x36, fields: &[U1, U1, U2, I4, I4, I4, U4, U4, U4] },
    CfgMsg { name: "TMODE3", id: 0x71, fields: &[U1, U1, U2, I4, I4, I4, U4, U4, U4] },
    CfgMsg { name: "TP", id: 0x07, fields: &[U4, U4, I1, U1, U2, I2, I2, I4] },
    CfgMsg {
        name: "TPS",
        id: 0x31,
        fields: &[U1, U1, U1, U1, I2, I2, U4, U4, U4, U4, I4, U4],
    },
    CfgMsg { name: "TXSLOT", id: 0x53, fields: &[U1, U1, U1, U1, U4, U4, U4, U4, U4] },
    CfgMsg {
        name: "USB",
        id: 0x1B,
        fields: &[U2, U2, U2, U2, U2, U2, S32, S32, S32],
    },
    CfgMsg { name: "VALSET", id: 0x8A, fields: &[U1, U1, U1, U1] },
];

fn int_of(tok: Option<&str>) -> i64 {
    tok.and_then(|s| s.parse().ok()).unwrap_or(0)
}

fn float_of(tok: Option<&str>) -> f64 {
    tok.and_then(|s| s.parse().ok()).unwrap_or(0.0)
}

fn put_field(payload: &mut Vec<u8>, ft: FieldType, tok: Option<&str>) {
    match ft {
        U1 => payload.push(int_of(tok) as u8),
        U2 => payload.extend_from_slice(&(int_of(tok) as u16).to_le_bytes()),
        U4 => payload.extend_from_slice(&(int_of(tok) as u32).to_le_bytes()),
        I1 => payload.extend_from_slice(&(int_of(tok) as i8).to_le_bytes()),
        I2 => payload.extend_from_slice(&(int_of(tok) as i16).to_le_bytes()),
        I4 => payload.extend_from_slice(&(int_of(tok) as i32).to_le_bytes()),
        R4 => payload.extend_from_slice(&(float_of(tok) as f32).to_le_bytes()),
        R8 => payload.extend_from_slice(&float_of(tok).to_le_bytes()),
        S32 => {
            let mut bytes = [0u8; 32]; /* zero padded ascii */
            let s = tok.unwrap_or("").as_bytes();
            let n = s.len().min(32);
            bytes[..n].copy_from_slice(&s[..n]);
            payload.extend_from_slice(&bytes);
        }
    }
}

/* build a complete CFG frame from a command string */
pub fn gen_frame(msg: &str) -> Result<Vec<u8>, Error> {
    let args: Vec<&str> = msg.split_whitespace().take(32).collect();
    let name = args
        .first()
        .and_then(|cmd| cmd.strip_prefix("CFG-"))
        .ok_or(Error::NotCfgCommand)?;
    let idx = CFG_MSGS
        .binary_search_by(|m| m.name.cmp(name))
        .map_err(|_| Error::UnknownCommand)?;
    let def = &CFG_MSGS[idx];

    let mut payload = Vec::new();
    if def.name == "VALSET" {
        /* exactly one key/value pair after the fixed header */
        if args.len() != 7 {
            return Err(Error::ValsetArgCount);
        }
        for j in 1..5 {
            put_field(&mut payload, U1, args.get(j).copied());
        }
        let key = args[5]
            .strip_prefix("CFG-")
            .ok_or(Error::ValsetKeyFormat)?;
        let (key_id, vtype) = valset::lookup(key).ok_or(Error::UnknownValsetKey)?;
        payload.extend_from_slice(&key_id.to_le_bytes());
        put_field(&mut payload, vtype, Some(args[6]));
    } else {
        /* the field type sequence is authoritative; extra tokens append
         * single bytes */
        let mut j = 1;
        loop {
            let ft = def.fields.get(j - 1).copied();
            if ft.is_none() && j >= args.len() {
                break;
            }
            put_field(&mut payload, ft.unwrap_or(U1), args.get(j).copied());
            j += 1;
        }
    }
    Ok(UbxFrame::construct(UbxCID::new(CLS_CFG, def.id), payload).to_bytes())
}

/* wire-compatible entry point: bytes written, 0 on a malformed command */
pub fn gen_ubx(msg: &str, buff: &mut [u8]) -> usize {
    match gen_frame(msg) {
        Ok(frame) => {
            if frame.len() > buff.len() {
                debug!("gen_ubx: {} ({})", Error::BufferTooSmall, msg);
                return 0;
            }
            buff[..frame.len()].copy_from_slice(&frame);
            frame.len()
        }
        Err(err) => {
            debug!("gen_ubx: {} ({})", err, msg);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum;
    use crate::raw::{Decoded, RawUbx};

    #[test]
    fn catalogue_is_sorted() {
        for pair in CFG_MSGS.windows(2) {
            assert!(pair[0].name < pair[1].name, "{} vs {}", pair[0].name, pair[1].name);
        }
    }

    #[test]
    fn cfg_msg_frame() {
        let mut buff = [0u8; 64];
        let n = gen_ubx("CFG-MSG 1 1 0 0 0 0 0 0", &mut buff);
        assert_eq!(n, 16);
        assert_eq!(&buff[0..4], &[0xB5, 0x62, 0x06, 0x01]);
        assert_eq!(&buff[4..6], &[0x08, 0x00]);
        assert_eq!(&buff[6..8], &[1, 1]);
        assert!(checksum::verify(&buff[..n]));
    }

    #[test]
    fn missing_tokens_default_to_zero() {
        let mut buff = [0u8; 64];
        let n = gen_ubx("CFG-RATE 100", &mut buff);
        /* three U2 fields regardless of the token count */
        assert_eq!(n, 8 + 6);
        assert_eq!(&buff[6..12], &[100, 0, 0, 0, 0, 0]);
        assert!(checksum::verify(&buff[..n]));
    }

    #[test]
    fn extra_tokens_append_bytes() {
        let mut buff = [0u8; 64];
        let n = gen_ubx("CFG-RXM 1 2 3", &mut buff);
        assert_eq!(n, 8 + 3);
        assert_eq!(&buff[6..9], &[1, 2, 3]);
        assert!(checksum::verify(&buff[..n]));
    }

    #[test]
    fn signed_and_float_fields() {
        let mut buff = [0u8; 128];
        /* CFG-TP: U4 U4 I1 U1 U2 I2 I2 I4 */
        let n = gen_ubx("CFG-TP 1000000 100000 -1 1 0 -2 3 -50000", &mut buff);
        assert_eq!(n, 8 + 4 + 4 + 1 + 1 + 2 + 2 + 2 + 4);
        assert_eq!(buff[14], 0xFF); /* -1 as I1 */
        assert_eq!(&buff[18..20], &(-2i16).to_le_bytes());
        assert_eq!(&buff[22..26], &(-50000i32).to_le_bytes());
    }

    #[test]
    fn string_fields_zero_padded() {
        let mut buff = [0u8; 160];
        let n = gen_ubx("CFG-USB 1 2 0 0 0 0 u-blox", &mut buff);
        assert_eq!(n, 8 + 12 + 96);
        assert_eq!(&buff[18..24], b"u-blox");
        assert_eq!(buff[24], 0);
        assert_eq!(buff[49], 0);
        assert!(checksum::verify(&buff[..n]));
    }

    #[test]
    fn rejects_non_cfg() {
        let mut buff = [0u8; 64];
        assert_eq!(gen_ubx("NAV-PVT 1", &mut buff), 0);
        assert_eq!(gen_ubx("", &mut buff), 0);
        assert_eq!(gen_ubx("CFG-NOSUCH 1", &mut buff), 0);
    }

    #[test]
    fn valset_rate_meas() {
        let mut buff = [0u8; 64];
        let n = gen_ubx("CFG-VALSET 0 1 0 0 CFG-RATE-MEAS 100", &mut buff);
        let (key_id, vtype) = crate::valset::lookup("RATE-MEAS").unwrap();
        assert_eq!(n, 8 + 4 + 4 + vtype.size());
        assert_eq!(&buff[0..4], &[0xB5, 0x62, 0x06, 0x8A]);
        /* header */
        assert_eq!(&buff[6..10], &[0, 1, 0, 0]);
        /* key id, little endian */
        assert_eq!(&buff[10..14], &key_id.to_le_bytes());
        /* value */
        assert_eq!(&buff[14..16], &100u16.to_le_bytes());
        assert!(checksum::verify(&buff[..n]));
    }

    #[test]
    fn valset_requires_key_and_value() {
        let mut buff = [0u8; 64];
        assert_eq!(gen_ubx("CFG-VALSET 0 1 0 0 CFG-RATE-MEAS", &mut buff), 0);
        assert_eq!(gen_ubx("CFG-VALSET 0 1 0 0", &mut buff), 0);
        assert_eq!(gen_ubx("CFG-VALSET 0 1 0 0 RATE-MEAS 100", &mut buff), 0);
        assert_eq!(gen_ubx("CFG-VALSET 0 1 0 0 CFG-NO-SUCH-KEY 100", &mut buff), 0);
    }

    #[test]
    fn buffer_too_small_returns_zero() {
        let mut buff = [0u8; 8];
        assert_eq!(gen_ubx("CFG-MSG 1 1", &mut buff), 0);
    }

    #[test]
    fn every_catalogue_entry_roundtrips() {
        /* generate each message with no arguments and feed it back
         * through the synchronizer: exactly one well-formed frame with
         * class 0x06 and the catalogue id */
        for def in CFG_MSGS {
            let cmd = if def.name == "VALSET" {
                "CFG-VALSET 0 1 0 0 CFG-RATE-MEAS 100".to_string()
            } else {
                format!("CFG-{}", def.name)
            };
            let frame = gen_frame(&cmd).unwrap();
            assert!(checksum::verify(&frame), "{}", def.name);
            assert_eq!(frame[2], 0x06, "{}", def.name);
            assert_eq!(frame[3], def.id, "{}", def.name);
            let payload_len = u16::from_le_bytes([frame[4], frame[5]]) as usize;
            assert_eq!(frame.len(), payload_len + 8, "{}", def.name);

            let mut raw = RawUbx::new();
            let mut errors = 0;
            for byte in frame.iter() {
                if raw.input(*byte) == Decoded::Error {
                    errors += 1;
                }
            }
            assert_eq!(errors, 0, "{}", def.name);
            assert_eq!(raw.nbyte, 0, "{}", def.name);
        }
    }

    #[test]
    fn valset_key_catalogue_is_sorted() {
        for pair in crate::valset::VALSET_KEYS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} vs {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn valset_lookup_samples() {
        assert!(crate::valset::lookup("RATE-MEAS").is_some());
        assert!(crate::valset::lookup("UART1-BAUDRATE").is_some());
        assert!(crate::valset::lookup("SIGNAL-GPS_ENA").is_some());
        assert!(crate::valset::lookup("NOT-A-KEY").is_none());
    }
}
