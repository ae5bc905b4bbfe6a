/*
 * Receiver raw data state and the UBX frame synchronizer
 *
 * Bytes go in one at a time through input(); whenever a complete frame
 * with a good checksum has been collected it is dispatched to the
 * decoder for its message type and the outcome is reported as a Decoded
 * status. Bad frames reset the synchronizer and never poison the
 * stream.
 */

use std::io::Read;

use log::{trace, warn};

use crate::bytefield::u2;
use crate::checksum;
use crate::cid::{
    ID_NAVSOL, ID_NAVTIME, ID_RXMRAW, ID_RXMRAWX, ID_RXMSFRB, ID_RXMSFRBX, ID_TIMTM2,
};
#[cfg(feature = "trk")]
use crate::cid::{ID_TRKD5, ID_TRKMEAS, ID_TRKSFRBX};
use crate::frame::{SYNC_1, SYNC_2};
use crate::gnss::eph::{Alm, Eph, GEph};
use crate::gnss::sbas::SbasMsg;
use crate::gnss::time::GTime;
use crate::gnss::{MAXSAT, NSATGLO};
use crate::opt::RawOpt;

/* upper bound on a complete frame (sync to checksum) */
pub const MAXRAWLEN: usize = 4096;
/* max observations per epoch */
pub const MAXOBS: usize = 64;
/* frequency slots per observation record */
pub const NFREQ: usize = 3;
pub const NEXOBS: usize = 0;
pub(crate) const NSLOT: usize = NFREQ + NEXOBS;

/* outcome of feeding one byte (or one frame from a stream) */
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Decoded {
    NeedMore,
    Observation,
    Ephemeris,
    SbasMessage,
    IonUtc,
    Error,
    EndOfStream,
}

impl Decoded {
    /* legacy integer status for hosts speaking the original convention */
    pub fn code(self) -> i32 {
        match self {
            Decoded::NeedMore => 0,
            Decoded::Observation => 1,
            Decoded::Ephemeris => 2,
            Decoded::SbasMessage => 3,
            Decoded::IonUtc => 9,
            Decoded::Error => -1,
            Decoded::EndOfStream => -2,
        }
    }
}

/* one satellite's measurements for one epoch */
#[derive(Clone, Debug)]
pub struct Obs {
    pub time: GTime,
    pub sat: usize,
    pub p: [f64; NSLOT],
    pub l: [f64; NSLOT],
    pub d: [f32; NSLOT],
    pub snr: [u8; NSLOT],
    pub lli: [u8; NSLOT],
    pub code: [u8; NSLOT],
    pub qual_p: [u8; NSLOT],
    pub qual_l: [u8; NSLOT],
}

impl Obs {
    pub(crate) fn new(time: GTime, sat: usize) -> Self {
        Self {
            time,
            sat,
            p: [0.0; NSLOT],
            l: [0.0; NSLOT],
            d: [0.0; NSLOT],
            snr: [0; NSLOT],
            lli: [0; NSLOT],
            code: [0; NSLOT],
            qual_p: [0; NSLOT],
            qual_l: [0; NSLOT],
        }
    }
}

/* an epoch of observations plus the external event bookkeeping fed by
 * TIM-TM2 */
#[derive(Clone, Debug, Default)]
pub struct ObsBatch {
    pub data: Vec<Obs>,
    pub flag: u8,
    pub rcvcount: u32,
    pub tmcount: u32,
    pub eventime: GTime,
    pub timevalid: u8,
}

/* decoded navigation data accumulated over the stream */
#[derive(Clone, Debug)]
pub struct NavData {
    pub eph: Vec<Eph>,
    pub geph: Vec<GEph>,
    pub alm: Vec<Alm>,
    pub ion_gps: [f64; 8],
    pub utc_gps: [f64; 4],
    pub ion_qzs: [f64; 8],
    pub utc_qzs: [f64; 4],
    pub leaps: i32,
}

impl Default for NavData {
    fn default() -> Self {
        Self {
            eph: vec![Eph::default(); MAXSAT],
            geph: vec![GEph::default(); NSATGLO],
            alm: vec![Alm::default(); MAXSAT],
            ion_gps: [0.0; 8],
            utc_gps: [0.0; 4],
            ion_qzs: [0.0; 8],
            utc_qzs: [0.0; 4],
            leaps: 0,
        }
    }
}

/* receiver raw data control */
pub struct RawUbx {
    pub time: GTime,
    pub obs: ObsBatch,
    pub nav: NavData,
    pub ephsat: usize,
    pub sbsmsg: SbasMsg,
    pub(crate) opt: RawOpt,

    pub(crate) buff: Box<[u8; MAXRAWLEN]>,
    pub(crate) nbyte: usize,
    pub(crate) len: usize,

    pub(crate) subfrm: Vec<[u8; 380]>,
    pub(crate) lockt: Vec<[f64; NSLOT]>,
    pub(crate) halfc: Vec<[u8; NSLOT]>,
    pub(crate) lockflag: Vec<[u8; NSLOT]>,
}

impl Default for RawUbx {
    fn default() -> Self {
        Self::new()
    }
}

impl RawUbx {
    pub fn new() -> Self {
        Self {
            time: GTime::default(),
            obs: ObsBatch::default(),
            nav: NavData::default(),
            ephsat: 0,
            sbsmsg: SbasMsg::default(),
            opt: RawOpt::default(),
            buff: Box::new([0; MAXRAWLEN]),
            nbyte: 0,
            len: 0,
            subfrm: vec![[0; 380]; MAXSAT],
            lockt: vec![[0.0; NSLOT]; MAXSAT],
            halfc: vec![[0; NSLOT]; MAXSAT],
            lockflag: vec![[0; NSLOT]; MAXSAT],
        }
    }

    pub fn with_opt(opt: &str) -> Self {
        let mut raw = Self::new();
        raw.set_opt(opt);
        raw
    }

    pub fn set_opt(&mut self, opt: &str) {
        self.opt = RawOpt::parse(opt);
    }

    /* slide the two-byte sync window */
    fn sync(&mut self, data: u8) -> bool {
        self.buff[0] = self.buff[1];
        self.buff[1] = data;
        self.buff[0] == SYNC_1 && self.buff[1] == SYNC_2
    }

    /* feed one byte from the receiver stream */
    pub fn input(&mut self, data: u8) -> Decoded {
        /* synchronize frame */
        if self.nbyte == 0 {
            if !self.sync(data) {
                return Decoded::NeedMore;
            }
            self.nbyte = 2;
            return Decoded::NeedMore;
        }
        self.buff[self.nbyte] = data;
        self.nbyte += 1;

        if self.nbyte == 6 {
            self.len = u2(&self.buff[..], 4) as usize + 8;
            if self.len > MAXRAWLEN {
                warn!("ubx length error: len={}", self.len);
                self.nbyte = 0;
                return Decoded::Error;
            }
        }
        if self.nbyte < 6 || self.nbyte < self.len {
            return Decoded::NeedMore;
        }
        self.nbyte = 0;

        self.decode()
    }

    /* fetch the next frame from a blocking byte source. Skips at most a
     * bounded run of bytes while searching for sync, so a caller can
     * interleave other work. */
    pub fn input_stream<R: Read>(&mut self, rdr: &mut R) -> Decoded {
        let mut byte = [0u8; 1];

        /* synchronize frame */
        if self.nbyte == 0 {
            let mut i = 0;
            loop {
                match rdr.read(&mut byte) {
                    Ok(0) | Err(_) => return Decoded::EndOfStream,
                    Ok(_) => {}
                }
                if self.sync(byte[0]) {
                    break;
                }
                if i >= 4096 {
                    return Decoded::NeedMore;
                }
                i += 1;
            }
        }
        if rdr.read_exact(&mut self.buff[2..6]).is_err() {
            return Decoded::EndOfStream;
        }
        self.nbyte = 6;

        self.len = u2(&self.buff[..], 4) as usize + 8;
        if self.len > MAXRAWLEN {
            warn!("ubx length error: len={}", self.len);
            self.nbyte = 0;
            return Decoded::Error;
        }
        let len = self.len;
        if rdr.read_exact(&mut self.buff[6..len]).is_err() {
            return Decoded::EndOfStream;
        }
        self.nbyte = 0;

        self.decode()
    }

    /* checksum gate and message type dispatch */
    fn decode(&mut self) -> Decoded {
        let ty = ((self.buff[2] as u16) << 8) | self.buff[3] as u16;
        trace!("decode_ubx: type={:04x} len={}", ty, self.len);

        if !checksum::verify(&self.buff[..self.len]) {
            warn!("ubx checksum error: type={:04x} len={}", ty, self.len);
            return Decoded::Error;
        }
        match ty {
            ID_RXMRAW => self.decode_rxmraw(),
            ID_RXMRAWX => self.decode_rxmrawx(),
            ID_RXMSFRB => self.decode_rxmsfrb(),
            ID_RXMSFRBX => self.decode_rxmsfrbx(),
            ID_NAVSOL => self.decode_navsol(),
            ID_NAVTIME => self.decode_navtime(),
            ID_TIMTM2 => self.decode_timtm2(),
            #[cfg(feature = "trk")]
            ID_TRKMEAS => self.decode_trkmeas(),
            #[cfg(feature = "trk")]
            ID_TRKD5 => self.decode_trkd5(),
            #[cfg(feature = "trk")]
            ID_TRKSFRBX => self.decode_trksfrbx(),
            _ => {
                trace!("decode_ubx: unsupported type={:04x} len={}", ty, self.len);
                Decoded::NeedMore
            }
        }
    }
}
