/*
 * GNSS domain support: constellations, satellite numbering, signal codes,
 * carrier frequencies
 *
 * Satellites are numbered 1..=MAXSAT across all constellations so that
 * per-satellite state can live in flat arrays, GPS first, then GLONASS,
 * Galileo, QZSS, BeiDou, SBAS.
 */

pub mod bits;
pub mod eph;
pub mod sbas;
pub mod time;

pub const CLIGHT: f64 = 299792458.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sys {
    Gps,
    Sbs,
    Glo,
    Gal,
    Qzs,
    Cmp,
}

pub const MINPRNGPS: u32 = 1;
pub const MAXPRNGPS: u32 = 32;
pub const MINPRNGLO: u32 = 1;
pub const MAXPRNGLO: u32 = 27;
pub const MINPRNGAL: u32 = 1;
pub const MAXPRNGAL: u32 = 36;
pub const MINPRNQZS: u32 = 193;
pub const MAXPRNQZS: u32 = 202;
pub const MINPRNCMP: u32 = 1;
pub const MAXPRNCMP: u32 = 63;
pub const MINPRNSBS: u32 = 120;
pub const MAXPRNSBS: u32 = 142;

pub const NSATGPS: usize = (MAXPRNGPS - MINPRNGPS + 1) as usize;
pub const NSATGLO: usize = (MAXPRNGLO - MINPRNGLO + 1) as usize;
pub const NSATGAL: usize = (MAXPRNGAL - MINPRNGAL + 1) as usize;
pub const NSATQZS: usize = (MAXPRNQZS - MINPRNQZS + 1) as usize;
pub const NSATCMP: usize = (MAXPRNCMP - MINPRNCMP + 1) as usize;
pub const NSATSBS: usize = (MAXPRNSBS - MINPRNSBS + 1) as usize;

pub const MAXSAT: usize = NSATGPS + NSATGLO + NSATGAL + NSATQZS + NSATCMP + NSATSBS;

/* observation code identifiers (subset used by the ubx signal table) */
pub const CODE_NONE: u8 = 0;
pub const CODE_L1C: u8 = 1; /* L1C/A, G1C/A, E1C, B1C */
pub const CODE_L1B: u8 = 11; /* E1B */
pub const CODE_L1X: u8 = 12; /* E1B+C */
pub const CODE_L2C: u8 = 14; /* G2C/A */
pub const CODE_L2S: u8 = 16; /* L2C(M) */
pub const CODE_L2L: u8 = 17; /* L2C(L) */
pub const CODE_L7I: u8 = 27; /* E5bI, B2I */
pub const CODE_L7Q: u8 = 28; /* E5bQ */
pub const CODE_L2I: u8 = 40; /* B1I */
pub const CODE_L1I: u8 = 47;

/* loss-of-lock indicator bits */
pub const LLI_SLIP: u8 = 0x01;
pub const LLI_HALFC: u8 = 0x02;

/* carrier frequencies (Hz) */
pub const FREQ1: f64 = 1.57542e9;
pub const FREQ2: f64 = 1.22760e9;
pub const FREQ5: f64 = 1.17645e9;
pub const FREQ1_GLO: f64 = 1.60200e9;
pub const DFRQ1_GLO: f64 = 0.56250e6;
pub const FREQ2_GLO: f64 = 1.24600e9;
pub const DFRQ2_GLO: f64 = 0.43750e6;
pub const FREQ3_GLO: f64 = 1.202025e9;
pub const FREQ1_CMP: f64 = 1.561098e9;
pub const FREQ2_CMP: f64 = 1.20714e9;
pub const FREQ3_CMP: f64 = 1.26852e9;

/* satellite system + prn to satellite number (1..=MAXSAT) */
pub fn satno(sys: Sys, prn: u32) -> Option<usize> {
    let (min, max, base) = match sys {
        Sys::Gps => (MINPRNGPS, MAXPRNGPS, 0),
        Sys::Glo => (MINPRNGLO, MAXPRNGLO, NSATGPS),
        Sys::Gal => (MINPRNGAL, MAXPRNGAL, NSATGPS + NSATGLO),
        Sys::Qzs => (MINPRNQZS, MAXPRNQZS, NSATGPS + NSATGLO + NSATGAL),
        Sys::Cmp => (MINPRNCMP, MAXPRNCMP, NSATGPS + NSATGLO + NSATGAL + NSATQZS),
        Sys::Sbs => (
            MINPRNSBS,
            MAXPRNSBS,
            NSATGPS + NSATGLO + NSATGAL + NSATQZS + NSATCMP,
        ),
    };
    if prn < min || max < prn {
        return None;
    }
    Some(base + (prn - min) as usize + 1)
}

/* satellite number to system + prn */
pub fn satsys(sat: usize) -> Option<(Sys, u32)> {
    if sat < 1 || MAXSAT < sat {
        return None;
    }
    let mut n = sat - 1;
    for &(sys, count, min) in &[
        (Sys::Gps, NSATGPS, MINPRNGPS),
        (Sys::Glo, NSATGLO, MINPRNGLO),
        (Sys::Gal, NSATGAL, MINPRNGAL),
        (Sys::Qzs, NSATQZS, MINPRNQZS),
        (Sys::Cmp, NSATCMP, MINPRNCMP),
        (Sys::Sbs, NSATSBS, MINPRNSBS),
    ] {
        if n < count {
            return Some((sys, min + n as u32));
        }
        n -= count;
    }
    None
}
