/*
 * u-blox signal identifier tables: gnssId to system, (system, sigId) to
 * observation code, code to frequency slot, slot to carrier frequency
 */

use crate::gnss::{
    Sys, CODE_L1B, CODE_L1C, CODE_L1I, CODE_L2C, CODE_L2I, CODE_L2L, CODE_L2S, CODE_L7I,
    CODE_L7Q, CODE_NONE, DFRQ1_GLO, DFRQ2_GLO, FREQ1, FREQ1_CMP, FREQ1_GLO, FREQ2, FREQ2_CMP,
    FREQ2_GLO, FREQ3_CMP, FREQ3_GLO, FREQ5,
};

/* ubx gnssId to system */
pub fn ubx_sys(gnssid: u8) -> Option<Sys> {
    match gnssid {
        0 => Some(Sys::Gps),
        1 => Some(Sys::Sbs),
        2 => Some(Sys::Gal),
        3 => Some(Sys::Cmp),
        5 => Some(Sys::Qzs),
        6 => Some(Sys::Glo),
        _ => None,
    }
}

/* ubx sigId to observation code */
pub fn ubx_sig(sys: Sys, sigid: u8) -> u8 {
    match (sys, sigid) {
        (Sys::Gps, 0) => CODE_L1C, /* L1C/A */
        (Sys::Gps, 3) => CODE_L2L, /* L2C(L) */
        (Sys::Gps, 4) => CODE_L2S, /* L2C(M) */
        (Sys::Glo, 0) => CODE_L1C, /* G1C/A (GLO L1 OF) */
        (Sys::Glo, 2) => CODE_L2C, /* G2C/A (GLO L2 OF) */
        (Sys::Gal, 0) => CODE_L1C, /* E1C */
        (Sys::Gal, 1) => CODE_L1B, /* E1B */
        (Sys::Gal, 5) => CODE_L7I, /* E5bI */
        (Sys::Gal, 6) => CODE_L7Q, /* E5bQ */
        (Sys::Qzs, 0) => CODE_L1C, /* L1C/A */
        (Sys::Qzs, 5) => CODE_L2L, /* L2C(L) */
        (Sys::Cmp, 0) | (Sys::Cmp, 1) => CODE_L2I, /* B1I */
        (Sys::Cmp, 2) | (Sys::Cmp, 3) => CODE_L7I, /* B2I */
        (Sys::Sbs, _) => CODE_L1C, /* L1C/A */
        _ => CODE_NONE,
    }
}

/* 1-based frequency slot of a code in the observation record, 0 = none */
pub fn sig_idx(sys: Sys, code: u8) -> usize {
    match sys {
        Sys::Gps => match code {
            CODE_L1C => 1,
            CODE_L2L | CODE_L2S => 2,
            _ => 0,
        },
        Sys::Glo => match code {
            CODE_L1C => 1,
            CODE_L2C => 2,
            _ => 0,
        },
        Sys::Gal => match code {
            CODE_L1C | CODE_L1B => 1,
            CODE_L7I | CODE_L7Q => 2, /* E5b to slot 2 */
            _ => 0,
        },
        Sys::Qzs => match code {
            CODE_L1C => 1,
            CODE_L2L => 2,
            _ => 0,
        },
        Sys::Cmp => match code {
            CODE_L1I | CODE_L2I => 1,
            CODE_L7I => 2,
            _ => 0,
        },
        Sys::Sbs => match code {
            CODE_L1C => 1,
            _ => 0,
        },
    }
}

/* carrier frequency of a slot; GLONASS FDMA needs the frequency channel
 * number */
pub fn sig_freq(sys: Sys, f: usize, fcn: i32) -> f64 {
    const FREQ_GLO: [f64; 3] = [FREQ1_GLO, FREQ2_GLO, FREQ3_GLO];
    const DFRQ_GLO: [f64; 3] = [DFRQ1_GLO, DFRQ2_GLO, 0.0];
    const FREQ_BDS: [f64; 3] = [FREQ1_CMP, FREQ2_CMP, FREQ3_CMP];
    const FREQ_DEF: [f64; 3] = [FREQ1, FREQ2, FREQ5];

    match sys {
        Sys::Glo => FREQ_GLO[f - 1] + DFRQ_GLO[f - 1] * fcn as f64,
        Sys::Cmp => FREQ_BDS[f - 1],
        _ => FREQ_DEF[f - 1],
    }
}
