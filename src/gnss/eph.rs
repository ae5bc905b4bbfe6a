/*
 * Broadcast ephemeris reconstruction from reassembled navigation frames
 *
 * decode_frame      - GPS/QZSS LNAV subframes 1..5 (ephemeris, almanac,
 *                     ion/utc parameters)
 * decode_gal_inav   - Galileo I/NAV word types 0..5
 * decode_bds_d1     - BeiDou D1 (MEO/IGSO) subframes 1..3
 * decode_bds_d2     - BeiDou D2 (GEO) subframe 1 pages 1..10
 * decode_glostr     - GLONASS strings 1..4
 *
 * Buffers are the per-satellite scratch areas filled by the subframe
 * store; layouts are described there.
 */

use log::debug;

use crate::gnss::bits::{getbitg, getbits, getbits2, getbitu, getbitu2, merge_two_s, merge_two_u};
use crate::gnss::time::{
    adjgpsweek, bdt2gpst, bdt2time, gpst2time, gpst2utc, gst2time, time2gpst, timeadd, timediff,
    utc2gpst, GTime,
};
use crate::gnss::{satno, Sys};

pub const SC2RAD: f64 = 3.1415926535898;

pub const P2_5: f64 = 0.03125;
pub const P2_6: f64 = 0.015625;
pub const P2_11: f64 = 4.882812500000000e-04;
pub const P2_19: f64 = 1.907348632812500e-06;
pub const P2_20: f64 = 9.536743164062500e-07;
pub const P2_21: f64 = 4.768371582031250e-07;
pub const P2_23: f64 = 1.192092895507810e-07;
pub const P2_24: f64 = 5.960464477539063e-08;
pub const P2_27: f64 = 7.450580596923828e-09;
pub const P2_29: f64 = 1.862645149230957e-09;
pub const P2_30: f64 = 9.313225746154785e-10;
pub const P2_31: f64 = 4.656612873077393e-10;
pub const P2_32: f64 = 2.328306436538696e-10;
pub const P2_33: f64 = 1.164153218269348e-10;
pub const P2_34: f64 = 5.820766091346740e-11;
pub const P2_38: f64 = 3.637978807091710e-12;
pub const P2_40: f64 = 9.094947017729280e-13;
pub const P2_43: f64 = 1.136868377216160e-13;
pub const P2_46: f64 = 1.421085471520200e-14;
pub const P2_50: f64 = 8.881784197001252e-16;
pub const P2_55: f64 = 2.775557561562891e-17;
pub const P2_59: f64 = 1.734723475976807e-18;
pub const P2_66: f64 = 1.355252715606881e-20;

/* GPS/Galileo/BeiDou/QZSS broadcast ephemeris */
#[derive(Clone, Default, Debug)]
pub struct Eph {
    pub sat: usize,
    pub iode: i32,
    pub iodc: i32,
    pub sva: i32,
    pub svh: i32,
    pub week: i32,
    pub code: i32,
    pub flag: i32,
    pub toe: GTime,
    pub toc: GTime,
    pub ttr: GTime,
    pub a: f64,
    pub e: f64,
    pub i0: f64,
    pub omg0: f64,
    pub omg: f64,
    pub m0: f64,
    pub deln: f64,
    pub omgd: f64,
    pub idot: f64,
    pub crc: f64,
    pub crs: f64,
    pub cuc: f64,
    pub cus: f64,
    pub cic: f64,
    pub cis: f64,
    pub toes: f64,
    pub fit: f64,
    pub f0: f64,
    pub f1: f64,
    pub f2: f64,
    pub tgd: [f64; 2],
}

/* GLONASS broadcast ephemeris */
#[derive(Clone, Default, Debug)]
pub struct GEph {
    pub sat: usize,
    pub iode: i32,
    pub frq: i32,
    pub svh: i32,
    pub sva: i32,
    pub age: i32,
    pub toe: GTime,
    pub tof: GTime,
    pub pos: [f64; 3],
    pub vel: [f64; 3],
    pub acc: [f64; 3],
    pub taun: f64,
    pub gamn: f64,
    pub dtaun: f64,
}

/* GPS/QZSS almanac */
#[derive(Clone, Default, Debug)]
pub struct Alm {
    pub sat: usize,
    pub svh: i32,
    pub svconf: i32,
    pub week: i32,
    pub toa: GTime,
    pub a: f64,
    pub e: f64,
    pub i0: f64,
    pub omg0: f64,
    pub omg: f64,
    pub m0: f64,
    pub omgd: f64,
    pub toas: f64,
    pub f0: f64,
    pub f1: f64,
}

/* ---- GPS/QZSS LNAV ----------------------------------------------------- */

fn decode_subfrm1(buff: &[u8], time: GTime, eph: &mut Eph) -> i32 {
    let tow = getbitu(buff, 24, 17) as f64 * 6.0;
    let mut i = 48;
    let week = getbitu(buff, i, 10) as i32;
    i += 10;
    eph.code = getbitu(buff, i, 2) as i32;
    i += 2;
    eph.sva = getbitu(buff, i, 4) as i32;
    i += 4;
    eph.svh = getbitu(buff, i, 6) as i32;
    i += 6;
    let iodc0 = getbitu(buff, i, 2);
    i += 2;
    eph.flag = getbitu(buff, i, 1) as i32;
    i += 1 + 87;
    let tgd = getbits(buff, i, 8);
    i += 8;
    let iodc1 = getbitu(buff, i, 8);
    i += 8;
    let toc = getbitu(buff, i, 16) as f64 * 16.0;
    i += 16;
    eph.f2 = getbits(buff, i, 8) as f64 * P2_55;
    i += 8;
    eph.f1 = getbits(buff, i, 16) as f64 * P2_43;
    i += 16;
    eph.f0 = getbits(buff, i, 22) as f64 * P2_31;
    eph.tgd[0] = if tgd == -128 { 0.0 } else { tgd as f64 * P2_31 };
    eph.iodc = ((iodc0 << 8) + iodc1) as i32;
    eph.week = adjgpsweek(week, time);
    eph.ttr = gpst2time(eph.week, tow);
    eph.toc = gpst2time(eph.week, toc);
    1
}

fn decode_subfrm2(buff: &[u8], eph: &mut Eph) -> i32 {
    let mut i = 48;
    eph.iode = getbitu(buff, i, 8) as i32;
    i += 8;
    eph.crs = getbits(buff, i, 16) as f64 * P2_5;
    i += 16;
    eph.deln = getbits(buff, i, 16) as f64 * P2_43 * SC2RAD;
    i += 16;
    eph.m0 = getbits(buff, i, 32) as f64 * P2_31 * SC2RAD;
    i += 32;
    eph.cuc = getbits(buff, i, 16) as f64 * P2_29;
    i += 16;
    eph.e = getbitu(buff, i, 32) as f64 * P2_33;
    i += 32;
    eph.cus = getbits(buff, i, 16) as f64 * P2_29;
    i += 16;
    let sqrt_a = getbitu(buff, i, 32) as f64 * P2_19;
    i += 32;
    eph.toes = getbitu(buff, i, 16) as f64 * 16.0;
    i += 16;
    eph.fit = if getbitu(buff, i, 1) != 0 { 0.0 } else { 4.0 };
    eph.a = sqrt_a * sqrt_a;
    2
}

fn decode_subfrm3(buff: &[u8], eph: &mut Eph) -> i32 {
    let mut i = 48;
    eph.cic = getbits(buff, i, 16) as f64 * P2_29;
    i += 16;
    eph.omg0 = getbits(buff, i, 32) as f64 * P2_31 * SC2RAD;
    i += 32;
    eph.cis = getbits(buff, i, 16) as f64 * P2_29;
    i += 16;
    eph.i0 = getbits(buff, i, 32) as f64 * P2_31 * SC2RAD;
    i += 32;
    eph.crc = getbits(buff, i, 16) as f64 * P2_5;
    i += 16;
    eph.omg = getbits(buff, i, 32) as f64 * P2_31 * SC2RAD;
    i += 32;
    eph.omgd = getbits(buff, i, 24) as f64 * P2_43 * SC2RAD;
    i += 24;
    let iode = getbitu(buff, i, 8) as i32;
    i += 8;
    eph.idot = getbits(buff, i, 14) as f64 * P2_43 * SC2RAD;

    /* iode of subframes 2 and 3 and the lsb of iodc must agree */
    if iode != eph.iode || iode != (eph.iodc & 0xFF) {
        return 0;
    }
    let mut tow = time2gpst(eph.ttr, Some(&mut eph.week));
    let toc = time2gpst(eph.toc, None);
    if eph.toes < tow - 302400.0 {
        eph.week += 1;
        tow -= 604800.0;
    } else if eph.toes > tow + 302400.0 {
        eph.week -= 1;
        tow += 604800.0;
    }
    eph.toe = gpst2time(eph.week, eph.toes);
    eph.toc = gpst2time(eph.week, toc);
    eph.ttr = gpst2time(eph.week, tow);
    3
}

fn decode_almanac(buff: &[u8], sat: usize, alm: &mut [Alm]) {
    if alm[sat - 1].week == 0 {
        return; /* reference week not received yet (subframe 5 page 25) */
    }
    let mut i = 56;
    alm[sat - 1].sat = sat;
    alm[sat - 1].e = getbitu(buff, i, 16) as f64 * P2_21;
    i += 16;
    alm[sat - 1].toas = getbitu(buff, i, 8) as f64 * 4096.0;
    i += 8;
    let deltai = getbits(buff, i, 16) as f64 * P2_19 * SC2RAD;
    i += 16;
    alm[sat - 1].omgd = getbits(buff, i, 16) as f64 * P2_38 * SC2RAD;
    i += 16;
    alm[sat - 1].svh = getbitu(buff, i, 8) as i32;
    i += 8;
    let sqrt_a = getbitu(buff, i, 24) as f64 * P2_11;
    i += 24;
    alm[sat - 1].omg0 = getbits(buff, i, 24) as f64 * P2_23 * SC2RAD;
    i += 24;
    alm[sat - 1].omg = getbits(buff, i, 24) as f64 * P2_23 * SC2RAD;
    i += 24;
    alm[sat - 1].m0 = getbits(buff, i, 24) as f64 * P2_23 * SC2RAD;
    i += 24;
    let f0_msb = getbits(buff, i, 8);
    i += 8;
    alm[sat - 1].f1 = getbits(buff, i, 11) as f64 * P2_38;
    i += 11;
    alm[sat - 1].f0 = merge_two_s(f0_msb, getbitu(buff, i, 3), 3) as f64 * P2_20;
    alm[sat - 1].a = sqrt_a * sqrt_a;
    alm[sat - 1].i0 = 0.3 * SC2RAD + deltai;

    let toa = gpst2time(alm[sat - 1].week, alm[sat - 1].toas);
    let tt = timediff(toa, alm[sat - 1].toa);
    if tt < -302400.0 {
        alm[sat - 1].week += 1;
    } else if tt > 302400.0 {
        alm[sat - 1].week -= 1;
    }
    alm[sat - 1].toa = gpst2time(alm[sat - 1].week, alm[sat - 1].toas);
}

fn decode_subfrm4(
    buff: &[u8],
    alm: Option<&mut [Alm]>,
    ion: Option<&mut [f64; 8]>,
    utc: Option<&mut [f64; 4]>,
    leaps: Option<&mut i32>,
) -> i32 {
    let svid = getbitu(buff, 50, 6) as usize;

    if (25..=32).contains(&svid) {
        /* pages 2,3,4,5,7,8,9,10: almanac for sat 25-32 */
        if let Some(alm) = alm {
            decode_almanac(buff, svid, alm);
        }
    } else if svid == 63 {
        /* page 25: sv config and health of sat 25-32 */
        if let Some(alm) = alm {
            let mut i = 56;
            for sat in 1..=32usize {
                alm[sat - 1].svconf = getbitu(buff, i, 4) as i32;
                i += 4;
            }
            i = 186;
            for sat in 25..=32usize {
                alm[sat - 1].svh = getbitu(buff, i, 6) as i32;
                i += 6;
            }
        }
    } else if svid == 56 {
        /* page 18: ion/utc parameters */
        if let Some(ion) = ion {
            let mut i = 56;
            ion[0] = getbits(buff, i, 8) as f64 * P2_30;
            i += 8;
            ion[1] = getbits(buff, i, 8) as f64 * P2_27;
            i += 8;
            ion[2] = getbits(buff, i, 8) as f64 * P2_24;
            i += 8;
            ion[3] = getbits(buff, i, 8) as f64 * P2_24;
            i += 8;
            ion[4] = getbits(buff, i, 8) as f64 * 2048.0;
            i += 8;
            ion[5] = getbits(buff, i, 8) as f64 * 16384.0;
            i += 8;
            ion[6] = getbits(buff, i, 8) as f64 * 65536.0;
            i += 8;
            ion[7] = getbits(buff, i, 8) as f64 * 65536.0;
        }
        if let Some(utc) = utc {
            let mut i = 120;
            utc[1] = getbits(buff, i, 24) as f64 * P2_50;
            i += 24;
            utc[0] = getbits(buff, i, 32) as f64 * P2_30;
            i += 32;
            utc[2] = getbits(buff, i, 8) as f64 * 4096.0;
            i += 8;
            utc[3] = getbitu(buff, i, 8) as f64;
        }
        if let Some(leaps) = leaps {
            *leaps = getbits(buff, 192, 8);
        }
    }
    4
}

fn decode_subfrm5(buff: &[u8], time: GTime, alm: Option<&mut [Alm]>) -> i32 {
    let svid = getbitu(buff, 50, 6) as usize;

    if (1..=24).contains(&svid) {
        if let Some(alm) = alm {
            decode_almanac(buff, svid, alm);
        }
    } else if svid == 51 {
        /* page 25: toa, week and health of sat 1-24 */
        if let Some(alm) = alm {
            let mut i = 56;
            let toas = getbitu(buff, i, 8) as f64 * 4096.0;
            i += 8;
            let week = adjgpsweek(getbitu(buff, i, 8) as i32, time);
            i += 8;
            for sat in 1..=24usize {
                alm[sat - 1].svh = getbitu(buff, i, 6) as i32;
                i += 6;
            }
            for sat in 1..=32usize {
                alm[sat - 1].toas = toas;
                alm[sat - 1].week = week;
                alm[sat - 1].toa = gpst2time(week, toas);
            }
        }
    }
    5
}

/* decode one LNAV subframe (30 bytes, 10 x 24 bits) from the subframe
 * store. Returns the subframe id (1-5), 0 on failure. */
pub fn decode_frame(
    buff: &[u8],
    time: GTime,
    eph: Option<&mut Eph>,
    alm: Option<&mut [Alm]>,
    ion: Option<&mut [f64; 8]>,
    utc: Option<&mut [f64; 4]>,
    leaps: Option<&mut i32>,
) -> i32 {
    let id = getbitu(buff, 43, 3);
    match (id, eph) {
        (1, Some(eph)) => decode_subfrm1(buff, time, eph),
        (2, Some(eph)) => decode_subfrm2(buff, eph),
        (3, Some(eph)) => decode_subfrm3(buff, eph),
        (4, _) => decode_subfrm4(buff, alm, ion, utc, leaps),
        (5, _) => decode_subfrm5(buff, time, alm),
        _ => 0,
    }
}

/* ---- Galileo I/NAV ----------------------------------------------------- */

/* decode I/NAV word types 0..5 from the reassembled page buffer
 * (16 bytes per word type) */
pub fn decode_gal_inav(buff: &[u8], eph: &mut Eph) -> bool {
    let mut types = [0u32; 6];
    let mut iod_nav = [0u32; 4];

    let mut i = 0; /* word type 0 */
    types[0] = getbitu(buff, i, 6);
    i += 6;
    let time_f = getbitu(buff, i, 2);
    i += 2 + 88;
    let mut week = getbitu(buff, i, 12) as i32; /* gst week */
    i += 12;
    let tow = getbitu(buff, i, 20) as f64;

    i = 128; /* word type 1 */
    types[1] = getbitu(buff, i, 6);
    i += 6;
    iod_nav[0] = getbitu(buff, i, 10);
    i += 10;
    eph.toes = getbitu(buff, i, 14) as f64 * 60.0;
    i += 14;
    eph.m0 = getbits(buff, i, 32) as f64 * P2_31 * SC2RAD;
    i += 32;
    eph.e = getbitu(buff, i, 32) as f64 * P2_33;
    i += 32;
    let sqrt_a = getbitu(buff, i, 32) as f64 * P2_19;

    i = 128 * 2; /* word type 2 */
    types[2] = getbitu(buff, i, 6);
    i += 6;
    iod_nav[1] = getbitu(buff, i, 10);
    i += 10;
    eph.omg0 = getbits(buff, i, 32) as f64 * P2_31 * SC2RAD;
    i += 32;
    eph.i0 = getbits(buff, i, 32) as f64 * P2_31 * SC2RAD;
    i += 32;
    eph.omg = getbits(buff, i, 32) as f64 * P2_31 * SC2RAD;
    i += 32;
    eph.idot = getbits(buff, i, 14) as f64 * P2_43 * SC2RAD;

    i = 128 * 3; /* word type 3 */
    types[3] = getbitu(buff, i, 6);
    i += 6;
    iod_nav[2] = getbitu(buff, i, 10);
    i += 10;
    eph.omgd = getbits(buff, i, 24) as f64 * P2_43 * SC2RAD;
    i += 24;
    eph.deln = getbits(buff, i, 16) as f64 * P2_43 * SC2RAD;
    i += 16;
    eph.cuc = getbits(buff, i, 16) as f64 * P2_29;
    i += 16;
    eph.cus = getbits(buff, i, 16) as f64 * P2_29;
    i += 16;
    eph.crc = getbits(buff, i, 16) as f64 * P2_5;
    i += 16;
    eph.crs = getbits(buff, i, 16) as f64 * P2_5;
    i += 16;
    eph.sva = getbitu(buff, i, 8) as i32;

    i = 128 * 4; /* word type 4 */
    types[4] = getbitu(buff, i, 6);
    i += 6;
    iod_nav[3] = getbitu(buff, i, 10);
    i += 10;
    let svid = getbitu(buff, i, 6);
    i += 6;
    eph.cic = getbits(buff, i, 16) as f64 * P2_29;
    i += 16;
    eph.cis = getbits(buff, i, 16) as f64 * P2_29;
    i += 16;
    let toc = getbitu(buff, i, 14) as f64 * 60.0;
    i += 14;
    eph.f0 = getbits(buff, i, 31) as f64 * P2_34;
    i += 31;
    eph.f1 = getbits(buff, i, 21) as f64 * P2_46;
    i += 21;
    eph.f2 = getbits(buff, i, 6) as f64 * P2_59;

    i = 128 * 5; /* word type 5 */
    types[5] = getbitu(buff, i, 6);
    i += 6 + 41;
    eph.tgd[0] = getbits(buff, i, 10) as f64 * P2_32; /* BGD E5a/E1 */
    i += 10;
    eph.tgd[1] = getbits(buff, i, 10) as f64 * P2_32; /* BGD E5b/E1 */
    i += 10;
    let e5b_hs = getbitu(buff, i, 2);
    i += 2;
    let e1b_hs = getbitu(buff, i, 2);
    i += 2;
    let e5b_dvs = getbitu(buff, i, 1);
    i += 1;
    let e1b_dvs = getbitu(buff, i, 1);

    for (w, ty) in types.iter().enumerate() {
        if *ty != w as u32 {
            debug!("decode_gal_inav error: type={:?}", types);
            return false;
        }
    }
    if time_f != 2 {
        debug!("decode_gal_inav error: word0-time={}", time_f);
        return false;
    }
    if iod_nav[0] != iod_nav[1] || iod_nav[0] != iod_nav[2] || iod_nav[0] != iod_nav[3] {
        debug!("decode_gal_inav error: iod_nav={:?}", iod_nav);
        return false;
    }
    let sat = match satno(Sys::Gal, svid) {
        Some(sat) => sat,
        None => {
            debug!("decode_gal_inav svid error: svid={}", svid);
            return false;
        }
    };
    eph.sat = sat;
    eph.a = sqrt_a * sqrt_a;
    eph.iode = iod_nav[0] as i32;
    eph.iodc = iod_nav[0] as i32;
    eph.svh = ((e5b_hs << 7) | (e5b_dvs << 6) | (e1b_hs << 1) | e1b_dvs) as i32;
    eph.ttr = gst2time(week, tow);
    /* week rollover so that toe stays close to the transmission time */
    let tt = timediff(gst2time(week, eph.toes), eph.ttr);
    if tt > 302400.0 {
        week -= 1;
    } else if tt < -302400.0 {
        week += 1;
    }
    eph.toe = gst2time(week, eph.toes);
    eph.toc = gst2time(week, toc);
    eph.week = week + 1024; /* gal week = gst week + 1024 */
    eph.code = (1 << 0) | (1 << 9); /* data source: I/NAV E1-B, af0-af2 for E5b-E1 */
    true
}

/* ---- BeiDou D1/D2 ------------------------------------------------------ */

/* decode BeiDou D1 ephemeris from subframes 1-3 (38 bytes each) */
pub fn decode_bds_d1(buff: &[u8], eph: &mut Eph) -> bool {
    let mut i = 0; /* subframe 1 */
    let frn1 = getbitu(buff, i + 15, 3);
    let sow1 = getbitu2(buff, i + 18, 8, i + 30, 12);
    eph.svh = getbitu(buff, i + 42, 1) as i32; /* SatH1 */
    eph.iodc = getbitu(buff, i + 43, 5) as i32; /* AODC */
    eph.sva = getbitu(buff, i + 48, 4) as i32;
    let bdt_week = getbitu(buff, i + 60, 13) as i32;
    let toc_bds = getbitu2(buff, i + 73, 9, i + 90, 8) as f64 * 8.0;
    eph.tgd[0] = getbits(buff, i + 98, 10) as f64 * 0.1e-9;
    eph.tgd[1] = getbits2(buff, i + 108, 4, i + 120, 6) as f64 * 0.1e-9;
    eph.f2 = getbits(buff, i + 214, 11) as f64 * P2_66;
    eph.f0 = getbits2(buff, i + 225, 7, i + 240, 17) as f64 * P2_33;
    eph.f1 = getbits2(buff, i + 257, 5, i + 270, 17) as f64 * P2_50;
    eph.iode = getbitu(buff, i + 287, 5) as i32; /* AODE */

    i = 8 * 38; /* subframe 2 */
    let frn2 = getbitu(buff, i + 15, 3);
    let sow2 = getbitu2(buff, i + 18, 8, i + 30, 12);
    eph.deln = getbits2(buff, i + 42, 10, i + 60, 6) as f64 * P2_43 * SC2RAD;
    eph.cuc = getbits2(buff, i + 66, 16, i + 90, 2) as f64 * P2_31;
    eph.m0 = getbits2(buff, i + 92, 20, i + 120, 12) as f64 * P2_31 * SC2RAD;
    eph.e = getbitu2(buff, i + 132, 10, i + 150, 22) as f64 * P2_33;
    eph.cus = getbits(buff, i + 172, 18) as f64 * P2_31;
    eph.crc = getbits2(buff, i + 190, 4, i + 210, 14) as f64 * P2_6;
    eph.crs = getbits2(buff, i + 224, 8, i + 240, 10) as f64 * P2_6;
    let sqrt_a = getbitu2(buff, i + 250, 12, i + 270, 20) as f64 * P2_19;
    let toe_msb = getbitu(buff, i + 290, 2);
    eph.a = sqrt_a * sqrt_a;

    i = 8 * 38 * 2; /* subframe 3 */
    let frn3 = getbitu(buff, i + 15, 3);
    let sow3 = getbitu2(buff, i + 18, 8, i + 30, 12);
    let toe_lsb = getbitu2(buff, i + 42, 10, i + 60, 5);
    eph.i0 = getbits2(buff, i + 65, 17, i + 90, 15) as f64 * P2_31 * SC2RAD;
    eph.cic = getbits2(buff, i + 105, 7, i + 120, 11) as f64 * P2_31;
    eph.omgd = getbits2(buff, i + 131, 11, i + 150, 13) as f64 * P2_43 * SC2RAD;
    eph.cis = getbits2(buff, i + 163, 9, i + 180, 9) as f64 * P2_31;
    eph.idot = getbits2(buff, i + 189, 13, i + 210, 1) as f64 * P2_43 * SC2RAD;
    eph.omg0 = getbits2(buff, i + 211, 21, i + 240, 11) as f64 * P2_31 * SC2RAD;
    eph.omg = getbits2(buff, i + 251, 11, i + 270, 21) as f64 * P2_31 * SC2RAD;
    eph.toes = merge_two_u(toe_msb, toe_lsb, 15) as f64 * 8.0;

    if frn1 != 1 || frn2 != 2 || frn3 != 3 {
        debug!("decode_bds_d1 error: frn={} {} {}", frn1, frn2, frn3);
        return false;
    }
    if sow2 != sow1 + 6 || sow3 != sow2 + 6 {
        debug!("decode_bds_d1 error: sow={} {} {}", sow1, sow2, sow3);
        return false;
    }
    eph.flag = 1; /* IGSO/MEO */
    eph.week = bdt_week;
    eph.toe = bdt2gpst(bdt2time(bdt_week, eph.toes));
    eph.toc = bdt2gpst(bdt2time(bdt_week, toc_bds));
    eph.ttr = bdt2gpst(bdt2time(bdt_week, sow1 as f64));
    true
}

/* decode BeiDou D2 ephemeris from subframe 1 pages 1-10 (38 bytes each,
 * the ephemeris is spread over pages 1 and 3-10) */
pub fn decode_bds_d2(buff: &[u8], eph: &mut Eph) -> bool {
    let mut pgn = [0u32; 10];
    for (p, page) in pgn.iter_mut().enumerate() {
        *page = getbitu(buff, 8 * 38 * p + 42, 4);
    }

    let mut i = 0; /* page 1 */
    let sow1 = getbitu2(buff, i + 18, 8, i + 30, 12);
    eph.svh = getbitu(buff, i + 46, 1) as i32; /* SatH1 */
    eph.iodc = getbitu(buff, i + 47, 5) as i32; /* AODC */
    eph.sva = getbitu(buff, i + 60, 4) as i32;
    let bdt_week = getbitu(buff, i + 64, 13) as i32;
    let toc_bds = getbitu2(buff, i + 77, 5, i + 90, 12) as f64 * 8.0;
    eph.tgd[0] = getbits(buff, i + 102, 10) as f64 * 0.1e-9;

    i = 8 * 38 * 2; /* page 3 */
    eph.f0 = getbits2(buff, i + 100, 12, i + 120, 12) as f64 * P2_33;
    let f1_msb = getbits(buff, i + 132, 4);

    i = 8 * 38 * 3; /* page 4 */
    let f1_lsb = getbitu2(buff, i + 46, 6, i + 60, 12);
    eph.f1 = merge_two_s(f1_msb, f1_lsb, 18) as f64 * P2_50;
    eph.f2 = getbits2(buff, i + 72, 10, i + 90, 1) as f64 * P2_66;
    eph.iode = getbitu(buff, i + 91, 5) as i32; /* AODE */
    eph.deln = getbits(buff, i + 96, 16) as f64 * P2_43 * SC2RAD;
    let cuc_msb = getbits(buff, i + 112, 5);

    i = 8 * 38 * 4; /* page 5 */
    eph.cuc = merge_two_s(cuc_msb, getbitu(buff, i + 46, 13), 13) as f64 * P2_31;
    eph.m0 = getbits2(buff, i + 59, 23, i + 90, 9) as f64 * P2_31 * SC2RAD;
    eph.e = getbitu2(buff, i + 99, 21, i + 120, 11) as f64 * P2_33;

    i = 8 * 38 * 5; /* page 6 */
    eph.cus = getbits(buff, i + 46, 18) as f64 * P2_31;
    eph.crc = getbits(buff, i + 64, 18) as f64 * P2_6;
    let crs_msb = getbits(buff, i + 82, 6);

    i = 8 * 38 * 6; /* page 7 */
    eph.crs = merge_two_s(crs_msb, getbitu(buff, i + 46, 12), 12) as f64 * P2_6;
    let sqrt_a = getbitu2(buff, i + 58, 12, i + 90, 20) as f64 * P2_19;
    let toe_msb = getbitu(buff, i + 110, 2);
    eph.a = sqrt_a * sqrt_a;

    i = 8 * 38 * 7; /* page 8 */
    eph.toes = merge_two_u(toe_msb, getbitu(buff, i + 46, 15), 15) as f64 * 8.0;
    eph.i0 = getbits2(buff, i + 61, 11, i + 90, 21) as f64 * P2_31 * SC2RAD;
    let cic_msb = getbits(buff, i + 111, 8);

    i = 8 * 38 * 8; /* page 9 */
    eph.cic = merge_two_s(cic_msb, getbitu(buff, i + 46, 10), 10) as f64 * P2_31;
    eph.omg0 = getbits2(buff, i + 56, 11, i + 90, 21) as f64 * P2_31 * SC2RAD;
    let cis_msb = getbits(buff, i + 111, 9);

    i = 8 * 38 * 9; /* page 10 */
    eph.cis = merge_two_s(cis_msb, getbitu(buff, i + 46, 9), 9) as f64 * P2_31;
    eph.idot = getbits2(buff, i + 55, 13, i + 90, 1) as f64 * P2_43 * SC2RAD;
    eph.omg = getbits2(buff, i + 91, 21, i + 120, 11) as f64 * P2_31 * SC2RAD;
    eph.omgd = getbits2(buff, i + 131, 19, i + 150, 5) as f64 * P2_43 * SC2RAD;

    for (p, page) in pgn.iter().enumerate() {
        if *page != p as u32 + 1 {
            debug!("decode_bds_d2 error: pgn[{}]={}", p, page);
            return false;
        }
    }
    eph.flag = 2; /* GEO */
    eph.week = bdt_week;
    eph.toe = bdt2gpst(bdt2time(bdt_week, eph.toes));
    eph.toc = bdt2gpst(bdt2time(bdt_week, toc_bds));
    eph.ttr = bdt2gpst(bdt2time(bdt_week, sow1 as f64));
    true
}

/* ---- GLONASS ----------------------------------------------------------- */

/* decode GLONASS ephemeris from strings 1-4 (10 bytes each). geph.tof
 * must hold the reception time on entry. */
pub fn decode_glostr(buff: &[u8], geph: &mut GEph) -> bool {
    let mut i = 1;
    /* string 1 */
    let frn1 = getbitu(buff, i, 4);
    i += 4 + 2;
    let _p1 = getbitu(buff, i, 2);
    i += 2;
    let tk_h = getbitu(buff, i, 5);
    i += 5;
    let tk_m = getbitu(buff, i, 6);
    i += 6;
    let tk_s = getbitu(buff, i, 1) * 30;
    i += 1;
    geph.vel[0] = getbitg(buff, i, 24) * P2_20 * 1e3;
    i += 24;
    geph.acc[0] = getbitg(buff, i, 5) * P2_30 * 1e3;
    i += 5;
    geph.pos[0] = getbitg(buff, i, 27) * P2_11 * 1e3;

    /* string 2 */
    i = 80 + 1;
    let frn2 = getbitu(buff, i, 4);
    i += 4;
    geph.svh = getbitu(buff, i, 3) as i32;
    i += 3;
    let _p2 = getbitu(buff, i, 1);
    i += 1;
    let tb = getbitu(buff, i, 7) * 900;
    i += 7 + 5;
    geph.vel[1] = getbitg(buff, i, 24) * P2_20 * 1e3;
    i += 24;
    geph.acc[1] = getbitg(buff, i, 5) * P2_30 * 1e3;
    i += 5;
    geph.pos[1] = getbitg(buff, i, 27) * P2_11 * 1e3;

    /* string 3 */
    i = 2 * 80 + 1;
    let frn3 = getbitu(buff, i, 4);
    i += 4;
    let _p3 = getbitu(buff, i, 1);
    i += 1;
    geph.gamn = getbitg(buff, i, 11) * P2_40;
    i += 11 + 1;
    let _p = getbitu(buff, i, 2);
    i += 2;
    let _ln = getbitu(buff, i, 1);
    i += 1;
    geph.vel[2] = getbitg(buff, i, 24) * P2_20 * 1e3;
    i += 24;
    geph.acc[2] = getbitg(buff, i, 5) * P2_30 * 1e3;
    i += 5;
    geph.pos[2] = getbitg(buff, i, 27) * P2_11 * 1e3;

    /* string 4 */
    i = 3 * 80 + 1;
    let frn4 = getbitu(buff, i, 4);
    i += 4;
    geph.taun = getbitg(buff, i, 22) * P2_30;
    i += 22;
    geph.dtaun = getbitg(buff, i, 5) * P2_30;
    i += 5;
    geph.age = getbitu(buff, i, 5) as i32;
    i += 5 + 14;
    let _p4 = getbitu(buff, i, 1);
    i += 1;
    geph.sva = getbitu(buff, i, 4) as i32;
    i += 4 + 3;
    let _nt = getbitu(buff, i, 11);
    i += 11;
    let slot = getbitu(buff, i, 5);
    i += 5;
    let _m = getbitu(buff, i, 2);

    if frn1 != 1 || frn2 != 2 || frn3 != 3 || frn4 != 4 {
        debug!(
            "decode_glostr error: frn={} {} {} {}",
            frn1, frn2, frn3, frn4
        );
        return false;
    }
    let sat = match satno(Sys::Glo, slot) {
        Some(sat) => sat,
        None => {
            debug!("decode_glostr error: slot={}", slot);
            return false;
        }
    };
    geph.sat = sat;
    geph.iode = (tb / 900) as i32;

    /* day times to absolute times, Moscow time to utc to gpst */
    let mut week = 0;
    let mut tow = time2gpst(gpst2utc(geph.tof), Some(&mut week));
    let tod = tow % 86400.0;
    tow -= tod;
    let mut tof = tk_h as f64 * 3600.0 + tk_m as f64 * 60.0 + tk_s as f64 - 10800.0;
    if tof < tod - 43200.0 {
        tof += 86400.0;
    } else if tof > tod + 43200.0 {
        tof -= 86400.0;
    }
    geph.tof = utc2gpst(timeadd(gpst2time(week, tow), tof));
    let mut toe = tb as f64 - 10800.0;
    if toe < tod - 43200.0 {
        toe += 86400.0;
    } else if toe > tod + 43200.0 {
        toe -= 86400.0;
    }
    geph.toe = utc2gpst(timeadd(gpst2time(week, tow), toe));
    true
}
