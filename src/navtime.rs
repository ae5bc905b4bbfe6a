/*
 * Receiver time from UBX-NAV-SOL / UBX-NAV-TIMEGPS, external event
 * marks from UBX-TIM-TM2
 *
 * The time messages never emit observations; they only move the
 * receiver's best-known time forward, which the subframe decoders and
 * the TRK decoders lean on.
 */

use log::{debug, trace, warn};
use serde::Deserialize;

use crate::gnss::time::gpst2time;
use crate::raw::{Decoded, RawUbx};

#[derive(Deserialize)]
struct NavSol {
    itow: u32, /* ms */
    ftow: i32, /* ns */
    week: u16,
    _gps_fix: u8,
    flags: u8,
}

#[derive(Deserialize)]
struct NavTimeGps {
    itow: u32, /* ms */
    ftow: i32, /* ns */
    week: u16,
    _leap_s: i8,
    flags: u8,
}

#[derive(Deserialize)]
struct TimTm2 {
    _ch: u8,
    flags: u8,
    count: u16,
    _wn_r: u16,
    wn_f: u16,
    tow_ms_r: u32,
    tow_sub_ms_r: u32,
    tow_ms_f: u32,
    tow_sub_ms_f: u32,
    _acc_est: u32,
}

impl RawUbx {
    /* decode ubx-nav-sol: navigation solution */
    pub(crate) fn decode_navsol(&mut self) -> Decoded {
        trace!("decode_navsol: len={}", self.len);

        if self.len < 20 {
            warn!("ubx navsol length error: len={}", self.len);
            return Decoded::Error;
        }
        let sol: NavSol = bincode::deserialize(&self.buff[6..18]).unwrap();
        /* week and tow must both be valid */
        if sol.flags & 0x0C == 0x0C {
            self.time = gpst2time(
                sol.week as i32,
                sol.itow as f64 * 1e-3 + sol.ftow as f64 * 1e-9,
            );
        }
        Decoded::NeedMore
    }

    /* decode ubx-nav-timegps: gps time solution */
    pub(crate) fn decode_navtime(&mut self) -> Decoded {
        trace!("decode_navtime: len={}", self.len);

        if self.len < 20 {
            warn!("ubx navtime length error: len={}", self.len);
            return Decoded::Error;
        }
        let sol: NavTimeGps = bincode::deserialize(&self.buff[6..18]).unwrap();
        if sol.flags & 0x03 == 0x03 {
            self.time = gpst2time(
                sol.week as i32,
                sol.itow as f64 * 1e-3 + sol.ftow as f64 * 1e-9,
            );
        }
        Decoded::NeedMore
    }

    /* decode ubx-tim-tm2: time mark data */
    pub(crate) fn decode_timtm2(&mut self) -> Decoded {
        trace!("decode_timtm2: len={}", self.len);

        if self.len < 36 {
            warn!("ubx timtm2 length error: len={}", self.len);
            return Decoded::Error;
        }
        let tm: TimTm2 = bincode::deserialize(&self.buff[6..34]).unwrap();
        let new_falling_edge = (tm.flags >> 2) & 0x01;
        let time_valid = (tm.flags >> 6) & 0x01;

        if new_falling_edge != 0 {
            self.obs.flag = 5; /* event flag */
            self.obs.eventime = gpst2time(
                tm.wn_f as i32,
                tm.tow_ms_f as f64 * 1e-3 + tm.tow_sub_ms_f as f64 * 1e-9,
            );
            self.obs.rcvcount = tm.count as u32;
            self.obs.tmcount += 1;
            self.obs.timevalid = time_valid;
        } else {
            self.obs.flag = 0;
        }
        debug!(
            "time mark rise: {}",
            gpst2time(
                tm._wn_r as i32,
                tm.tow_ms_r as f64 * 1e-3 + tm.tow_sub_ms_r as f64 * 1e-9
            )
        );
        Decoded::NeedMore
    }
}
