/*
 * UBX-TRK-MEAS / UBX-TRK-D5 tracking channel decoders
 *
 * These messages are not documented by the vendor; layouts follow
 * observed NEO-M8N (F/W 2.01) and NEO-7N (F/W 1.00) behavior. The
 * receiver reports per-channel transmission times; the observation
 * epoch is reconstructed as max(transmission time) + 80 ms rounded to
 * 100 ms, and the pseudorange follows from the travel time.
 */

use log::{trace, warn};

use crate::bytefield::{i4, i8_le, u1, u2};
use crate::gnss::time::{gpst2time, gpst2utc, time2gpst, timediff};
use crate::gnss::{satno, Sys, CLIGHT, CODE_L1C, CODE_L2I, MINPRNSBS};
use crate::raw::{Decoded, Obs, RawUbx};

const P2_10: f64 = 0.0009765625;
const P2_32: f64 = 2.328306436538696e-10;

fn round_100ms(t: f64) -> f64 {
    ((t + 0.08) / 0.1 + 0.5).floor() * 0.1
}

/* adjustment to the code measurement in meters by GLONASS frequency
 * channel, from differences between TRK-MEAS and RXM-RAWX */
const P_ADJ_FW2: [i8; 15] = [0, 0, 0, 0, 1, 3, 2, 0, -4, -3, -9, -8, -7, -4, 0]; /* fw 2.30 */
const P_ADJ_FW3: [i8; 15] = [11, 13, 13, 14, 14, 13, 12, 10, 8, 6, 5, 5, 5, 7, 0]; /* fw 3.01 */

impl RawUbx {
    /* decode ubx-trk-meas: trace measurement data */
    pub(crate) fn decode_trkmeas(&mut self) -> Decoded {
        trace!("decode_trkmeas: len={}", self.len);

        if self.time.is_zero() {
            return Decoded::NeedMore;
        }
        let fw = self.opt.trkm_adj;

        /* number of channels */
        let nch = u1(&self.buff[..], 8) as usize;
        if self.len < 112 + nch * 56 {
            warn!("decode_trkmeas: length error len={} nch={}", self.len, nch);
            return Decoded::Error;
        }
        /* time tag = max(transmission time + 0.08) rounded by 100 ms,
         * taken from gps channels only */
        let mut tr = -1.0;
        for i in 0..nch {
            let p = 110 + 56 * i;
            if u1(&self.buff[..], p + 1) < 4
                || crate::sig::ubx_sys(u1(&self.buff[..], p + 4)) != Some(Sys::Gps)
            {
                continue;
            }
            let t = i8_le(&self.buff[..], p + 24) * P2_32 / 1000.0;
            if t > tr {
                tr = t;
            }
        }
        if tr < 0.0 {
            return Decoded::NeedMore;
        }
        tr = round_100ms(tr);

        /* adjust week handover */
        let mut week = 0;
        let t = time2gpst(self.time, Some(&mut week));
        if tr < t - 302400.0 {
            week += 1;
        } else if tr > t + 302400.0 {
            week -= 1;
        }
        let time = gpst2time(week, tr);
        let utc_gpst = timediff(gpst2utc(time), time);

        self.obs.data.clear();
        for i in 0..nch {
            let p = 110 + 56 * i;

            /* quality indicator (0:idle, 1:search, 2:acquired,
             * 3:unusable, 4:code lock, 5-7:code/carrier lock) */
            let qi = u1(&self.buff[..], p + 1);
            if !(4..=7).contains(&qi) {
                continue;
            }
            let sys = match crate::sig::ubx_sys(u1(&self.buff[..], p + 4)) {
                Some(sys) => sys,
                None => {
                    warn!("ubx trkmeas: system error");
                    continue;
                }
            };
            let prn = u1(&self.buff[..], p + 5) as u32 + if sys == Sys::Qzs { 192 } else { 0 };
            let sat = match satno(sys, prn) {
                Some(sat) => sat,
                None => {
                    warn!("ubx trkmeas sat number error: sys={:?} prn={}", sys, prn);
                    continue;
                }
            };
            /* transmission time */
            let mut ts = i8_le(&self.buff[..], p + 24) * P2_32 / 1000.0;
            if sys == Sys::Cmp {
                ts += 14.0; /* bdt -> gpst */
            } else if sys == Sys::Glo {
                ts -= 10800.0 + utc_gpst; /* glot -> gpst */
            }
            /* signal travel time */
            let mut tau = tr - ts;
            if tau < -302400.0 {
                tau += 604800.0;
            } else if tau > 302400.0 {
                tau -= 604800.0;
            }
            let frq = u1(&self.buff[..], p + 7) as i32 - 7;
            let flag = u1(&self.buff[..], p + 8);
            let lock2 = u1(&self.buff[..], p + 17);
            let snr = u2(&self.buff[..], p + 20) as f64 / 256.0;
            let adr = i8_le(&self.buff[..], p + 32) * P2_32
                + if flag & 0x40 != 0 { 0.5 } else { 0.0 };
            let dop = i4(&self.buff[..], p + 40) as f64 * P2_10 * 10.0;

            /* set the slip flag on a phase lock count drop */
            if lock2 == 0 || (lock2 as f64) < self.lockt[sat - 1][0] {
                self.lockt[sat - 1][1] = 1.0;
            }
            self.lockt[sat - 1][0] = lock2 as f64;

            /* check phase lock */
            if flag & 0x20 == 0 {
                continue;
            }
            let mut obs = Obs::new(time, sat);
            obs.p[0] = tau * CLIGHT;
            obs.l[0] = -adr;
            obs.d[0] = dop as f32;
            obs.snr[0] = (snr * 4.0) as u8;
            obs.code[0] = if sys == Sys::Cmp { CODE_L2I } else { CODE_L1C };
            obs.qual_l[0] = 8 - qi;
            obs.lli[0] = if self.lockt[sat - 1][1] > 0.0 { 1 } else { 0 };
            if sys == Sys::Sbs {
                /* half-cycle valid */
                obs.lli[0] |= if lock2 > 142 { 0 } else { 2 };
            } else {
                obs.lli[0] |= if flag & 0x80 != 0 { 0 } else { 2 };
            }
            self.lockt[sat - 1][1] = 0.0;

            /* adjust code measurements for glonass */
            if sys == Sys::Glo && (-7..=7).contains(&frq) {
                if fw == 2 {
                    obs.p[0] += P_ADJ_FW2[(frq + 7) as usize] as f64;
                }
                if fw == 3 {
                    obs.p[0] += P_ADJ_FW3[(frq + 7) as usize] as f64;
                }
            }
            self.obs.data.push(obs);
        }
        if self.obs.data.is_empty() {
            return Decoded::NeedMore;
        }
        self.time = time;
        Decoded::Observation
    }

    /* decode ubx-trk-d5: trace measurement data */
    pub(crate) fn decode_trkd5(&mut self) -> Decoded {
        trace!("decode_trkd5: len={}", self.len);

        if self.time.is_zero() {
            return Decoded::NeedMore;
        }
        let utc_gpst = timediff(gpst2utc(self.time), self.time);

        let msg_type = u1(&self.buff[..], 6);
        let (off, item_len) = match msg_type {
            3 => (86, 56),
            6 => (86, 64), /* u-blox 7 */
            _ => (78, 56),
        };
        /* time tag from the latest transmission time */
        let mut tr = -1.0;
        let mut idx = off;
        while idx + item_len <= self.len - 2 {
            let p = idx;
            idx += item_len;
            if u1(&self.buff[..], p + 41) < 4 {
                continue;
            }
            let mut t = i8_le(&self.buff[..], p) * P2_32 / 1000.0;
            if crate::sig::ubx_sys(u1(&self.buff[..], p + 56)) == Some(Sys::Glo) {
                t -= 10800.0 + utc_gpst;
            }
            if t > tr {
                tr = t;
            }
        }
        if tr < 0.0 {
            return Decoded::NeedMore;
        }
        tr = round_100ms(tr);

        /* adjust week handover */
        let mut week = 0;
        let t = time2gpst(self.time, Some(&mut week));
        if tr < t - 302400.0 {
            week += 1;
        } else if tr > t + 302400.0 {
            week -= 1;
        }
        let time = gpst2time(week, tr);

        self.obs.data.clear();
        let mut idx = off;
        while idx + item_len <= self.len - 2 {
            let p = idx;
            idx += item_len;

            /* quality indicator */
            let qi = u1(&self.buff[..], p + 41) & 7;
            if !(4..=7).contains(&qi) {
                continue;
            }
            let (sys, prn, _frq) = if msg_type == 6 {
                let sys = match crate::sig::ubx_sys(u1(&self.buff[..], p + 56)) {
                    Some(sys) => sys,
                    None => {
                        warn!("ubx trkd5: system error");
                        continue;
                    }
                };
                let prn =
                    u1(&self.buff[..], p + 57) as u32 + if sys == Sys::Qzs { 192 } else { 0 };
                (sys, prn, u1(&self.buff[..], p + 59) as i32 - 7)
            } else {
                let prn = u1(&self.buff[..], p + 34) as u32;
                let sys = if prn < MINPRNSBS { Sys::Gps } else { Sys::Sbs };
                (sys, prn, 0)
            };
            let sat = match satno(sys, prn) {
                Some(sat) => sat,
                None => {
                    warn!("ubx trkd5 sat number error: sys={:?} prn={}", sys, prn);
                    continue;
                }
            };
            /* transmission time */
            let mut ts = i8_le(&self.buff[..], p) * P2_32 / 1000.0;
            if sys == Sys::Glo {
                ts -= 10800.0 + utc_gpst; /* glot -> gpst */
            }
            /* signal travel time */
            let mut tau = tr - ts;
            if tau < -302400.0 {
                tau += 604800.0;
            } else if tau > 302400.0 {
                tau -= 604800.0;
            }
            let flag = u1(&self.buff[..], p + 54);
            let adr = if qi < 6 {
                0.0
            } else {
                i8_le(&self.buff[..], p + 8) * P2_32 + if flag & 0x01 != 0 { 0.5 } else { 0.0 }
            };
            let dop = i4(&self.buff[..], p + 16) as f64 * P2_10 / 4.0;
            let snr = u2(&self.buff[..], p + 32) as f64 / 256.0;

            if snr <= 10.0 {
                self.lockt[sat - 1][1] = 1.0;
            }
            /* check phase lock */
            if flag & 0x08 == 0 {
                continue;
            }
            let mut obs = Obs::new(time, sat);
            obs.p[0] = tau * CLIGHT;
            obs.l[0] = -adr;
            obs.d[0] = dop as f32;
            obs.snr[0] = (snr * 4.0) as u8;
            obs.code[0] = if sys == Sys::Cmp { CODE_L2I } else { CODE_L1C };
            obs.lli[0] = if self.lockt[sat - 1][1] > 0.0 { 1 } else { 0 };
            self.lockt[sat - 1][1] = 0.0;
            self.obs.data.push(obs);
        }
        if self.obs.data.is_empty() {
            return Decoded::NeedMore;
        }
        self.time = time;
        Decoded::Observation
    }
}
