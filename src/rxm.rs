/*
 * UBX-RXM-RAW / UBX-RXM-RAWX raw measurement decoders
 *
 * RXM-RAW is the legacy single-constellation message (GPS/SBAS, L1
 * only), RXM-RAWX the multi-gnss replacement. Both end up as an
 * observation batch on the state object; RAWX additionally maintains
 * the per-satellite lock time, half-cycle and slip bookkeeping.
 */

use log::{debug, trace, warn};
use serde::Deserialize;

use crate::gnss::time::{gpst2time, time2gpst, timeadd, timediff};
use crate::gnss::{
    satno, Sys, CLIGHT, CODE_L1C, CODE_L1X, CODE_L2I, LLI_HALFC, LLI_SLIP, MINPRNSBS,
};
use crate::raw::{Decoded, Obs, RawUbx, MAXOBS, NSLOT};
use crate::sig;

/* RXM-RAW header (8 bytes) and measurement record (24 bytes) */
#[derive(Deserialize)]
struct RawHeader {
    tow: u32, /* ms */
    week: u16,
    num_sv: u8,
    _reserved1: u8,
}

#[derive(Deserialize)]
struct RawMeas {
    cp_mes: f64, /* cycles */
    pr_mes: f64, /* m */
    do_mes: f32, /* Hz */
    sv: u8,
    _mes_qi: i8,
    cno: i8,
    lli: u8,
}

/* RXM-RAWX header (16 bytes) and measurement record (32 bytes) */
#[derive(Deserialize)]
struct RawxHeader {
    rcv_tow: f64, /* s */
    week: u16,
    _leap_s: i8,
    num_meas: u8,
    _rec_stat: u8,
    version: u8,
    _reserved1: [u8; 2],
}

#[derive(Deserialize)]
struct RawxMeas {
    pr_mes: f64, /* m */
    cp_mes: f64, /* cycles */
    do_mes: f32, /* Hz */
    gnss_id: u8,
    sv_id: u8,
    sig_id: u8,
    freq_id: u8, /* fcn + 7 */
    lock_time: u16, /* ms */
    cn0: u8, /* dBHz */
    pr_stdev: u8,
    cp_stdev: u8,
    _do_stdev: u8,
    trk_stat: u8,
    _reserved2: u8,
}

impl RawUbx {
    /* decode ubx-rxm-raw: raw measurement data */
    pub(crate) fn decode_rxmraw(&mut self) -> Decoded {
        trace!("decode_rxmraw: len={}", self.len);

        if self.len < 16 {
            warn!("ubx rxmraw length error: len={}", self.len);
            return Decoded::Error;
        }
        let hdr: RawHeader = bincode::deserialize(&self.buff[6..14]).unwrap();
        let nsat = hdr.num_sv as usize;
        if self.len < 12 + 24 * nsat {
            warn!("ubx rxmraw length error: len={} nsat={}", self.len, nsat);
            return Decoded::Error;
        }
        let mut time = gpst2time(hdr.week as i32, hdr.tow as f64 * 0.001);

        if hdr.week == 0 {
            debug!("ubx rxmraw week=0: len={} nsat={}", self.len, nsat);
            return Decoded::NeedMore;
        }
        /* time tag adjustment */
        let mut toff = 0.0;
        if self.opt.tadj > 0.0 {
            let mut week = 0;
            let tn = time2gpst(time, Some(&mut week)) / self.opt.tadj;
            toff = (tn - (tn + 0.5).floor()) * self.opt.tadj;
            time = timeadd(time, -toff);
        }
        let tt = timediff(time, self.time);

        self.obs.data.clear();
        for i in 0..nsat.min(MAXOBS) {
            let p = 14 + 24 * i;
            let m: RawMeas = bincode::deserialize(&self.buff[p..p + 24]).unwrap();

            let mut l = m.cp_mes - toff * sig::sig_freq(Sys::Gps, 1, 0);
            let pr = m.pr_mes - toff * CLIGHT;

            /* phase polarity flip option (-INVCP) */
            if self.opt.invcp {
                l = -l;
            }
            let prn = m.sv as u32;
            let sys = if prn >= MINPRNSBS { Sys::Sbs } else { Sys::Gps };
            let sat = match satno(sys, prn) {
                Some(sat) => sat,
                None => {
                    warn!("ubx rxmraw sat number error: prn={}", prn);
                    continue;
                }
            };
            /* continuous lock time, reset on receiver slip or time jump */
            if m.lli & 1 != 0 {
                self.lockt[sat - 1][0] = 0.0;
            } else if !(1.0..=10.0).contains(&tt) {
                self.lockt[sat - 1][0] = 0.0;
            } else {
                self.lockt[sat - 1][0] += tt;
            }
            let mut obs = Obs::new(time, sat);
            obs.l[0] = l;
            obs.p[0] = pr;
            obs.d[0] = m.do_mes;
            obs.snr[0] = (m.cno as f64 * 4.0 + 0.5) as u8;
            obs.lli[0] = m.lli;
            obs.code[0] = CODE_L1C;
            self.obs.data.push(obs);
        }
        self.time = time;
        Decoded::Observation
    }

    /* decode ubx-rxm-rawx: multi-gnss raw measurement data */
    pub(crate) fn decode_rxmrawx(&mut self) -> Decoded {
        trace!("decode_rxmrawx: len={}", self.len);

        if self.len < 24 {
            warn!("ubx rxmrawx length error: len={}", self.len);
            return Decoded::Error;
        }
        let hdr: RawxHeader = bincode::deserialize(&self.buff[6..22]).unwrap();
        let nmeas = hdr.num_meas as usize;
        if self.len < 24 + 32 * nmeas {
            warn!("ubx rxmrawx length error: len={} nmeas={}", self.len, nmeas);
            return Decoded::Error;
        }
        if hdr.week == 0 {
            debug!("ubx rxmrawx week=0: len={} nmeas={}", self.len, nmeas);
            return Decoded::NeedMore;
        }
        let mut time = gpst2time(hdr.week as i32, hdr.rcv_tow);

        /* time tag adjustment */
        let mut toff = 0.0;
        if self.opt.tadj > 0.0 {
            let mut week = 0;
            let tn = time2gpst(time, Some(&mut week)) / self.opt.tadj;
            toff = (tn - (tn + 0.5).floor()) * self.opt.tadj;
            time = timeadd(time, -toff);
        }
        let cpstd_valid = self.opt.max_std_cp;
        let cpstd_slip = self.opt.std_slip;

        self.obs.data.clear();
        for i in 0..nmeas {
            if self.obs.data.len() >= MAXOBS {
                break;
            }
            let p = 22 + 32 * i;
            let m: RawxMeas = bincode::deserialize(&self.buff[p..p + 32]).unwrap();

            let mut pr = m.pr_mes;
            let mut cp = m.cp_mes;
            let prstd_raw = m.pr_stdev & 15;
            let cpstd = m.cp_stdev & 15;
            /* prstd = 2^(x-5) */
            let prstd = 1u32 << if prstd_raw >= 5 { prstd_raw - 5 } else { 0 };
            if m.trk_stat & 1 == 0 {
                pr = 0.0;
            }
            if m.trk_stat & 2 == 0 || cp == -0.5 || cpstd > cpstd_valid {
                cp = 0.0; /* invalid phase */
            }
            let sys = match sig::ubx_sys(m.gnss_id) {
                Some(sys) => sys,
                None => {
                    warn!("ubx rxmrawx: system error gnss={}", m.gnss_id);
                    continue;
                }
            };
            let prn = m.sv_id as u32 + if sys == Sys::Qzs { 192 } else { 0 };
            let sat = match satno(sys, prn) {
                Some(sat) => sat,
                None => {
                    if sys == Sys::Glo && m.sv_id == 255 {
                        continue; /* unknown glonass satellite */
                    }
                    warn!("ubx rxmrawx sat number error: sys={:?} prn={}", sys, prn);
                    continue;
                }
            };
            let code = if hdr.version >= 1 {
                sig::ubx_sig(sys, m.sig_id)
            } else if sys == Sys::Cmp {
                CODE_L2I
            } else if sys == Sys::Gal {
                CODE_L1X
            } else {
                CODE_L1C
            };
            /* frequency slot in the observation record */
            let f = sig::sig_idx(sys, code);
            if f == 0 || f > NSLOT {
                warn!("ubx rxmrawx signal error: sat={} sigid={}", sat, m.sig_id);
                continue;
            }
            /* offset by time tag adjustment */
            if toff != 0.0 && cp != 0.0 {
                pr -= toff * CLIGHT;
                cp -= toff * sig::sig_freq(sys, f, m.freq_id as i32 - 7);
            }
            let halfv = if sys == Sys::Sbs {
                (m.lock_time > 8000) as u8
            } else {
                ((m.trk_stat & 4) != 0) as u8
            };
            let halfc = ((m.trk_stat & 8) != 0) as u8;

            let mut slip = m.lock_time == 0
                || (m.lock_time as f64) * 1e-3 < self.lockt[sat - 1][f - 1]
                || halfc != self.halfc[sat - 1][f - 1];
            if cpstd >= cpstd_slip {
                slip = true;
            }
            if slip {
                self.lockflag[sat - 1][f - 1] = 1;
            }
            self.lockt[sat - 1][f - 1] = m.lock_time as f64 * 1e-3;
            self.halfc[sat - 1][f - 1] = halfc;

            /* LLI: bit0 = slip, bit1 = half-cycle invalid */
            let mut lli = if halfv == 0 && cp != 0.0 { LLI_HALFC } else { 0 };
            if cp != 0.0 && self.lockflag[sat - 1][f - 1] != 0 {
                lli |= LLI_SLIP;
            }
            /* measurements of one satellite collapse into one record */
            let j = match self.obs.data.iter().position(|o| o.sat == sat) {
                Some(j) => j,
                None => {
                    self.obs.data.push(Obs::new(time, sat));
                    self.obs.data.len() - 1
                }
            };
            let obs = &mut self.obs.data[j];
            obs.l[f - 1] = cp;
            obs.p[f - 1] = pr;
            /* clamp to one digit for RINEX output */
            obs.qual_l[f - 1] = cpstd.min(9);
            obs.qual_p[f - 1] = (prstd.min(9)) as u8;
            obs.d[f - 1] = m.do_mes;
            obs.snr[f - 1] = m.cn0.wrapping_mul(4);
            obs.lli[f - 1] = lli;
            obs.code[f - 1] = code;
            if cp != 0.0 {
                self.lockflag[sat - 1][f - 1] = 0;
            }
        }
        self.time = time;
        Decoded::Observation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cid::UbxCID;
    use crate::frame::UbxFrame;
    use crate::gnss::{CODE_L7I, CODE_L7Q};

    struct Meas {
        pr: f64,
        cp: f64,
        gnss: u8,
        svid: u8,
        sigid: u8,
        freqid: u8,
        lockt_ms: u16,
        cn0: u8,
        prstd: u8,
        cpstd: u8,
        trkstat: u8,
    }

    impl Default for Meas {
        fn default() -> Self {
            Self {
                pr: 22e6,
                cp: 115e6,
                gnss: 0,
                svid: 5,
                sigid: 0,
                freqid: 0,
                lockt_ms: 10000,
                cn0: 45,
                prstd: 5,
                cpstd: 2,
                trkstat: 0x07, /* pr, cp, half-cycle valid */
            }
        }
    }

    fn rawx_frame(tow: f64, week: u16, meas: &[Meas]) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&tow.to_le_bytes());
        payload.extend_from_slice(&week.to_le_bytes());
        payload.push(18); /* leapS */
        payload.push(meas.len() as u8);
        payload.push(0x01); /* recStat */
        payload.push(1); /* version */
        payload.extend_from_slice(&[0; 2]);
        for m in meas {
            payload.extend_from_slice(&m.pr.to_le_bytes());
            payload.extend_from_slice(&m.cp.to_le_bytes());
            payload.extend_from_slice(&0f32.to_le_bytes()); /* doppler */
            payload.push(m.gnss);
            payload.push(m.svid);
            payload.push(m.sigid);
            payload.push(m.freqid);
            payload.extend_from_slice(&m.lockt_ms.to_le_bytes());
            payload.push(m.cn0);
            payload.push(m.prstd);
            payload.push(m.cpstd);
            payload.push(0); /* doStdev */
            payload.push(m.trkstat);
            payload.push(0);
        }
        UbxFrame::construct(UbxCID::new(0x02, 0x15), payload).to_bytes()
    }

    fn feed(raw: &mut RawUbx, frame: &[u8]) -> Decoded {
        let mut last = Decoded::NeedMore;
        for byte in frame {
            last = raw.input(*byte);
        }
        last
    }

    #[test]
    fn week_zero_is_a_noop() {
        let frame = rawx_frame(100.0, 0, &[]);
        let mut raw = RawUbx::new();
        assert_eq!(feed(&mut raw, &frame), Decoded::NeedMore);
        assert!(raw.obs.data.is_empty());
        assert!(raw.time.is_zero());
    }

    #[test]
    fn single_gps_measurement() {
        let frame = rawx_frame(100.0, 2000, &[Meas::default()]);
        let mut raw = RawUbx::new();
        assert_eq!(feed(&mut raw, &frame), Decoded::Observation);
        assert_eq!(raw.obs.data.len(), 1);
        let obs = &raw.obs.data[0];
        assert_eq!(obs.sat, satno(Sys::Gps, 5).unwrap());
        assert_eq!(obs.code[0], CODE_L1C);
        assert_eq!(obs.p[0], 22e6);
        assert_eq!(obs.l[0], 115e6);
        assert_eq!(obs.snr[0], 45 * 4);
        /* prstd raw 5 -> 2^0 = 1 */
        assert_eq!(obs.qual_p[0], 1);
        assert_eq!(obs.qual_l[0], 2);
        assert_eq!(raw.time, gpst2time(2000, 100.0));
    }

    #[test]
    fn pseudorange_std_clamped() {
        let frame = rawx_frame(
            100.0,
            2000,
            &[Meas {
                prstd: 15,
                ..Meas::default()
            }],
        );
        let mut raw = RawUbx::new();
        feed(&mut raw, &frame);
        /* 2^10 = 1024 clamps to 9 */
        assert_eq!(raw.obs.data[0].qual_p[0], 9);
    }

    #[test]
    fn invalid_phase_is_zeroed() {
        /* trkStat bit 1 clear */
        let frame = rawx_frame(
            100.0,
            2000,
            &[Meas {
                trkstat: 0x01,
                ..Meas::default()
            }],
        );
        let mut raw = RawUbx::new();
        feed(&mut raw, &frame);
        assert_eq!(raw.obs.data[0].l[0], 0.0);
        assert_eq!(raw.obs.data[0].p[0], 22e6);

        /* cp std above the validity limit */
        let frame = rawx_frame(
            100.0,
            2000,
            &[Meas {
                cpstd: 6,
                ..Meas::default()
            }],
        );
        let mut raw = RawUbx::new();
        feed(&mut raw, &frame);
        assert_eq!(raw.obs.data[0].l[0], 0.0);

        /* the -0.5 sentinel */
        let frame = rawx_frame(
            100.0,
            2000,
            &[Meas {
                cp: -0.5,
                ..Meas::default()
            }],
        );
        let mut raw = RawUbx::new();
        feed(&mut raw, &frame);
        assert_eq!(raw.obs.data[0].l[0], 0.0);
    }

    #[test]
    fn max_std_cp_option_overrides() {
        let frame = rawx_frame(
            100.0,
            2000,
            &[Meas {
                cpstd: 6,
                ..Meas::default()
            }],
        );
        let mut raw = RawUbx::with_opt("-MAX_STD_CP=8");
        feed(&mut raw, &frame);
        assert_ne!(raw.obs.data[0].l[0], 0.0);
    }

    #[test]
    fn slip_sets_lli_and_clears_after_emission() {
        let mut raw = RawUbx::new();
        feed(&mut raw, &rawx_frame(100.0, 2000, &[Meas::default()]));
        assert_eq!(raw.obs.data[0].lli[0] & LLI_SLIP, 0);

        /* lock time dropped to zero: slip */
        feed(
            &mut raw,
            &rawx_frame(
                101.0,
                2000,
                &[Meas {
                    lockt_ms: 0,
                    ..Meas::default()
                }],
            ),
        );
        let sat = raw.obs.data[0].sat;
        assert_ne!(raw.obs.data[0].lli[0] & LLI_SLIP, 0);
        /* emitting a non-zero phase clears the latched flag */
        assert_eq!(raw.lockflag[sat - 1][0], 0);
    }

    #[test]
    fn slip_latches_across_invalid_phase() {
        let mut raw = RawUbx::new();
        feed(&mut raw, &rawx_frame(100.0, 2000, &[Meas::default()]));
        /* slip while the phase itself is invalid: flag latches */
        feed(
            &mut raw,
            &rawx_frame(
                101.0,
                2000,
                &[Meas {
                    lockt_ms: 0,
                    trkstat: 0x05,
                    ..Meas::default()
                }],
            ),
        );
        let sat = raw.obs.data[0].sat;
        assert_eq!(raw.obs.data[0].lli[0] & LLI_SLIP, 0); /* no phase, no flag */
        assert_eq!(raw.lockflag[sat - 1][0], 1);
        /* next valid phase reports the slip */
        feed(&mut raw, &rawx_frame(102.0, 2000, &[Meas::default()]));
        assert_ne!(raw.obs.data[0].lli[0] & LLI_SLIP, 0);
        assert_eq!(raw.lockflag[sat - 1][0], 0);
    }

    #[test]
    fn half_cycle_invalid_flag() {
        let frame = rawx_frame(
            100.0,
            2000,
            &[Meas {
                trkstat: 0x03, /* half-cycle not resolved */
                ..Meas::default()
            }],
        );
        let mut raw = RawUbx::new();
        feed(&mut raw, &frame);
        assert_ne!(raw.obs.data[0].lli[0] & LLI_HALFC, 0);
    }

    #[test]
    fn galileo_e5b_shares_slot2() {
        let frame = rawx_frame(
            100.0,
            2000,
            &[
                Meas {
                    gnss: 2,
                    svid: 11,
                    sigid: 5,
                    ..Meas::default()
                },
                Meas {
                    gnss: 2,
                    svid: 11,
                    sigid: 6,
                    pr: 23e6,
                    ..Meas::default()
                },
            ],
        );
        let mut raw = RawUbx::new();
        assert_eq!(feed(&mut raw, &frame), Decoded::Observation);
        /* same satellite: one record, slot 2 overwritten by the last code */
        assert_eq!(raw.obs.data.len(), 1);
        let obs = &raw.obs.data[0];
        assert_eq!(obs.sat, satno(Sys::Gal, 11).unwrap());
        assert_eq!(obs.code[1], CODE_L7Q);
        assert_eq!(obs.p[1], 23e6);
        assert_ne!(CODE_L7I, CODE_L7Q);
    }

    #[test]
    fn unknown_system_and_glo255_are_skipped() {
        let frame = rawx_frame(
            100.0,
            2000,
            &[
                Meas {
                    gnss: 4,
                    ..Meas::default()
                },
                Meas {
                    gnss: 6,
                    svid: 255,
                    ..Meas::default()
                },
                Meas::default(),
            ],
        );
        let mut raw = RawUbx::new();
        feed(&mut raw, &frame);
        assert_eq!(raw.obs.data.len(), 1);
    }

    #[test]
    fn qzss_prn_offset() {
        let frame = rawx_frame(
            100.0,
            2000,
            &[Meas {
                gnss: 5,
                svid: 1,
                ..Meas::default()
            }],
        );
        let mut raw = RawUbx::new();
        feed(&mut raw, &frame);
        assert_eq!(raw.obs.data[0].sat, satno(Sys::Qzs, 193).unwrap());
    }

    #[test]
    fn tadj_quantizes_time_tags() {
        /* tow slightly off the 1 s grid */
        let frame = rawx_frame(100.0004, 2000, &[Meas::default()]);
        let mut raw = RawUbx::with_opt("-TADJ=1.0");
        feed(&mut raw, &frame);
        let tow = time2gpst(raw.time, None);
        assert!((tow - 100.0).abs() < 1e-7, "tow={}", tow);
        /* and the measurements moved with it */
        let obs = &raw.obs.data[0];
        assert!((obs.p[0] - (22e6 - 0.0004 * CLIGHT)).abs() < 1e-3);
        let freq = sig::sig_freq(Sys::Gps, 1, 0);
        assert!((obs.l[0] - (115e6 - 0.0004 * freq)).abs() < 1e-2);
    }

    #[test]
    fn rawx_truncated_record_is_an_error() {
        let mut frame = rawx_frame(100.0, 2000, &[Meas::default()]);
        /* claim two measurements but carry one */
        let n_at = 6 + 11;
        frame[n_at] = 2;
        /* fix the checksum so only the length gate can reject it */
        let len = frame.len();
        crate::checksum::set(&mut frame[..len]);
        let mut raw = RawUbx::new();
        assert_eq!(feed(&mut raw, &frame), Decoded::Error);
    }

    fn raw_frame(tow_ms: u32, week: u16, prns: &[u8]) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&tow_ms.to_le_bytes());
        payload.extend_from_slice(&week.to_le_bytes());
        payload.push(prns.len() as u8);
        payload.push(0);
        for prn in prns {
            payload.extend_from_slice(&150e6f64.to_le_bytes()); /* cpMes */
            payload.extend_from_slice(&21e6f64.to_le_bytes()); /* prMes */
            payload.extend_from_slice(&0f32.to_le_bytes());
            payload.push(*prn);
            payload.push(0); /* mesQI */
            payload.push(40); /* cno */
            payload.push(0); /* lli */
        }
        UbxFrame::construct(UbxCID::new(0x02, 0x10), payload).to_bytes()
    }

    #[test]
    fn legacy_raw_decodes_l1_only() {
        let frame = raw_frame(100000, 2000, &[7]);
        let mut raw = RawUbx::new();
        assert_eq!(feed(&mut raw, &frame), Decoded::Observation);
        let obs = &raw.obs.data[0];
        assert_eq!(obs.sat, satno(Sys::Gps, 7).unwrap());
        assert_eq!(obs.l[0], 150e6);
        assert_eq!(obs.p[0], 21e6);
        assert_eq!(obs.code[0], CODE_L1C);
        assert_eq!(obs.l[1], 0.0);
        assert_eq!(raw.time, gpst2time(2000, 100.0));
    }

    #[test]
    fn legacy_raw_invcp_flips_phase() {
        let frame = raw_frame(100000, 2000, &[7]);
        let mut raw = RawUbx::with_opt("-INVCP");
        feed(&mut raw, &frame);
        assert_eq!(raw.obs.data[0].l[0], -150e6);
    }

    #[test]
    fn legacy_raw_week_zero_guard() {
        let frame = raw_frame(100000, 0, &[7]);
        let mut raw = RawUbx::new();
        assert_eq!(feed(&mut raw, &frame), Decoded::NeedMore);
        assert!(raw.obs.data.is_empty());
    }

    #[test]
    fn legacy_raw_sbas_prn() {
        let frame = raw_frame(100000, 2000, &[133]);
        let mut raw = RawUbx::new();
        feed(&mut raw, &frame);
        assert_eq!(raw.obs.data[0].sat, satno(Sys::Sbs, 133).unwrap());
    }

    #[test]
    fn legacy_raw_bad_prn_skipped() {
        let frame = raw_frame(100000, 2000, &[99, 7]);
        let mut raw = RawUbx::new();
        feed(&mut raw, &frame);
        assert_eq!(raw.obs.data.len(), 1);
        assert_eq!(raw.obs.data[0].sat, satno(Sys::Gps, 7).unwrap());
    }
}
