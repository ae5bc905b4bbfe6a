/*
 * UBX-RXM-SFRB / UBX-RXM-SFRBX navigation subframe decoders
 *
 * Per-satellite scratch layout (subfrm, 380 bytes):
 *   GPS/QZSS  30 bytes per subframe id 1..5 at (id-1)*30
 *   BeiDou    38 bytes per subframe/page at (id-1)*38
 *   GLONASS   10 bytes per string 1..15 at (m-1)*10,
 *             2 byte frame-id tag at offset 150
 *   Galileo   16 bytes per word type 0..6 at type*16,
 *             seen-words bitmap at offset 112
 *
 * Subframes accumulate until a full ephemeris can be handed to the
 * per-constellation reconstruction; unchanged ephemerides are swallowed
 * unless -EPHALL is set.
 */

use log::{debug, trace, warn};

use crate::bytefield::{u1, u4};
use crate::gnss::bits::{crc24q, getbitu, setbitu, test_glostr};
use crate::gnss::eph::{
    decode_bds_d1, decode_bds_d2, decode_frame, decode_gal_inav, decode_glostr, Eph, GEph,
};
use crate::gnss::sbas::sbsdecodemsg;
use crate::gnss::time::{adj_utcweek, time2gpst, timeadd, timediff};
use crate::gnss::{satno, satsys, Sys, MINPRNSBS};
use crate::raw::{Decoded, RawUbx};
use crate::sig;

const PREAMB_CNAV: u32 = 0x8B;

impl RawUbx {
    /* store one legacy-framed subframe (24 bit words, parity already
     * stripped by the receiver) */
    fn save_subfrm(&mut self, sat: usize) -> usize {
        let p = 6;
        let id = ((u4(&self.buff[..], p + 6) >> 2) & 0x7) as usize;
        trace!("save_subfrm: sat={} id={}", sat, id);

        if !(1..=5).contains(&id) {
            return 0;
        }
        let mut words = [0u32; 10];
        for (i, word) in words.iter_mut().enumerate() {
            *word = u4(&self.buff[..], p + 2 + 4 * i) & 0xFFFFFF;
        }
        let seg = &mut self.subfrm[sat - 1][(id - 1) * 30..id * 30];
        for (i, word) in words.iter().enumerate() {
            setbitu(seg, i * 24, 24, *word);
        }
        id
    }

    /* subframes 1-3 complete: reconstruct and publish the ephemeris */
    fn decode_ephem(&mut self, sat: usize) -> Decoded {
        trace!("decode_ephem: sat={}", sat);

        let mut eph = Eph::default();
        let time = self.time;
        if decode_frame(&self.subfrm[sat - 1][0..30], time, Some(&mut eph), None, None, None, None)
            != 1
            || decode_frame(
                &self.subfrm[sat - 1][30..60],
                time,
                Some(&mut eph),
                None,
                None,
                None,
                None,
            ) != 2
            || decode_frame(
                &self.subfrm[sat - 1][60..90],
                time,
                Some(&mut eph),
                None,
                None,
                None,
                None,
            ) != 3
        {
            return Decoded::NeedMore;
        }
        if !self.opt.ephall
            && eph.iode == self.nav.eph[sat - 1].iode
            && eph.iodc == self.nav.eph[sat - 1].iodc
        {
            return Decoded::NeedMore; /* unchanged */
        }
        eph.sat = sat;
        self.nav.eph[sat - 1] = eph;
        self.ephsat = sat;
        Decoded::Ephemeris
    }

    /* subframe 4: almanac and ion/utc parameters */
    fn decode_alm1(&mut self, sat: usize) -> Decoded {
        trace!("decode_alm1: sat={}", sat);

        match satsys(sat) {
            Some((Sys::Gps, _)) => {
                decode_frame(
                    &self.subfrm[sat - 1][90..120],
                    self.time,
                    None,
                    Some(&mut self.nav.alm[..]),
                    Some(&mut self.nav.ion_gps),
                    Some(&mut self.nav.utc_gps),
                    Some(&mut self.nav.leaps),
                );
                adj_utcweek(self.time, &mut self.nav.utc_gps);
            }
            Some((Sys::Qzs, _)) => {
                decode_frame(
                    &self.subfrm[sat - 1][90..120],
                    self.time,
                    None,
                    Some(&mut self.nav.alm[..]),
                    Some(&mut self.nav.ion_qzs),
                    Some(&mut self.nav.utc_qzs),
                    Some(&mut self.nav.leaps),
                );
                adj_utcweek(self.time, &mut self.nav.utc_qzs);
            }
            _ => {}
        }
        Decoded::IonUtc
    }

    /* subframe 5: almanac */
    fn decode_alm2(&mut self, sat: usize) -> Decoded {
        trace!("decode_alm2: sat={}", sat);

        match satsys(sat) {
            Some((Sys::Gps, _)) => {
                decode_frame(
                    &self.subfrm[sat - 1][120..150],
                    self.time,
                    None,
                    Some(&mut self.nav.alm[..]),
                    None,
                    None,
                    None,
                );
            }
            Some((Sys::Qzs, _)) => {
                decode_frame(
                    &self.subfrm[sat - 1][120..150],
                    self.time,
                    None,
                    Some(&mut self.nav.alm[..]),
                    Some(&mut self.nav.ion_qzs),
                    Some(&mut self.nav.utc_qzs),
                    Some(&mut self.nav.leaps),
                );
                adj_utcweek(self.time, &mut self.nav.utc_qzs);
            }
            _ => {}
        }
        Decoded::NeedMore
    }

    /* decode ubx-rxm-sfrb: subframe buffer (legacy) */
    pub(crate) fn decode_rxmsfrb(&mut self) -> Decoded {
        trace!("decode_rxmsfrb: len={}", self.len);

        if self.len < 42 {
            warn!("ubx rxmsfrb length error: len={}", self.len);
            return Decoded::Error;
        }
        let prn = u1(&self.buff[..], 7) as u32;
        let sys = if prn >= MINPRNSBS { Sys::Sbs } else { Sys::Gps };
        let sat = match satno(sys, prn) {
            Some(sat) => sat,
            None => {
                warn!("ubx rxmsfrb satellite number error: prn={}", prn);
                return Decoded::Error;
            }
        };
        match sys {
            Sys::Gps => match self.save_subfrm(sat) {
                3 => self.decode_ephem(sat),
                4 => self.decode_alm1(sat),
                5 => self.decode_alm2(sat),
                _ => Decoded::NeedMore,
            },
            _ => {
                let mut words = [0u32; 10];
                for (i, word) in words.iter_mut().enumerate() {
                    *word = u4(&self.buff[..], 8 + 4 * i);
                }
                if sbsdecodemsg(self.time, prn, &words, &mut self.sbsmsg) {
                    Decoded::SbasMessage
                } else {
                    Decoded::NeedMore
                }
            }
        }
    }

    /* gps and qzss navigation data (32 bit words, 6 parity bits) */
    fn decode_nav(&mut self, sat: usize, off: usize) -> Decoded {
        if self.len < 48 + off {
            warn!("ubx rawsfrbx length error: sat={} len={}", sat, self.len);
            return Decoded::Error;
        }
        let p = 6 + off;
        if u4(&self.buff[..], p) >> 24 == PREAMB_CNAV {
            debug!(
                "ubx rawsfrbx cnav not supported sat={} prn={}",
                sat,
                (u4(&self.buff[..], p) >> 18) & 0x3F
            );
            return Decoded::NeedMore;
        }
        let mut words = [0u32; 10];
        for (i, word) in words.iter_mut().enumerate() {
            *word = u4(&self.buff[..], p + 4 * i) >> 6; /* 24 bits without parity */
        }
        let id = ((words[1] >> 2) & 7) as usize;
        if !(1..=5).contains(&id) {
            warn!(
                "ubx rawsfrbx subfrm id error: sat={} id={} len={}",
                sat, id, self.len
            );
            return Decoded::Error;
        }
        let seg = &mut self.subfrm[sat - 1][(id - 1) * 30..id * 30];
        for (i, word) in words.iter().enumerate() {
            setbitu(seg, i * 24, 24, *word);
        }
        match id {
            3 => self.decode_ephem(sat),
            4 => self.decode_alm1(sat),
            5 => self.decode_alm2(sat),
            _ => Decoded::NeedMore,
        }
    }

    /* galileo navigation data: one I/NAV page as even/odd half pages */
    fn decode_enav(&mut self, sat: usize, off: usize) -> Decoded {
        if self.len < 44 + off {
            warn!("ubx rawsfrbx length error: sat={} len={}", sat, self.len);
            return Decoded::Error;
        }
        let p = 6 + off;
        let mut buff = [0u8; 32];
        for i in 0..8 {
            for j in 0..4 {
                buff[i * 4 + j] = self.buff[p + i * 4 + 3 - j];
            }
        }
        let part1 = getbitu(&buff, 0, 1);
        let page1 = getbitu(&buff, 1, 1);
        let part2 = getbitu(&buff[16..], 0, 1);
        let page2 = getbitu(&buff[16..], 1, 1);

        /* skip alert page */
        if page1 == 1 || page2 == 1 {
            return Decoded::NeedMore;
        }
        /* test even-odd parts */
        if part1 != 0 || part2 != 1 {
            warn!("ubx rawsfrbx gal page even/odd error: sat={}", sat);
            return Decoded::Error;
        }
        /* test crc (4 pad + 114 + 82 bits) */
        let mut crc_buff = [0u8; 26];
        for i in 0..15 {
            setbitu(&mut crc_buff, 4 + 8 * i, 8, getbitu(&buff, 8 * i, 8));
        }
        for i in 0..11 {
            setbitu(&mut crc_buff, 118 + 8 * i, 8, getbitu(&buff[16..], 8 * i, 8));
        }
        if crc24q(&crc_buff, 25) != getbitu(&buff[16..], 82, 24) {
            warn!("ubx rawsfrbx gal page crc error: sat={}", sat);
            return Decoded::Error;
        }
        let ty = getbitu(&buff, 2, 6) as usize;

        /* keep only ephemeris, iono and utc words */
        if ty > 6 {
            return Decoded::NeedMore;
        }
        let subfrm = &mut self.subfrm[sat - 1];
        /* clear the word 0-6 flags on a new nominal sequence */
        if ty == 2 {
            subfrm[112] = 0;
        }
        /* save page data (112 + 16 bits) to the frame buffer */
        let mut k = ty * 16;
        for i in 0..14 {
            subfrm[k] = getbitu(&buff, 2 + 8 * i, 8) as u8;
            k += 1;
        }
        for i in 0..2 {
            subfrm[k] = getbitu(&buff[16..], 2 + 8 * i, 8) as u8;
            k += 1;
        }
        subfrm[112] |= 1 << ty;
        if subfrm[112] != 0x7F {
            return Decoded::NeedMore;
        }
        if self.opt.galfnav {
            return Decoded::NeedMore; /* host takes ephemerides from F/NAV */
        }
        let mut eph = Eph::default();
        if !decode_gal_inav(&self.subfrm[sat - 1][..112], &mut eph) {
            return Decoded::NeedMore;
        }
        /* test svid consistency */
        if eph.sat != sat {
            warn!("ubx rawsfrbx gal svid error: sat={} {}", sat, eph.sat);
            return Decoded::Error;
        }
        if !self.opt.ephall
            && eph.iode == self.nav.eph[sat - 1].iode
            && timediff(eph.toe, self.nav.eph[sat - 1].toe) == 0.0
            && timediff(eph.toc, self.nav.eph[sat - 1].toc) == 0.0
        {
            return Decoded::NeedMore; /* unchanged */
        }
        eph.sat = sat;
        self.nav.eph[sat - 1] = eph;
        self.ephsat = sat;
        Decoded::Ephemeris
    }

    /* beidou navigation data (30 bit words) */
    fn decode_cnav(&mut self, sat: usize, off: usize) -> Decoded {
        if self.len < 48 + off {
            warn!("ubx rawsfrbx length error: sat={} len={}", sat, self.len);
            return Decoded::Error;
        }
        let p = 6 + off;
        let mut words = [0u32; 10];
        for (i, word) in words.iter_mut().enumerate() {
            *word = u4(&self.buff[..], p + 4 * i) & 0x3FFF_FFFF; /* 30 bits */
        }
        let prn = match satsys(sat) {
            Some((_, prn)) => prn,
            None => return Decoded::NeedMore,
        };
        let id = ((words[0] >> 12) & 0x07) as usize;
        if !(1..=5).contains(&id) {
            warn!("ubx rawsfrbx subfrm id error: sat={}", sat);
            return Decoded::Error;
        }
        let mut eph = Eph::default();
        if prn > 5 && prn < 59 {
            /* IGSO/MEO: D1, assemble subframes 1-3 */
            let seg = &mut self.subfrm[sat - 1][(id - 1) * 38..(id - 1) * 38 + 38];
            for (i, word) in words.iter().enumerate() {
                setbitu(seg, i * 30, 30, *word);
            }
            if id != 3 {
                return Decoded::NeedMore;
            }
            if !decode_bds_d1(&self.subfrm[sat - 1][..114], &mut eph) {
                return Decoded::NeedMore;
            }
        } else {
            /* GEO: D2, assemble pages 1-10 of subframe 1 */
            if id != 1 {
                return Decoded::NeedMore;
            }
            let pgn = ((words[1] >> 14) & 0x0F) as usize;
            if !(1..=10).contains(&pgn) {
                warn!("ubx rawsfrbx page number error: sat={}", sat);
                return Decoded::Error;
            }
            let seg = &mut self.subfrm[sat - 1][(pgn - 1) * 38..(pgn - 1) * 38 + 38];
            for (i, word) in words.iter().enumerate() {
                setbitu(seg, i * 30, 30, *word);
            }
            if pgn != 10 {
                return Decoded::NeedMore;
            }
            if !decode_bds_d2(&self.subfrm[sat - 1][..380], &mut eph) {
                return Decoded::NeedMore;
            }
        }
        if !self.opt.ephall
            && timediff(eph.toe, self.nav.eph[sat - 1].toe) == 0.0
            && eph.iode == self.nav.eph[sat - 1].iode
            && eph.iodc == self.nav.eph[sat - 1].iodc
        {
            return Decoded::NeedMore; /* unchanged */
        }
        eph.sat = sat;
        self.nav.eph[sat - 1] = eph;
        self.ephsat = sat;
        Decoded::Ephemeris
    }

    /* glonass navigation data (one string, byte-swapped words) */
    fn decode_gnav(&mut self, sat: usize, off: usize, frq: u8) -> Decoded {
        let prn = match satsys(sat) {
            Some((_, prn)) => prn as usize,
            None => return Decoded::NeedMore,
        };
        if self.len < 24 + off {
            warn!("ubx rawsfrbx gnav length error: len={}", self.len);
            return Decoded::Error;
        }
        let p = 6 + off;
        let mut buff = [0u8; 16];
        for i in 0..4 {
            for j in 0..4 {
                buff[i * 4 + j] = self.buff[p + i * 4 + 3 - j];
            }
        }
        /* test hamming of the glonass string */
        if !test_glostr(&buff[..11]) {
            warn!("ubx rawsfrbx glo string hamming error: sat={}", sat);
            return Decoded::Error;
        }
        let m = getbitu(&buff, 1, 4) as usize;
        if !(1..=15).contains(&m) {
            warn!("ubx rawsfrbx glo string no error: sat={}", sat);
            return Decoded::Error;
        }
        /* flush the frame buffer if the frame-id changed */
        let subfrm = &mut self.subfrm[sat - 1];
        if subfrm[150] != buff[12] || subfrm[151] != buff[13] {
            for byte in subfrm[0..40].iter_mut() {
                *byte = 0;
            }
            subfrm[150] = buff[12];
            subfrm[151] = buff[13];
        }
        subfrm[(m - 1) * 10..(m - 1) * 10 + 10].copy_from_slice(&buff[..10]);

        if m != 4 {
            return Decoded::NeedMore;
        }
        /* decode the ephemeris strings */
        let mut geph = GEph::default();
        geph.tof = self.time;
        if !decode_glostr(&self.subfrm[sat - 1][..40], &mut geph) || geph.sat != sat {
            return Decoded::NeedMore;
        }
        geph.frq = frq as i32 - 7;

        if !self.opt.ephall && geph.iode == self.nav.geph[prn - 1].iode {
            return Decoded::NeedMore; /* unchanged */
        }
        self.nav.geph[prn - 1] = geph;
        self.ephsat = sat;
        Decoded::Ephemeris
    }

    /* sbas navigation data */
    fn decode_snav(&mut self, sat: usize, off: usize) -> Decoded {
        if self.len < 40 + off {
            warn!("ubx rawsfrbx snav length error: len={}", self.len);
            return Decoded::Error;
        }
        let p = 6 + off;
        let mut week = 0;
        let tow = time2gpst(timeadd(self.time, -1.0), Some(&mut week)) as i32;
        let prn = match satsys(sat) {
            Some((_, prn)) => prn,
            None => return Decoded::NeedMore,
        };
        let mut buff = [0u8; 32];
        for i in 0..8 {
            for j in 0..4 {
                buff[i * 4 + j] = self.buff[p + i * 4 + 3 - j];
            }
        }
        self.sbsmsg.prn = prn as u8;
        self.sbsmsg.tow = tow;
        self.sbsmsg.week = week;
        self.sbsmsg.msg.copy_from_slice(&buff[..29]);
        self.sbsmsg.msg[28] &= 0xC0;
        Decoded::SbasMessage
    }

    /* decode ubx-rxm-sfrbx: raw subframe data */
    pub(crate) fn decode_rxmsfrbx(&mut self) -> Decoded {
        trace!("decode_rxmsfrbx: len={}", self.len);

        let gnss = u1(&self.buff[..], 6);
        let sys = match sig::ubx_sys(gnss) {
            Some(sys) => sys,
            None => {
                warn!("ubx rxmsfrbx sys id error: sys={}", gnss);
                return Decoded::Error;
            }
        };
        let prn = u1(&self.buff[..], 7) as u32 + if sys == Sys::Qzs { 192 } else { 0 };
        let sat = match satno(sys, prn) {
            Some(sat) => sat,
            None => {
                if sys == Sys::Glo && prn == 255 {
                    return Decoded::NeedMore; /* unknown glonass satellite */
                }
                warn!("ubx rxmsfrbx sat number error: sys={:?} prn={}", sys, prn);
                return Decoded::Error;
            }
        };
        match sys {
            Sys::Gps | Sys::Qzs => self.decode_nav(sat, 8),
            Sys::Gal => self.decode_enav(sat, 8),
            Sys::Cmp => self.decode_cnav(sat, 8),
            Sys::Glo => {
                let frq = u1(&self.buff[..], 9);
                self.decode_gnav(sat, 8, frq)
            }
            Sys::Sbs => self.decode_snav(sat, 8),
        }
    }

    /* decode ubx-trk-sfrbx: subframe buffer extension (undocumented) */
    #[cfg(feature = "trk")]
    pub(crate) fn decode_trksfrbx(&mut self) -> Decoded {
        trace!("decode_trksfrbx: len={}", self.len);

        let gnss = u1(&self.buff[..], 7);
        let sys = match sig::ubx_sys(gnss) {
            Some(sys) => sys,
            None => {
                warn!("ubx trksfrbx sys id error: sys={}", gnss);
                return Decoded::Error;
            }
        };
        let prn = u1(&self.buff[..], 8) as u32 + if sys == Sys::Qzs { 192 } else { 0 };
        let sat = match satno(sys, prn) {
            Some(sat) => sat,
            None => {
                warn!("ubx trksfrbx sat number error: sys={:?} prn={}", sys, prn);
                return Decoded::Error;
            }
        };
        match sys {
            Sys::Gps | Sys::Qzs => self.decode_nav(sat, 13),
            Sys::Gal => self.decode_enav(sat, 13),
            Sys::Cmp => self.decode_cnav(sat, 13),
            Sys::Glo => {
                let frq = u1(&self.buff[..], 10);
                self.decode_gnav(sat, 13, frq)
            }
            Sys::Sbs => self.decode_snav(sat, 13),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cid::UbxCID;
    use crate::frame::UbxFrame;
    use crate::gnss::time::gpst2time;

    fn feed(raw: &mut RawUbx, frame: &[u8]) -> Decoded {
        let mut last = Decoded::NeedMore;
        for byte in frame {
            last = raw.input(*byte);
        }
        last
    }

    fn sfrbx_frame(gnss: u8, svid: u8, freq_id: u8, data: &[u8]) -> Vec<u8> {
        let mut payload = vec![gnss, svid, 0, freq_id, (data.len() / 4) as u8, 0, 2, 0];
        payload.extend_from_slice(data);
        UbxFrame::construct(UbxCID::new(0x02, 0x13), payload).to_bytes()
    }

    /* an LNAV subframe as ten 32-bit receiver words (parity in the low
     * six bits) */
    fn lnav_words(sf: &[u8; 30]) -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..10 {
            let word = getbitu(sf, i * 24, 24) << 6;
            data.extend_from_slice(&word.to_le_bytes());
        }
        data
    }

    fn lnav_subframe(id: u32, tow_count: u32, iode: u32) -> [u8; 30] {
        let mut sf = [0u8; 30];
        setbitu(&mut sf, 24, 17, tow_count);
        setbitu(&mut sf, 43, 3, id);
        match id {
            1 => {
                setbitu(&mut sf, 48, 10, 2100 % 1024);
                setbitu(&mut sf, 168, 8, iode); /* iodc lsb */
                setbitu(&mut sf, 176, 16, 375); /* toc */
            }
            2 => {
                setbitu(&mut sf, 48, 8, iode);
                setbitu(&mut sf, 184, 32, 2702u32 << 19); /* sqrtA */
                setbitu(&mut sf, 216, 16, 375); /* toes */
            }
            3 => {
                setbitu(&mut sf, 216, 8, iode);
            }
            _ => {}
        }
        sf
    }

    #[test]
    fn gps_lnav_through_sfrbx() {
        let mut raw = RawUbx::new();
        raw.time = gpst2time(2100, 6000.0);
        let sat = satno(Sys::Gps, 5).unwrap();

        for id in 1..=2 {
            let frame = sfrbx_frame(0, 5, 0, &lnav_words(&lnav_subframe(id, 1000, 0x23)));
            assert_eq!(feed(&mut raw, &frame), Decoded::NeedMore);
        }
        let frame = sfrbx_frame(0, 5, 0, &lnav_words(&lnav_subframe(3, 1000, 0x23)));
        assert_eq!(feed(&mut raw, &frame), Decoded::Ephemeris);
        assert_eq!(raw.ephsat, sat);
        assert_eq!(raw.nav.eph[sat - 1].iode, 0x23);
        assert_eq!(raw.nav.eph[sat - 1].sat, sat);

        /* the same broadcast again: unchanged, swallowed */
        for id in 1..=3 {
            let frame = sfrbx_frame(0, 5, 0, &lnav_words(&lnav_subframe(id, 1010, 0x23)));
            assert_eq!(feed(&mut raw, &frame), Decoded::NeedMore);
        }

        /* a new issue of data goes out */
        for id in 1..=2 {
            let frame = sfrbx_frame(0, 5, 0, &lnav_words(&lnav_subframe(id, 1020, 0x24)));
            feed(&mut raw, &frame);
        }
        let frame = sfrbx_frame(0, 5, 0, &lnav_words(&lnav_subframe(3, 1020, 0x24)));
        assert_eq!(feed(&mut raw, &frame), Decoded::Ephemeris);
    }

    #[test]
    fn gps_lnav_ephall_republishes() {
        let mut raw = RawUbx::with_opt("-EPHALL");
        raw.time = gpst2time(2100, 6000.0);
        for _ in 0..2 {
            for id in 1..=2 {
                feed(
                    &mut raw,
                    &sfrbx_frame(0, 5, 0, &lnav_words(&lnav_subframe(id, 1000, 0x23))),
                );
            }
            let r = feed(
                &mut raw,
                &sfrbx_frame(0, 5, 0, &lnav_words(&lnav_subframe(3, 1000, 0x23))),
            );
            assert_eq!(r, Decoded::Ephemeris);
        }
    }

    #[test]
    fn cnav_preamble_is_skipped() {
        let mut raw = RawUbx::new();
        let mut data = lnav_words(&lnav_subframe(1, 1000, 0x23));
        /* overwrite word 0 with a cnav preamble in the high byte */
        data[0..4].copy_from_slice(&(PREAMB_CNAV << 24).to_le_bytes());
        let frame = sfrbx_frame(0, 5, 0, &data);
        assert_eq!(feed(&mut raw, &frame), Decoded::NeedMore);
    }

    #[test]
    fn lnav_bad_subframe_id() {
        let mut raw = RawUbx::new();
        let frame = sfrbx_frame(0, 5, 0, &lnav_words(&lnav_subframe(7, 1000, 0)));
        assert_eq!(feed(&mut raw, &frame), Decoded::Error);
    }

    #[test]
    fn lnav_subframe4_yields_ionutc() {
        let mut raw = RawUbx::new();
        raw.time = gpst2time(2100, 6000.0);
        let mut sf = lnav_subframe(4, 1000, 0);
        setbitu(&mut sf, 50, 6, 56); /* page 18 */
        setbitu(&mut sf, 192, 8, 18); /* leap seconds */
        let frame = sfrbx_frame(0, 5, 0, &lnav_words(&sf));
        assert_eq!(feed(&mut raw, &frame), Decoded::IonUtc);
        assert_eq!(raw.nav.leaps, 18);
    }

    #[test]
    fn unknown_gnss_id_is_an_error() {
        let mut raw = RawUbx::new();
        let frame = sfrbx_frame(4, 5, 0, &[0; 40]);
        assert_eq!(feed(&mut raw, &frame), Decoded::Error);
    }

    #[test]
    fn glonass_slot_255_is_benign() {
        let mut raw = RawUbx::new();
        let frame = sfrbx_frame(6, 255, 0, &[0; 16]);
        assert_eq!(feed(&mut raw, &frame), Decoded::NeedMore);
    }

    /* ---- galileo ---- */

    /* wrap a reassembled 128 bit word into an even/odd page pair with a
     * valid crc, byte-swapped the way the receiver delivers it */
    fn gal_page(word: &[u8; 16]) -> Vec<u8> {
        let mut even = [0u8; 16];
        let mut odd = [0u8; 16];
        for b in 0..112 {
            setbitu(&mut even, 2 + b, 1, getbitu(word, b, 1));
        }
        for b in 0..16 {
            setbitu(&mut odd, 2 + b, 1, getbitu(word, 112 + b, 1));
        }
        setbitu(&mut odd, 0, 1, 1); /* odd part flag */

        let mut crc_buff = [0u8; 26];
        for i in 0..15 {
            setbitu(&mut crc_buff, 4 + 8 * i, 8, getbitu(&even, 8 * i, 8));
        }
        for i in 0..11 {
            setbitu(&mut crc_buff, 118 + 8 * i, 8, getbitu(&odd, 8 * i, 8));
        }
        let crc = crc24q(&crc_buff, 25);
        setbitu(&mut odd, 82, 24, crc);

        let mut page = [0u8; 32];
        page[..16].copy_from_slice(&even);
        page[16..].copy_from_slice(&odd);
        /* byte-swap per 32 bit group, pad to 9 words */
        let mut data = Vec::new();
        for i in 0..8 {
            for j in 0..4 {
                data.push(page[i * 4 + 3 - j]);
            }
        }
        data.extend_from_slice(&[0; 4]);
        data
    }

    fn gal_word(ty: u32, iod: u32, svid: u32) -> [u8; 16] {
        let mut word = [0u8; 16];
        setbitu(&mut word, 0, 6, ty);
        match ty {
            0 => {
                setbitu(&mut word, 6, 2, 2); /* time field */
                setbitu(&mut word, 96, 12, 1150); /* week */
                setbitu(&mut word, 108, 20, 5000); /* tow */
            }
            1 => {
                setbitu(&mut word, 6, 10, iod);
                setbitu(&mut word, 16, 14, 100); /* toe */
                setbitu(&mut word, 94, 32, 2800u32 << 19); /* sqrtA */
            }
            2 | 3 => {
                setbitu(&mut word, 6, 10, iod);
            }
            4 => {
                setbitu(&mut word, 6, 10, iod);
                setbitu(&mut word, 16, 6, svid);
                setbitu(&mut word, 54, 14, 100); /* toc */
            }
            _ => {}
        }
        word
    }

    #[test]
    fn galileo_inav_through_sfrbx() {
        let mut raw = RawUbx::new();
        let sat = satno(Sys::Gal, 11).unwrap();
        /* without word 2 the bitmap never completes */
        for ty in [0u32, 1, 3, 4, 5, 6].iter() {
            let frame = sfrbx_frame(2, 11, 0, &gal_page(&gal_word(*ty, 77, 11)));
            assert_eq!(feed(&mut raw, &frame), Decoded::NeedMore, "type {}", ty);
        }
        /* word 2 resets the bitmap, the rest fill it, the last one
         * completes and publishes */
        for ty in [2u32, 0, 1, 3, 4, 5].iter() {
            let frame = sfrbx_frame(2, 11, 0, &gal_page(&gal_word(*ty, 77, 11)));
            assert_eq!(feed(&mut raw, &frame), Decoded::NeedMore, "type {}", ty);
        }
        let frame = sfrbx_frame(2, 11, 0, &gal_page(&gal_word(6, 77, 11)));
        assert_eq!(feed(&mut raw, &frame), Decoded::Ephemeris);
        assert_eq!(raw.ephsat, sat);
        assert_eq!(raw.nav.eph[sat - 1].iode, 77);
    }

    #[test]
    fn galileo_crc_error_discards_page() {
        let mut raw = RawUbx::new();
        let mut data = gal_page(&gal_word(0, 77, 11));
        data[10] ^= 0x10; /* flip a payload bit after the crc was sealed */
        let frame = sfrbx_frame(2, 11, 0, &data);
        assert_eq!(feed(&mut raw, &frame), Decoded::Error);
    }

    #[test]
    fn galileo_alert_page_skipped() {
        let mut raw = RawUbx::new();
        let word = gal_word(0, 77, 11);
        let mut data = gal_page(&word);
        /* set the alert bit of the even part (bit 1, msb byte 3 on wire) */
        data[3] |= 0x40;
        let frame = sfrbx_frame(2, 11, 0, &data);
        assert_eq!(feed(&mut raw, &frame), Decoded::NeedMore);
    }

    #[test]
    fn galfnav_suppresses_publication() {
        let mut raw = RawUbx::with_opt("-GALFNAV");
        for ty in [2u32, 0, 1, 3, 4, 5, 6].iter() {
            let frame = sfrbx_frame(2, 11, 0, &gal_page(&gal_word(*ty, 77, 11)));
            assert_eq!(feed(&mut raw, &frame), Decoded::NeedMore);
        }
        let sat = satno(Sys::Gal, 11).unwrap();
        assert_eq!(raw.nav.eph[sat - 1].sat, 0);
    }

    /* ---- beidou ---- */

    fn bds_words(page: &[u8; 38]) -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..10 {
            let word = getbitu(page, i * 30, 30);
            data.extend_from_slice(&word.to_le_bytes());
        }
        data
    }

    fn d1_subframe(frn: u32, sow: u32, aode: u32) -> [u8; 38] {
        let mut page = [0u8; 38];
        setbitu(&mut page, 15, 3, frn);
        setbitu(&mut page, 18, 8, sow >> 12);
        setbitu(&mut page, 30, 12, sow & 0xFFF);
        match frn {
            1 => {
                setbitu(&mut page, 60, 13, 700); /* week */
                setbitu(&mut page, 287, 5, aode);
            }
            2 => {
                let toe = 43200u32 / 8;
                setbitu(&mut page, 290, 2, toe >> 15);
            }
            3 => {
                let toe = 43200u32 / 8;
                setbitu(&mut page, 42, 10, (toe & 0x7FFF) >> 5);
                setbitu(&mut page, 60, 5, toe & 0x1F);
            }
            _ => {}
        }
        page
    }

    #[test]
    fn beidou_d1_through_sfrbx() {
        let mut raw = RawUbx::new();
        let sat = satno(Sys::Cmp, 6).unwrap();
        let f1 = sfrbx_frame(3, 6, 0, &bds_words(&d1_subframe(1, 345600, 9)));
        let f2 = sfrbx_frame(3, 6, 0, &bds_words(&d1_subframe(2, 345606, 9)));
        let f3 = sfrbx_frame(3, 6, 0, &bds_words(&d1_subframe(3, 345612, 9)));
        assert_eq!(feed(&mut raw, &f1), Decoded::NeedMore);
        assert_eq!(feed(&mut raw, &f2), Decoded::NeedMore);
        assert_eq!(feed(&mut raw, &f3), Decoded::Ephemeris);
        assert_eq!(raw.ephsat, sat);
        assert_eq!(raw.nav.eph[sat - 1].iode, 9);
        assert_eq!(raw.nav.eph[sat - 1].week, 700);

        /* unchanged rebroadcast swallowed */
        assert_eq!(feed(&mut raw, &f1), Decoded::NeedMore);
        assert_eq!(feed(&mut raw, &f2), Decoded::NeedMore);
        assert_eq!(feed(&mut raw, &f3), Decoded::NeedMore);
    }

    fn d2_page(pgn: u32, sow: u32) -> [u8; 38] {
        let mut page = [0u8; 38];
        setbitu(&mut page, 15, 3, 1); /* subframe 1 */
        setbitu(&mut page, 18, 8, sow >> 12);
        setbitu(&mut page, 30, 12, sow & 0xFFF);
        setbitu(&mut page, 42, 4, pgn);
        match pgn {
            1 => {
                setbitu(&mut page, 64, 13, 700);
            }
            4 => {
                setbitu(&mut page, 91, 5, 7); /* aode */
            }
            7 => {
                let toe = 43200u32 / 8;
                setbitu(&mut page, 110, 2, toe >> 15);
            }
            8 => {
                let toe = 43200u32 / 8;
                setbitu(&mut page, 46, 15, toe & 0x7FFF);
            }
            _ => {}
        }
        page
    }

    #[test]
    fn beidou_d2_through_sfrbx() {
        let mut raw = RawUbx::new();
        let sat = satno(Sys::Cmp, 3).unwrap(); /* GEO prn */
        for pgn in 1..=9u32 {
            let frame = sfrbx_frame(3, 3, 0, &bds_words(&d2_page(pgn, 345600 + 3 * pgn)));
            assert_eq!(feed(&mut raw, &frame), Decoded::NeedMore, "page {}", pgn);
        }
        let frame = sfrbx_frame(3, 3, 0, &bds_words(&d2_page(10, 345630)));
        assert_eq!(feed(&mut raw, &frame), Decoded::Ephemeris);
        assert_eq!(raw.ephsat, sat);
        assert_eq!(raw.nav.eph[sat - 1].iode, 7);
        assert_eq!(raw.nav.eph[sat - 1].flag, 2);
    }

    /* ---- glonass ---- */

    fn fix_hamming(s: &mut [u8; 16]) {
        /* solve the check bits (string bits 77..87) by brute force,
         * keeping the data bits in byte 9 intact */
        let keep = s[9] & 0xF8;
        for c in 0u16..2048 {
            s[9] = keep | (c >> 8) as u8;
            s[10] = c as u8;
            if test_glostr(&s[..11]) {
                return;
            }
        }
        panic!("no hamming solution");
    }

    fn glo_string(frn: u32, slot: u32, tb: u32, fid: u16) -> Vec<u8> {
        let mut s = [0u8; 16];
        setbitu(&mut s, 1, 4, frn);
        match frn {
            2 => {
                setbitu(&mut s, 9, 7, tb);
            }
            4 => {
                setbitu(&mut s, 59, 11, 1234); /* NT */
                setbitu(&mut s, 70, 5, slot);
            }
            _ => {}
        }
        fix_hamming(&mut s);
        s[12] = (fid >> 8) as u8;
        s[13] = fid as u8;
        /* byte-swap per 32 bit group for the wire */
        let mut data = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                data.push(s[i * 4 + 3 - j]);
            }
        }
        data
    }

    #[test]
    fn glonass_strings_through_sfrbx() {
        let mut raw = RawUbx::new();
        raw.time = gpst2time(2100, 200000.0);
        let sat = satno(Sys::Glo, 5).unwrap();

        for frn in 1..=3u32 {
            let frame = sfrbx_frame(6, 5, 4, &glo_string(frn, 5, 24, 0x1122));
            assert_eq!(feed(&mut raw, &frame), Decoded::NeedMore, "string {}", frn);
        }
        let frame = sfrbx_frame(6, 5, 4, &glo_string(4, 5, 24, 0x1122));
        assert_eq!(feed(&mut raw, &frame), Decoded::Ephemeris);
        assert_eq!(raw.ephsat, sat);
        let geph = &raw.nav.geph[4];
        assert_eq!(geph.sat, sat);
        assert_eq!(geph.iode, 24);
        assert_eq!(geph.frq, 4 - 7);
    }

    #[test]
    fn glonass_frame_id_change_flushes() {
        let mut raw = RawUbx::new();
        raw.time = gpst2time(2100, 200000.0);
        /* strings 1-3 of one frame */
        for frn in 1..=3u32 {
            feed(&mut raw, &sfrbx_frame(6, 5, 4, &glo_string(frn, 5, 24, 0x1122)));
        }
        /* string 4 of the NEXT frame: flush discards strings 1-3 */
        let frame = sfrbx_frame(6, 5, 4, &glo_string(4, 5, 24, 0x1123));
        assert_eq!(feed(&mut raw, &frame), Decoded::NeedMore);
        /* completing the new frame publishes */
        for frn in 1..=3u32 {
            feed(&mut raw, &sfrbx_frame(6, 5, 4, &glo_string(frn, 5, 24, 0x1123)));
        }
        let frame = sfrbx_frame(6, 5, 4, &glo_string(4, 5, 24, 0x1123));
        assert_eq!(feed(&mut raw, &frame), Decoded::Ephemeris);
    }

    #[test]
    fn glonass_hamming_error_discards() {
        let mut raw = RawUbx::new();
        raw.time = gpst2time(2100, 200000.0);
        let mut data = glo_string(1, 5, 24, 0x1122);
        data[7] ^= 0x01; /* corrupt a data bit */
        let frame = sfrbx_frame(6, 5, 4, &data);
        assert_eq!(feed(&mut raw, &frame), Decoded::Error);
    }

    /* ---- sbas ---- */

    #[test]
    fn sbas_message_through_sfrbx() {
        let mut raw = RawUbx::new();
        raw.time = gpst2time(2100, 4000.0);
        let mut data = [0u8; 32];
        data[3] = 0x9A; /* first payload byte after the byte-swap */
        let frame = sfrbx_frame(1, 133, 0, &data);
        assert_eq!(feed(&mut raw, &frame), Decoded::SbasMessage);
        assert_eq!(raw.sbsmsg.prn, 133);
        assert_eq!(raw.sbsmsg.tow, 3999); /* tow - 1 s */
        assert_eq!(raw.sbsmsg.week, 2100);
        assert_eq!(raw.sbsmsg.msg[0], 0x9A);
    }

    /* ---- legacy rxm-sfrb ---- */

    fn sfrb_frame(svid: u8, words: &[u32; 10]) -> Vec<u8> {
        let mut payload = vec![0, svid];
        for word in words.iter() {
            payload.extend_from_slice(&word.to_le_bytes());
        }
        UbxFrame::construct(UbxCID::new(0x02, 0x11), payload).to_bytes()
    }

    #[test]
    fn legacy_sfrb_assembles_gps_ephemeris() {
        let mut raw = RawUbx::new();
        raw.time = gpst2time(2100, 6000.0);
        let sat = satno(Sys::Gps, 9).unwrap();
        for id in 1..=3u32 {
            let sf = lnav_subframe(id, 1000, 0x30);
            let mut words = [0u32; 10];
            for (i, word) in words.iter_mut().enumerate() {
                *word = getbitu(&sf, i * 24, 24);
            }
            let frame = sfrb_frame(9, &words);
            let expect = if id == 3 {
                Decoded::Ephemeris
            } else {
                Decoded::NeedMore
            };
            assert_eq!(feed(&mut raw, &frame), expect, "subframe {}", id);
        }
        assert_eq!(raw.nav.eph[sat - 1].iode, 0x30);
    }

    #[test]
    fn legacy_sfrb_too_short() {
        let mut raw = RawUbx::new();
        let frame =
            UbxFrame::construct(UbxCID::new(0x02, 0x11), vec![0; 20]).to_bytes();
        assert_eq!(feed(&mut raw, &frame), Decoded::Error);
    }
}
