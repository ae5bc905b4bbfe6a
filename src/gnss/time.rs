/*
 * GNSS time scales
 *
 * GTime keeps integer seconds (unix epoch) plus a fraction below one
 * second, so carrier-phase grade resolution survives arbitrary spans.
 */

use std::fmt;

use chrono::{DateTime, NaiveDate};

#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct GTime {
    pub time: i64,
    pub sec: f64,
}

impl GTime {
    /* an unset time; receivers start here until NAV-SOL/NAV-TIMEGPS */
    pub fn is_zero(&self) -> bool {
        self.time == 0
    }
}

impl fmt::Display for GTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::from_timestamp(self.time, 0) {
            Some(dt) => write!(f, "{} +{:.3}s", dt.naive_utc(), self.sec),
            None => write!(f, "gtime({}, {:.3})", self.time, self.sec),
        }
    }
}

fn epoch_unix(year: i32, month: u32, day: u32) -> i64 {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp()
}

fn gpst0() -> i64 {
    epoch_unix(1980, 1, 6)
}

fn gst0() -> i64 {
    epoch_unix(1999, 8, 22)
}

fn bdt0() -> i64 {
    epoch_unix(2006, 1, 1)
}

/* leap second table: (utc epoch, gpst-utc) newest first */
fn leap_table() -> Vec<(i64, f64)> {
    vec![
        (epoch_unix(2017, 1, 1), -18.0),
        (epoch_unix(2015, 7, 1), -17.0),
        (epoch_unix(2012, 7, 1), -16.0),
        (epoch_unix(2009, 1, 1), -15.0),
        (epoch_unix(2006, 1, 1), -14.0),
        (epoch_unix(1999, 1, 1), -13.0),
        (epoch_unix(1997, 7, 1), -12.0),
        (epoch_unix(1996, 1, 1), -11.0),
        (epoch_unix(1994, 7, 1), -10.0),
        (epoch_unix(1993, 7, 1), -9.0),
        (epoch_unix(1992, 7, 1), -8.0),
        (epoch_unix(1991, 1, 1), -7.0),
        (epoch_unix(1990, 1, 1), -6.0),
        (epoch_unix(1988, 1, 1), -5.0),
        (epoch_unix(1985, 7, 1), -4.0),
        (epoch_unix(1983, 7, 1), -3.0),
        (epoch_unix(1982, 7, 1), -2.0),
        (epoch_unix(1981, 7, 1), -1.0),
    ]
}

fn week2time(epoch: i64, week: i32, mut sec: f64) -> GTime {
    if !(-1e9..=1e9).contains(&sec) {
        sec = 0.0;
    }
    let mut t = GTime {
        time: epoch + 86400 * 7 * week as i64,
        sec: 0.0,
    };
    t.time += sec.floor() as i64;
    t.sec = sec - sec.floor();
    t
}

fn time2week(epoch: i64, t: GTime, week: Option<&mut i32>) -> f64 {
    let sec = t.time - epoch;
    let w = sec.div_euclid(86400 * 7);
    if let Some(wk) = week {
        *wk = w as i32;
    }
    (sec - w * 86400 * 7) as f64 + t.sec
}

pub fn gpst2time(week: i32, sec: f64) -> GTime {
    week2time(gpst0(), week, sec)
}

pub fn time2gpst(t: GTime, week: Option<&mut i32>) -> f64 {
    time2week(gpst0(), t, week)
}

pub fn gst2time(week: i32, sec: f64) -> GTime {
    week2time(gst0(), week, sec)
}

pub fn time2gst(t: GTime, week: Option<&mut i32>) -> f64 {
    time2week(gst0(), t, week)
}

pub fn bdt2time(week: i32, sec: f64) -> GTime {
    week2time(bdt0(), week, sec)
}

pub fn time2bdt(t: GTime, week: Option<&mut i32>) -> f64 {
    time2week(bdt0(), t, week)
}

/* BDT runs 14 s behind GPST */
pub fn bdt2gpst(t: GTime) -> GTime {
    timeadd(t, 14.0)
}

pub fn timeadd(mut t: GTime, sec: f64) -> GTime {
    t.sec += sec;
    let whole = t.sec.floor();
    t.time += whole as i64;
    t.sec -= whole;
    t
}

pub fn timediff(t1: GTime, t2: GTime) -> f64 {
    (t1.time - t2.time) as f64 + t1.sec - t2.sec
}

pub fn gpst2utc(t: GTime) -> GTime {
    for (epoch, leap) in leap_table() {
        let tu = timeadd(t, leap);
        if tu.time >= epoch {
            return tu;
        }
    }
    t
}

pub fn utc2gpst(t: GTime) -> GTime {
    for (epoch, leap) in leap_table() {
        if t.time >= epoch {
            return timeadd(t, -leap);
        }
    }
    t
}

/* expand an 8-bit utc reference week to a full week close to time */
pub fn adj_utcweek(time: GTime, utc: &mut [f64; 4]) {
    if utc[3] >= 256.0 {
        return;
    }
    let mut week = 0;
    time2gpst(time, Some(&mut week));
    utc[3] += (week / 256 * 256) as f64;
    if utc[3] < (week - 128) as f64 {
        utc[3] += 256.0;
    } else if utc[3] > (week + 128) as f64 {
        utc[3] -= 256.0;
    }
}

/* expand a 10-bit gps week to a full week. The pivot is the receiver
 * time when known, a fixed post-rollover week otherwise. */
pub fn adjgpsweek(week: i32, time: GTime) -> i32 {
    let mut w = 0;
    if !time.is_zero() {
        time2gpst(time, Some(&mut w));
    }
    if w < 1560 {
        w = 2048;
    }
    week + (w - week + 512) / 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpst_epoch() {
        let t = gpst2time(0, 0.0);
        assert_eq!(t.time, 315964800); /* 1980-01-06 00:00:00 UTC */
        assert_eq!(t.sec, 0.0);
    }

    #[test]
    fn gpst_roundtrip() {
        let t = gpst2time(2000, 100.5);
        let mut week = 0;
        let sec = time2gpst(t, Some(&mut week));
        assert_eq!(week, 2000);
        assert!((sec - 100.5).abs() < 1e-9);
    }

    #[test]
    fn timeadd_carries_fraction() {
        let t = gpst2time(2000, 0.75);
        let t2 = timeadd(t, 0.5);
        assert!((time2gpst(t2, None) - 1.25).abs() < 1e-9);
        assert!(0.0 <= t2.sec && t2.sec < 1.0);
    }

    #[test]
    fn timediff_signs() {
        let t1 = gpst2time(2000, 10.0);
        let t2 = gpst2time(2000, 4.5);
        assert!((timediff(t1, t2) - 5.5).abs() < 1e-9);
        assert!((timediff(t2, t1) + 5.5).abs() < 1e-9);
    }

    #[test]
    fn leap_seconds_2017() {
        let t = gpst2time(2000, 100000.0); /* year 2018 */
        let u = gpst2utc(t);
        assert!((timediff(u, t) + 18.0).abs() < 1e-9);
        let back = utc2gpst(u);
        assert_eq!(back, t);
    }

    #[test]
    fn bdt_offset() {
        let t = bdt2gpst(bdt2time(0, 0.0));
        assert_eq!(t.time, epoch_unix(2006, 1, 1) + 14);
    }

    #[test]
    fn utc_week_expansion() {
        let time = gpst2time(2100, 0.0);
        let mut utc = [0.0, 0.0, 0.0, 52.0]; /* 2100 % 256 = 52 */
        adj_utcweek(time, &mut utc);
        assert_eq!(utc[3], 2100.0);
    }

    #[test]
    fn utc_week_expansion_wraps() {
        let time = gpst2time(2047, 0.0);
        let mut utc = [0.0, 0.0, 0.0, 10.0];
        adj_utcweek(time, &mut utc);
        /* 7*256+10 = 1802 is below 2047-128, bump up by 256 */
        assert_eq!(utc[3], 2058.0);
    }

    #[test]
    fn gps_week_expansion() {
        /* 10-bit week 42 close to receiver week 2090 */
        let time = gpst2time(2090, 0.0);
        assert_eq!(adjgpsweek(42, time), 2090);
        /* without receiver time, pivot on week 2048 */
        assert_eq!(adjgpsweek(42, GTime::default()), 2090);
    }
}
