/*
 * Receiver option string, parsed once instead of being rescanned on
 * every frame. Space separated, case sensitive:
 *
 *   -EPHALL        publish every ephemeris, changed or not
 *   -INVCP         invert carrier-phase polarity (RXM-RAW)
 *   -TADJ=tint     adjust time tags to multiples of tint seconds
 *   -MAX_STD_CP=n  max std-dev of a valid carrier-phase (default 5)
 *   -STD_SLIP=n    declare slip above this carrier-phase std-dev (15)
 *   -GALFNAV       suppress I/NAV ephemeris output (host uses F/NAV)
 *   -TRKM_ADJ=k    GLONASS code bias table for TRK-MEAS, k = 2 or 3
 */

#[derive(Debug, Clone)]
pub struct RawOpt {
    pub ephall: bool,
    pub invcp: bool,
    pub galfnav: bool,
    pub tadj: f64,
    pub max_std_cp: u8,
    pub std_slip: u8,
    pub trkm_adj: u8,
}

const MAX_CPSTD_VALID: u8 = 5;
const CPSTD_SLIP: u8 = 15;

impl Default for RawOpt {
    fn default() -> Self {
        Self {
            ephall: false,
            invcp: false,
            galfnav: false,
            tadj: 0.0,
            max_std_cp: MAX_CPSTD_VALID,
            std_slip: CPSTD_SLIP,
            trkm_adj: 0,
        }
    }
}

impl RawOpt {
    pub fn parse(opt: &str) -> Self {
        let mut parsed = Self::default();
        for tok in opt.split_whitespace() {
            if tok == "-EPHALL" {
                parsed.ephall = true;
            } else if tok == "-INVCP" {
                parsed.invcp = true;
            } else if tok == "-GALFNAV" {
                parsed.galfnav = true;
            } else if let Some(v) = tok.strip_prefix("-TADJ=") {
                parsed.tadj = v.parse().unwrap_or(0.0);
            } else if let Some(v) = tok.strip_prefix("-MAX_STD_CP=") {
                parsed.max_std_cp = v.parse().unwrap_or(MAX_CPSTD_VALID);
            } else if let Some(v) = tok.strip_prefix("-STD_SLIP=") {
                parsed.std_slip = v.parse().unwrap_or(CPSTD_SLIP);
            } else if let Some(v) = tok.strip_prefix("-TRKM_ADJ=") {
                parsed.trkm_adj = v.parse().unwrap_or(0);
            }
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opt = RawOpt::parse("");
        assert!(!opt.ephall);
        assert!(!opt.invcp);
        assert!(!opt.galfnav);
        assert_eq!(opt.tadj, 0.0);
        assert_eq!(opt.max_std_cp, 5);
        assert_eq!(opt.std_slip, 15);
        assert_eq!(opt.trkm_adj, 0);
    }

    #[test]
    fn all_options() {
        let opt = RawOpt::parse("-EPHALL -INVCP -TADJ=0.1 -MAX_STD_CP=8 -STD_SLIP=12 -GALFNAV -TRKM_ADJ=3");
        assert!(opt.ephall);
        assert!(opt.invcp);
        assert!(opt.galfnav);
        assert_eq!(opt.tadj, 0.1);
        assert_eq!(opt.max_std_cp, 8);
        assert_eq!(opt.std_slip, 12);
        assert_eq!(opt.trkm_adj, 3);
    }

    #[test]
    fn case_sensitive() {
        let opt = RawOpt::parse("-ephall -invcp");
        assert!(!opt.ephall);
        assert!(!opt.invcp);
    }

    #[test]
    fn bad_numbers_fall_back() {
        let opt = RawOpt::parse("-TADJ=abc -MAX_STD_CP=x");
        assert_eq!(opt.tadj, 0.0);
        assert_eq!(opt.max_std_cp, 5);
    }
}
