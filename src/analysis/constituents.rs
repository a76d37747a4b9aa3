//! Tidal constituent catalogue and automatic constituent selection.
//!
//! Frequencies are in cycles per hour. The catalogue is ordered by typical
//! importance so that, when the record is short, the dominant constituents
//! win the Rayleigh competition against their neighbours.

use std::f64::consts::PI;

/// How a constituent's nodal factors are computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodalClass {
    /// Solar or otherwise unmodulated (f = 1, u = 0)
    Solar,
    /// M2-like lunar semidiurnal
    M2,
    K1,
    O1,
    K2,
    J1,
    OO1,
    Mf,
    Mm,
    /// f = f(M2)^1.5
    M3,
    /// Compound of M2 and K1
    M2K1,
    /// f = f(M2)^2 (quarter-diurnal overtides)
    M2Squared,
    /// f = f(M2)^3 (sixth-diurnal overtides)
    M2Cubed,
    /// f = f(M2)^4
    M2Fourth,
}

/// A tidal constituent from the catalogue.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constituent {
    /// Name (e.g., "M2", "K1")
    pub name: &'static str,
    /// Frequency in cycles per hour
    pub frequency: f64,
    /// Nodal modulation class
    pub nodal: NodalClass,
}

impl Constituent {
    const fn new(name: &'static str, frequency: f64, nodal: NodalClass) -> Self {
        Self {
            name,
            frequency,
            nodal,
        }
    }

    /// Period in hours.
    pub fn period_hours(&self) -> f64 {
        1.0 / self.frequency
    }

    /// Angular frequency in radians per hour.
    pub fn angular_frequency(&self) -> f64 {
        2.0 * PI * self.frequency
    }
}

/// Constituents considered by both strategies, in order of importance.
pub static CATALOGUE: [Constituent; 37] = [
    Constituent::new("M2", 0.0805114007, NodalClass::M2),
    Constituent::new("K1", 0.0417807462, NodalClass::K1),
    Constituent::new("S2", 0.0833333333, NodalClass::Solar),
    Constituent::new("O1", 0.0387306544, NodalClass::O1),
    Constituent::new("N2", 0.0789992485, NodalClass::M2),
    Constituent::new("P1", 0.0415525871, NodalClass::Solar),
    Constituent::new("K2", 0.0835614924, NodalClass::K2),
    Constituent::new("Q1", 0.0372185026, NodalClass::O1),
    Constituent::new("M4", 0.1610228013, NodalClass::M2Squared),
    Constituent::new("MF", 0.0030500918, NodalClass::Mf),
    Constituent::new("MM", 0.0015121518, NodalClass::Mm),
    Constituent::new("SSA", 0.0002281591, NodalClass::Solar),
    Constituent::new("SA", 0.0001140741, NodalClass::Solar),
    Constituent::new("MS4", 0.1638447341, NodalClass::M2),
    Constituent::new("MN4", 0.1595106493, NodalClass::M2Squared),
    Constituent::new("M6", 0.2415342021, NodalClass::M2Cubed),
    Constituent::new("NU2", 0.0792016195, NodalClass::M2),
    Constituent::new("MU2", 0.0776894677, NodalClass::M2),
    Constituent::new("2N2", 0.0774870967, NodalClass::M2),
    Constituent::new("L2", 0.0820235417, NodalClass::M2),
    Constituent::new("T2", 0.0832192628, NodalClass::Solar),
    Constituent::new("J1", 0.0432928890, NodalClass::J1),
    Constituent::new("OO1", 0.0448308289, NodalClass::OO1),
    Constituent::new("M3", 0.1207671010, NodalClass::M3),
    Constituent::new("MK3", 0.1222921469, NodalClass::M2K1),
    Constituent::new("S4", 0.1666666667, NodalClass::Solar),
    Constituent::new("2MS6", 0.2443561346, NodalClass::M2Squared),
    Constituent::new("2MN6", 0.2400220500, NodalClass::M2Cubed),
    Constituent::new("M8", 0.3220456027, NodalClass::M2Fourth),
    Constituent::new("MSF", 0.0028219327, NodalClass::M2),
    Constituent::new("S1", 0.0416666721, NodalClass::Solar),
    Constituent::new("LDA2", 0.0818211706, NodalClass::M2),
    Constituent::new("RHO1", 0.0374208736, NodalClass::O1),
    Constituent::new("2Q1", 0.0357063507, NodalClass::O1),
    Constituent::new("SIG1", 0.0359087218, NodalClass::O1),
    Constituent::new("NO1", 0.0402685944, NodalClass::J1),
    Constituent::new("MO3", 0.1192420551, NodalClass::M2),
];

/// Look up a catalogue constituent by name (case-insensitive).
pub fn find_constituent(name: &str) -> Option<&'static Constituent> {
    CATALOGUE.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Select the constituents a record can resolve.
///
/// Walks the catalogue in importance order and keeps a constituent when it
/// lies below the Nyquist frequency of `dt_hours`, is separated from the mean
/// (frequency zero) and from every constituent already kept by at least
/// `rayleigh / record_hours`, and at most `max_constituents` are kept.
///
/// The result is sorted by frequency.
pub fn select_constituents(
    record_hours: f64,
    dt_hours: f64,
    rayleigh: f64,
    max_constituents: usize,
) -> Vec<&'static Constituent> {
    if record_hours <= 0.0 || dt_hours <= 0.0 {
        return Vec::new();
    }

    let nyquist = 0.5 / dt_hours;
    let min_separation = rayleigh / record_hours;
    let mut selected: Vec<&'static Constituent> = Vec::new();

    for c in CATALOGUE.iter() {
        if selected.len() >= max_constituents {
            break;
        }
        if c.frequency >= nyquist || c.frequency < min_separation {
            continue;
        }
        let resolvable = selected
            .iter()
            .all(|s| (s.frequency - c.frequency).abs() >= min_separation);
        if resolvable {
            selected.push(c);
        }
    }

    selected.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(selected: &[&Constituent]) -> Vec<&'static str> {
        selected.iter().map(|c| c.name).collect()
    }

    #[test]
    fn test_catalogue_names_unique() {
        for (i, a) in CATALOGUE.iter().enumerate() {
            for b in CATALOGUE.iter().skip(i + 1) {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_find_constituent() {
        let m2 = find_constituent("m2").unwrap();
        assert!((m2.period_hours() - 12.4206).abs() < 1e-3);
        assert!(find_constituent("XYZ").is_none());
    }

    #[test]
    fn test_short_record_selects_nothing() {
        // one hour between two samples resolves no tidal frequency
        assert!(select_constituents(1.0, 1.0, 1.0, 10).is_empty());
    }

    #[test]
    fn test_two_day_record() {
        let selected = select_constituents(48.0, 1.0, 1.0, 20);
        let n = names(&selected);
        // M2 and K1 win; S2 is too close to M2 over two days
        assert!(n.contains(&"M2"));
        assert!(n.contains(&"K1"));
        assert!(!n.contains(&"S2"));
        assert!(n.contains(&"M4"));
    }

    #[test]
    fn test_month_record_separates_m2_s2() {
        let selected = select_constituents(30.0 * 24.0, 1.0, 1.0, 40);
        let n = names(&selected);
        for expected in ["M2", "S2", "K1", "O1", "N2", "MF"] {
            assert!(n.contains(&expected), "{expected} missing from {n:?}");
        }
        // K1 and P1 need about half a year
        assert!(!n.contains(&"P1"));
    }

    #[test]
    fn test_nyquist_excludes_high_frequencies() {
        // 4-hour sampling: Nyquist is 0.125 cph, so M4 (0.161) is excluded
        let selected = select_constituents(60.0 * 24.0, 4.0, 1.0, 40);
        assert!(selected.iter().all(|c| c.frequency < 0.125));
        assert!(names(&selected).contains(&"M2"));
    }

    #[test]
    fn test_limit_and_sorted() {
        let selected = select_constituents(400.0 * 24.0, 1.0, 1.0, 3);
        assert_eq!(selected.len(), 3);
        for pair in selected.windows(2) {
            assert!(pair[0].frequency < pair[1].frequency);
        }
    }
}
