//! Diagnostic report text.
//!
//! The layout depends on the strategy that produced the model:
//!
//! T_Tide-style models get a header block and a fixed-width table
//!
//! ```text
//! tide      freq       amp   amp_err     pha   pha_err       snr
//! *M2   0.0805114    1.2003    0.0041   40.12      0.19   8.6e4
//! ```
//!
//! UTide-style models get `name<TAB>value` scalars followed by a
//! tab-separated table with one column per diagnostic field.

use std::fmt::{self, Write};

use crate::analysis::{Diagnostics, HarmonicModel, StrategyKind};
use crate::time::from_datenum;

/// Constituents above this SNR are flagged as significant.
const SIGNIFICANT_SNR: f64 = 2.0;

/// Render the diagnostics of a fitted model.
pub fn format_report(model: &dyn HarmonicModel) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    match write_report(&mut out, model) {
        Ok(()) => out,
        Err(fmt::Error) => String::new(),
    }
}

/// Write the diagnostics of a fitted model to any text sink.
pub fn write_report<W: Write>(out: &mut W, model: &dyn HarmonicModel) -> fmt::Result {
    let diagnostics = model.diagnostics();
    match model.kind() {
        StrategyKind::ConstituentFitA => write_ttide(out, &diagnostics),
        StrategyKind::ConstituentFitB => write_utide(out, &diagnostics),
    }
}

fn write_ttide<W: Write>(out: &mut W, d: &Diagnostics) -> fmt::Result {
    let value = |name: &str| d.scalar(name).unwrap_or(f64::NAN);

    writeln!(out, "{} harmonic analysis", StrategyKind::ConstituentFitA.label())?;
    writeln!(out, "nobs = {}", value("n_samples") as usize)?;
    writeln!(out, "sampling interval (hours) = {:.4}", value("dt_hours"))?;
    let start = d
        .scalar("stime")
        .map(|t| from_datenum(t).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();
    writeln!(out, "start time = {start}")?;
    match d.scalar("latitude") {
        Some(lat) => writeln!(out, "latitude = {lat:.4} (nodal corrections applied)")?,
        None => writeln!(out, "latitude = none (no nodal corrections)")?,
    }
    writeln!(out, "x0 = {:.6}", value("mean"))?;
    writeln!(out, "var(xres) = {:.6}", value("residual_variance"))?;
    writeln!(out, "r squared = {:.6}", value("r_squared"))?;
    writeln!(out, "synth = {}", value("synth"))?;
    writeln!(out)?;

    writeln!(out, "tidal amplitude and phase with 95% CI estimates")?;
    writeln!(
        out,
        "{:<6}{:>10}{:>10}{:>10}{:>8}{:>10}{:>10}",
        "tide", "freq", "amp", "amp_err", "pha", "pha_err", "snr"
    )?;
    for c in &d.constituents {
        let field = |name: &str| c.get(name).unwrap_or(f64::NAN);
        let snr = field("snr");
        let flag = if snr > SIGNIFICANT_SNR { "*" } else { " " };
        writeln!(
            out,
            "{flag}{:<5}{:>10.7}{:>10.4}{:>10.4}{:>8.2}{:>10.2}{:>10}",
            c.name,
            field("freq"),
            field("amp"),
            field("amp_err"),
            field("pha"),
            field("pha_err"),
            format_snr(snr),
        )?;
    }
    Ok(())
}

fn write_utide<W: Write>(out: &mut W, d: &Diagnostics) -> fmt::Result {
    writeln!(out, "{} harmonic analysis", StrategyKind::ConstituentFitB.label())?;
    for (name, value) in &d.scalars {
        writeln!(out, "{name}\t{value}")?;
    }
    writeln!(out)?;

    write!(out, "Constituent")?;
    for name in d.field_names() {
        write!(out, "\t{name}")?;
    }
    writeln!(out)?;

    for c in &d.constituents {
        write!(out, "{}", c.name)?;
        for (_, value) in &c.fields {
            write!(out, "\t{value}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn format_snr(snr: f64) -> String {
    if !snr.is_finite() {
        "inf".to_string()
    } else if snr >= 1e4 {
        format!("{snr:.1e}")
    } else {
        format!("{snr:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ConstituentFitA, ConstituentFitB, Latitude, find_constituent};

    fn depths() -> Vec<f64> {
        let m2 = find_constituent("M2").unwrap();
        (0..24 * 15)
            .map(|i| {
                let t = i as f64;
                2.0 + (m2.angular_frequency() * t).cos() + if i % 2 == 0 { 0.01 } else { -0.01 }
            })
            .collect()
    }

    #[test]
    fn test_ttide_report_layout() {
        let model = ConstituentFitA::default()
            .solve(&depths(), 1.0, 19000.0, Some(Latitude::new(45.0).unwrap()))
            .unwrap();
        let text = format_report(&model);

        assert!(text.starts_with("T Tide harmonic analysis\n"));
        assert!(text.contains("nobs = 360"));
        assert!(text.contains("start time = 2022-01-08 00:00:00"));
        assert!(text.contains("latitude = 45.0000"));
        let header = text.lines().find(|l| l.starts_with("tide")).unwrap();
        for col in ["freq", "amp", "amp_err", "pha", "pha_err", "snr"] {
            assert!(header.contains(col));
        }
        assert!(text.lines().any(|l| l.starts_with("*M2")));
    }

    #[test]
    fn test_utide_report_contains_every_field() {
        let t: Vec<f64> = (0..24 * 15).map(|i| 19000.0 + i as f64 / 24.0).collect();
        let model = ConstituentFitB::default().solve(&t, &depths(), 1.0, None).unwrap();
        let text = format_report(&model);
        let d = model.diagnostics();

        assert!(text.starts_with("U Tide harmonic analysis\n"));
        for (name, _) in &d.scalars {
            assert!(text.lines().any(|l| l.starts_with(&format!("{name}\t"))));
        }
        assert!(text.contains("Constituent\tfrequency\tA\tA_ci\tg\tg_ci\tSNR\tPE"));
        let row = text.lines().find(|l| l.starts_with("M2\t")).unwrap();
        assert_eq!(row.split('\t').count(), 8);
    }

    /// Sink that rejects writes once `limit` bytes have been taken.
    struct Truncating {
        text: String,
        limit: usize,
    }

    impl Write for Truncating {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            if self.text.len() + s.len() > self.limit {
                return Err(fmt::Error);
            }
            self.text.push_str(s);
            Ok(())
        }
    }

    #[test]
    fn test_write_errors_are_propagated() {
        let model = ConstituentFitA::default().solve(&depths(), 1.0, 19000.0, None).unwrap();
        let full = format_report(&model);

        let mut short = Truncating { text: String::new(), limit: 40 };
        assert_eq!(write_report(&mut short, &model), Err(fmt::Error));
        assert!(short.text.len() <= 40);
        assert!(full.starts_with(&short.text));

        let mut roomy = Truncating { text: String::new(), limit: usize::MAX };
        write_report(&mut roomy, &model).unwrap();
        assert_eq!(roomy.text, full);
    }

    #[test]
    fn test_snr_formatting() {
        assert_eq!(format_snr(f64::INFINITY), "inf");
        assert_eq!(format_snr(3.14159), "3.14");
        assert_eq!(format_snr(86000.0), "8.6e4");
    }
}
