// Helpers for cell cleanup, column naming, formatting and basic statistics.
//
// Everything "dirty" about the CSV exports is handled here so the loader and
// the query layer can work with typed values.
use num_format::{Locale, ToFormattedString};

/// Annotation appended to some year labels in the source exports.
pub const COVID_ANNOTATION: &str = "(COVID-19 Pandemic)";

/// Parse a measure cell of either export (`Cases`, `Rate per 100000`,
/// `Numerator`, `Percent`) into `f64`.
///
/// Counts arrive with thousands separators (`"1,234"`), so commas are
/// stripped before parsing. Placeholders such as `N/A` or `Suppressed`, and
/// anything that parses to NaN or infinity, become `None`. Exponent forms
/// like `1e3` are accepted.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let value = s.replace(',', "").parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Normalize a year label: drop the pandemic annotation, trim, parse.
pub fn parse_year(s: Option<&str>) -> Option<i32> {
    let s = s?.replace(COVID_ANNOTATION, "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i32>().ok()
}

pub fn parse_fips(s: Option<&str>) -> Option<u32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<u32>().ok()
}

/// Column name used for an indicator in a wide table: lowercase, spaces
/// replaced by underscores. Other punctuation is kept as is, so
/// `"Early Non-Primary, Non-Secondary Syphilis"` becomes
/// `"early_non-primary,_non-secondary_syphilis"`.
pub fn normalize_column_name(label: &str) -> String {
    label.to_lowercase().replace(' ', "_")
}

/// Pearson correlation over the positions where both series have a value.
///
/// Returns NaN when fewer than two pairs remain or either side has zero
/// variance.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((*x, *y)),
            _ => None,
        })
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators, e.g. `1,234,567.89`.
    if !n.is_finite() {
        return "NaN".to_string();
    }
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Row and state counts for load summaries and console output,
/// e.g. `2,550`.
pub fn format_int<T: ToFormattedString>(count: T) -> String {
    count.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_labels_are_normalized() {
        assert_eq!(parse_year(Some("2015")), Some(2015));
        assert_eq!(parse_year(Some("2020 (COVID-19 Pandemic)")), Some(2020));
        assert_eq!(parse_year(Some("  2021 ")), Some(2021));
        assert_eq!(parse_year(Some("not a year")), None);
        assert_eq!(parse_year(Some("")), None);
        assert_eq!(parse_year(None), None);
    }

    #[test]
    fn numeric_cells_strip_separators() {
        assert_eq!(parse_f64_safe(Some("1,234")), Some(1234.0));
        assert_eq!(parse_f64_safe(Some(" 12.5 ")), Some(12.5));
        assert_eq!(parse_f64_safe(Some("1,234,567")), Some(1_234_567.0));
        assert_eq!(parse_f64_safe(Some("N/A")), None);
        assert_eq!(parse_f64_safe(Some("Suppressed")), None);
        assert_eq!(parse_f64_safe(Some("1e3")), Some(1000.0));
        assert_eq!(parse_f64_safe(Some("2.5E2")), Some(250.0));
        assert_eq!(parse_f64_safe(Some("NaN")), None);
        assert_eq!(parse_f64_safe(Some("inf")), None);
        assert_eq!(parse_f64_safe(Some("-infinity")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn column_names() {
        assert_eq!(normalize_column_name("Gonorrhea"), "gonorrhea");
        assert_eq!(normalize_column_name("Vacant housing"), "vacant_housing");
        assert_eq!(
            normalize_column_name("Population 25 years and older w/o HS diploma"),
            "population_25_years_and_older_w/o_hs_diploma"
        );
    }

    #[test]
    fn pearson_basic() {
        let xs = [Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let ys = [Some(2.0), Some(4.0), Some(6.0), Some(8.0)];
        let neg = [Some(4.0), Some(3.0), Some(2.0), Some(1.0)];
        assert!((pearson(&xs, &ys) - 1.0).abs() < 1e-12);
        assert!((pearson(&xs, &neg) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_skips_missing_pairs_and_flags_constant() {
        let xs = [Some(1.0), None, Some(3.0), Some(5.0)];
        let ys = [Some(1.0), Some(100.0), Some(3.0), Some(5.0)];
        assert!((pearson(&xs, &ys) - 1.0).abs() < 1e-12);

        let flat = [Some(7.0), Some(7.0), Some(7.0), Some(7.0)];
        assert!(pearson(&xs, &flat).is_nan());
        assert!(pearson(&[Some(1.0)], &[Some(2.0)]).is_nan());
    }

    #[test]
    fn formatting() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-42.0, 0), "-42");
        assert_eq!(format_number(0.0, 1), "0.0");
        assert_eq!(format_int(9855_i64), "9,855");
    }
}
