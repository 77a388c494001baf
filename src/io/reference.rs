//! Known optimal costs and optimality gaps.

use std::collections::HashMap;
use std::path::Path;

use tracing::trace;

/// Reads a table of reference costs keyed by instance name.
///
/// Each line holds `name;\t<value>;\t<cost>` (fields separated by `;` and
/// optional whitespace); the third field is the reference cost. Lines with
/// fewer than three fields or a non-numeric cost, such as column headers,
/// are skipped. A later line for the same name overrides an earlier one.
///
/// # Examples
///
/// ```
/// use u_dispatch::io::parse_reference_costs;
///
/// let table = parse_reference_costs("Instance;\tTime;\tCost\nCo_30_1_NT_0;\t1.2;\t950\n");
/// assert_eq!(table.get("Co_30_1_NT_0"), Some(&950.0));
/// assert_eq!(table.len(), 1);
/// ```
pub fn parse_reference_costs(text: &str) -> HashMap<String, f64> {
    let mut table = HashMap::new();
    for (index, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split(';').map(str::trim).collect();
        if fields.len() < 3 || fields[0].is_empty() {
            continue;
        }
        match fields[2].parse::<f64>() {
            Ok(cost) if cost.is_finite() => {
                table.insert(fields[0].to_string(), cost);
            }
            _ => trace!(line = index + 1, "skipping reference line"),
        }
    }
    table
}

/// Name under which an instance file appears in a reference table: the
/// final path component up to its first `.`.
///
/// Returns `None` for paths without a file name.
///
/// # Examples
///
/// ```
/// use u_dispatch::io::instance_name;
///
/// assert_eq!(instance_name("data/Co_30_1_NT_0.txt").as_deref(), Some("Co_30_1_NT_0"));
/// ```
pub fn instance_name(path: impl AsRef<Path>) -> Option<String> {
    let file_name = path.as_ref().file_name()?.to_str()?;
    let stem = file_name.split('.').next().unwrap_or(file_name);
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}

/// Relative distance of `found` above `reference`, in percent:
/// `(found - reference) / reference * 100`.
///
/// Returns `None` when the reference is zero or either cost is not finite.
///
/// # Examples
///
/// ```
/// use u_dispatch::io::optimality_gap;
///
/// let gap = optimality_gap(110.0, 100.0).unwrap();
/// assert!((gap - 10.0).abs() < 1e-10);
/// assert_eq!(optimality_gap(5.0, 0.0), None);
/// ```
pub fn optimality_gap(found: f64, reference: f64) -> Option<f64> {
    if reference == 0.0 || !reference.is_finite() || !found.is_finite() {
        return None;
    }
    Some((found - reference) / reference * 100.0)
}
