use crate::error::{DashboardError, Result};
use crate::pipeline::DashboardView;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|e| DashboardError::io(path, e))?;
    Ok(())
}

/// Write every chart of a view as `<dir>/<name>.json`, returning the paths.
pub fn write_charts(dir: &Path, view: &DashboardView) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| DashboardError::io(dir, e))?;
    let mut written = Vec::new();
    for (name, spec) in view.charts() {
        let path = dir.join(format!("{}.json", name));
        write_json(&path, spec)?;
        log::debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Markdown rendering of the first `max_rows` rows, or `(no rows)`.
pub fn table_markdown<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", table_markdown(rows, max_rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StateRankRow;

    #[test]
    fn markdown_preview() {
        let rows = vec![
            StateRankRow { state: "California".into(), cases: 1234.0 },
            StateRankRow { state: "Texas".into(), cases: 99.0 },
        ];
        let md = table_markdown(&rows, 1);
        assert!(md.contains("| State"));
        assert!(md.contains("1,234"));
        assert!(!md.contains("Texas"));
        assert_eq!(table_markdown::<StateRankRow>(&[], 5), "(no rows)");
    }
}
