//! Purpose: Render rows as one line per stored cell version (`--format cells`).
//! Exports: `render_row`, `render_scan`.
//! Role: Small, pure formatter used by the `get` and `scan` emission paths.
//! Invariants: Lines are ordered by row, family, qualifier, then newest version first.
//! Invariants: Output always ends with a `N row(s)` summary line.
use dsbase::api::{RowData, ScanData};

const ROW_HEADER: &str = "ROW";
const CELL_HEADER: &str = "COLUMN+CELL";

pub(crate) fn render_row(row: &str, data: &RowData) -> String {
    render([(row, data)].into_iter(), 1)
}

pub(crate) fn render_scan(rows: &ScanData) -> String {
    render(rows.iter().map(|(row, data)| (row.as_str(), data)), rows.len())
}

fn render<'a, I>(rows: I, row_count: usize) -> String
where
    I: Iterator<Item = (&'a str, &'a RowData)> + Clone,
{
    let width = rows
        .clone()
        .map(|(row, _)| row.chars().count())
        .max()
        .unwrap_or(0)
        .max(ROW_HEADER.len());

    let mut out = String::new();
    out.push_str(&format!(" {ROW_HEADER:<width$}  {CELL_HEADER}\n"));
    for (row, data) in rows {
        for cell in data.cells() {
            out.push_str(&format!(
                " {row:<width$}  column={}:{}, version={}, value={}\n",
                cell.family, cell.qualifier, cell.version, cell.value
            ));
        }
    }
    out.push_str(&format!("{row_count} row(s)\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::{render_row, render_scan};
    use dsbase::api::{CreateOptions, Catalog, MemStore};

    fn sample() -> Catalog<MemStore> {
        let mut catalog = Catalog::open(MemStore::new()).expect("open");
        catalog
            .create_table("people", ["info"], CreateOptions::new(2))
            .expect("create");
        catalog.put("people", "r1", "info", "name", "Alice").expect("put");
        catalog.put("people", "r1", "info", "name", "Alicia").expect("put");
        catalog.put("people", "row-22", "info", "name", "Bob").expect("put");
        catalog
    }

    #[test]
    fn row_lists_newest_version_first() {
        let mut catalog = sample();
        let data = catalog.get("people", "r1").expect("get");
        let text = render_row("r1", &data);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                " ROW  COLUMN+CELL",
                " r1   column=info:name, version=2, value=Alicia",
                " r1   column=info:name, version=1, value=Alice",
                "1 row(s)",
            ]
        );
    }

    #[test]
    fn scan_pads_to_longest_row_key() {
        let mut catalog = sample();
        let rows = catalog.scan("people", None).expect("scan");
        let text = render_scan(&rows);
        assert!(text.contains(" row-22  column=info:name, version=1, value=Bob\n"));
        assert!(text.ends_with("2 row(s)\n"));
    }
}
