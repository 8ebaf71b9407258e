//! Reconstruct tables from page text.
//!
//! pdftotext -layout preserves column alignment using spaces, while OCR and
//! exported text tend to use pipes or tabs. A line is a row candidate when
//! one delimiter occurs at least twice in it; candidates only become rows
//! when a neighbouring line uses the same delimiter, so prose with the odd
//! wide gap never turns into a table.

use crate::model::{Page, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Pipe,
    Tab,
    /// A run of three or more spaces.
    SpaceRun,
}

const MIN_SPACE_RUN: usize = 3;

/// Detect the column delimiter of a line, if it looks like a table row.
pub fn row_delimiter(line: &str) -> Option<Delimiter> {
    let trimmed = line.trim_matches(|c: char| c == ' ' || c == '\r' || c == '\n');
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.matches('|').count() >= 2 {
        return Some(Delimiter::Pipe);
    }
    if trimmed.matches('\t').count() >= 2 {
        return Some(Delimiter::Tab);
    }
    if count_space_runs(trimmed) >= 2 {
        return Some(Delimiter::SpaceRun);
    }
    None
}

fn count_space_runs(s: &str) -> usize {
    let mut runs = 0;
    let mut current = 0;
    for c in s.chars() {
        if c == ' ' {
            current += 1;
        } else {
            if current >= MIN_SPACE_RUN {
                runs += 1;
            }
            current = 0;
        }
    }
    runs
}

/// Split a row on its delimiter, trimming cells. Outer empty cells produced
/// by leading or trailing pipes are dropped; inner empty cells are kept.
pub fn split_row(line: &str, delimiter: Delimiter) -> Vec<String> {
    let trimmed = line.trim();
    let mut cells: Vec<String> = match delimiter {
        Delimiter::Pipe => trimmed.split('|').map(|c| c.trim().to_string()).collect(),
        Delimiter::Tab => trimmed.split('\t').map(|c| c.trim().to_string()).collect(),
        Delimiter::SpaceRun => split_on_space_runs(trimmed),
    };

    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

fn split_on_space_runs(s: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut spaces = 0;

    for c in s.chars() {
        if c == ' ' {
            spaces += 1;
            continue;
        }
        if spaces >= MIN_SPACE_RUN {
            cells.push(cell.trim().to_string());
            cell.clear();
        } else {
            cell.push_str(&" ".repeat(spaces));
        }
        spaces = 0;
        cell.push(c);
    }
    cells.push(cell.trim().to_string());
    cells
}

/// Find all tables in the given pages, in page and line order.
pub fn detect_tables(pages: &[Page]) -> Vec<Table> {
    let mut tables = Vec::new();

    for page in pages {
        let lines: Vec<&str> = page.text.lines().collect();
        let kinds: Vec<Option<Delimiter>> = lines.iter().map(|l| row_delimiter(l)).collect();

        let mut current: Vec<Vec<String>> = Vec::new();
        let mut current_kind: Option<Delimiter> = None;

        for (i, line) in lines.iter().enumerate() {
            let kind = kinds[i];
            let consistent = kind.is_some()
                && ((i > 0 && kinds[i - 1] == kind) || kinds.get(i + 1).copied().flatten() == kind);

            if consistent && kind == current_kind {
                current.push(split_row(line, kind.unwrap_or(Delimiter::SpaceRun)));
                continue;
            }

            flush(&mut tables, &mut current, page.page_number);
            current_kind = None;

            if let (true, Some(delimiter)) = (consistent, kind) {
                current.push(split_row(line, delimiter));
                current_kind = Some(delimiter);
            }
        }

        flush(&mut tables, &mut current, page.page_number);
    }

    tables
}

fn flush(tables: &mut Vec<Table>, rows: &mut Vec<Vec<String>>, page_number: usize) {
    if rows.len() >= 2 {
        tables.push(Table {
            page_number,
            rows: std::mem::take(rows),
        });
    } else {
        rows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: usize, lines: &[&str]) -> Page {
        Page {
            page_number: number,
            text: lines.join("\n"),
        }
    }

    #[test]
    fn test_row_delimiter() {
        assert_eq!(row_delimiter("| a | b |"), Some(Delimiter::Pipe));
        assert_eq!(row_delimiter("a\tb\tc"), Some(Delimiter::Tab));
        assert_eq!(
            row_delimiter("  Konsulttimmar     10     950,00"),
            Some(Delimiter::SpaceRun)
        );
        assert_eq!(row_delimiter("Some prose  with a double space"), None);
        assert_eq!(row_delimiter("Total:     1 200,50 SEK"), None);
        assert_eq!(row_delimiter(""), None);
    }

    #[test]
    fn test_split_row() {
        assert_eq!(
            split_row("| Item | Qty | Price |", Delimiter::Pipe),
            vec!["Item", "Qty", "Price"]
        );
        assert_eq!(split_row("a||c", Delimiter::Pipe), vec!["a", "", "c"]);
        assert_eq!(
            split_row("  Consulting services    10    950,00", Delimiter::SpaceRun),
            vec!["Consulting services", "10", "950,00"]
        );
    }

    #[test]
    fn test_detect_tables() {
        let pages = vec![page(
            2,
            &[
                "Invoice 2024-001",
                "  Description        Qty      Amount",
                "  Consulting         10       9 500,00",
                "  Travel             1        1 200,50",
                "",
                "Thank you for your business",
            ],
        )];

        let tables = detect_tables(&pages);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].page_number, 2);
        assert_eq!(tables[0].rows.len(), 3);
        assert_eq!(tables[0].rows[2], vec!["Travel", "1", "1 200,50"]);
    }

    #[test]
    fn test_isolated_row_is_not_a_table() {
        let pages = vec![page(
            1,
            &["Intro text", "  Name      Value      Unit", "More prose here"],
        )];
        assert!(detect_tables(&pages).is_empty());
    }

    #[test]
    fn test_delimiter_change_splits_tables() {
        let pages = vec![page(
            1,
            &["| a | b |", "| c | d |", "x\ty\tz", "1\t2\t3"],
        )];
        let tables = detect_tables(&pages);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].rows[0], vec!["x", "y", "z"]);
    }
}
