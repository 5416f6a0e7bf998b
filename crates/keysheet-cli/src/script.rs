//! Keyword script lines
//!
//! One keyword call per line. Cells are separated by `|` pipes, tabs, or two
//! or more spaces. Blank lines and `#` comments are skipped.

use lazy_regex::regex;

/// A keyword call read from a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based line number in the script
    pub number: usize,
    pub keyword: String,
    pub args: Vec<String>,
}

/// Split one line into cells, or `None` for blank and comment lines
pub fn split_cells(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let cells: Vec<String> = if trimmed.contains('|') {
        // Pipe tables may start and end with a separator
        let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
        let inner = inner.strip_suffix('|').unwrap_or(inner);
        inner.split('|').map(|c| c.trim().to_string()).collect()
    } else {
        regex!(r"\t+| {2,}")
            .split(trimmed)
            .map(|c| c.trim().to_string())
            .collect()
    };

    match cells.first() {
        Some(keyword) if !keyword.is_empty() => Some(cells),
        _ => None,
    }
}

/// Keyword calls of a whole script, in order
pub fn parse_script(text: &str) -> Vec<ScriptLine> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let mut cells = split_cells(line)?;
            let keyword = cells.remove(0);
            Some(ScriptLine {
                number: i + 1,
                keyword,
                args: cells,
            })
        })
        .collect()
}
