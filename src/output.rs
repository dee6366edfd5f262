use crate::error::CliError;

pub struct Styler {
    color_enabled: bool,
}

impl Styler {
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    fn wrap(&self, code: &str, s: &str) -> String {
        if !self.color_enabled {
            return s.to_string();
        }
        format!("{}{}\u{001b}[0m", code, s)
    }

    pub fn green(&self, s: &str) -> String {
        self.wrap("\u{001b}[32m", s)
    }

    pub fn yellow(&self, s: &str) -> String {
        self.wrap("\u{001b}[33m", s)
    }

    pub fn gray(&self, s: &str) -> String {
        self.wrap("\u{001b}[90m", s)
    }

    /// `[x]` done, `[-]` skipped, `[ ]` open.
    pub fn check_mark(&self, completed: bool, skipped: bool) -> String {
        if completed {
            self.green("[x]")
        } else if skipped {
            self.yellow("[-]")
        } else {
            "[ ]".to_string()
        }
    }
}

/// Terminal columns taken by `s`. CJK, emoji and block elements count as two;
/// ANSI colour sequences count as zero.
pub fn display_width(s: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c == 'm' {
                in_escape = false;
            }
            continue;
        }
        if c == '\u{001b}' {
            in_escape = true;
            continue;
        }
        width += if is_wide_char(c) { 2 } else { 1 };
    }
    width
}

fn is_wide_char(c: char) -> bool {
    let cp = c as u32;
    (0x1100..=0x115F).contains(&cp)         // Hangul Jamo
        || (0x2580..=0x259F).contains(&cp)  // block elements
        || (0x2600..=0x27BF).contains(&cp)  // misc symbols, dingbats
        || (0x3400..=0x4DBF).contains(&cp)  // CJK ext A
        || (0x4E00..=0x9FFF).contains(&cp)  // CJK unified
        || (0xAC00..=0xD7AF).contains(&cp)  // Hangul syllables
        || (0xF900..=0xFAFF).contains(&cp)  // CJK compatibility
        || (0xFF00..=0xFF60).contains(&cp)  // fullwidth forms
        || (0x1F300..=0x1FAFF).contains(&cp) // emoji
        || (0x20000..=0x2A6DF).contains(&cp)
}

fn pad_right(s: &str, width: usize) -> String {
    let dw = display_width(s);
    if dw >= width {
        return s.to_string();
    }
    format!("{}{}", s, " ".repeat(width - dw))
}

/// Plain aligned table: header line, then one line per row, columns
/// separated by two spaces. Trailing padding is trimmed.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| display_width(h)).collect();
        for row in self.rows.iter() {
            for (i, cell) in row.iter().enumerate() {
                let w = display_width(cell);
                match widths.get_mut(i) {
                    Some(cur) => *cur = (*cur).max(w),
                    None => widths.push(w),
                }
            }
        }
        widths
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let line = |cells: &[String]| {
            cells
                .iter()
                .enumerate()
                .map(|(i, c)| pad_right(c, widths[i]))
                .collect::<Vec<String>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        std::iter::once(line(self.headers.as_slice()))
            .chain(self.rows.iter().map(|r| line(r.as_slice())))
            .collect::<Vec<String>>()
            .join("\n")
    }
}

pub fn render_progress_bar(percent: u32, width: usize) -> String {
    let filled = ((f64::from(percent.min(100)) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let s = serde_json::to_string_pretty(value).map_err(|e| {
        tracing::error!(error = %e, "encode output");
        CliError::io("Output encoding error")
    })?;
    println!("{}", s);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_of_ascii_wide_and_coloured_text() {
        assert_eq!(display_width("hello"), 5);
        assert_eq!(display_width(""), 0);
        assert_eq!(display_width("한글"), 4);
        assert_eq!(display_width("Read📚"), 6);
        assert_eq!(display_width("██░"), 6);
        assert_eq!(display_width(&Styler::new(true).green("[x]")), 3);
    }

    #[test]
    fn table_aligns_wide_cells() {
        let mut t = Table::new(&["name", "streak"]);
        t.push(vec!["💪 Gym".to_string(), "3".to_string()]);
        t.push(vec!["Read".to_string(), "12".to_string()]);
        let rendered = t.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "name    streak");
        assert_eq!(lines[1], "💪 Gym  3");
        assert_eq!(lines[2], "Read    12");
    }

    #[test]
    fn empty_table_is_just_the_header() {
        let t = Table::new(&["a", "b"]);
        assert!(t.is_empty());
        assert_eq!(t.render(), "a  b");
    }

    #[test]
    fn check_marks_without_colour() {
        let s = Styler::new(false);
        assert_eq!(s.check_mark(true, false), "[x]");
        assert_eq!(s.check_mark(false, true), "[-]");
        assert_eq!(s.check_mark(false, false), "[ ]");
        assert_eq!(s.gray("x"), "x");
    }

    #[test]
    fn progress_bar_fill() {
        assert_eq!(render_progress_bar(0, 4), "░░░░");
        assert_eq!(render_progress_bar(50, 4), "██░░");
        assert_eq!(render_progress_bar(100, 4), "████");
        assert_eq!(render_progress_bar(250, 4), "████");
    }
}
