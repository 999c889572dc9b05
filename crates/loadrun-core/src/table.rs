//! Side-by-side table blocks.
//!
//! A [`TableBlock`] is a grid of cells with its own alignment settings.
//! Each block is aligned on its own, then the i-th lines of all blocks are
//! concatenated into the i-th output line. This lets a dot-padded label
//! block sit next to a space-padded value block on the same visual row
//! without either knowing the other's column widths.
//!
//! Cell semantics follow elastic tabstops: the last cell of a row ends the
//! line and is never padded; every other cell is padded to its column's
//! width. Widths count visible characters, ignoring ANSI escape sequences.

/// Which side of a cell receives the padding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    /// Text first, padding after
    #[default]
    Left,
    /// Padding first, text after
    Right,
}

/// A grid of cells sharing one set of formatting parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub cells: Vec<Vec<String>>,
    /// Minimal column width, padding included
    pub min_width: usize,
    /// Pad characters added after the widest cell of each column
    pub padding: usize,
    pub pad_char: char,
    pub alignment: Alignment,
}

impl TableBlock {
    /// Left-aligned, space-padded block with one pad character between columns
    pub fn new(cells: Vec<Vec<String>>) -> Self {
        Self {
            cells,
            min_width: 0,
            padding: 1,
            pad_char: ' ',
            alignment: Alignment::Left,
        }
    }

    pub fn padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn pad_char(mut self, pad_char: char) -> Self {
        self.pad_char = pad_char;
        self
    }

    pub fn min_width(mut self, min_width: usize) -> Self {
        self.min_width = min_width;
        self
    }

    pub fn align_right(mut self) -> Self {
        self.alignment = Alignment::Right;
        self
    }

    /// Render this block alone, one line per row
    pub fn render(&self) -> Vec<String> {
        let widths = self.column_widths();

        self.cells
            .iter()
            .map(|row| {
                let mut line = String::new();
                for (col, cell) in row.iter().enumerate() {
                    if col + 1 == row.len() {
                        line.push_str(cell);
                    } else {
                        self.push_padded(&mut line, cell, widths[col]);
                    }
                }
                line
            })
            .collect()
    }

    fn column_widths(&self) -> Vec<usize> {
        let columns = self
            .cells
            .iter()
            .map(|row| row.len().saturating_sub(1))
            .max()
            .unwrap_or(0);

        let mut widths = vec![0; columns];
        for row in &self.cells {
            let padded = row.len().saturating_sub(1);
            for (col, cell) in row.iter().take(padded).enumerate() {
                widths[col] = widths[col].max(visible_width(cell));
            }
        }

        widths
            .into_iter()
            .map(|w| (w + self.padding).max(self.min_width))
            .collect()
    }

    fn push_padded(&self, line: &mut String, cell: &str, width: usize) {
        let fill = width.saturating_sub(visible_width(cell));
        match self.alignment {
            Alignment::Left => {
                line.push_str(cell);
                line.extend(std::iter::repeat(self.pad_char).take(fill));
            }
            Alignment::Right => {
                line.extend(std::iter::repeat(self.pad_char).take(fill));
                line.push_str(cell);
            }
        }
    }
}

/// Render every block independently and join them line by line.
///
/// The output has one line per row of the first block. Blocks are expected
/// to have equal row counts; a shorter block contributes nothing to the
/// lines it lacks.
pub fn format_table_blocks(blocks: &[TableBlock]) -> Vec<String> {
    let rows = blocks.first().map_or(0, |block| block.cells.len());
    let rendered: Vec<Vec<String>> = blocks.iter().map(TableBlock::render).collect();

    (0..rows)
        .map(|row| {
            rendered
                .iter()
                .filter_map(|lines| lines.get(row))
                .map(String::as_str)
                .collect()
        })
        .collect()
}

/// Number of characters a terminal displays for `text`
///
/// ANSI CSI sequences (`ESC [ ... final`) take no room.
pub fn visible_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' && chars.peek() == Some(&'[') {
            chars.next();
            for c in chars.by_ref() {
                if ('\u{40}'..='\u{7e}').contains(&c) {
                    break;
                }
            }
            continue;
        }
        width += 1;
    }

    width
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_blocks_are_aligned_independently_then_joined() {
        let labels = TableBlock::new(grid(&[&["a", ":"], &["ccc", ":"], &["bb", ":"]])).pad_char('.');
        let values = TableBlock::new(grid(&[&["x", "1"], &["yyyyy", "2"], &["z", "3"]]));

        let lines = format_table_blocks(&[labels.clone(), values.clone()]);

        assert_eq!(lines, vec!["a...:x     1", "ccc.:yyyyy 2", "bb..:z     3"]);
        let left = labels.render();
        let right = values.render();
        for i in 0..3 {
            assert_eq!(lines[i], format!("{}{}", left[i], right[i]));
        }
    }

    #[test]
    fn test_last_cell_is_not_padded() {
        let block = TableBlock::new(grid(&[&["id", "short"], &["identifier", "a much longer cell"]]))
            .padding(2);

        assert_eq!(
            block.render(),
            vec!["id          short", "identifier  a much longer cell"]
        );
    }

    #[test]
    fn test_right_alignment() {
        let block = TableBlock::new(grid(&[&["execution", ":"], &["duration", ":"], &["vuh cost", ":"]]))
            .padding(2)
            .align_right();

        assert_eq!(
            block.render(),
            vec!["  execution:", "   duration:", "   vuh cost:"]
        );
    }

    #[test]
    fn test_ragged_rows_share_column_widths() {
        let block = TableBlock::new(grid(&[&["a", "b", "c"], &["dddd", "e"], &["f"]]));

        assert_eq!(block.render(), vec!["a    b c", "dddd e", "f"]);
    }

    #[test]
    fn test_min_width_includes_padding() {
        let block = TableBlock::new(grid(&[&["ab", "|"]])).padding(1).min_width(6);
        assert_eq!(block.render(), vec!["ab    |"]);
    }

    #[test]
    fn test_escape_sequences_do_not_count_towards_width() {
        let colored = "\u{1b}[36mab\u{1b}[0m";
        let block = TableBlock::new(vec![
            vec![colored.to_string(), "|".to_string()],
            vec!["abcd".to_string(), "|".to_string()],
        ]);

        let lines = block.render();
        assert_eq!(lines[0], format!("{colored}   |"));
        assert_eq!(lines[1], "abcd |");
    }

    #[test]
    fn test_visible_width_counts_characters() {
        assert_eq!(visible_width("✓ 12"), 4);
        assert_eq!(visible_width("\u{1b}[2;36mmuted\u{1b}[0m"), 5);
        assert_eq!(visible_width(""), 0);
    }

    #[test]
    fn test_shorter_block_contributes_nothing() {
        let first = TableBlock::new(grid(&[&["a"], &["b"]]));
        let second = TableBlock::new(grid(&[&["1"]]));

        assert_eq!(format_table_blocks(&[first, second]), vec!["a1", "b"]);
    }

    #[test]
    fn test_no_blocks() {
        assert!(format_table_blocks(&[]).is_empty());
    }
}
