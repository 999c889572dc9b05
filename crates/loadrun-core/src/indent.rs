// Line-indenting writer
//
// Inserts a fixed pad before every non-blank line that follows a line
// break. The first line is left alone, which lets a caller print a label
// and continue the value on the same line. Wrapping an IndentedWriter in
// another one adds the pads up, giving arbitrarily deep nesting.

use std::io::{self, Write};

/// Writer decorator that indents every line after the first
#[derive(Debug)]
pub struct IndentedWriter<W: Write> {
    inner: W,
    pad: Vec<u8>,
    at_line_start: bool,
}

impl<W: Write> IndentedWriter<W> {
    pub fn new(inner: W, pad: impl Into<String>) -> Self {
        Self {
            inner,
            pad: pad.into().into_bytes(),
            at_line_start: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for IndentedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;

        while !rest.is_empty() {
            let end = rest
                .iter()
                .position(|&b| b == b'\n')
                .map_or(rest.len(), |idx| idx + 1);
            let (chunk, tail) = rest.split_at(end);

            // Blank lines stay unpadded; the pad waits for real content
            if self.at_line_start && !chunk.iter().all(u8::is_ascii_whitespace) {
                self.inner.write_all(&self.pad)?;
                self.at_line_start = false;
            }
            self.inner.write_all(chunk)?;
            if chunk.ends_with(b"\n") {
                self.at_line_start = true;
            }

            rest = tail;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut IndentedWriter<&mut Vec<u8>>)) -> String {
        let mut out = Vec::new();
        let mut writer = IndentedWriter::new(&mut out, "  ");
        f(&mut writer);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_single_write_with_several_breaks() {
        let out = written(|w| w.write_all(b"a\nb\nc").unwrap());
        assert_eq!(out, "a\n  b\n  c");
    }

    #[test]
    fn test_state_carries_across_writes() {
        let out = written(|w| {
            w.write_all(b"a\n").unwrap();
            w.write_all(b"b\n").unwrap();
            w.write_all(b"c").unwrap();
        });
        assert_eq!(out, "a\n  b\n  c");
    }

    #[test]
    fn test_first_line_is_not_padded() {
        let out = written(|w| write!(w, "label: {}", 42).unwrap());
        assert_eq!(out, "label: 42");
    }

    #[test]
    fn test_blank_lines_are_not_padded() {
        let out = written(|w| w.write_all(b"a\n\n   \nb\n").unwrap());
        assert_eq!(out, "a\n\n   \n  b\n");
    }

    #[test]
    fn test_trailing_break_pads_next_write_only() {
        let out = written(|w| {
            writeln!(w, "first").unwrap();
            write!(w, "sec").unwrap();
            write!(w, "ond").unwrap();
        });
        assert_eq!(out, "first\n  second");
    }

    #[test]
    fn test_nesting_is_additive() {
        let mut out = Vec::new();
        {
            let mut outer = IndentedWriter::new(&mut out, "--");
            write!(outer, "root").unwrap();
            {
                let mut inner = IndentedWriter::new(&mut outer, "++");
                writeln!(inner).unwrap();
                write!(inner, "child").unwrap();
                writeln!(inner).unwrap();
                write!(inner, "grandchild").unwrap();
            }
            writeln!(outer).unwrap();
            write!(outer, "sibling").unwrap();
        }

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "root\n--++child\n--++grandchild\n--sibling"
        );
    }

    #[test]
    fn test_three_levels_of_whitespace_pads() {
        let mut out = Vec::new();
        {
            let mut section = IndentedWriter::new(&mut out, "    ");
            write!(section, "header").unwrap();
            writeln!(section).unwrap();
            write!(section, "default:").unwrap();
            let mut scenario = IndentedWriter::new(&mut section, "  ");
            writeln!(scenario).unwrap();
            write!(scenario, "GET /api").unwrap();
            let mut endpoint = IndentedWriter::new(&mut scenario, "  ");
            writeln!(endpoint).unwrap();
            writeln!(endpoint, "200: count=1").unwrap();
        }

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "header\n    default:\n      GET /api\n        200: count=1\n"
        );
    }
}
