use std::fmt;

const GUIDE: &str = "│   ";

/// Writer that prefixes every non-empty line with a guide rail. Blank lines
/// stay blank.
pub(crate) struct Guided<'a, F: ?Sized> {
    f: &'a mut F,
    needs_indent: bool,
}

impl<F: fmt::Write + ?Sized> fmt::Write for Guided<'_, F> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for (idx, line) in s.split('\n').enumerate() {
            if idx > 0 {
                self.f.write_char('\n')?;
                self.needs_indent = true;
            }

            if self.needs_indent {
                if line.is_empty() {
                    continue;
                }

                self.f.write_str(GUIDE)?;
                self.needs_indent = false;
            }

            self.f.write_str(line)?;
        }

        Ok(())
    }
}

/// Nested writers stack their guides, one column per tree level.
pub(crate) fn guided<D: ?Sized>(f: &mut D) -> Guided<'_, D> {
    Guided {
        f,
        needs_indent: true,
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write;

    use super::*;

    #[test]
    fn skips_blank_lines() {
        let mut out = String::new();
        writeln!(out, "root").unwrap();
        writeln!(guided(&mut out), "a\n\nb").unwrap();
        assert_eq!(out, "root\n│   a\n\n│   b\n");
    }

    #[test]
    fn guides_stack() {
        let mut out = String::new();
        {
            let mut one = guided(&mut out);
            writeln!(one, "a").unwrap();
            write!(guided(&mut one), "b\nc").unwrap();
        }
        assert_eq!(out, "│   a\n│   │   b\n│   │   c");
    }
}
