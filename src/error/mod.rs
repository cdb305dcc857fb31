use std::{error::Error, io::BufWriter, ops::Range, path::Path};

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::scan::Occurrence;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Level {
    Error,
    Warning,
    Info,
    Note,
    Help,
}

impl Level {
    pub fn color(self) -> Color {
        match self {
            Level::Error => Color::Red,
            Level::Warning => Color::Yellow,
            Level::Info => Color::BrightBlue,
            Level::Note => Color::BrightGreen,
            Level::Help => Color::BrightCyan,
        }
    }

    pub fn report_kind(self) -> ReportKind<'static> {
        let s = match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Info => "info",
            Level::Note => "note",
            Level::Help => "help",
        };

        ReportKind::Custom(s, self.color())
    }
}

/// A source-anchored report.
#[derive(Debug)]
pub struct Diag {
    pub level: Level,
    pub title: String,
    pub annotations: Vec<Annotation>,
}

impl Diag {
    pub fn new(level: Level, title: impl Into<String>) -> Self {
        Diag {
            level,
            title: title.into(),
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);

        self
    }

    #[must_use]
    pub fn add_annotations(mut self, annotations: impl IntoIterator<Item = Annotation>) -> Self {
        self.annotations.extend(annotations);

        self
    }

    /// Renders with colour; callers print through `anstream`, which strips it
    /// off-terminal.
    pub fn render(&self, source: &str, path: &Path) -> Result<String, Box<dyn Error>> {
        let path = path.to_string_lossy();

        let range = self
            .annotations
            .first()
            .map(|it| it.range.clone())
            .unwrap_or_default();

        let report = Report::build(self.level.report_kind(), (&path, range))
            .with_message(&self.title)
            .with_labels(self.annotations.iter().map(|it| {
                let mut label = Label::new((&path, it.range.clone())).with_color(it.level.color());
                if let Some(s) = &it.label {
                    label = label.with_message(s);
                }
                label
            }));

        let mut buf = BufWriter::new(Vec::new());
        report
            .finish()
            .write((&path, Source::from(source)), &mut buf)?;

        let bytes = buf.into_inner()?;
        Ok(String::from_utf8(bytes)?)
    }
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub level: Level,
    pub range: Range<usize>,
    pub label: Option<String>,
}

impl Annotation {
    pub fn new(level: Level, range: Range<usize>) -> Self {
        Annotation {
            level,
            range,
            label: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

pub(crate) trait Snippetize {
    fn snippetize(&self) -> Annotation;
}

impl Snippetize for Occurrence {
    fn snippetize(&self) -> Annotation {
        Annotation::new(Level::Info, self.span.clone()).label(format!(
            "keyword `{}`, token code {}",
            self.keyword,
            self.keyword.code()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keyword;

    #[test]
    fn renders_keyword_labels() {
        let source = "fn main() {}\n";
        let occurrence = Occurrence {
            span: 0..2,
            keyword: Keyword::Fn,
        };
        let diag = Diag::new(Level::Info, "1 keyword").add_annotation(occurrence.snippetize());
        let rendered = diag.render(source, Path::new("main.v")).unwrap();
        let rendered = anstream::adapter::strip_str(&rendered).to_string();

        assert!(rendered.contains("info: 1 keyword"), "{rendered}");
        assert!(rendered.contains("main.v"), "{rendered}");
        assert!(rendered.contains("keyword `fn`, token code 79"), "{rendered}");
    }
}
