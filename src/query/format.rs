use console::Style;
use serde_json::Value;

use crate::error::Result;
use crate::history::VisitKind;
use crate::ranking::Candidate;

use super::QueryOutput;

/// Terminal styling for plain-text output. Never changes the text itself.
#[derive(Debug, Clone)]
pub struct Styler {
    path: Style,
    count: Style,
    label: Style,
    key: Style,
    literal: Style,
}

impl Styler {
    pub fn new(enabled: bool) -> Self {
        Self {
            path: Style::new().cyan().force_styling(enabled),
            count: Style::new().yellow().force_styling(enabled),
            label: Style::new().dim().force_styling(enabled),
            key: Style::new().blue().force_styling(enabled),
            literal: Style::new().magenta().force_styling(enabled),
        }
    }

    pub fn path(&self, path: &str) -> String {
        self.path.apply_to(path).to_string()
    }

    pub fn count(&self, count: u64) -> String {
        self.count.apply_to(count).to_string()
    }

    pub fn label(&self, label: &str) -> String {
        self.label.apply_to(label).to_string()
    }
}

/// Pretty JSON with two-space indents. Unstyled, it is byte-identical to
/// `serde_json::to_string_pretty`.
pub fn pretty_json(value: &Value, styler: &Styler) -> String {
    let mut out = String::new();
    write_json(&mut out, value, styler, 0);
    out
}

fn write_json(out: &mut String, value: &Value, styler: &Styler, depth: usize) {
    match value {
        Value::Array(items) if !items.is_empty() => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                indent(out, depth + 1);
                write_json(out, item, styler, depth + 1);
            }
            indent(out, depth);
            out.push(']');
        }
        Value::Object(map) if !map.is_empty() => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                indent(out, depth + 1);
                out.push_str(&styler.key.apply_to(quoted(key)).to_string());
                out.push_str(": ");
                write_json(out, item, styler, depth + 1);
            }
            indent(out, depth);
            out.push('}');
        }
        Value::String(s) => out.push_str(&styler.path.apply_to(quoted(s)).to_string()),
        Value::Number(n) => out.push_str(&styler.count.apply_to(n).to_string()),
        Value::Bool(_) | Value::Null => {
            out.push_str(&styler.literal.apply_to(value).to_string());
        }
        Value::Array(_) | Value::Object(_) => out.push_str(&value.to_string()),
    }
}

fn indent(out: &mut String, depth: usize) {
    out.push('\n');
    out.push_str(&"  ".repeat(depth));
}

/// JSON string literal, escaped.
fn quoted(s: &str) -> String {
    Value::from(s).to_string()
}

fn tagged(styler: &Styler, kind: VisitKind, candidates: &[Candidate]) -> Vec<String> {
    candidates
        .iter()
        .map(|c| format!("{}\t{}", styler.label(kind.label()), styler.path(&c.path)))
        .collect()
}

pub(super) fn lines(output: &QueryOutput, styler: &Styler) -> Result<Vec<String>> {
    let lines: Vec<String> = match output {
        QueryOutput::Recent(candidates) => {
            candidates.iter().map(|c| styler.path(&c.path)).collect()
        }
        QueryOutput::Popular(candidates) => candidates
            .iter()
            .map(|c| format!("{}\t{}", styler.path(&c.path), styler.count(c.visits)))
            .collect(),
        QueryOutput::Stats(stats) => stats
            .categories
            .iter()
            .map(|c| {
                format!(
                    "{}\t{}",
                    styler.label(c.file_type.as_str()),
                    styler.count(c.count)
                )
            })
            .chain(std::iter::once(format!(
                "{}\t{}",
                styler.label("total"),
                styler.count(stats.total)
            )))
            .collect(),
        QueryOutput::Search(results) => {
            let mut lines = tagged(styler, VisitKind::Directory, &results.directories);
            lines.extend(tagged(styler, VisitKind::File, &results.files));
            lines
        }
        QueryOutput::Rows(rows) => rows
            .iter()
            .map(|r| serde_json::to_string(r).map_err(std::io::Error::from))
            .collect::<std::result::Result<_, _>>()?,
    };
    Ok(lines)
}
