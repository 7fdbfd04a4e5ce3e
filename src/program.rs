use fxhash::FxBuildHasher;
use indexmap::IndexMap;

use crate::error::{ExecError, Fault, LoadWarning};
use crate::instr::Instr;
use crate::span::Span;

// Label -> instruction index
type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Lines beginning with this define a label.
pub const LABEL_MARKER: char = '.';

/// Single instruction line, as written, decoded once on load.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Line {
    text: String,
    /// Location in source, dummy when built from parts
    span: Span,
    /// Decode errors are kept until the line is executed
    instr: Result<Instr, ExecError>,
}

impl Line {
    fn new(text: String, span: Span) -> Self {
        let instr = Instr::decode(&text);
        Line { text, span, instr }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn instr(&self) -> Result<&Instr, ExecError> {
        self.instr.as_ref().map_err(Clone::clone)
    }
}

/// Instruction list and label table, fixed once loaded.
#[derive(Clone, Debug, Default)]
pub struct Program {
    lines: Vec<Line>,
    labels: FxMap<String, usize>,
    warnings: Vec<LoadWarning>,
}

impl Program {
    /// Split source text into instructions and label definitions.
    ///
    /// A label refers to the next instruction after it, or to the end of the program. A label
    /// defined again moves to the later position and leaves a warning.
    pub fn parse(src: &str) -> Self {
        let mut program = Program::default();
        let mut label_spans: FxMap<&str, Span> = FxMap::default();
        let mut offs = 0;

        for (i, raw) in src.split_inclusive('\n').enumerate() {
            let line_offs = offs;
            offs += raw.len();

            let text = raw.trim();
            if text.is_empty() {
                continue;
            }
            let leading = raw.len() - raw.trim_start().len();
            let span = Span::new(line_offs + leading, text.len());

            if text.starts_with(LABEL_MARKER) {
                if let Some(&first) = label_spans.get(text) {
                    program.warnings.push(LoadWarning::DuplicateLabel {
                        label: text.to_owned(),
                        line: i + 1,
                        span,
                        first,
                    });
                } else {
                    label_spans.insert(text, span);
                }
                program.labels.insert(text.to_owned(), program.lines.len());
            } else {
                program.lines.push(Line::new(text.to_owned(), span));
            }
        }
        program
    }

    /// Build from an already split instruction list and label table.
    pub fn from_parts<I, L>(lines: I, labels: L) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        L: IntoIterator<Item = (String, usize)>,
    {
        Program {
            lines: lines
                .into_iter()
                .map(|text| Line::new(text.into(), Span::default()))
                .collect(),
            labels: labels.into_iter().collect(),
            warnings: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Line> {
        self.lines.get(idx)
    }

    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Labels in order of first definition.
    pub fn labels(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().map(|(name, &idx)| (name.as_str(), idx))
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Find every fault that can be detected without running: unknown opcodes, operand counts,
    /// malformed operands, immediate destinations and missing labels.
    pub fn check(&self) -> Vec<Fault> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| {
                self.check_line(line).err().map(|error| {
                    Fault::new(idx as i64, line.text(), Some(line.span()), error)
                })
            })
            .collect()
    }

    fn check_line(&self, line: &Line) -> Result<(), ExecError> {
        let instr = line.instr()?;
        if let Some(label) = instr.label() {
            if self.label(label).is_none() {
                return Err(ExecError::UndefinedLabel {
                    label: label.to_owned(),
                });
            }
        }
        if let Some(dst) = instr.dst() {
            if dst.is_immediate() {
                return Err(ExecError::NotWritable {
                    token: dst.token.clone(),
                });
            }
        }
        Ok(())
    }
}
