//! A lightweight per-file symbol index.
//!
//! This crate deliberately does not carry a full HLASM statement grammar
//! (see `hlasm-syntax`'s module docs), so the index below is built by
//! scanning source lines for the shapes the query features actually need:
//! a label in the name field (columns 1-8, non-blank, non-comment) defining
//! an ordinary symbol or macro prototype, operand references to ordinary
//! symbols, variable symbols, and macro/copy member names, and Endevor
//! preprocessor `-INC`/`++INCLUDE` directive sites. It is the IDE-facing
//! analogue of a real assembler's statement classifier, scoped down to what
//! navigation and completion require.

use hlasm_syntax::Position;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// What an occurrence's name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// An ordinary assembler symbol (a label).
    Ordinary,
    /// A CA variable symbol (`&NAME`), stored without its leading `&`.
    Variable,
    /// A macro or copy member name referenced as an operand.
    MacroOrCopyRef,
    /// An Endevor preprocessor `-INC`/`++INCLUDE` directive site. All such
    /// sites in a file share [`PREPROCESSOR_INCLUDE_MARKER`] as their name,
    /// so a references query on any one of them returns every site,
    /// matching `lsp_context_preprocessor_test.cpp`'s `refs` case.
    PreprocessorInclude,
}

/// Sentinel occurrence name grouping every `-INC`/`++INCLUDE` directive site
/// in a file, since the directive itself (unlike a `COPY` operand) isn't a
/// named reference to any one member. Contains a hyphen so it can never
/// collide with a real HLASM symbol, which [`is_name_char`] excludes it from.
pub(crate) const PREPROCESSOR_INCLUDE_MARKER: &str = "$PREPROCESSOR-INCLUDE$";

/// Whether an occurrence is the symbol's defining point or a use of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccurrenceRole {
    /// The label field that introduces the symbol.
    Definition,
    /// An operand reference.
    Reference,
}

/// A single occurrence of a name in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// The name, uppercased for ordinary symbols (HLASM is case-insensitive
    /// there) but preserved verbatim for variable symbols' display text.
    pub name: SmolStr,
    /// Where the name appears.
    pub position: Position,
    /// The name's length in characters, for building a range.
    pub len: u32,
    /// What kind of symbol this is.
    pub kind: SymbolKind,
    /// Whether this is the defining occurrence or a reference.
    pub role: OccurrenceRole,
}

/// The per-file index: every occurrence, plus a name -> definition lookup
/// for fast goto-definition.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    occurrences: Vec<Occurrence>,
    definitions: FxHashMap<SmolStr, usize>,
}

impl SymbolIndex {
    /// Scans `text` and builds an index.
    #[must_use]
    pub fn build(text: &str) -> Self {
        let mut index = Self::default();
        for (line_no, line) in text.lines().enumerate() {
            index.scan_line(line_no as u32, line);
        }
        index
    }

    fn scan_line(&mut self, line_no: u32, line: &str) {
        if line.starts_with('*') || line.trim_start().is_empty() {
            return;
        }
        let chars: Vec<char> = line.chars().collect();

        // Endevor preprocessor directives sit in column 1 with no label
        // field, unlike ordinary statements, so they're recognized before
        // the label-field scan below would otherwise misread them.
        if let Some(mnemonic_end) = preprocessor_directive_end(&chars) {
            self.push(Occurrence {
                name: SmolStr::from(PREPROCESSOR_INCLUDE_MARKER),
                position: Position::new(line_no, 0),
                len: mnemonic_end as u32,
                kind: SymbolKind::PreprocessorInclude,
                role: OccurrenceRole::Reference,
            });
            if let Some((name, start)) = first_operand_word(&chars, mnemonic_end) {
                self.push(Occurrence {
                    name: SmolStr::from(name.to_ascii_uppercase()),
                    position: Position::new(line_no, start as u32),
                    len: name.len() as u32,
                    kind: SymbolKind::MacroOrCopyRef,
                    role: OccurrenceRole::Reference,
                });
            }
            return;
        }

        // Label field: columns 0..8, a non-blank run starting at column 0.
        if !chars.is_empty() && !chars[0].is_whitespace() {
            let mut end = 0;
            while end < chars.len() && !chars[end].is_whitespace() {
                end += 1;
            }
            let name: String = chars[..end].iter().collect();
            self.push(Occurrence {
                name: SmolStr::from(name.to_ascii_uppercase()),
                position: Position::new(line_no, 0),
                len: end as u32,
                kind: SymbolKind::Ordinary,
                role: OccurrenceRole::Definition,
            });
        }

        // Operand references: variable symbols (`&NAME`) and bare names
        // that look like macro/copy operands (first word after the
        // mnemonic on a `COPY`/macro-call statement).
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == '&' {
                let start = i;
                let mut end = i + 1;
                while end < chars.len() && is_name_char(chars[end]) {
                    end += 1;
                }
                if end > start + 1 {
                    let name: String = chars[start + 1..end].iter().collect();
                    self.push(Occurrence {
                        name: SmolStr::from(name),
                        position: Position::new(line_no, start as u32),
                        len: (end - start) as u32,
                        kind: SymbolKind::Variable,
                        role: OccurrenceRole::Reference,
                    });
                }
                i = end;
            } else {
                i += 1;
            }
        }

        if let Some(mnemo_end) = find_mnemonic_end(&chars) {
            if is_copy_like_mnemonic(&chars[field_start(&chars)..mnemo_end]) {
                if let Some((name, start)) = first_operand_word(&chars, mnemo_end) {
                    self.push(Occurrence {
                        name: SmolStr::from(name.to_ascii_uppercase()),
                        position: Position::new(line_no, start as u32),
                        len: name.len() as u32,
                        kind: SymbolKind::MacroOrCopyRef,
                        role: OccurrenceRole::Reference,
                    });
                }
            }
        }
    }

    fn push(&mut self, occ: Occurrence) {
        if occ.role == OccurrenceRole::Definition {
            self.definitions.insert(occ.name.clone(), self.occurrences.len());
        }
        self.occurrences.push(occ);
    }

    /// All occurrences recorded in this file.
    #[must_use]
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    /// The defining occurrence for `name`, if this file defines it.
    #[must_use]
    pub fn definition(&self, name: &str) -> Option<&Occurrence> {
        self.definitions.get(name).map(|&i| &self.occurrences[i])
    }

    /// Every occurrence whose name matches `name` (case-insensitively for
    /// ordinary symbols and macro refs, exactly for variable symbols).
    pub fn references<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Occurrence> {
        self.occurrences.iter().filter(move |occ| match occ.kind {
            SymbolKind::Variable => occ.name == name,
            _ => occ.name.eq_ignore_ascii_case(name),
        })
    }

    /// All defined names, for completion.
    pub fn defined_names(&self) -> impl Iterator<Item = &SmolStr> {
        self.definitions.keys()
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '#' || c == '$' || c == '@'
}

fn field_start(chars: &[char]) -> usize {
    let mut i = 0;
    while i < chars.len() && !chars[i].is_whitespace() {
        i += 1;
    }
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    i
}

fn find_mnemonic_end(chars: &[char]) -> Option<usize> {
    let start = field_start(chars);
    if start >= chars.len() {
        return None;
    }
    let mut end = start;
    while end < chars.len() && !chars[end].is_whitespace() {
        end += 1;
    }
    Some(end)
}

/// `Some(end)` if `chars` starts (column 0, no label field) with the `-INC`
/// or `++INCLUDE` Endevor preprocessor mnemonic, where `end` is the mnemonic's
/// length.
fn preprocessor_directive_end(chars: &[char]) -> Option<usize> {
    if chars.is_empty() || chars[0].is_whitespace() {
        return None;
    }
    let mut end = 0;
    while end < chars.len() && !chars[end].is_whitespace() {
        end += 1;
    }
    let mnemonic: String = chars[..end].iter().collect::<String>().to_ascii_uppercase();
    (mnemonic == "-INC" || mnemonic == "++INCLUDE").then_some(end)
}

fn is_copy_like_mnemonic(mnemonic: &[char]) -> bool {
    let text: String = mnemonic.iter().collect::<String>().to_ascii_uppercase();
    text == "COPY"
}

fn first_operand_word(chars: &[char], after: usize) -> Option<(String, usize)> {
    let mut i = after;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    if i >= chars.len() {
        return None;
    }
    let start = i;
    while i < chars.len() && !chars[i].is_whitespace() && chars[i] != ',' {
        i += 1;
    }
    if i == start {
        return None;
    }
    Some((chars[start..i].iter().collect(), start))
}
