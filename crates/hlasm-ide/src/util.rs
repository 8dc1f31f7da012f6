//! Line/column helpers shared by the query features.
//!
//! Grounded in `trust-ide::util`'s `ident_at_offset`/token-lookback pattern:
//! since this crate does not carry a full HLASM statement parser, "what
//! identifier is under the cursor" is answered by scanning the source line
//! directly rather than walking a syntax tree.

use hlasm_syntax::Position;

/// `true` if `c` can appear in an ordinary symbol, macro name, or variable
/// symbol name (after the `&` sigil, which is handled separately).
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '#' || c == '$' || c == '@'
}

/// Finds the name token touching `position` on its source line, along with
/// its start column. Recognizes an optional leading `&` as part of the name
/// so variable symbol references resolve as a whole.
#[must_use]
pub fn name_at_position(text: &str, position: Position) -> Option<(String, u32)> {
    let line = text.lines().nth(position.line as usize)?;
    let chars: Vec<char> = line.chars().collect();
    let col = position.column as usize;

    let mut start = col.min(chars.len());
    // Prefer the token starting at or before the cursor; back up over name
    // characters, then accept a touching token immediately after the cursor.
    while start > 0 && is_name_char(chars[start - 1]) {
        start -= 1;
    }
    let mut end = start;
    while end < chars.len() && is_name_char(chars[end]) {
        end += 1;
    }
    if start == end {
        // Cursor sits just before a token (e.g. on the `&` itself); try the
        // next character.
        if col < chars.len() && is_name_char(chars[col]) {
            start = col;
            end = col;
            while end < chars.len() && is_name_char(chars[end]) {
                end += 1;
            }
        } else {
            return None;
        }
    }
    if start > 0 && chars[start - 1] == '&' {
        start -= 1;
    }
    if start == end {
        return None;
    }
    let name: String = chars[start..end].iter().collect();
    Some((name, start as u32))
}

/// If `position` sits within a `-INC`/`++INCLUDE` directive mnemonic at the
/// start of its line, returns the marker name that groups every such site in
/// the file (see `index::SymbolIndex`'s directive handling). Distinct from
/// [`name_at_position`] because the mnemonic's leading `-`/`+` characters
/// aren't name characters, and the mnemonic resolves to a different logical
/// "name" than the member operand following it.
#[must_use]
pub fn preprocessor_directive_at_position(text: &str, position: Position) -> Option<&'static str> {
    let line = text.lines().nth(position.line as usize)?;
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() || chars[0].is_whitespace() {
        return None;
    }
    let mut end = 0;
    while end < chars.len() && !chars[end].is_whitespace() {
        end += 1;
    }
    let mnemonic: String = chars[..end].iter().collect::<String>().to_ascii_uppercase();
    if (mnemonic == "-INC" || mnemonic == "++INCLUDE") && (position.column as usize) < end {
        Some(crate::index::PREPROCESSOR_INCLUDE_MARKER)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_ordinary_symbol_under_cursor() {
        let text = "         BR    MYLABEL\n";
        let hit = name_at_position(text, Position::new(0, 17));
        assert_eq!(hit, Some(("MYLABEL".to_string(), 15)));
    }

    #[test]
    fn finds_variable_symbol_with_sigil() {
        let text = "         AIF  (&X EQ 1).SKIP\n";
        let hit = name_at_position(text, Position::new(0, 16));
        assert_eq!(hit, Some(("&X".to_string(), 15)));
    }

    #[test]
    fn recognizes_dash_inc_and_plus_plus_include_mnemonics() {
        let text = "-INC  MEMBER blabla\n++INCLUDE  MEMBER blabla\n";
        assert_eq!(
            preprocessor_directive_at_position(text, Position::new(0, 1)),
            Some(crate::index::PREPROCESSOR_INCLUDE_MARKER)
        );
        assert_eq!(
            preprocessor_directive_at_position(text, Position::new(1, 5)),
            Some(crate::index::PREPROCESSOR_INCLUDE_MARKER)
        );
    }

    #[test]
    fn does_not_treat_the_member_operand_as_the_directive() {
        let text = "-INC  MEMBER blabla\n";
        assert_eq!(preprocessor_directive_at_position(text, Position::new(0, 8)), None);
    }
}
