use crate::{
    ast::{ExternalCommand, Statement},
    error::ParseError,
    interpreter::{parser::core::ParseResult, tokenizer::Token},
};

/// A marker keyword and the number of tokens that must follow it.
#[derive(Clone, Copy)]
struct Marker {
    word:      &'static str,
    followers: usize,
}

/// Defines the external command table.
///
/// Each entry provides:
/// - the command family and sub-command,
/// - the minimum number of tokens after the sub-command,
/// - the marker keywords that must appear, with the number of tokens each
///   marker needs after it.
///
/// The macro produces `CommandDef` and the static `COMMAND_TABLE`.
macro_rules! external_commands {
    (
        $(
            $category:literal $sub:literal => {
                min: $min:expr,
                markers: [$(($word:literal, $followers:expr)),* $(,)?] $(,)?
            }
        ),* $(,)?
    ) => {
        struct CommandDef {
            category: &'static str,
            sub:      &'static str,
            min:      usize,
            markers:  &'static [Marker],
        }
        static COMMAND_TABLE: &[CommandDef] = &[
            $(
                CommandDef { category: $category,
                             sub:      $sub,
                             min:      $min,
                             markers:  &[$(Marker { word: $word, followers: $followers }),*] },
            )*
        ];
    };
}

external_commands! {
    "ui"  "window"   => { min: 1,  markers: [] },
    "ui"  "title"    => { min: 2,  markers: [] },
    "ui"  "size"     => { min: 3,  markers: [] },
    "ui"  "bg"       => { min: 2,  markers: [] },
    "ui"  "fg"       => { min: 2,  markers: [] },
    "ui"  "label"    => { min: 6,  markers: [("at", 2)] },
    "ui"  "button"   => { min: 8,  markers: [("at", 2), ("do", 1)] },
    "ui"  "entry"    => { min: 5,  markers: [("at", 2)] },
    "ui"  "slider"   => { min: 9,  markers: [("from", 1), ("to", 1), ("at", 2)] },
    "ui"  "checkbox" => { min: 6,  markers: [("at", 2)] },
    "ui"  "bind"     => { min: 4,  markers: [("do", 1)] },
    "ui"  "text"     => { min: 2,  markers: [] },
    "ui"  "set"      => { min: 2,  markers: [] },
    "ui"  "get"      => { min: 3,  markers: [("into", 1)] },
    "ui"  "run"      => { min: 1,  markers: [] },
    "gfx" "screen"   => { min: 3,  markers: [] },
    "gfx" "clear"    => { min: 2,  markers: [] },
    "gfx" "present"  => { min: 1,  markers: [] },
    "gfx" "rect"     => { min: 8,  markers: [("at", 2), ("size", 2)] },
    "gfx" "circle"   => { min: 7,  markers: [("at", 2), ("radius", 1)] },
    "gfx" "text"     => { min: 6,  markers: [("at", 2)] },
    "gfx" "key"      => { min: 4,  markers: [("into", 1)] },
}

/// Checks whether `category sub_command` is a read form, one whose reply
/// stores a value into the variable named after its `into` marker.
#[must_use]
pub fn is_read_form(category: &str, sub_command: &str) -> bool {
    COMMAND_TABLE.iter()
                 .find(|def| def.category == category && def.sub == sub_command)
                 .is_some_and(|def| def.markers.iter().any(|m| m.word == "into"))
}

/// Parses a `ui`/`gfx` line into an external command statement.
///
/// Only the shape is checked: the sub-command must be known, enough tokens
/// must follow it, and every required marker must be present with its
/// followers. Argument meaning is left to the host.
///
/// # Parameters
/// - `category`: The family keyword, `ui` or `gfx`.
/// - `rest`: The tokens after the family keyword.
/// - `line`: The line number for the statement and any error.
///
/// # Errors
/// `MalformedExternalCommand` naming the sub-command and the problem.
///
/// # Example
/// ```
/// use solar::{
///     ast::Statement,
///     interpreter::{parser::external::parse_external_command, tokenizer::tokenize},
/// };
///
/// let tokens = tokenize(r#"button main ok "Go" at 10 20 do start"#, 4).unwrap();
/// let Ok(Statement::ExternalCommand(cmd)) = parse_external_command("ui", &tokens, 4) else {
///     panic!("expected an external command");
/// };
/// assert_eq!(cmd.sub_command, "button");
/// assert_eq!(cmd.raw_tokens.len(), 8);
/// assert_eq!(cmd.quoted_flags[2], true);
///
/// let tokens = tokenize("button main ok Go 10 20 do start", 4).unwrap();
/// assert!(parse_external_command("ui", &tokens, 4).is_err());
/// ```
pub fn parse_external_command(category: &str, rest: &[Token], line: usize) -> ParseResult<Statement> {
    let malformed = |sub_command: &str, details: String| ParseError::MalformedExternalCommand {
        category: category.to_string(),
        sub_command: sub_command.to_string(),
        details,
        line,
    };

    let Some((sub, args)) = rest.split_first() else {
        return Err(malformed("", "missing sub-command".to_string()));
    };
    if sub.was_quoted {
        return Err(malformed(&sub.text, "the sub-command cannot be a string".to_string()));
    }
    let Some(def) = COMMAND_TABLE.iter().find(|def| def.category == category && def.sub == sub.text) else {
        return Err(malformed(&sub.text, "unknown sub-command".to_string()));
    };

    if args.len() < def.min {
        return Err(malformed(def.sub,
                             format!("expected at least {} arguments, found {}", def.min, args.len())));
    }
    for marker in def.markers {
        let Some(position) = args.iter().position(|t| t.is_keyword(marker.word)) else {
            return Err(malformed(def.sub, format!("missing `{}`", marker.word)));
        };
        if position + marker.followers >= args.len() {
            return Err(malformed(def.sub,
                                 format!("`{}` needs {} value(s) after it", marker.word, marker.followers)));
        }
    }

    Ok(Statement::ExternalCommand(ExternalCommand { category: category.to_string(),
                                                    sub_command: sub.text.clone(),
                                                    raw_tokens: args.iter().map(|t| t.text.clone()).collect(),
                                                    quoted_flags: args.iter().map(|t| t.was_quoted).collect(),
                                                    line }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::tokenizer::tokenize;

    fn parse(category: &str, rest: &str) -> ParseResult<Statement> {
        parse_external_command(category, &tokenize(rest, 9).unwrap(), 9)
    }

    #[test]
    fn unknown_sub_command_is_named_in_the_error() {
        let err = parse("ui", "spinner main x").unwrap_err();
        assert!(matches!(err,
                         ParseError::MalformedExternalCommand { ref sub_command, line: 9, .. } if sub_command == "spinner"));
    }

    #[test]
    fn marker_needs_its_followers() {
        assert!(parse("gfx", "circle screen red radius 5 at 1").is_err());
        assert!(parse("gfx", "circle screen red at 1 2 radius 5").is_ok());
    }

    #[test]
    fn quoted_marker_does_not_count() {
        assert!(parse("ui", r#"get name "into" target"#).is_err());
    }

    #[test]
    fn slider_needs_all_three_markers() {
        assert!(parse("ui", "slider main vol from 0 to 10 at 5 5").is_ok());
        assert!(parse("ui", "slider main vol from 0 upto 10 at 5 5").is_err());
    }

    #[test]
    fn read_forms_are_the_into_commands() {
        assert!(is_read_form("ui", "get"));
        assert!(is_read_form("gfx", "key"));
        assert!(!is_read_form("ui", "set"));
    }
}
