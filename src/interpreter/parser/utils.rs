/// Words reserved by the Solar line grammar.
pub const LANGUAGE_KEYWORDS: &[&str] =
    &["let", "print", "call", "if", "use", "solar_def", "loop", "end", "ui", "gfx"];

/// Words the expression sandbox gives a meaning of its own.
///
/// A bare token spelled like one of these is never a variable reference.
pub const SANDBOX_KEYWORDS: &[&str] =
    &["and", "or", "not", "if", "else", "in", "is", "true", "false", "none", "True", "False", "None"];

/// Words that open an indented verbatim block.
pub const BLOCK_OPENERS: &[&str] = &["def", "class", "for", "while", "with", "try", "except", "finally", "elif",
                                     "else", "async", "match"];

/// Words that start a single verbatim line.
const MODULE_LOADERS: &[&str] = &["import", "from"];

/// Checks whether `text` is a valid identifier.
///
/// Identifiers are ASCII letters, digits and underscores, and do not start with
/// a digit. Sandbox keywords are excluded.
///
/// # Example
/// ```
/// use solar::interpreter::parser::utils::is_identifier;
///
/// assert!(is_identifier("score_2"));
/// assert!(is_identifier("_tmp"));
/// assert!(!is_identifier("2fast"));
/// assert!(!is_identifier("a-b"));
/// assert!(!is_identifier("True"));
/// ```
#[must_use]
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    && !SANDBOX_KEYWORDS.contains(&text)
}

/// Checks whether `text` names something user code may bind or define.
///
/// Names beginning with a double underscore are reserved.
#[must_use]
pub fn is_bindable_name(text: &str) -> bool {
    is_identifier(text) && !text.starts_with("__")
}

/// Checks whether `text` can name a user function.
///
/// A call line starts with the function's name, so names the line classifier
/// reads as passthrough are refused.
///
/// # Example
/// ```
/// use solar::interpreter::parser::utils::is_function_name;
///
/// assert!(is_function_name("greet"));
/// assert!(is_function_name("matches"));
/// assert!(!is_function_name("match"));
/// assert!(!is_function_name("import"));
/// ```
#[must_use]
pub fn is_function_name(text: &str) -> bool {
    is_bindable_name(text) && !BLOCK_OPENERS.contains(&text) && !MODULE_LOADERS.contains(&text)
}

/// Returns the first whitespace-delimited word of a line.
#[must_use]
pub fn first_word(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

/// Checks whether the line's first word is a language keyword.
#[must_use]
pub fn starts_with_keyword(line: &str) -> bool {
    LANGUAGE_KEYWORDS.contains(&first_word(line))
}
