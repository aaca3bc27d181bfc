//! Lexical helpers for field and mutator names.
//!
//! Pure string operations; no knowledge of any class.

/// Converts a plural field name to the singular stem of its mutators.
///
/// Only the trailing word is inflected, so `userRoles` becomes `userRole`.
pub fn singularize(word: &str) -> String {
    let split = word
        .char_indices()
        .filter(|(_, ch)| ch.is_ascii_uppercase() || *ch == '_')
        .map(|(idx, ch)| if ch == '_' { idx + 1 } else { idx })
        .last()
        .unwrap_or(0);
    let (head, tail) = word.split_at(split);

    let lowered = tail.to_ascii_lowercase();
    let singular = facet_singularize::singularize(&lowered);
    if singular == lowered {
        return word.to_string();
    }

    // Keep the input casing for the unchanged prefix.
    let common = lowered
        .chars()
        .zip(singular.chars())
        .take_while(|(a, b)| a == b)
        .count();
    let kept: String = tail.chars().take(common).collect();
    let rest: String = singular.chars().skip(common).collect();
    format!("{}{}{}", head, kept, rest)
}

/// Upper-cases the first character.
pub fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-cases the first character.
pub fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `is_active` -> `isActive`.
///
/// The character after each run of `_`/`.` is upper-cased and the run dropped;
/// a run ending in `.` leaves a single `_` behind. Trailing separators are kept.
pub fn snake_to_camel(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending = String::new();
    let mut at_boundary = true;

    for ch in s.chars() {
        if ch == '_' || ch == '.' {
            pending.push(ch);
            at_boundary = true;
            continue;
        }

        if at_boundary {
            if pending.ends_with('.') {
                out.push('_');
            }
            pending.clear();
            out.extend(ch.to_uppercase());
            at_boundary = false;
        } else {
            out.push(ch);
        }
    }
    out.push_str(&pending);

    lcfirst(&out)
}

/// `isActive` -> `is_active`.
pub fn camel_to_snake(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for ch in lcfirst(s).chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(ch.to_ascii_lowercase());
    }
    out
}
