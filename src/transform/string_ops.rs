use std::borrow::Cow;

use heck::ToSnakeCase;

/// Converts identifiers to `snake_case`.
pub fn snake_case(input: &str) -> Cow<'_, str> {
    let converted = input.to_snake_case();
    if converted == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(converted)
    }
}

/// Returns a substring using character indices to stay UTF-8 safe.
pub fn substring(value: &str, start: usize, length: usize) -> Cow<'_, str> {
    if length == 0 {
        return Cow::Owned(String::new());
    }
    let mut start_byte: Option<usize> = None;
    let mut end_byte: Option<usize> = None;
    let end_target = start.saturating_add(length);

    for (char_index, (idx, _)) in value.char_indices().enumerate() {
        if char_index == start {
            start_byte = Some(idx);
        }
        if char_index == end_target {
            end_byte = Some(idx);
            break;
        }
    }

    let Some(start_byte) = start_byte else {
        return Cow::Owned(String::new());
    };
    let end_byte = end_byte.unwrap_or(value.len());
    if start_byte == 0 && end_byte == value.len() {
        return Cow::Borrowed(value);
    }
    Cow::Borrowed(&value[start_byte..end_byte])
}

/// Removes every occurrence of `target`, borrowing when there is nothing to remove.
pub fn strip_char(value: &str, target: char) -> Cow<'_, str> {
    if value.contains(target) {
        Cow::Owned(value.chars().filter(|ch| *ch != target).collect())
    } else {
        Cow::Borrowed(value)
    }
}
