// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! Input validation for request bodies.

/// Longest allowed post, in characters.
pub const MAX_POST_CHARS: usize = 280;

/// Minimum number of characters in a phone number after an optional `+`.
const MIN_PHONE_CHARS: usize = 10;

/// Trimmed value of an optional field, `None` when absent or blank.
pub fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `local@domain.tld`: one `@`, no whitespace, and a dot inside the domain
/// with characters on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Optional leading `+`, then at least ten digits, spaces, dashes or
/// parentheses.
pub fn is_valid_phone(phone: &str) -> bool {
    let rest = phone.strip_prefix('+').unwrap_or(phone);
    rest.chars().count() >= MIN_PHONE_CHARS
        && rest
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '-' | '(' | ')'))
}

/// Why post content was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentError {
    Empty,
    TooLong,
}

impl ContentError {
    pub fn message(&self) -> &'static str {
        match self {
            ContentError::Empty => "Post content is required",
            ContentError::TooLong => "Post content cannot exceed 280 characters",
        }
    }
}

/// Post content must contain a non-whitespace character and be at most
/// [`MAX_POST_CHARS`] characters long. The content is stored as sent.
pub fn check_post_content(content: &str) -> Result<(), ContentError> {
    if content.trim().is_empty() {
        return Err(ContentError::Empty);
    }
    if content.chars().count() > MAX_POST_CHARS {
        return Err(ContentError::TooLong);
    }
    Ok(())
}
