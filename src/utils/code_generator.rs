//! Short code generation and validation utilities.
//!
//! Random codes are drawn from a 62-symbol alphabet with a cryptographically
//! secure generator. A deterministic base-62 bijection over `u64` is provided
//! as an alternative allocation strategy (e.g. encoding a sequence id).

use crate::error::AppError;
use rand::Rng;
use serde_json::json;

/// Base-62 alphabet in digit order: `0-9`, `A-Z`, `a-z`.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of a randomly generated short code.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Bounds for user-supplied custom codes.
pub const CUSTOM_CODE_MIN_LENGTH: usize = 3;
pub const CUSTOM_CODE_MAX_LENGTH: usize = 20;

const BASE: u64 = ALPHABET.len() as u64;

/// Generates a random short code of [`DEFAULT_CODE_LENGTH`] characters.
///
/// Uniqueness is not guaranteed; callers must check the store and retry.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code();
/// assert_eq!(code.len(), 6);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_code() -> String {
    generate_code_with_length(DEFAULT_CODE_LENGTH)
}

/// Generates a random short code of the given length.
///
/// Each character is drawn independently and uniformly over [`ALPHABET`]
/// from the thread-local CSPRNG (ChaCha, seeded from the OS).
pub fn generate_code_with_length(length: usize) -> String {
    let mut rng = rand::rng();

    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Returns `true` if `code` is an acceptable custom short code.
///
/// # Rules
///
/// - Length: 3-20 characters
/// - Allowed characters: ASCII letters, digits, hyphens
pub fn is_valid_custom_code(code: &str) -> bool {
    (CUSTOM_CODE_MIN_LENGTH..=CUSTOM_CODE_MAX_LENGTH).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Validates a user-provided custom short code.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the code violates [`is_valid_custom_code`].
pub fn validate_custom_code(code: &str) -> Result<(), AppError> {
    if !is_valid_custom_code(code) {
        return Err(AppError::bad_request(
            "Invalid custom code format",
            json!({
                "code": code,
                "rule": "3-20 characters: letters, digits and hyphens",
            }),
        ));
    }

    Ok(())
}

/// Encodes a non-negative integer as a base-62 string, most significant digit first.
///
/// `0` encodes to `"0"`.
pub fn encode_numeric(mut n: u64) -> String {
    if n == 0 {
        return (ALPHABET[0] as char).to_string();
    }

    let mut digits = Vec::new();
    while n > 0 {
        digits.push(ALPHABET[(n % BASE) as usize]);
        n /= BASE;
    }
    digits.reverse();

    String::from_utf8(digits).unwrap_or_default()
}

/// Errors returned by [`decode_numeric`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("code is empty")]
    Empty,

    #[error("invalid base-62 character '{0}'")]
    InvalidCharacter(char),

    #[error("value does not fit in 64 bits")]
    Overflow,
}

/// Decodes a base-62 string produced by [`encode_numeric`].
///
/// Leading zero symbols are accepted, so the mapping is a bijection only over
/// canonical strings (no leading `'0'` except `"0"` itself).
///
/// # Errors
///
/// Returns [`DecodeError`] for empty input, characters outside [`ALPHABET`],
/// or values larger than `u64::MAX`.
pub fn decode_numeric(code: &str) -> Result<u64, DecodeError> {
    if code.is_empty() {
        return Err(DecodeError::Empty);
    }

    code.chars().try_fold(0u64, |acc, c| {
        let digit = digit_value(c).ok_or(DecodeError::InvalidCharacter(c))?;
        acc.checked_mul(BASE)
            .and_then(|v| v.checked_add(digit))
            .ok_or(DecodeError::Overflow)
    })
}

fn digit_value(c: char) -> Option<u64> {
    match c {
        '0'..='9' => Some(c as u64 - '0' as u64),
        'A'..='Z' => Some(c as u64 - 'A' as u64 + 10),
        'a'..='z' => Some(c as u64 - 'a' as u64 + 36),
        _ => None,
    }
}
