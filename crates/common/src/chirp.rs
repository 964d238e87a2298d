// Chirp body validation: length cap and profanity masking.

use thiserror::Error;

/// Maximum chirp body length in bytes.
pub const MAX_CHIRP_LEN: usize = 140;

const PROFANE_WORDS: &[&str] = &["kerfuffle", "sharbert", "fornax"];
const REPLACEMENT: &str = "****";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChirpError {
    #[error("Chirp is too long")]
    TooLong,
}

/// Validate a chirp body and return it with profane words masked.
pub fn validate_chirp(body: &str) -> Result<String, ChirpError> {
    if body.len() > MAX_CHIRP_LEN {
        return Err(ChirpError::TooLong);
    }

    Ok(clean_profanity(body))
}

/// Replace profane words with `****`.
///
/// Words are split on single spaces and compared case-insensitively.
/// A word with attached punctuation (`"sharbert!"`) is left alone.
pub fn clean_profanity(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            let lowered = word.to_lowercase();
            if PROFANE_WORDS.contains(&lowered.as_str()) {
                REPLACEMENT
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
