// MIT License - Copyright (c) 2026 Peter Wright
// Keypad symbols and the tones they produce

/// Backspace key.
pub const BACKSPACE: char = '*';

/// Command terminator.
pub const ENTER: char = '#';

/// Clears the entry buffer.
pub const CLEAR: char = 'C';

/// Buzzer tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Low,
    Medium,
    High,
}

/// Whether `key` is one of the ten digit keys.
pub fn is_digit(key: char) -> bool {
    key.is_ascii_digit()
}

/// Whether `key` is one of the four letter keys `A`-`D`.
pub fn is_letter(key: char) -> bool {
    matches!(key, 'A'..='D')
}

/// The tone a key press produces on its own, before any command handling.
///
/// `#` and `*` beep medium as part of their own handling; other symbols
/// are silent.
pub fn key_tone(key: char) -> Option<Tone> {
    if is_digit(key) {
        Some(Tone::Low)
    } else if is_letter(key) {
        Some(Tone::High)
    } else {
        None
    }
}

/// The last four characters of `text`, which is all a 4-digit display shows.
pub fn visible(text: &str) -> &str {
    match text.char_indices().rev().nth(3) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}
