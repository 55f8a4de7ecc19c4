// MKAI Arabic Normalizer
// Copyright (c) 2026 Xing_The_Creator | SYNOID

/// Harakat, shadda, sukun, superscript alef and tatweel.
const DIACRITICS: &[char] = &[
    '\u{064B}', '\u{064C}', '\u{064D}', '\u{064E}', '\u{064F}', '\u{0650}', '\u{0651}', '\u{0652}',
    '\u{0670}', '\u{0640}',
];

/// Remove Arabic diacritics so transcripts compare on bare letters.
pub fn strip_diacritics(text: &str) -> String {
    text.chars().filter(|c| !DIACRITICS.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_harakat() {
        assert_eq!(strip_diacritics("مَرْحَبًا"), "مرحبا");
        assert_eq!(strip_diacritics("شُكْرًا"), "شكرا");
    }

    #[test]
    fn test_strips_tatweel() {
        assert_eq!(strip_diacritics("جمـــيل"), "جميل");
    }

    #[test]
    fn test_leaves_plain_text_alone() {
        assert_eq!(strip_diacritics("hello مش"), "hello مش");
        assert_eq!(strip_diacritics(""), "");
    }
}
