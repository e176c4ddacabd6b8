//! Pinyin helpers.
//!
//! - numeric → tone-mark conversion ("ni3 hao3" → "nǐ hǎo")
//! - diacritic stripping for tone-insensitive comparison
//! - Hanzi → tone-marked pinyin for text that arrives without a romanization
//!
//! Everything here is pure and never fails: input we don't understand is
//! passed through unchanged.
use pinyin::ToPinyin;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Each row is `[base, tone1, tone2, tone3, tone4]`.
static TONE_TABLE: [[char; 5]; 12] = [
    ['a', 'ā', 'á', 'ǎ', 'à'],
    ['e', 'ē', 'é', 'ě', 'è'],
    ['i', 'ī', 'í', 'ǐ', 'ì'],
    ['o', 'ō', 'ó', 'ǒ', 'ò'],
    ['u', 'ū', 'ú', 'ǔ', 'ù'],
    ['ü', 'ǖ', 'ǘ', 'ǚ', 'ǜ'],
    ['A', 'Ā', 'Á', 'Ǎ', 'À'],
    ['E', 'Ē', 'É', 'Ě', 'È'],
    ['I', 'Ī', 'Í', 'Ǐ', 'Ì'],
    ['O', 'Ō', 'Ó', 'Ǒ', 'Ò'],
    ['U', 'Ū', 'Ú', 'Ǔ', 'Ù'],
    ['Ü', 'Ǖ', 'Ǘ', 'Ǚ', 'Ǜ'],
];

/// Convert space-separated numeric pinyin into tone-mark pinyin.
///
/// Input that already carries a tone mark anywhere is returned unchanged, which
/// makes the conversion idempotent. Syllables without a trailing tone digit in
/// `1..=5` are passed through as-is; tone 5 (neutral) only drops the digit.
///
///   "ni3 hao3"  → "nǐ hǎo"
///   "lv4 se4"   → "lǜ sè"
///   "ma5"       → "ma"
pub fn convert_numeric_pinyin_to_tonal(input: &str) -> String {
    if has_tone_mark(input) {
        return input.to_string();
    }
    input
        .split(' ')
        .map(convert_syllable)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip diacritics (NFD + combining-mark removal). Tone digits are left alone.
pub fn normalize_pinyin(input: &str) -> String {
    input.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Tone- and case-insensitive pinyin equality.
pub fn pinyin_matches(a: &str, b: &str) -> bool {
    comparable(a) == comparable(b)
}

fn comparable(s: &str) -> String {
    normalize_pinyin(s)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True if the text contains any tone-marked vowel.
pub fn has_tone_mark(s: &str) -> bool {
    s.chars()
        .any(|c| TONE_TABLE.iter().any(|row| row[1..].contains(&c)))
}

fn convert_syllable(syllable: &str) -> String {
    let Some(last) = syllable.chars().last() else {
        return String::new();
    };
    let tone = match last.to_digit(10) {
        Some(d @ 1..=5) => d as usize,
        _ => return syllable.to_string(),
    };

    // The tone digit is ASCII, so it is exactly one byte.
    let letters = &syllable[..syllable.len() - 1];
    if letters.is_empty() || !letters.chars().all(char::is_alphabetic) {
        return syllable.to_string();
    }

    let letters: String = letters
        .chars()
        .map(|c| match c {
            'v' => 'ü',
            'V' => 'Ü',
            c => c,
        })
        .collect();

    if tone == 5 {
        return letters;
    }

    match tone_vowel_index(&letters) {
        Some(idx) => letters
            .chars()
            .enumerate()
            .map(|(i, c)| if i == idx { tone_mark(c, tone) } else { c })
            .collect(),
        None => letters,
    }
}

/// Char index of the vowel that carries the tone mark:
/// `a` > `e` > the `o` of `ou` > the last of `i o u ü`.
fn tone_vowel_index(letters: &str) -> Option<usize> {
    let lower: Vec<char> = letters
        .chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect();

    if let Some(i) = lower.iter().position(|&c| c == 'a') {
        return Some(i);
    }
    if let Some(i) = lower.iter().position(|&c| c == 'e') {
        return Some(i);
    }
    if let Some(i) = lower.windows(2).position(|w| w == ['o', 'u']) {
        return Some(i);
    }
    lower.iter().rposition(|c| matches!(c, 'i' | 'o' | 'u' | 'ü'))
}

fn tone_mark(c: char, tone: usize) -> char {
    TONE_TABLE
        .iter()
        .find(|row| row[0] == c)
        .map(|row| row[tone])
        .unwrap_or(c)
}

/// Convert Chinese text into Hanyu Pinyin with tone diacritics, space-separated.
/// Non-Chinese characters are copied as-is.
///
/// Per-character conversion (no word segmentation), so polyphonic characters
/// use their default reading.
pub fn to_pinyin_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);

    // Insert spaces only between consecutive Hanzi syllables.
    let mut last_was_hanzi = false;

    for ch in text.chars() {
        if let Some(py) = ch.to_pinyin() {
            if last_was_hanzi {
                out.push(' ');
            }
            out.push_str(py.with_tone());
            last_was_hanzi = true;
        } else {
            out.push(ch);
            last_was_hanzi = false;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_common_syllables() {
        assert_eq!(convert_numeric_pinyin_to_tonal("ni3 hao3"), "nǐ hǎo");
        assert_eq!(convert_numeric_pinyin_to_tonal("hao3"), "hǎo");
        assert_eq!(convert_numeric_pinyin_to_tonal("tian1"), "tiān");
        assert_eq!(convert_numeric_pinyin_to_tonal("jiu3"), "jiǔ");
        assert_eq!(convert_numeric_pinyin_to_tonal("gou3"), "gǒu");
        assert_eq!(convert_numeric_pinyin_to_tonal("xue2 sheng5"), "xué sheng");
        assert_eq!(convert_numeric_pinyin_to_tonal("dui4"), "duì");
    }

    #[test]
    fn neutral_tone_strips_digit_only() {
        assert_eq!(convert_numeric_pinyin_to_tonal("hao5"), "hao");
        assert_eq!(convert_numeric_pinyin_to_tonal("ma5"), "ma");
    }

    #[test]
    fn v_is_shorthand_for_u_umlaut() {
        assert_eq!(convert_numeric_pinyin_to_tonal("lv4"), "lǜ");
        assert_eq!(convert_numeric_pinyin_to_tonal("nv3 ren2"), "nǚ rén");
        assert_eq!(convert_numeric_pinyin_to_tonal("lv5"), "lü");
    }

    #[test]
    fn uppercase_keeps_case() {
        assert_eq!(convert_numeric_pinyin_to_tonal("Bei3 jing1"), "Běi jīng");
        assert_eq!(convert_numeric_pinyin_to_tonal("AN1"), "ĀN");
    }

    #[test]
    fn malformed_syllables_pass_through() {
        assert_eq!(convert_numeric_pinyin_to_tonal("hao6"), "hao6");
        assert_eq!(convert_numeric_pinyin_to_tonal("hao"), "hao");
        assert_eq!(convert_numeric_pinyin_to_tonal("3"), "3");
        assert_eq!(convert_numeric_pinyin_to_tonal("m2"), "m");
        assert_eq!(convert_numeric_pinyin_to_tonal(""), "");
        assert_eq!(convert_numeric_pinyin_to_tonal("ni3  hao3"), "nǐ  hǎo");
    }

    #[test]
    fn diacritic_input_short_circuits() {
        assert_eq!(convert_numeric_pinyin_to_tonal("nǐ hao3"), "nǐ hao3");
    }

    #[test]
    fn conversion_is_idempotent() {
        for input in ["ni3 hao3", "hao5", "lv4", "hao6", "zhong1 guo2 ren2", "m2 a"] {
            let once = convert_numeric_pinyin_to_tonal(input);
            let twice = convert_numeric_pinyin_to_tonal(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn normalize_removes_marks_but_not_digits() {
        assert_eq!(normalize_pinyin("nǐ hǎo"), "ni hao");
        assert_eq!(normalize_pinyin("lǜ"), "lu");
        assert_eq!(normalize_pinyin("ni3 hao3"), "ni3 hao3");
    }

    #[test]
    fn matches_ignore_tone_and_case() {
        assert!(pinyin_matches("Nǐ  hǎo", "ni hao"));
        assert!(!pinyin_matches("nǐ hǎo", "ni3 hao3"));
    }

    #[test]
    fn hanzi_to_pinyin_spaces_syllables() {
        assert_eq!(to_pinyin_diacritics("你好"), "nǐ hǎo");
        assert_eq!(to_pinyin_diacritics("我 2025!"), "wǒ 2025!");
    }
}
