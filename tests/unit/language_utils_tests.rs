/*!
 * Tests for ISO language code utilities
 */

use movsub::language_utils::{display_name, normalize_to_part1_or_part2t, output_suffix, whisper_language_code};

#[test]
fn test_normalize_to_part1_or_part2t_withVariousForms_shouldPreferTwoLetters() {
    assert_eq!(normalize_to_part1_or_part2t("ger").unwrap(), "de");
    assert_eq!(normalize_to_part1_or_part2t("fra").unwrap(), "fr");
    assert_eq!(normalize_to_part1_or_part2t("English").unwrap(), "en");
}

#[test]
fn test_whisper_language_code_withBlank_shouldBeAuto() {
    assert_eq!(whisper_language_code(Some("  ")).unwrap(), "auto");
}

#[test]
fn test_display_name_andSuffix_shouldAgreeForCodes() {
    assert_eq!(display_name("ja"), "Japanese");
    assert_eq!(output_suffix(&display_name("ja")), "japanese");
}
