//! Language tag to display-name mapping for the input transcript label.
//!
//! The provider tags recognized speech with short language codes. The
//! presentation surface shows a localized English name when one is known
//! and falls back to the raw tag otherwise.

/// Resolve a language tag (ISO 639-1, optionally with a region subtag)
/// to a human-readable English name.
pub fn display_name(tag: &str) -> Option<&'static str> {
    // Region subtags beyond zh-TW collapse to the primary language.
    let primary = match tag.to_lowercase().as_str() {
        "zh-tw" | "zh_tw" => return Some("Chinese (Traditional)"),
        other => other.split(['-', '_']).next().unwrap_or("").to_string(),
    };

    let name = match primary.as_str() {
        "ko" => "Korean",
        "ja" => "Japanese",
        "zh" => "Chinese",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "id" => "Indonesian",
        "ms" => "Malay",
        "tl" => "Filipino",
        "hi" => "Hindi",
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "nl" => "Dutch",
        "pl" => "Polish",
        "cs" => "Czech",
        "sv" => "Swedish",
        "da" => "Danish",
        "ru" => "Russian",
        "uk" => "Ukrainian",
        "tr" => "Turkish",
        "ar" => "Arabic",
        _ => return None,
    };
    Some(name)
}

/// Display label for the input transcript: the resolved name, or the raw
/// tag when no localized name exists.
pub fn input_label(tag: &str) -> String {
    display_name(tag)
        .map(str::to_string)
        .unwrap_or_else(|| tag.to_string())
}
