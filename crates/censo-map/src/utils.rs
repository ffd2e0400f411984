//! Text normalization shared by header scoring and value sniffing.

/// Normalizes header text for comparison.
///
/// Lower-cases, folds Spanish accents, turns punctuation into spaces and
/// collapses whitespace.
///
/// ```
/// use censo_map::normalize_text;
///
/// assert_eq!(normalize_text("  Fecha de  Ingreso "), "fecha de ingreso");
/// assert_eq!(normalize_text("F. NACIMIENTO"), "f nacimiento");
/// assert_eq!(normalize_text("Antigüedad (años)"), "antiguedad anos");
/// ```
pub fn normalize_text(raw: &str) -> String {
    let mut folded = String::with_capacity(raw.len());
    for ch in raw.chars().flat_map(char::to_lowercase) {
        let ch = fold_accent(ch);
        if ch.is_alphanumeric() {
            folded.push(ch);
        } else {
            folded.push(' ');
        }
    }
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits normalized text into tokens.
pub fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split_whitespace().collect()
}

fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}
