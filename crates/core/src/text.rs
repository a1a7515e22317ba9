//! Text helpers for offer names, status codes and HTML output.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalize free text into a lookup key.
///
/// Underscores become spaces, the text is lowercased, accents are stripped
/// (NFD decomposition with combining marks removed), and the result is trimmed
/// with internal whitespace runs collapsed to one space. Total and idempotent.
///
/// ```
/// use ofertas_vin_core::text::normalize_text;
///
/// assert_eq!(normalize_text("  Aceleración_Primer   SERVICIO "), "aceleracion primer servicio");
/// assert_eq!(normalize_text(""), "");
/// ```
#[must_use]
pub fn normalize_text(input: &str) -> String {
    let folded = strip_accents(&input.replace('_', " ").to_lowercase());
    collapse_whitespace(&folded)
}

/// Strip accents and uppercase, for comparing status codes like `ASISTIÓ`.
#[must_use]
pub fn fold_upper(input: &str) -> String {
    strip_accents(input).to_uppercase().trim().to_owned()
}

/// Escape `& < > " '` for insertion into HTML text or attributes.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

fn strip_accents(input: &str) -> String {
    input.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_accents_and_case() {
        assert_eq!(normalize_text("Garantía"), "garantia");
        assert_eq!(normalize_text("LEALES FUERA GARANTÍA"), "leales fuera garantia");
        assert_eq!(normalize_text("Niño"), "nino");
    }

    #[test]
    fn test_normalize_underscores_and_whitespace() {
        assert_eq!(normalize_text("retenidos_en_riesgo"), "retenidos en riesgo");
        assert_eq!(normalize_text(" a \t\n b  _ c "), "a b c");
        assert_eq!(normalize_text("___"), "");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "",
            "  Aceleración_Primer   SERVICIO ",
            "SERVICIO_a_tu_PUERTA",
            "Ça va\u{00A0}bien",
            "e\u{0301}",
            "İstanbul",
            "ǅungla",
            "ﬁnal",
        ];
        for sample in samples {
            let once = normalize_text(sample);
            assert_eq!(normalize_text(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_fold_upper() {
        assert_eq!(fold_upper(" asistió "), "ASISTIO");
        assert_eq!(fold_upper("Potencial"), "POTENCIAL");
        assert_eq!(fold_upper(""), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;"
        );
        assert_eq!(escape_html("sin cambios"), "sin cambios");
    }
}
