//! Display formatting for offers.
//!
//! Turns raw warehouse offer names into what the offer cards show: a
//! capitalized title, a description with its promo code highlighted, and an
//! image. Descriptions are rendered as HTML, so everything except the code
//! marker is escaped.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::catalog;
use crate::text::{escape_html, fold_upper, normalize_text};

/// Matches `Código: XXXX` / `Codigo: XXXX` in escaped description text.
static PROMO_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)c[oó]digo:\s*([a-z0-9]+)").expect("Invalid regex")
});

/// An offer ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedOffer {
    /// Capitalized, de-slugified offer name.
    pub title: String,
    /// Escaped description HTML with promo codes wrapped in `<code>`.
    pub description_html: String,
    /// Image reference relative to the static root.
    pub image: &'static str,
}

impl ResolvedOffer {
    /// Resolve a raw offer name against the knowledge base.
    ///
    /// `fallback` is shown (escaped) when the knowledge base has no
    /// description for the offer.
    #[must_use]
    pub fn resolve(raw_name: &str, fallback: &str) -> Self {
        let description = catalog::description(raw_name);

        Self {
            title: display_name(raw_name),
            description_html: description_html(description.unwrap_or(fallback)),
            image: catalog::image(raw_name),
        }
    }
}

/// Normalize an offer name and uppercase its first character.
///
/// ```
/// use ofertas_vin_core::resolver::display_name;
///
/// assert_eq!(display_name("RETENIDOS_EN_RIESGO"), "Retenidos en riesgo");
/// assert_eq!(display_name(""), "");
/// ```
#[must_use]
pub fn display_name(raw_name: &str) -> String {
    let normalized = normalize_text(raw_name);
    let mut chars = normalized.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Escape a description and highlight its promo code.
///
/// Every `Código:` or `Codigo:` (any case) followed by whitespace and an
/// alphanumeric token becomes `Código: <code class="codigo-oferta">TOKEN</code>`.
#[must_use]
pub fn description_html(text: &str) -> String {
    let escaped = escape_html(text);
    PROMO_CODE_RE
        .replace_all(&escaped, r#"Código: <code class="codigo-oferta">$1</code>"#)
        .into_owned()
}

/// Human label for a customer status code, if it has one.
///
/// ```
/// use ofertas_vin_core::resolver::status_legend;
///
/// assert_eq!(status_legend("asistió"), Some("Ya asistió"));
/// assert_eq!(status_legend("otro"), None);
/// ```
#[must_use]
pub fn status_legend(raw_status: &str) -> Option<&'static str> {
    match fold_upper(raw_status).as_str() {
        "ASISTIO" => Some("Ya asistió"),
        "POTENCIAL" => Some("Potencial"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("inactivos"), "Inactivos");
        assert_eq!(display_name("LEALES_FUERA_GARANTÍA"), "Leales fuera garantia");
        assert_eq!(display_name("  servicio   a tu puerta "), "Servicio a tu puerta");
        assert_eq!(display_name("   "), "");
    }

    #[test]
    fn test_description_html_wraps_code() {
        assert_eq!(
            description_html("Entrada gratis. Código: OFERTALLER."),
            r#"Entrada gratis. Código: <code class="codigo-oferta">OFERTALLER</code>."#
        );
    }

    #[test]
    fn test_description_html_accepts_variants() {
        assert_eq!(
            description_html("codigo:abc123"),
            r#"Código: <code class="codigo-oferta">abc123</code>"#
        );
        assert_eq!(
            description_html("CÓDIGO:   X1 y Codigo: Y2"),
            r#"Código: <code class="codigo-oferta">X1</code> y Código: <code class="codigo-oferta">Y2</code>"#
        );
    }

    #[test]
    fn test_description_html_escapes_markup() {
        assert_eq!(
            description_html(r#"<script>alert("x")</script> Código: A1"#),
            r#"&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; Código: <code class="codigo-oferta">A1</code>"#
        );
    }

    #[test]
    fn test_description_html_without_code() {
        assert_eq!(description_html("Cupón $500 & más"), "Cupón $500 &amp; más");
        assert_eq!(description_html("Código: "), "Código: ");
    }

    #[test]
    fn test_resolve_known_offer() {
        let offer = ResolvedOffer::resolve("INACTIVOS", "fallback");
        assert_eq!(offer.title, "Inactivos");
        assert!(
            offer
                .description_html
                .contains(r#"<code class="codigo-oferta">OFERTALLER</code>"#)
        );
        assert_eq!(offer.image, "images/Inactivos.png");
    }

    #[test]
    fn test_resolve_unknown_offer_uses_fallback() {
        let offer = ResolvedOffer::resolve("Garantía <extendida>", "Oferta adicional disponible.");
        assert_eq!(offer.title, "Garantia <extendida>");
        assert_eq!(offer.description_html, "Oferta adicional disponible.");
        assert_eq!(offer.image, catalog::DEFAULT_IMAGE);
    }

    #[test]
    fn test_status_legend() {
        assert_eq!(status_legend("ASISTIO"), Some("Ya asistió"));
        assert_eq!(status_legend(" potencial "), Some("Potencial"));
        assert_eq!(status_legend("Asistió"), Some("Ya asistió"));
        assert_eq!(status_legend(""), None);
        assert_eq!(status_legend("PERDIDO"), None);
    }
}
