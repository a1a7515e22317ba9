//! Offer knowledge base.
//!
//! Two static tables map normalized offer names to a sales-floor description
//! and to a card image. Warehouse offer names are not always spelled like the
//! table keys, so lookup falls back to substring containment in either
//! direction.
//!
//! # Ordering
//!
//! Patterns overlap ("primer servicio" is a substring of "aceleracion primer
//! servicio"). When the exact key is absent, the first entry in declaration
//! order that matches wins, so the order of [`DESCRIPTIONS`] and [`IMAGES`] is
//! part of their meaning. Do not sort them.

use crate::text::normalize_text;

/// Image shown when no table entry matches.
pub const DEFAULT_IMAGE: &str = "images/default.png";

/// Offer descriptions, in match-priority order.
pub const DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "aceleracion primer servicio",
        "Contacta al cliente con urgencia por perder garantía. Ofrece Reactivación de garantía al realizar su servicio. Código: REACTIVACION.",
    ),
    (
        "inactivos",
        "Recupera clientes con una oferta de entrada: Servicio VA $1,699 o Cambio de Aceite VA $999. Código: OFERTALLER.",
    ),
    (
        "retenidos en riesgo",
        "Motiva una visita con la Revisión de 27 puntos + Cupón $500 para reparaciones. Código: OFERTALLER.",
    ),
    (
        "servicio a tu puerta",
        "Ofrece recolección y entrega del vehículo como valor agregado. Incentivo: $100 al distribuidor. Código: VALETPARKING.",
    ),
    (
        "leales fuera garantia",
        "Recompensa su lealtad con Servicio VA $1,699 y promueve upselling de mantenimientos. Código: OFERTALLER.",
    ),
    (
        "primer servicio",
        "Invita al cliente a realizar su primer servicio y conservar la garantía. Beneficio: Tarjeta Amazon $500. Código: OFERTALLER.",
    ),
];

/// Offer card images, in match-priority order.
pub const IMAGES: &[(&str, &str)] = &[
    ("aceleracion primer servicio", "images/aceleracion_ps.png"),
    ("inactivos", "images/Inactivos.png"),
    ("retenidos en riesgo", "images/retencion.png"),
    ("leales fuera garantia", "images/leales_fg.png"),
    ("primer servicio", "images/primer_servicio.png"),
];

/// Look up a normalized key in an ordered `(pattern, value)` table.
///
/// 1. An entry whose pattern equals `key` wins.
/// 2. Otherwise the first entry, in table order, where `key` contains the
///    pattern or the pattern contains `key`.
/// 3. Otherwise `None`.
///
/// An empty key matches nothing.
#[must_use]
pub fn lookup<'a>(key: &str, table: &[(&str, &'a str)]) -> Option<&'a str> {
    if key.is_empty() {
        return None;
    }

    table
        .iter()
        .find(|(pattern, _)| *pattern == key)
        .or_else(|| {
            table
                .iter()
                .find(|(pattern, _)| key.contains(pattern) || pattern.contains(key))
        })
        .map(|(_, value)| *value)
}

/// Description for a raw offer name, if the knowledge base knows it.
#[must_use]
pub fn description(offer_name: &str) -> Option<&'static str> {
    lookup(&normalize_text(offer_name), DESCRIPTIONS)
}

/// Image reference for a raw offer name, or [`DEFAULT_IMAGE`].
#[must_use]
pub fn image(offer_name: &str) -> &'static str {
    lookup(&normalize_text(offer_name), IMAGES).unwrap_or(DEFAULT_IMAGE)
}
