//! SQL for the offers table.
//!
//! Identifiers come from configuration and are validated at load time
//! (`[A-Za-z0-9_-]`), so they can be quoted with backticks directly. The VIN
//! is always bound as the `@vin` named parameter.

use crate::config::OffersTable;

/// Column aliases the row decoder reads, independent of the table's schema.
pub mod alias {
    pub const VIN: &str = "vin";
    pub const PRIMARY: &str = "oferta_principal";
    pub const OFFERS: &str = "ofertas";
    pub const STATUS: &str = "status_cliente_principal";
}

/// Name of the query parameter carrying the VIN.
pub const VIN_PARAM: &str = "vin";

/// Build the single-row offer lookup for `project`.
///
/// Matches the VIN column trimmed and lowercased against the parameter.
#[must_use]
pub fn offer_lookup(project: &str, table: &OffersTable) -> String {
    format!(
        "SELECT `{vin}` AS {vin_alias}, `{primary}` AS {primary_alias}, \
         `{offers}` AS {offers_alias}, `{status}` AS {status_alias} \
         FROM `{project}.{dataset}.{table}` \
         WHERE TRIM(LOWER(`{vin}`)) = TRIM(LOWER(@{VIN_PARAM})) \
         LIMIT 1",
        vin = table.vin_column,
        primary = table.primary_column,
        offers = table.offers_column,
        status = table.status_column,
        dataset = table.dataset,
        table = table.table,
        vin_alias = alias::VIN,
        primary_alias = alias::PRIMARY,
        offers_alias = alias::OFFERS,
        status_alias = alias::STATUS,
    )
}
