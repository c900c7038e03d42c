//! Wire shape for the ingestion RPC.
//!
//! The endpoint takes one business per call, services inlined. Price is
//! modeled as a kind tag: `fixed` with minor units, or `quote` when the
//! page showed no price.

use localserv_core::BusinessRecord;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct BusinessPayload {
    pub source_code: String,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_business_id: Option<String>,
    pub business_name: String,
    pub business_type_code: String,
    pub country_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub services: Vec<ServicePayload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServicePayload {
    pub name: String,
    pub price_kind: PriceKind,
    pub currency_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceKind {
    Fixed,
    Quote,
}

/// Identifies the source and catalogue slot a payload lands in.
#[derive(Debug, Clone)]
pub struct PayloadContext {
    pub source_code: String,
    pub business_type_code: String,
    pub country_code: String,
}

impl BusinessPayload {
    /// Maps an extracted record into the RPC shape. A service with no
    /// parseable price becomes `quote` with no `price_cents`.
    #[must_use]
    pub fn from_record(record: &BusinessRecord, ctx: &PayloadContext) -> Self {
        let services = record
            .services
            .iter()
            .map(|service| ServicePayload {
                name: service.name.clone(),
                price_kind: if service.price_cents.is_some() {
                    PriceKind::Fixed
                } else {
                    PriceKind::Quote
                },
                currency_code: "EUR".to_string(),
                price_cents: service.price_cents,
                duration_minutes: service.duration_minutes,
            })
            .collect();

        Self {
            source_code: ctx.source_code.clone(),
            source_url: record.source_url.clone(),
            external_business_id: record.external_id.clone(),
            business_name: record.name.clone(),
            business_type_code: ctx.business_type_code.clone(),
            country_code: ctx.country_code.clone(),
            city: record.city.clone(),
            services,
        }
    }
}
