use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{InvoiceId, PartnerId, Property, PropertyId};

pub const ADMINISTRATIVE_FEES_LABEL: &str = "Administrative Fees";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    OutInvoice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub name: String,
    pub quantity: f64,
    pub price_unit: f64,
}

impl InvoiceLine {
    pub fn subtotal(&self) -> f64 {
        self.quantity * self.price_unit
    }
}

/// Customer invoice requested from the accounting side when a listing is sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub property_id: PropertyId,
    pub partner_id: Option<PartnerId>,
    pub move_type: MoveType,
    pub invoice_date: NaiveDate,
    pub lines: Vec<InvoiceLine>,
}

impl InvoiceDraft {
    /// Commission on the selling price plus the flat administrative fee.
    pub fn for_sale(
        property: &Property,
        commission_rate: f64,
        administrative_fee: f64,
        invoice_date: NaiveDate,
    ) -> Self {
        Self {
            property_id: property.id.clone(),
            partner_id: property.buyer_id.clone(),
            move_type: MoveType::OutInvoice,
            invoice_date,
            lines: vec![
                InvoiceLine {
                    name: format!("Property Sale - {}", property.name),
                    quantity: 1.0,
                    price_unit: property.selling_price * commission_rate,
                },
                InvoiceLine {
                    name: ADMINISTRATIVE_FEES_LABEL.to_string(),
                    quantity: 1.0,
                    price_unit: administrative_fee,
                },
            ],
        }
    }

    pub fn total(&self) -> f64 {
        self.lines.iter().map(InvoiceLine::subtotal).sum()
    }
}

/// Invoice as recorded by the accounting backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: InvoiceId,
    pub draft: InvoiceDraft,
    pub total: f64,
}

/// Outbound hook to the accounting system.
pub trait InvoiceGateway: Send + Sync {
    fn create_invoice(&self, draft: InvoiceDraft) -> Result<InvoiceRecord, BillingError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("accounting backend unavailable: {0}")]
    Transport(String),
    #[error("invoice rejected: {0}")]
    Rejected(String),
}
