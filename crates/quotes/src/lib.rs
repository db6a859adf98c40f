//! Quote (budget) domain module.
//!
//! Customer quotes built from free-text lines or catalog items. Quotes read
//! the stock catalog to price lines but never change stock.

pub mod quote;

pub use quote::{Quote, QuoteAttributes, QuoteDraft, QuoteId, QuoteLine, QuotePatch, QuoteStatus};
