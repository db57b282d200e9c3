//! Domain models for invoice-payments-exporter.
//!
//! All records are owned by the ticketing platform's database and only read
//! here.

mod event;
mod gift_card;
mod invoice;
mod payment;

pub use event::{Event, Order};
pub use gift_card::{gift_card_reference, GiftCard, GiftCardTransaction};
pub use invoice::{Invoice, InvoiceLine, InvoiceLineRecord};
pub use payment::{
    info_data, OrderPayment, OrderRefund, PaymentState, RefundState, TransactionRecord,
};
