pub mod invoice;
pub mod kiosk_order;
pub mod member;
pub mod product;
pub mod session;
pub mod shop;
pub mod transaction;
pub mod user;

pub use invoice::{Invoice, InvoiceUpdate, NewInvoice};
pub use kiosk_order::{KioskOrder, KioskOrderUpdate, NewKioskOrder, OrderStatus};
pub use member::{Member, MemberUpdate, NewMember};
pub use product::{NewProduct, Product, ProductUpdate};
pub use session::{NewSession, PosSession};
pub use shop::Shop;
pub use transaction::{items_total, LineItem, NewTransaction, Transaction};
pub use user::{User, UserPublic};

use uuid::Uuid;

/// Bulk update payloads identify their target row by id.
pub trait Identified {
    fn id(&self) -> Option<Uuid>;
}

/// Split bulk update entries into those that name a row and a count of
/// entries skipped for missing one.
pub fn split_identified<T: Identified>(entries: Vec<T>) -> (Vec<T>, usize) {
    let total = entries.len();
    let identified: Vec<T> = entries.into_iter().filter(|e| e.id().is_some()).collect();
    let skipped = total - identified.len();
    (identified, skipped)
}
