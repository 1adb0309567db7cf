// Route handlers, grouped by scope.
//
// auth and sessions are host-scoped: they talk to the host database
// directly and never consult credential markers. The rest are
// tenant-scoped: they run behind the resolver middleware and use whatever
// client it injected.
pub mod auth;
pub mod invoices;
pub mod kiosk;
pub mod members;
pub mod products;
pub mod sessions;
pub mod transactions;
