pub mod resolve_client;
pub mod response;

pub use resolve_client::resolve_client_middleware;
pub use response::{ApiResponse, ApiResult};
