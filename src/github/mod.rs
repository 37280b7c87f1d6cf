pub mod client;
pub mod query;
pub mod transport;

pub use client::ReportClient;
pub use transport::{HttpTransport, Transport};
