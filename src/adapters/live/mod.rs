//! Live adapters for real external interactions.

pub mod transport;

pub use transport::ReqwestTransport;
