//! Thin W3C WebDriver client: wire types, a pluggable transport, and the
//! typed command surface the session layer drives.

pub mod client;
pub mod http;
pub mod protocol;
pub mod transport;

pub use client::DriverClient;
pub use http::{DriverProcess, HttpTransport};
pub use protocol::{keys, Locator};
pub use transport::DriverTransport;
