//! Gateway proxying
//!
//! Parses the inbound body, resolves the alias into `x-portkey-*` headers and
//! streams the call through the Portkey gateway.

pub mod gateway;
pub mod headers;
pub mod logging;
pub mod request;
pub mod translate;

pub use gateway::GatewayClient;
pub use logging::RequestContext;
pub use request::{InboundRequest, WireFormat};
pub use translate::{translate, OutboundConfig, Translation};
