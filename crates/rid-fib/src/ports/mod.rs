//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API used by evaluation drivers
//! - Driven Ports (outbound) - identifier encoding the FIB depends on

pub mod inbound;
pub mod outbound;

pub use inbound::ForwardingTableApi;
pub use outbound::RidEncoder;
