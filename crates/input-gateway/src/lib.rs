//! OS-level input driver for screen-pilot.
//!
//! Implements the core's `InputDriver` boundary with a real keyboard/mouse
//! (`enigo`) and screen capture (`screenshots`). The device handle lives on a
//! dedicated thread; everything else talks to it through a command channel.

mod actor;
mod capture;
mod gateway;
pub mod keys;

pub use gateway::{EnigoGateway, GatewayConfig};
