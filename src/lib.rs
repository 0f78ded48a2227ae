//! Remote control of Android devices over adb.
//!
//! The crate is a thin, typed layer over the `adb` command-line tool: a
//! single command runner, pure parsers for adb's semi-structured text
//! output, a spatial lookup over UI-dump bounding rectangles, and a facade
//! ([`DeviceBridge`]) exposing one operation per device capability.

pub mod adb;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod ui_dump;

pub use adb::parse::{BoolCoercion, Resolution};
pub use device::DeviceBridge;
pub use error::{BridgeError, ErrorKind};
pub use ui_dump::{node_at_point, parse_dump_nodes, Bounds, UiDump, UiNode};
