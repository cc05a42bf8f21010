//! API endpoint modules.

mod firmware;
mod nodes;

pub use firmware::FirmwareApi;
pub use nodes::NodeApi;
