mod api;
mod identity;
mod ledger;

pub use api::*;
pub use identity::*;
pub use ledger::*;
