pub mod classify;
pub mod events;
pub mod graph;
pub mod ledger;
pub mod mapping;
pub mod merge;
pub mod policy;
pub mod reduce;
pub mod resolve;
pub mod signature;
pub mod state;
pub mod types;
