//! Balance reconciliation
//!
//! Merges the per-asset totals reported for the base ledger (L1) and the head
//! ledger (L2) into one decimal-normalized, USD-priced view.

mod reconciler;
mod sources;

pub use reconciler::*;
pub use sources::*;
