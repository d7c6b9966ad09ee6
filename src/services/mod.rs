mod backfill;
mod on_demand;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use backfill::{Backfill, BackfillSummary};
pub use on_demand::{OnDemandTranslator, TranslateRequest, TranslateResponse};
pub use worker::{BatchSummary, DrainSummary, QueueWorker};
