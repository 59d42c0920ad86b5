//! Services built on top of the stores and backends.

mod transfer;

pub use transfer::{ExportReport, ImportReport, RowError, TransferService};
