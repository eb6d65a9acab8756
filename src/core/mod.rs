pub mod dashboard;
pub mod dataset;
pub mod directory;
pub mod export;
pub mod import;
pub mod settlement;
pub mod transfer;

// Flat public surface for domain types and functions.
pub use dashboard::{summarize, DashboardSummary};
#[allow(unused_imports)]
pub use dataset::{read_dataset_json, write_dataset_json, Dataset, DatasetError};
#[allow(unused_imports)]
pub use directory::{Company, Directory, Driver, Party, Rates};
pub use export::{write_transfers_csv, EXPORT_COLUMNS};
#[allow(unused_imports)]
pub use import::{import_transfers, ImportResult, InvalidRow, RowError, REQUIRED_COLUMNS};
pub use settlement::{
    settle, BillingRules, PartyKind, Settlement, SettlementRow, Statement, TripPart,
};
#[allow(unused_imports)]
pub use transfer::{Transfer, TransferStatus, TripType};
