use thiserror::Error;

/// Which of the four required input tables a message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    EventLedger,
    StoreOrder,
    AliasTable,
    BillingLedger,
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InputKind::EventLedger => "event ledger",
            InputKind::StoreOrder => "store ordering list",
            InputKind::AliasTable => "tag/alias table",
            InputKind::BillingLedger => "billing ledger",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("required input dataset is missing or empty: {0}")]
    MissingInput(InputKind),

    #[error("store ordering list contains no usable store names")]
    EmptyStoreOrder,

    #[error("event ledger contains no record with a parseable date; cannot determine cutoff")]
    NoValidEventDates,

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
