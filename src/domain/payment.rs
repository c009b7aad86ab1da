//! Mapping of payment gateway transaction reports onto order state.

/// Transaction status as reported by the gateway, either on the webhook or
/// the status endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    Capture,
    Settlement,
    Pending,
    Cancel,
    Deny,
    Expire,
    Other(String),
}

impl TransactionStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "capture" => Self::Capture,
            "settlement" => Self::Settlement,
            "pending" => Self::Pending,
            "cancel" => Self::Cancel,
            "deny" => Self::Deny,
            "expire" => Self::Expire,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Capture => "capture",
            Self::Settlement => "settlement",
            Self::Pending => "pending",
            Self::Cancel => "cancel",
            Self::Deny => "deny",
            Self::Expire => "expire",
            Self::Other(raw) => raw,
        }
    }
}

/// What the order should become after a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Paid,
    Failed,
    Pending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayReport {
    pub transaction_status: TransactionStatus,
    pub fraud_status: Option<String>,
}

impl GatewayReport {
    pub fn new(transaction_status: &str, fraud_status: Option<&str>) -> Self {
        Self {
            transaction_status: TransactionStatus::parse(transaction_status),
            fraud_status: fraud_status.map(str::trim).filter(|f| !f.is_empty()).map(str::to_lowercase),
        }
    }

    pub fn resolve(&self) -> Resolution {
        use TransactionStatus::*;
        match &self.transaction_status {
            Capture | Settlement => match self.fraud_status.as_deref() {
                None | Some("accept") => Resolution::Paid,
                Some(_) => Resolution::Pending,
            },
            Cancel | Deny | Expire => Resolution::Failed,
            Pending | Other(_) => Resolution::Pending,
        }
    }
}
