use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A purchase attempt, from checkout to gateway settlement.
///
/// `out_trade_no` is our id as seen by the gateway and doubles as the
/// idempotency key for notifications. `trade_no` is the gateway's own id,
/// known only once the order settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub out_trade_no: String,
    /// Auth backend subject that created the order
    pub user_id: String,
    pub name: String,
    /// Two-decimal amount as sent to the gateway
    pub money: Decimal,
    pub payment_type: PaymentType,
    /// Opaque caller metadata (e.g. which plan was bought)
    pub param: serde_json::Value,
    pub status: OrderStatus,
    pub trade_no: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn is_settled(&self) -> bool {
        self.status == OrderStatus::Success
    }
}

/// Data required to create a new order
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub name: String,
    pub money: Decimal,
    pub payment_type: PaymentType,
    pub param: serde_json::Value,
}

/// Order lifecycle. The only transition is `Pending -> Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Success,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            _ => Err(format!("unknown order status: {}", s)),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment method offered on the gateway's cashier page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    #[default]
    Alipay,
    Wxpay,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alipay => "alipay",
            Self::Wxpay => "wxpay",
        }
    }
}

impl std::str::FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alipay" => Ok(Self::Alipay),
            "wxpay" => Ok(Self::Wxpay),
            _ => Err(format!("unknown payment type: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
