use url::Url;

use crate::config::GatewayCredentials;
use crate::error::{AppError, Result};
use crate::models::{Order, format_amount};
use crate::signature::{self, SIGN_PARAM, SIGN_TYPE_MD5, SIGN_TYPE_PARAM};

/// Path the gateway calls back on, relative to the public base URL.
pub const NOTIFY_PATH: &str = "/api/checkout/providers/zpay/webhook";
/// Where the gateway sends the shopper after paying.
pub const RETURN_PATH: &str = "/dashboard";

/// `trade_status` value reported for a completed payment.
pub const TRADE_SUCCESS: &str = "TRADE_SUCCESS";

/// Builds signed redirects to the Z-Pay cashier.
#[derive(Clone, Copy)]
pub struct ZpayClient<'a> {
    creds: GatewayCredentials<'a>,
}

impl<'a> ZpayClient<'a> {
    pub fn new(creds: GatewayCredentials<'a>) -> Self {
        Self { creds }
    }

    pub fn notify_url(&self) -> String {
        format!("{}{}", self.creds.app_url, NOTIFY_PATH)
    }

    pub fn return_url(&self) -> String {
        format!("{}{}", self.creds.app_url, RETURN_PATH)
    }

    /// Parameters sent to the gateway for `order`, in submission order,
    /// without the signature.
    pub fn checkout_params(&self, order: &Order) -> Vec<(&'static str, String)> {
        vec![
            ("pid", self.creds.merchant_id.to_string()),
            ("out_trade_no", order.out_trade_no.clone()),
            ("name", order.name.clone()),
            ("money", format_amount(order.money)),
            ("type", order.payment_type.as_str().to_string()),
            ("notify_url", self.notify_url()),
            ("return_url", self.return_url()),
            (SIGN_TYPE_PARAM, SIGN_TYPE_MD5.to_string()),
        ]
    }

    /// Full cashier URL for `order`, with `sign` appended last.
    pub fn checkout_url(&self, order: &Order) -> Result<Url> {
        let mut params = self.checkout_params(order);
        let sign = signature::sign(params.iter().map(|(k, v)| (*k, v)), self.creds.key);
        params.push((SIGN_PARAM, sign));

        Url::parse_with_params(self.creds.submit_url, &params)
            .map_err(|e| AppError::Internal(format!("Invalid gateway submit URL: {}", e)))
    }
}

/// Query parameters of an asynchronous payment notification.
///
/// Every received parameter is kept, since the signature covers all of them.
#[derive(Debug, Clone, Default)]
pub struct ZpayNotification {
    params: Vec<(String, String)>,
}

impl ZpayNotification {
    /// Decode a raw `application/x-www-form-urlencoded` query string.
    pub fn from_query(query: &str) -> Self {
        Self {
            params: url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    /// Value of `key`; the last occurrence wins, matching signature
    /// canonicalization.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`get`](Self::get), but blank values count as missing.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn trade_status(&self) -> Option<&str> {
        self.get("trade_status")
    }

    pub fn out_trade_no(&self) -> Option<&str> {
        self.get_non_empty("out_trade_no")
    }

    pub fn money(&self) -> Option<&str> {
        self.get_non_empty("money")
    }

    pub fn trade_no(&self) -> Option<&str> {
        self.get_non_empty("trade_no")
    }

    pub fn is_trade_success(&self) -> bool {
        self.trade_status() == Some(TRADE_SUCCESS)
    }

    /// Check the `sign` parameter against the rest of the notification.
    pub fn verify(&self, key: &str) -> bool {
        let provided = self.get(SIGN_PARAM).unwrap_or_default();
        signature::verify(
            self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            key,
            provided,
        )
    }
}
