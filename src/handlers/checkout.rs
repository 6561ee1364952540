use axum::{Extension, Router, extract::State, middleware, routing::post};
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};
use crate::extractors::Json;
use crate::jwt::SessionUser;
use crate::middleware::require_session;
use crate::models::{CreateOrder, PaymentType, parse_request_amount};
use crate::payments::ZpayClient;

/// Longest accepted product name, in characters.
pub const MAX_NAME_CHARS: usize = 128;

/// Plan purchase request from the pricing page.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// JSON number or numeric string
    #[serde(default)]
    pub money: Option<serde_json::Value>,
    /// `alipay` (default) or `wxpay`
    #[serde(default, rename = "type")]
    pub payment_type: Option<String>,
    /// Opaque metadata stored with the order
    #[serde(default)]
    pub param: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub payment_url: String,
    pub out_trade_no: String,
}

impl CheckoutRequest {
    fn into_create_order(self) -> Result<CreateOrder> {
        let name = self.name.as_deref().map(str::trim).unwrap_or_default();
        let money = self.money.as_ref().filter(|m| !m.is_null());

        let Some(money) = money.filter(|_| !name.is_empty()) else {
            return Err(AppError::BadRequest(msg::MISSING_NAME_OR_MONEY.into()));
        };

        if name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::BadRequest(msg::NAME_TOO_LONG.into()));
        }

        let money = parse_request_amount(money)
            .filter(|m| m.is_sign_positive() && !m.is_zero())
            .ok_or_else(|| AppError::BadRequest(msg::INVALID_AMOUNT.into()))?;

        let payment_type = match self.payment_type.as_deref().map(str::trim) {
            None | Some("") => PaymentType::default(),
            Some(t) => t
                .parse::<PaymentType>()
                .map_err(|_| AppError::BadRequest(msg::INVALID_PAYMENT_TYPE.into()))?,
        };

        let param = match self.param {
            None | Some(serde_json::Value::Null) => serde_json::json!({}),
            Some(p) => p,
        };

        Ok(CreateOrder {
            name: name.to_string(),
            money,
            payment_type,
            param,
        })
    }
}

/// POST /api/checkout/providers/zpay
///
/// Records a pending order for the caller and returns the signed cashier URL
/// to redirect the browser to.
pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let input = request.into_create_order()?;

    // Fail before writing anything if the merchant isn't set up
    let client = ZpayClient::new(state.gateway.credentials()?);

    let conn = state.db.get()?;
    let order = queries::create_order(&conn, &user.user_id, &input)?;

    let payment_url = client.checkout_url(&order)?;

    tracing::info!(
        "Created order {} for user {}: {} {} via {}",
        order.out_trade_no,
        order.user_id,
        order.name,
        order.money,
        order.payment_type
    );

    Ok(Json(CheckoutResponse {
        payment_url: payment_url.into(),
        out_trade_no: order.out_trade_no,
    }))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/checkout/providers/zpay", post(create_checkout))
        .layer(middleware::from_fn_with_state(state, require_session))
}
