/*
[INPUT]:  Inbound frames carrying a `code` and optional `message`
[OUTPUT]: A classified StreamError, or None for success frames
[POS]:    WebSocket layer - server error code tables
[UPDATE]: When the exchange documents new error codes
*/

use serde_json::Value;

use crate::error::{ExchangeErrorKind, StreamError};
use crate::types::parse::{integer_field, string_field};

const EXACT: &[(i64, ExchangeErrorKind)] = &[
    (10001, ExchangeErrorKind::Generic),
    (10002, ExchangeErrorKind::Authentication),
    (10003, ExchangeErrorKind::PermissionDenied),
    (10004, ExchangeErrorKind::BadRequest),
    (10005, ExchangeErrorKind::PermissionDenied),
    (10006, ExchangeErrorKind::RateLimit),
    (10007, ExchangeErrorKind::InvalidNonce),
    (10008, ExchangeErrorKind::BadRequest),
    (10009, ExchangeErrorKind::BadRequest),
    (20001, ExchangeErrorKind::BadRequest),
    (20002, ExchangeErrorKind::InsufficientFunds),
    (30003, ExchangeErrorKind::BadSymbol),
    (30004, ExchangeErrorKind::BadRequest),
    (30005, ExchangeErrorKind::BadRequest),
    (30006, ExchangeErrorKind::InvalidOrder),
    (30007, ExchangeErrorKind::InvalidOrder),
    (30008, ExchangeErrorKind::InvalidOrder),
    (30009, ExchangeErrorKind::InvalidOrder),
    (30010, ExchangeErrorKind::BadRequest),
    (30013, ExchangeErrorKind::InvalidOrder),
    (30014, ExchangeErrorKind::InvalidOrder),
    (30016, ExchangeErrorKind::InvalidOrder),
    (30017, ExchangeErrorKind::InvalidOrder),
    (30023, ExchangeErrorKind::InvalidOrder),
    (30024, ExchangeErrorKind::InvalidOrder),
    (30025, ExchangeErrorKind::InvalidOrder),
    (40001, ExchangeErrorKind::BadRequest),
    (40002, ExchangeErrorKind::BadRequest),
    (40003, ExchangeErrorKind::BadRequest),
    (40004, ExchangeErrorKind::BadRequest),
    (40005, ExchangeErrorKind::BadRequest),
    (40006, ExchangeErrorKind::BadRequest),
    (40007, ExchangeErrorKind::BadRequest),
    (40101, ExchangeErrorKind::Authentication),
    (50001, ExchangeErrorKind::BadRequest),
    (9010001, ExchangeErrorKind::OnMaintenance),
];

const BROAD: &[(&str, ExchangeErrorKind)] = &[
    ("UNAUTHORIZED", ExchangeErrorKind::Authentication),
    ("Authentication failure", ExchangeErrorKind::Authentication),
    ("TOO_MANY_REQUESTS", ExchangeErrorKind::RateLimit),
    ("SYSTEM_MAINTENANCE", ExchangeErrorKind::OnMaintenance),
    ("invalid channel", ExchangeErrorKind::BadRequest),
];

pub fn exact_kind(code: i64) -> Option<ExchangeErrorKind> {
    EXACT
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, kind)| *kind)
}

pub fn broad_kind(message: &str) -> Option<ExchangeErrorKind> {
    BROAD
        .iter()
        .find(|(needle, _)| message.contains(needle))
        .map(|(_, kind)| *kind)
}

/// Error carried by `frame`; exact code first, then message text, else generic.
pub fn classify(frame: &Value) -> Option<StreamError> {
    let code = integer_field(frame, "code").unwrap_or(0);
    if code == 0 {
        return None;
    }
    let message = string_field(frame, "message");
    let kind = exact_kind(code)
        .or_else(|| message.as_deref().and_then(broad_kind))
        .unwrap_or(ExchangeErrorKind::Generic);
    let feedback = message.unwrap_or_else(|| frame.to_string());
    Some(StreamError::from_exchange(kind, code, feedback))
}
