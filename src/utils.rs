use axum::http::StatusCode;
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};

use crate::constants::*;
use crate::database::{Db, get_user_db};
use crate::models::DATE_FORMAT;

pub type ApiError = (StatusCode, String);
pub type ApiResult<T> = Result<T, ApiError>;

/// Opens the ledger of `user_id`. The id always comes from the caller's
/// session; nothing here looks at request state.
pub async fn get_user_database(data_path: &str, user_id: &str) -> ApiResult<Db> {
    get_user_db(data_path, user_id).await.map_err(|e| {
        tracing::error!(user_id, error = %e, "failed to open user database");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ERR_DATABASE_ACCESS.to_string(),
        )
    })
}

pub fn db_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ERR_DATABASE_OPERATION.to_string(),
    )
}

pub fn db_error_with_context(context: &str) -> ApiError {
    tracing::error!(context, "database error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Database error: {}", context),
    )
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, message.into())
}

pub fn not_found(entity: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("{} not found", entity))
}

pub fn conflict(message: impl Into<String>) -> ApiError {
    (StatusCode::CONFLICT, message.into())
}

pub fn validate_string_length(value: &str, field_name: &str, max_length: usize) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(bad_request(format!("{} cannot be empty", field_name)));
    }
    if value.trim().chars().count() > max_length {
        return Err(bad_request(format!(
            "{} must be at most {} characters",
            field_name, max_length
        )));
    }
    Ok(())
}

/// Checks a money value fits a `DECIMAL(15, 2)` column.
pub fn validate_money(value: Decimal, field_name: &str) -> ApiResult<()> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(bad_request(format!(
            "{} cannot have more than {} decimal places",
            field_name, MONEY_SCALE
        )));
    }
    if !is_within_money_limit(value) {
        return Err(bad_request(format!(
            "{} cannot have more than {} digits",
            field_name, MAX_MONEY_DIGITS
        )));
    }
    Ok(())
}

/// True when `value` has no more integer digits than a money column allows.
pub fn is_within_money_limit(value: Decimal) -> bool {
    value.abs() < Decimal::from(10_i64.pow(MAX_MONEY_DIGITS - MONEY_SCALE))
}

/// Normalises a validated money value to exactly two fractional digits.
pub fn to_money(value: Decimal) -> Decimal {
    let mut value = value;
    value.rescale(MONEY_SCALE);
    value
}

pub fn parse_money(raw: &str) -> ApiResult<Decimal> {
    raw.parse::<Decimal>()
        .map_err(|_| db_error_with_context("invalid stored amount"))
}

pub fn format_date(date: Date) -> ApiResult<String> {
    date.format(DATE_FORMAT)
        .map_err(|_| db_error_with_context("failed to format date"))
}

pub fn parse_date(raw: &str) -> ApiResult<Date> {
    Date::parse(raw, DATE_FORMAT).map_err(|_| db_error_with_context("invalid stored date"))
}

pub fn now_timestamp() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

pub fn validate_limit(limit: Option<u32>, default: u32) -> ApiResult<u32> {
    match limit {
        Some(0) => Err(bad_request("Limit must be greater than 0")),
        Some(l) if l > MAX_LIMIT => Err(bad_request(format!("Limit cannot exceed {}", MAX_LIMIT))),
        Some(l) => Ok(l),
        None => Ok(default),
    }
}

pub fn validate_transactions_limit(limit: Option<u32>) -> ApiResult<u32> {
    validate_limit(limit, DEFAULT_TRANSACTIONS_LIMIT)
}

pub fn validate_offset(offset: Option<u32>) -> ApiResult<u32> {
    match offset {
        Some(o) if o > MAX_OFFSET => Err(bad_request(format!(
            "Offset cannot exceed {}",
            MAX_OFFSET
        ))),
        Some(o) => Ok(o),
        None => Ok(0),
    }
}
