//! FFI Layer for micropay-core
//!
//! All C-ABI exports are defined here. Every function follows one pattern:
//! - Input: JSON string (null-terminated C string)
//! - Output: JSON string (must be freed with `micropay_free_string`)
//!
//! Error handling: every response carries a `success` field. On error,
//! `success: false` and `error` holds the code and a generic message; the
//! detailed message never crosses the boundary.

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::assets::{parse_unit, AssetQuantityVector, Unit};
use crate::authorization::{authorize_spend, build_spend_authorization, SpendRequest};
use crate::balances::{reconcile, reconcile_funds, StaticAssetRegistry, StaticPriceFeed};
use crate::codec::{encode, EncodedValue, Shape, Value};
use crate::error::{CoreError, CoreResult};
use crate::types::{ApiResponse, FundReference, FundsSnapshot, Network};
use crate::wallet::{validate_phrase, DerivationPath, SigningService};
use crate::log_debug;

const MODULE: &str = "ffi";

// =============================================================================
// Memory Management
// =============================================================================

/// Free a string returned by any micropay_* function
///
/// # Safety
/// The pointer must have been returned by a micropay_* function and not freed
/// before.
#[no_mangle]
pub unsafe extern "C" fn micropay_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    drop(CString::from_raw(s));
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Borrow the C string as UTF-8
///
/// # Safety
/// `input` must be null or point to a valid null-terminated string that
/// outlives the returned slice.
unsafe fn parse_input<'a>(input: *const c_char) -> CoreResult<&'a str> {
    if input.is_null() {
        return Err(CoreError::invalid_input("Null input pointer"));
    }
    CStr::from_ptr(input)
        .to_str()
        .map_err(|_| CoreError::invalid_input("Invalid UTF-8 string"))
}

fn parse_request<'a, T: Deserialize<'a>>(json: &'a str) -> CoreResult<T> {
    serde_json::from_str(json).map_err(|e| CoreError::parse_error(format!("Invalid JSON: {}", e)))
}

/// Run `handler` on the decoded input and wrap the result in the envelope
fn respond<T, F>(operation: &'static str, input: *const c_char, handler: F) -> *mut c_char
where
    T: Serialize,
    F: FnOnce(&str) -> CoreResult<T>,
{
    // SAFETY: callers pass a valid C string; null is handled by parse_input
    let result = unsafe { parse_input(input) }.and_then(handler);
    match result {
        Ok(data) => string_to_ptr(ApiResponse::ok(data).to_json()),
        Err(error) => {
            log_debug!(MODULE, "call failed", operation = operation, code = format!("{:?}", error.code));
            string_to_ptr(ApiResponse::<()>::err(&error).to_json())
        }
    }
}

fn string_to_ptr(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_str) => c_str.into_raw(),
        Err(_) => CString::new(
            r#"{"success":false,"data":null,"error":{"code":"internal","message":"Something went wrong."}}"#,
        )
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut()),
    }
}

// =============================================================================
// Codec
// =============================================================================

#[derive(Deserialize)]
struct EncodeRequest {
    /// CIP-57 schema; may carry `definitions` for `$ref`s
    schema: serde_json::Value,
    value: serde_json::Value,
    #[serde(default = "default_true")]
    canonical: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize)]
struct EncodedResponse {
    cbor: String,
}

/// Encode a value against a blueprint schema
///
/// # Input
/// ```json
/// { "schema": { "dataType": "list", "items": { "dataType": "integer" } },
///   "value": [1, 2], "canonical": true }
/// ```
///
/// # Output
/// ```json
/// { "success": true, "data": { "cbor": "820102" } }
/// ```
#[no_mangle]
pub extern "C" fn micropay_encode_data(input: *const c_char) -> *mut c_char {
    respond("encode_data", input, |json| {
        let request: EncodeRequest = parse_request(json)?;
        let shape = Shape::from_blueprint_json(&request.schema.to_string())?;
        let value = Value::from_json(&request.value)?;
        let encoded = encode(&value, &shape, request.canonical)?;
        Ok(EncodedResponse {
            cbor: encoded.to_hex(),
        })
    })
}

#[derive(Deserialize)]
struct DecodeRequest {
    cbor: String,
}

/// Decode CBOR hex into the detailed JSON form of the datum
#[no_mangle]
pub extern "C" fn micropay_decode_data(input: *const c_char) -> *mut c_char {
    respond("decode_data", input, |json| {
        let request: DecodeRequest = parse_request(json)?;
        let data = EncodedValue::from_hex(&request.cbor)?.to_data()?;
        Ok(data.to_json())
    })
}

// =============================================================================
// Assets
// =============================================================================

#[derive(Deserialize)]
struct UnitRequest {
    unit: String,
}

#[derive(Serialize)]
struct UnitResponse {
    #[serde(flatten)]
    unit: Unit,
    label: Option<u16>,
    name: Option<String>,
}

impl UnitResponse {
    fn from_unit(unit: Unit) -> Self {
        Self {
            label: unit.label(),
            name: unit.name().map(str::to_string),
            unit,
        }
    }
}

/// Split an asset unit into group id and sub-name
#[no_mangle]
pub extern "C" fn micropay_parse_unit(input: *const c_char) -> *mut c_char {
    respond("parse_unit", input, |json| {
        let request: UnitRequest = parse_request(json)?;
        Ok(UnitResponse::from_unit(parse_unit(&request.unit)))
    })
}

// =============================================================================
// Wallet
// =============================================================================

#[derive(Deserialize)]
struct PhraseRequest {
    phrase: String,
}

#[derive(Serialize)]
struct PhraseResponse {
    valid: bool,
}

/// Validate a recovery phrase; the response never echoes it
#[no_mangle]
pub extern "C" fn micropay_validate_phrase(input: *const c_char) -> *mut c_char {
    respond("validate_phrase", input, |json| {
        let request: PhraseRequest = parse_request(json)?;
        let phrase = SecretString::from(request.phrase);
        validate_phrase(&phrase)?;
        Ok(PhraseResponse { valid: true })
    })
}

// =============================================================================
// Authorization
// =============================================================================

#[derive(Deserialize)]
struct BuildRequest {
    fund: FundReference,
    amount: AssetQuantityVector,
    /// Hex key hashes: payment, then optional stake
    destination_key_hashes: Vec<String>,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

/// Build the canonical spend-authorization message
#[no_mangle]
pub extern "C" fn micropay_build_spend_authorization(input: *const c_char) -> *mut c_char {
    respond("build_spend_authorization", input, |json| {
        let request: BuildRequest = parse_request(json)?;
        let hashes = request
            .destination_key_hashes
            .iter()
            .map(hex::decode)
            .collect::<Result<Vec<_>, _>>()?;
        let message = build_spend_authorization(&request.fund, &request.amount, &hashes)?;
        Ok(MessageResponse {
            message: message.to_hex(),
        })
    })
}

#[derive(Deserialize)]
struct AuthorizeRequest {
    phrase: String,
    #[serde(default)]
    network: Network,
    #[serde(default)]
    path: Option<DerivationPath>,
    #[serde(flatten)]
    spend: SpendRequest,
}

/// Derive, sign and return the settlement envelope
///
/// # Input
/// ```json
/// { "phrase": "...", "network": "preprod", "path": "m/1852'/1815'/0'/0/0",
///   "fund": { "hash": "<64 hex>", "index": 0 },
///   "amount": { "lovelace": "2000000" },
///   "merchant_address": "addr_test1..." }
/// ```
#[no_mangle]
pub extern "C" fn micropay_authorize_spend(input: *const c_char) -> *mut c_char {
    respond("authorize_spend", input, |json| {
        let request: AuthorizeRequest = parse_request(json)?;
        let phrase = SecretString::from(request.phrase);
        let path = match request.path {
            Some(path) => path,
            None => DerivationPath::payment(0)?,
        };
        let service = SigningService::new(request.network);
        Ok(authorize_spend(&service, &phrase, &path, &request.spend)?)
    })
}

// =============================================================================
// Balances
// =============================================================================

#[derive(Deserialize)]
struct ReconcileRequest {
    /// Full funds response; takes precedence over `l1`/`l2`
    #[serde(default)]
    funds: Option<FundsSnapshot>,
    #[serde(default)]
    l1: AssetQuantityVector,
    #[serde(default)]
    l2: AssetQuantityVector,
    /// Extra decimals on top of the built-in registry
    #[serde(default)]
    decimals: HashMap<String, u32>,
    /// USD rate per whole unit
    #[serde(default)]
    prices: HashMap<String, Decimal>,
}

/// Merge L1 and L2 totals into a priced balance snapshot
#[no_mangle]
pub extern "C" fn micropay_reconcile(input: *const c_char) -> *mut c_char {
    respond("reconcile", input, |json| {
        let request: ReconcileRequest = parse_request(json)?;

        let mut registry = StaticAssetRegistry::new();
        for (unit, decimals) in request.decimals {
            registry.set_decimals(unit, decimals);
        }
        let mut prices = StaticPriceFeed::new();
        for (unit, rate) in request.prices {
            prices.insert(unit, rate);
        }

        Ok(match request.funds {
            Some(funds) => reconcile_funds(&funds, &registry, &prices),
            None => reconcile(&request.l1, &request.l2, &registry, &prices),
        })
    })
}
