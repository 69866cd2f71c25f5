//! JSON wire format spoken by the K2 backend.
//!
//! Each CT-API function maps onto a `POST {base_url}{function}/{ctn}/{pn}` request.
//! `ct_init` and `ct_close` carry no body and answer with the bare status code as text,
//! while `ct_data` exchanges JSON objects whose binary fields are base64 encoded.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::status::{self, Status};

/// A backend endpoint, one per CT-API function.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Init,
    Data,
    Close,
}

impl Endpoint {
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Init => "ct_init",
            Endpoint::Data => "ct_data",
            Endpoint::Close => "ct_close",
        }
    }

    /// Builds the request path relative to the base URL.
    pub fn path(self, ctn: u16, pn: u16) -> String {
        format!("{}/{}/{}", self.name(), ctn, pn)
    }
}

/// Body of a `ct_data` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataRequest {
    pub dad: u8,
    pub sad: u8,
    pub lenc: u16,
    pub command: String,
    pub lenr: u16,
}

impl DataRequest {
    /// `lenr` is the capacity of the caller's response buffer.
    pub fn new(dad: u8, sad: u8, command: &[u8], lenr: u16) -> Self {
        Self {
            dad,
            sad,
            lenc: u16::try_from(command.len()).unwrap_or(u16::MAX),
            command: BASE64.encode(command),
            lenr,
        }
    }
}

/// Status code as it appears in JSON; backends disagree on number vs. string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCode {
    Number(i64),
    Text(String),
}

impl RawCode {
    fn validate(&self) -> Status {
        match self {
            RawCode::Number(n) => status::validate(&n.to_string()),
            RawCode::Text(s) => status::validate(s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDataResponse {
    dad: u8,
    sad: u8,
    lenr: u16,
    response: String,
    #[serde(rename = "responseCode")]
    response_code: RawCode,
}

/// Decoded body of a `ct_data` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataResponse {
    pub dad: u8,
    pub sad: u8,
    pub lenr: u16,
    pub response: Vec<u8>,
    pub status: Status,
}

impl DataResponse {
    /// Parses the response body. Missing fields, wrong types and broken base64 are errors.
    pub fn decode(body: &str) -> Result<Self> {
        let raw: RawDataResponse = serde_json::from_str(body)?;
        let response = BASE64.decode(raw.response.as_bytes())?;

        Ok(Self {
            dad: raw.dad,
            sad: raw.sad,
            lenr: raw.lenr,
            response,
            status: raw.response_code.validate(),
        })
    }
}

/// Parses the body of a `ct_init` or `ct_close` response.
pub fn decode_status(body: &str) -> Status {
    status::validate(body)
}
