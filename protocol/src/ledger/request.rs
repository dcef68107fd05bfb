//! Typed request objects and the `{method, params}` envelope.
//!
//! Decoding is lenient: a string field that is absent, `null` or of the
//! wrong JSON type decodes as empty, and a list or object of the wrong type
//! decodes as empty too. The protocol checks then reject it at the point
//! the ledger would, with that check's error kind, so a malformed body never
//! pre-empts `AlreadyIssued`, `SourceAccountNotFound` or `TokenNotFound`.

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{LedgerError, LedgerResult};
use crate::config::{METHOD_ISSUE, METHOD_RANGEPROOF_VERIFY, METHOD_TALLY_VERIFY, METHOD_TRANSFER};

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// Parameters of the one-time genesis mint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub symbol: String,
    #[serde(default, deserialize_with = "lenient_object")]
    pub token: IssueToken,
}

/// The genesis token as submitted by the issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueToken {
    #[serde(default, deserialize_with = "lenient_string")]
    pub commit: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub range_proof: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub from_pubkey: String,
    /// Not required at issuance; stored as given.
    #[serde(default, deserialize_with = "lenient_string")]
    pub encrypt_value: String,
}

impl IssueRequest {
    /// Name, symbol, commitment, range proof and committer key must all be
    /// present and non-empty.
    pub fn validate(&self) -> LedgerResult<()> {
        let required = [
            ("name", &self.name),
            ("symbol", &self.symbol),
            ("token.commit", &self.token.commit),
            ("token.range_proof", &self.token.range_proof),
            ("token.from_pubkey", &self.token.from_pubkey),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(LedgerError::InvalidArguments(format!(
                    "{field} must be a non-empty string"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transfer
// ---------------------------------------------------------------------------

/// Parameters of a confidential transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    #[serde(default, deserialize_with = "lenient_list")]
    pub inputs: Vec<InputRef>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub outputs: Vec<OutputSpec>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub excess_sig: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub excess_msg: String,
}

/// A token the caller wants to spend, named by id.
///
/// The id is kept as sent. Only a string can name a token, so any other
/// JSON value resolves to `TokenNotFound`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRef {
    #[serde(default)]
    pub id: Value,
}

impl InputRef {
    /// The id as a string, if it is one.
    pub fn raw_id(&self) -> Option<&str> {
        self.id.as_str()
    }
}

/// A token the caller wants created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    #[serde(default, deserialize_with = "lenient_string")]
    pub commit: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub encrypt_value: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub from_pubkey: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub range_proof: String,
    /// Destination account id.
    #[serde(default, deserialize_with = "lenient_string")]
    pub to: String,
}

impl TransferRequest {
    /// Stage 1 shape check. Runs before any state is read.
    pub fn validate_shape(&self) -> LedgerResult<()> {
        if self.inputs.is_empty() {
            return Err(LedgerError::InvalidArguments(
                "inputs must be a non-empty list".into(),
            ));
        }
        if self.outputs.is_empty() {
            return Err(LedgerError::InvalidArguments(
                "outputs must be a non-empty list".into(),
            ));
        }
        if self.excess_sig.is_empty() {
            return Err(LedgerError::InvalidArguments(
                "excess_sig must be a non-empty string".into(),
            ));
        }
        if self.excess_msg.is_empty() {
            return Err(LedgerError::InvalidArguments(
                "excess_msg must be a non-empty string".into(),
            ));
        }
        Ok(())
    }
}

impl OutputSpec {
    /// Every field of an output must be a non-empty string.
    pub fn validate(&self, index: usize) -> LedgerResult<()> {
        let required = [
            ("commit", &self.commit),
            ("encrypt_value", &self.encrypt_value),
            ("from_pubkey", &self.from_pubkey),
            ("range_proof", &self.range_proof),
            ("to", &self.to),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(LedgerError::InvalidTokenFormat(format!(
                    "output {index}: {field} must be a non-empty string"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Parameters of the standalone tally check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyVerifyRequest {
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub excess_msg: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub excess_sig: String,
}

/// Parameters of the standalone range-proof check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeproofVerifyRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub commit: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub proof: String,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A decoded `{method, params}` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Issue(IssueRequest),
    Transfer(TransferRequest),
    TallyVerify(TallyVerifyRequest),
    RangeproofVerify(RangeproofVerifyRequest),
}

#[derive(Deserialize)]
struct Envelope {
    method: String,
    #[serde(default)]
    params: Value,
}

impl Request {
    /// Decode a request from its JSON text.
    pub fn parse(input: &str) -> LedgerResult<Request> {
        let value: serde_json::Value = serde_json::from_str(input)
            .map_err(|e| LedgerError::InvalidArguments(format!("malformed request: {e}")))?;
        Self::from_value(value)
    }

    /// Decode a request from an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> LedgerResult<Request> {
        let envelope: Envelope = serde_json::from_value(value)
            .map_err(|e| LedgerError::InvalidArguments(format!("malformed request: {e}")))?;

        match envelope.method.as_str() {
            METHOD_ISSUE => decode_params(envelope.params).map(Request::Issue),
            METHOD_TRANSFER => decode_params(envelope.params).map(Request::Transfer),
            METHOD_TALLY_VERIFY => decode_params(envelope.params).map(Request::TallyVerify),
            METHOD_RANGEPROOF_VERIFY => {
                decode_params(envelope.params).map(Request::RangeproofVerify)
            }
            _ => Err(LedgerError::UnknownMethod(envelope.method)),
        }
    }

    /// Wire name of the method.
    pub fn method(&self) -> &'static str {
        match self {
            Request::Issue(_) => METHOD_ISSUE,
            Request::Transfer(_) => METHOD_TRANSFER,
            Request::TallyVerify(_) => METHOD_TALLY_VERIFY,
            Request::RangeproofVerify(_) => METHOD_RANGEPROOF_VERIFY,
        }
    }

    /// Re-encode as a `{method, params}` JSON value.
    pub fn to_value(&self) -> serde_json::Value {
        let params = match self {
            Request::Issue(p) => serde_json::to_value(p),
            Request::Transfer(p) => serde_json::to_value(p),
            Request::TallyVerify(p) => serde_json::to_value(p),
            Request::RangeproofVerify(p) => serde_json::to_value(p),
        }
        .unwrap_or(Value::Null);
        serde_json::json!({ "method": self.method(), "params": params })
    }
}

/// Params that are not an object decode as the all-empty request.
fn decode_params<T: DeserializeOwned + Default>(params: Value) -> LedgerResult<T> {
    if !params.is_object() {
        return Ok(T::default());
    }
    serde_json::from_value(params)
        .map_err(|e| LedgerError::InvalidArguments(format!("invalid params: {e}")))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).map_err(D::Error::custom),
        _ => Ok(T::default()),
    }
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(_) => serde_json::from_value(item).map_err(D::Error::custom),
                _ => Ok(T::default()),
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output() -> OutputSpec {
        OutputSpec {
            commit: "C1".into(),
            encrypt_value: "E1".into(),
            from_pubkey: "K1".into(),
            range_proof: "P1".into(),
            to: "bob".into(),
        }
    }

    #[test]
    fn parses_issue_envelope() {
        let input = r#"{"method":"issue","params":{"name":"Coin","symbol":"COIN",
            "token":{"commit":"C0","range_proof":"P0","from_pubkey":"K0","encrypt_value":"E0"}}}"#;
        let request = Request::parse(input).unwrap();
        let Request::Issue(issue) = request else {
            panic!("expected issue request");
        };
        assert_eq!(issue.name, "Coin");
        assert_eq!(issue.token.encrypt_value, "E0");
        assert!(issue.validate().is_ok());
    }

    #[test]
    fn unknown_method_is_reported_by_name() {
        let err = Request::parse(r#"{"method":"burn","params":{}}"#).unwrap_err();
        assert!(matches!(err, LedgerError::UnknownMethod(ref m) if m == "burn"));
    }

    #[test]
    fn malformed_json_is_invalid_arguments() {
        assert!(matches!(
            Request::parse("{not json").unwrap_err(),
            LedgerError::InvalidArguments(_)
        ));
        assert!(matches!(
            Request::parse(r#"{"params":{}}"#).unwrap_err(),
            LedgerError::InvalidArguments(_)
        ));
    }

    #[test]
    fn wrong_list_type_fails_the_shape_check() {
        let value = json!({"method": "transfer", "params": {"inputs": "1"}});
        let Request::Transfer(transfer) = Request::from_value(value).unwrap() else {
            panic!("expected transfer request");
        };
        assert!(transfer.inputs.is_empty());
        assert!(matches!(
            transfer.validate_shape().unwrap_err(),
            LedgerError::InvalidArguments(ref m) if m.contains("inputs")
        ));
    }

    #[test]
    fn issue_decodes_from_any_params() {
        for params in [json!({}), json!(null), json!(5), json!({"token": {"commit": 5}}), json!({"token": "C0"})] {
            let value = json!({"method": "issue", "params": params});
            let Request::Issue(issue) = Request::from_value(value).unwrap() else {
                panic!("expected issue request");
            };
            assert!(issue.token.commit.is_empty());
            assert!(matches!(issue.validate().unwrap_err(), LedgerError::InvalidArguments(_)));
        }
    }

    #[test]
    fn mistyped_output_field_is_invalid_token_format() {
        let value = json!({"method": "transfer", "params": {
            "inputs": [{"id": "1"}],
            "outputs": [
                {"commit": "C1", "encrypt_value": "E1", "from_pubkey": "K1", "range_proof": "P1", "to": 5},
                {"commit": null, "encrypt_value": "E1", "from_pubkey": "K1", "range_proof": "P1", "to": "bob"},
                7
            ],
            "excess_msg": "m",
            "excess_sig": "s"
        }});
        let Request::Transfer(transfer) = Request::from_value(value).unwrap() else {
            panic!("expected transfer request");
        };
        assert!(transfer.validate_shape().is_ok());
        assert_eq!(transfer.outputs.len(), 3);

        let err = transfer.outputs[0].validate(0).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTokenFormat(ref m) if m.contains("to")));
        let err = transfer.outputs[1].validate(1).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTokenFormat(ref m) if m.contains("commit")));
        assert!(matches!(
            transfer.outputs[2].validate(2).unwrap_err(),
            LedgerError::InvalidTokenFormat(_)
        ));
    }

    #[test]
    fn non_string_input_id_is_kept_as_sent() {
        let value = json!({"inputs": [{"id": 1}, {"id": "2"}, "3"]});
        let transfer: TransferRequest = serde_json::from_value(value).unwrap();
        assert_eq!(transfer.inputs[0].raw_id(), None);
        assert_eq!(transfer.inputs[1].raw_id(), Some("2"));
        assert_eq!(transfer.inputs[2].raw_id(), None);
    }

    #[test]
    fn issue_without_symbol_fails_validation() {
        let value = json!({"method": "issue", "params": {
            "name": "Coin",
            "token": {"commit": "C0", "range_proof": "P0", "from_pubkey": "K0"}
        }});
        let Request::Issue(issue) = Request::from_value(value).unwrap() else {
            panic!("expected issue request");
        };
        assert!(matches!(
            issue.validate().unwrap_err(),
            LedgerError::InvalidArguments(ref m) if m.contains("symbol")
        ));
    }

    #[test]
    fn transfer_shape_checks() {
        let mut request = TransferRequest {
            inputs: vec![InputRef { id: "1".into() }],
            outputs: vec![output()],
            excess_sig: "sig".into(),
            excess_msg: "msg".into(),
        };
        assert!(request.validate_shape().is_ok());

        request.excess_msg.clear();
        assert!(matches!(
            request.validate_shape().unwrap_err(),
            LedgerError::InvalidArguments(_)
        ));

        request.excess_msg = "msg".into();
        request.inputs.clear();
        assert!(request.validate_shape().is_err());
    }

    #[test]
    fn output_missing_destination_is_invalid_token_format() {
        let value = json!({"commit": "C1", "encrypt_value": "E1", "from_pubkey": "K1", "range_proof": "P1"});
        let spec: OutputSpec = serde_json::from_value(value).unwrap();
        let err = spec.validate(3).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTokenFormat(ref m) if m.contains("output 3") && m.contains("to")));
    }

    #[test]
    fn to_value_round_trips_through_parse() {
        let request = Request::RangeproofVerify(RangeproofVerifyRequest {
            commit: "C".into(),
            proof: "P".into(),
        });
        let back = Request::from_value(request.to_value()).unwrap();
        assert_eq!(back, request);
    }
}
