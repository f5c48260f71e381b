//! JSON-RPC gateway channel.
//!
//! Every call is an HTTP POST of one JSON object to the gateway:
//!
//! ```text
//! {"action": "query",  "program_id": "0x..", "method": "BalanceOf", "args": ["0x.."]}
//! {"action": "submit", "program_id": "0x..", "method": "Transfer", "args": [...], "account": "0x.."}
//! ```
//!
//! The gateway answers `{"result": ...}` or `{"error": "..."}`. Signing and
//! fee payment happen on the gateway side for the given account.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use vft_types::{Address, Operation, ProgramId, Receipt};

use crate::channel::{QueryMethod, RemoteChannel};
use crate::config::ClientConfig;
use crate::error::ChannelError;

/// [`RemoteChannel`] over the gateway's JSON-RPC endpoint.
#[derive(Clone)]
pub struct RpcChannel {
    http: reqwest::Client,
    gateway_url: String,
    program_id: ProgramId,
    account: Option<Address>,
}

impl RpcChannel {
    /// Create a channel for `program_id` at `gateway_url` (e.g. `http://127.0.0.1:7077`).
    pub fn new(
        gateway_url: impl Into<String>,
        program_id: ProgramId,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, ChannelError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ChannelError::Unavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            gateway_url: gateway_url.into(),
            program_id,
            account: None,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ChannelError> {
        let program_id = config
            .require_program_id()
            .map_err(|e| ChannelError::Unavailable(e.to_string()))?;
        Self::new(
            config.gateway_url.clone(),
            program_id,
            config.request_timeout(),
            config.connect_timeout(),
        )
    }

    /// The account submissions are made on behalf of.
    pub fn with_account(mut self, account: Address) -> Self {
        self.account = Some(account);
        self
    }

    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    /// Send one request and return its `result` field.
    async fn rpc_call(&self, action: &str, params: Value) -> Result<Value, ChannelError> {
        let body = request_body(action, &self.program_id, params)?;
        debug!(action, url = %self.gateway_url, "gateway call");

        let response = self
            .http
            .post(&self.gateway_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::Unavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ChannelError::Unavailable(format!(
                "gateway returned HTTP {}",
                response.status()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ChannelError::Decode(format!("invalid JSON response: {e}")))?;
        parse_response(json)
    }
}

#[async_trait]
impl RemoteChannel for RpcChannel {
    async fn submit(&self, operation: Operation, args: Vec<Value>) -> Result<Receipt, ChannelError> {
        let account = self
            .account
            .ok_or_else(|| ChannelError::Unavailable("no submitting account configured".into()))?;
        let result = self
            .rpc_call(
                "submit",
                json!({ "method": operation.method(), "args": args, "account": account.to_hex() }),
            )
            .await?;
        if result.is_null() {
            return Ok(Receipt::default());
        }
        serde_json::from_value(result).map_err(|e| ChannelError::Decode(format!("receipt: {e}")))
    }

    async fn query(&self, method: QueryMethod, args: Vec<Value>) -> Result<Value, ChannelError> {
        self.rpc_call("query", json!({ "method": method.as_str(), "args": args }))
            .await
    }
}

fn request_body(action: &str, program_id: &ProgramId, params: Value) -> Result<Value, ChannelError> {
    let mut body = params;
    let fields = body
        .as_object_mut()
        .ok_or_else(|| ChannelError::Decode("params must be a JSON object".into()))?;
    fields.insert("action".to_string(), json!(action));
    fields.insert("program_id".to_string(), json!(program_id.to_hex()));
    Ok(body)
}

fn parse_response(mut json: Value) -> Result<Value, ChannelError> {
    match json.get("error") {
        Some(Value::String(message)) => return Err(ChannelError::rejected(message.clone())),
        Some(Value::Null) | None => {}
        Some(_) => return Err(ChannelError::Rejected { message: None }),
    }
    json.get_mut("result")
        .map(Value::take)
        .ok_or_else(|| ChannelError::Decode("response has neither result nor error".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program() -> ProgramId {
        Address::new([7; 32])
    }

    #[test]
    fn body_carries_action_and_program() {
        let body = request_body(
            "query",
            &program(),
            json!({ "method": "BalanceOf", "args": ["0x01"] }),
        )
        .unwrap();
        assert_eq!(body["action"], "query");
        assert_eq!(body["program_id"], program().to_hex());
        assert_eq!(body["method"], "BalanceOf");
        assert!(request_body("query", &program(), json!([1, 2])).is_err());
    }

    #[test]
    fn error_bodies_are_rejections() {
        assert_eq!(
            parse_response(json!({ "error": "insufficient balance" })),
            Err(ChannelError::rejected("insufficient balance"))
        );
        assert_eq!(
            parse_response(json!({ "error": { "code": 3 } })),
            Err(ChannelError::Rejected { message: None })
        );
    }

    #[test]
    fn result_is_extracted() {
        assert_eq!(parse_response(json!({ "result": "42" })), Ok(json!("42")));
        assert_eq!(
            parse_response(json!({ "result": null, "error": null })),
            Ok(Value::Null)
        );
        assert!(matches!(
            parse_response(json!({ "status": "ok" })),
            Err(ChannelError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn submit_without_account_is_unavailable() {
        let channel = RpcChannel::new(
            "http://127.0.0.1:9",
            program(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        let err = channel.submit(Operation::Mint, vec![]).await.unwrap_err();
        assert!(matches!(err, ChannelError::Unavailable(_)));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let channel = RpcChannel::new(
            format!("http://127.0.0.1:{port}"),
            program(),
            Duration::from_secs(2),
            Duration::from_secs(1),
        )
        .unwrap();
        let err = channel.query(QueryMethod::Name, vec![]).await.unwrap_err();
        assert!(matches!(err, ChannelError::Unavailable(_)));
    }

    #[test]
    fn from_config_requires_program_id() {
        assert!(RpcChannel::from_config(&ClientConfig::default()).is_err());
        let config = ClientConfig {
            program_id: Some(program()),
            ..ClientConfig::default()
        };
        assert_eq!(
            RpcChannel::from_config(&config).unwrap().gateway_url(),
            "http://127.0.0.1:7077"
        );
    }
}
