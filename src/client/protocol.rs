//! 控制端消息协议定义
//!
//! JSON 文本帧，每帧一条消息，以 `type` 字段区分。未知 `type` 不报错，解码为 `Unknown` 交由上层记录后忽略。

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::ClientError;

/// 客户端 -> 控制端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// 收到 connected 后回报就绪
    Ready,
    /// 保活
    Heartbeat,
    /// 用户完成当前指令
    TaskCompleted,
}

impl OutboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Ready => "ready",
            OutboundMessage::Heartbeat => "heartbeat",
            OutboundMessage::TaskCompleted => "task_completed",
        }
    }

    pub fn encode(&self) -> Result<String, ClientError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// 控制端 -> 客户端
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// 连接确认，携带分配的客户端 ID
    Connected {
        #[serde(rename = "clientId")]
        client_id: String,
    },

    /// 要展示的指令
    Instruction {
        instruction: String,
        /// 毫秒时间戳（可选）
        #[serde(default, deserialize_with = "lenient_millis")]
        timestamp: Option<u64>,
    },

    /// 控制端已收到 task_completed
    Acknowledged,

    /// 心跳确认
    HeartbeatAck,

    /// 未识别的 type，保留原值用于日志
    #[serde(skip)]
    Unknown(String),
}

const KNOWN_TYPES: &[&str] = &["connected", "instruction", "acknowledged", "heartbeat_ack"];

/// 解码一帧文本
///
/// 非 JSON、缺少字符串 `type`、已知类型缺少必填字段都视为坏帧。
pub fn decode(text: &str) -> Result<InboundMessage, ClientError> {
    let value: Value = serde_json::from_str(text)?;
    let tag = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ClientError::MissingType)?
        .to_owned();

    if KNOWN_TYPES.contains(&tag.as_str()) {
        Ok(serde_json::from_value(value)?)
    } else {
        Ok(InboundMessage::Unknown(tag))
    }
}

/// 时间戳可能以整数或浮点形式到达，负数与非有限值视为缺省
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_wire_format() {
        assert_eq!(OutboundMessage::Ready.encode().unwrap(), r#"{"type":"ready"}"#);
        assert_eq!(OutboundMessage::Heartbeat.encode().unwrap(), r#"{"type":"heartbeat"}"#);
        assert_eq!(
            OutboundMessage::TaskCompleted.encode().unwrap(),
            r#"{"type":"task_completed"}"#
        );
    }

    #[test]
    fn test_decode_connected() {
        let msg = decode(r#"{"type":"connected","clientId":"abc"}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::Connected {
                client_id: "abc".into()
            }
        );
    }

    #[test]
    fn test_decode_instruction_with_timestamp() {
        let msg = decode(
            r#"{"type":"instruction","instruction":"Wave your arms","timestamp":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            InboundMessage::Instruction {
                instruction: "Wave your arms".into(),
                timestamp: Some(1_700_000_000_000),
            }
        );
    }

    #[test]
    fn test_decode_instruction_without_timestamp() {
        let msg = decode(r#"{"type":"instruction","instruction":"Sit"}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::Instruction {
                instruction: "Sit".into(),
                timestamp: None,
            }
        );
    }

    #[test]
    fn test_decode_float_and_null_timestamp() {
        let msg = decode(r#"{"type":"instruction","instruction":"x","timestamp":1.5e3}"#).unwrap();
        assert!(matches!(msg, InboundMessage::Instruction { timestamp: Some(1500), .. }));
        let msg = decode(r#"{"type":"instruction","instruction":"x","timestamp":null}"#).unwrap();
        assert!(matches!(msg, InboundMessage::Instruction { timestamp: None, .. }));
    }

    #[test]
    fn test_decode_unit_messages() {
        assert_eq!(decode(r#"{"type":"acknowledged"}"#).unwrap(), InboundMessage::Acknowledged);
        assert_eq!(decode(r#"{"type":"heartbeat_ack"}"#).unwrap(), InboundMessage::HeartbeatAck);
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        let msg = decode(r#"{"type":"lights_off","level":3}"#).unwrap();
        assert_eq!(msg, InboundMessage::Unknown("lights_off".into()));
    }

    #[test]
    fn test_malformed_frames() {
        assert!(matches!(decode("not json"), Err(ClientError::MalformedFrame(_))));
        assert!(matches!(decode(r#"{"clientId":"abc"}"#), Err(ClientError::MissingType)));
        assert!(matches!(decode(r#"{"type":42}"#), Err(ClientError::MissingType)));
        assert!(matches!(decode(r#"[1,2]"#), Err(ClientError::MissingType)));
        // 已知类型缺少必填字段
        assert!(matches!(decode(r#"{"type":"connected"}"#), Err(ClientError::MalformedFrame(_))));
        assert!(matches!(
            decode(r#"{"type":"instruction"}"#),
            Err(ClientError::MalformedFrame(_))
        ));
    }
}
