use std::str::FromStr;

use super::error::{GatewayError, GatewayResult};
use super::events::DispatchEvent;
use super::payloads::{GatewayMessage, HelloPayload, MessagePayload, ReadyPayload};
use crate::domain::entities::{ChannelId, GuildId, InboundMessage, MessageId};

pub struct EventParser;

impl EventParser {
    pub fn parse_message(json: &str) -> GatewayResult<GatewayMessage> {
        serde_json::from_str(json).map_err(|e| GatewayError::serialization(e.to_string()))
    }

    pub fn parse_hello(data: &serde_json::Value) -> GatewayResult<HelloPayload> {
        serde_json::from_value(data.clone())
            .map_err(|e| GatewayError::serialization(format!("Failed to parse Hello: {e}")))
    }

    pub fn parse_dispatch(
        event_type: &str,
        data: Option<serde_json::Value>,
    ) -> GatewayResult<DispatchEvent> {
        let data = data.ok_or_else(|| GatewayError::protocol("Missing dispatch data"))?;

        match event_type {
            "READY" => Self::parse_ready(data),
            "MESSAGE_CREATE" => Self::parse_message_create(data),
            _ => Ok(DispatchEvent::Unknown {
                event_type: event_type.to_string(),
            }),
        }
    }

    fn parse_ready(data: serde_json::Value) -> GatewayResult<DispatchEvent> {
        let ready: ReadyPayload = serde_json::from_value(data)
            .map_err(|e| GatewayError::serialization(format!("Failed to parse Ready: {e}")))?;

        Ok(DispatchEvent::Ready {
            session_id: ready.session_id,
            resume_gateway_url: ready.resume_gateway_url,
            user_id: ready.user.id,
            username: ready.user.username,
        })
    }

    fn parse_message_create(data: serde_json::Value) -> GatewayResult<DispatchEvent> {
        let payload: MessagePayload = serde_json::from_value(data).map_err(|e| {
            GatewayError::serialization(format!("Failed to parse MessageCreate: {e}"))
        })?;

        let message = Self::convert_message_payload(payload)?;
        Ok(DispatchEvent::MessageCreate { message })
    }

    fn convert_message_payload(payload: MessagePayload) -> GatewayResult<InboundMessage> {
        let id = parse_snowflake::<MessageId>(&payload.id, "message id")?;
        let channel_id = parse_snowflake::<ChannelId>(&payload.channel_id, "channel id")?;

        let mut message =
            InboundMessage::new(id, channel_id, payload.author.username, payload.content);
        if let Some(guild_id) = payload.guild_id {
            message = message.with_guild(parse_snowflake::<GuildId>(&guild_id, "guild id")?);
        }
        if payload.author.bot {
            message = message.from_bot();
        }

        Ok(message)
    }
}

fn parse_snowflake<T: FromStr>(value: &str, field: &str) -> GatewayResult<T> {
    value
        .parse()
        .map_err(|_| GatewayError::protocol(format!("invalid {field}: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_parser_unknown_event() {
        let data = json!({});
        let result = EventParser::parse_dispatch("TYPING_START", Some(data)).unwrap();
        assert!(matches!(result, DispatchEvent::Unknown { .. }));
    }

    #[test]
    fn test_parse_hello() {
        let message =
            EventParser::parse_message(r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#)
                .unwrap();
        assert_eq!(message.op, 10);

        let hello = EventParser::parse_hello(&message.d.unwrap()).unwrap();
        assert_eq!(hello.heartbeat_interval, 41250);
    }

    #[test]
    fn test_parse_ready() {
        let data = json!({
            "v": 10,
            "session_id": "abc",
            "resume_gateway_url": "wss://gateway-us-east1-b.discord.gg",
            "user": {"id": "42", "username": "embedfix", "bot": true},
            "guilds": [{"id": "1", "unavailable": true}]
        });

        let event = EventParser::parse_dispatch("READY", Some(data)).unwrap();

        let DispatchEvent::Ready {
            session_id,
            resume_gateway_url,
            username,
            ..
        } = event
        else {
            panic!("expected Ready");
        };
        assert_eq!(session_id, "abc");
        assert!(resume_gateway_url.is_some());
        assert_eq!(username, "embedfix");
    }

    #[test]
    fn test_parse_guild_message() {
        let data = json!({
            "id": "1197329348051611700",
            "channel_id": "1197329348051611690",
            "guild_id": "959613362612887000",
            "author": {"id": "7", "username": "alice", "discriminator": "0"},
            "content": "https://instagram.com/p/abc",
            "timestamp": "2024-01-01T00:00:00+00:00"
        });

        let DispatchEvent::MessageCreate { message } =
            EventParser::parse_dispatch("MESSAGE_CREATE", Some(data)).unwrap()
        else {
            panic!("expected MessageCreate");
        };

        assert_eq!(message.id, MessageId(1_197_329_348_051_611_700));
        assert_eq!(message.channel_id, ChannelId(1_197_329_348_051_611_690));
        assert_eq!(message.guild_id, Some(GuildId(959_613_362_612_887_000)));
        assert_eq!(message.author_username, "alice");
        assert!(!message.author_is_bot);
        assert_eq!(message.content, "https://instagram.com/p/abc");
    }

    #[test]
    fn test_parse_bot_direct_message() {
        let data = json!({
            "id": "1",
            "channel_id": "2",
            "author": {"id": "3", "username": "otherbot", "bot": true},
            "content": ""
        });

        let DispatchEvent::MessageCreate { message } =
            EventParser::parse_dispatch("MESSAGE_CREATE", Some(data)).unwrap()
        else {
            panic!("expected MessageCreate");
        };

        assert!(message.author_is_bot);
        assert!(message.guild_id.is_none());
    }

    #[test]
    fn test_invalid_snowflake_rejected() {
        let data = json!({
            "id": "not-a-number",
            "channel_id": "2",
            "author": {"id": "3", "username": "alice"},
            "content": "hi"
        });

        let result = EventParser::parse_dispatch("MESSAGE_CREATE", Some(data));
        assert!(matches!(result, Err(GatewayError::ProtocolError { .. })));
    }

    #[test]
    fn test_missing_dispatch_data() {
        assert!(EventParser::parse_dispatch("READY", None).is_err());
    }
}
