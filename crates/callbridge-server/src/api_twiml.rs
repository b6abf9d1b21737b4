//! Call-control webhook: answers an inbound call with TwiML that connects the
//! call audio to the media-stream endpoint.

use crate::AppState;
use axum::{
    extract::Extension,
    http::{header, HeaderMap},
    response::IntoResponse,
};
use std::sync::Arc;

/// Path of the media-stream WebSocket endpoint.
pub const MEDIA_STREAM_PATH: &str = "/media-stream";

pub async fn incoming_call_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let host = state.public_host.clone().unwrap_or_else(|| {
        headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("localhost")
            .to_string()
    });
    let stream_url = format!("wss://{}{}", host, MEDIA_STREAM_PATH);
    tracing::info!(stream_url = %stream_url, "answering inbound call");

    (
        [(header::CONTENT_TYPE, "application/xml")],
        render_twiml(state.say.as_deref(), &stream_url),
    )
}

/// Renders the answer document.
pub fn render_twiml(say: Option<&str>, stream_url: &str) -> String {
    let mut twiml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
    if let Some(text) = say.map(str::trim).filter(|text| !text.is_empty()) {
        twiml.push_str("<Say>");
        twiml.push_str(&escape_xml(text));
        twiml.push_str("</Say>");
    }
    twiml.push_str(r#"<Connect><Stream url=""#);
    twiml.push_str(&escape_xml(stream_url));
    twiml.push_str(r#""/></Connect></Response>"#);
    twiml
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_only_without_greeting() {
        let twiml = render_twiml(None, "wss://calls.example.com/media-stream");
        assert_eq!(
            twiml,
            r#"<?xml version="1.0" encoding="UTF-8"?><Response><Connect><Stream url="wss://calls.example.com/media-stream"/></Connect></Response>"#
        );
    }

    #[test]
    fn greeting_is_escaped() {
        let twiml = render_twiml(Some("Tom & Jerry's <shop>"), "wss://h/media-stream");
        assert!(twiml.contains("<Say>Tom &amp; Jerry&apos;s &lt;shop&gt;</Say><Connect>"));
    }

    #[test]
    fn blank_greeting_is_omitted() {
        let twiml = render_twiml(Some("   "), "wss://h/media-stream");
        assert!(!twiml.contains("<Say>"));
    }
}
