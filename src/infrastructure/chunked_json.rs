// Chunked NDJSON streaming utilities
use crate::domain::report::ReportStreamMessage;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;

/// Create a chunked NDJSON streaming response
pub fn ndjson_stream<S>(stream: S) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = ReportStreamMessage> + Send + 'static,
{
    let byte_stream = stream.map(serialize_line);

    let body = Body::from_stream(byte_stream);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::TRANSFER_ENCODING, "chunked");

    response
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single message to one newline-terminated line
fn serialize_line(msg: ReportStreamMessage) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(&msg)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let mut line = BytesMut::with_capacity(json.len() + 1);
    line.put_slice(&json);
    line.put_u8(b'\n');

    Ok(line.freeze())
}

/// Helper to create a streaming response from a receiver
pub fn stream_from_receiver(
    mut rx: tokio::sync::mpsc::Receiver<ReportStreamMessage>,
) -> impl IntoResponse {
    let stream = async_stream::stream! {
        while let Some(msg) = rx.recv().await {
            yield msg;
        }
    };

    match ndjson_stream(stream) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn started() -> ReportStreamMessage {
        ReportStreamMessage::Started {
            from: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
            vehicles_total: 3,
        }
    }

    #[test]
    fn test_serialize_line_is_newline_terminated_json() {
        let line = serialize_line(started()).unwrap();

        assert_eq!(line.last(), Some(&b'\n'));
        let value: serde_json::Value = serde_json::from_slice(&line[..line.len() - 1]).unwrap();
        assert_eq!(value["type"], "started");
        assert_eq!(value["vehiclesTotal"], 3);
        assert_eq!(value["from"], "2024-01-15");
    }

    #[tokio::test]
    async fn test_stream_from_receiver_emits_one_line_per_message() {
        let (tx, rx) = tokio::sync::mpsc::channel(10);
        tx.send(started()).await.unwrap();
        tx.send(ReportStreamMessage::Complete {
            trips_total: 0,
            vehicles_processed: 3,
            vehicles_skipped: 0,
            duration_ms: 42,
        })
        .await
        .unwrap();
        drop(tx);

        let response = stream_from_receiver(rx).into_response();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/x-ndjson"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        let last: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(first["type"], "started");
        assert_eq!(last["type"], "complete");
        assert_eq!(last["durationMs"], 42);
    }
}
