use bytes::Bytes;

use super::{ByteStream, Frame, FrameReader};
use crate::error::AgentError;

fn byte_stream(chunks: Vec<Result<Bytes, AgentError>>) -> ByteStream {
    Box::pin(futures::stream::iter(chunks))
}

async fn collect(mut reader: FrameReader) -> Vec<Result<Frame, AgentError>> {
    let mut results = Vec::new();
    while let Some(result) = reader.next_frame().await {
        results.push(result);
    }
    results
}

#[tokio::test]
async fn test_frame_reader_handles_split_utf8() {
    let test_data = "data: {\"text\":\"Positive reactions\"}\n\n".as_bytes();

    let chunks = vec![
        Ok(Bytes::from(test_data[..10].to_vec())),
        Ok(Bytes::from(test_data[10..].to_vec())),
    ];

    let results = collect(FrameReader::new(byte_stream(chunks))).await;

    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].as_ref().unwrap(),
        &Frame::Data("{\"text\":\"Positive reactions\"}".to_string())
    );
}

#[tokio::test]
async fn test_frame_reader_handles_split_events() {
    let event1 = "data: {\"n\":1}\n\n";
    let event2 = "data: {\"n\":2}\n\n";
    let combined = format!("{event1}{event2}");
    let test_data = combined.as_bytes().to_vec();

    let split_point = event1.len() + 5;
    let chunks = vec![
        Ok(Bytes::from(test_data[..split_point].to_vec())),
        Ok(Bytes::from(test_data[split_point..].to_vec())),
    ];

    let results = collect(FrameReader::new(byte_stream(chunks))).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap(), &Frame::Data("{\"n\":1}".into()));
    assert_eq!(results[1].as_ref().unwrap(), &Frame::Data("{\"n\":2}".into()));
}

#[tokio::test]
async fn test_frame_reader_handles_multibyte_utf8_split() {
    let multibyte_char = "✨";
    let event = format!("data: {{\"text\":\"Star {multibyte_char}\"}}\n");
    let test_data = event.as_bytes().to_vec();

    let emoji_start = event.find(multibyte_char).unwrap();
    let split_in_emoji = emoji_start + 1;

    let chunks = vec![
        Ok(Bytes::from(test_data[..split_in_emoji].to_vec())),
        Ok(Bytes::from(test_data[split_in_emoji..].to_vec())),
    ];

    let results = collect(FrameReader::new(byte_stream(chunks))).await;

    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].as_ref().unwrap(),
        &Frame::Data(format!("{{\"text\":\"Star {multibyte_char}\"}}"))
    );
}

#[tokio::test]
async fn test_frame_reader_skips_comments_and_event_lines() {
    let body = ": keep-alive\nevent: message_start\ndata: {\"a\":1}\n\ndata:\n\ndata: [DONE]\n";
    let chunks = vec![Ok(Bytes::from(body))];

    let results: Vec<Frame> = collect(FrameReader::new(byte_stream(chunks)))
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(results, vec![Frame::Data("{\"a\":1}".into()), Frame::Done]);
}

#[tokio::test]
async fn test_frame_reader_flushes_unterminated_tail() {
    let chunks = vec![Ok(Bytes::from("{\"type\":\"done\"}"))];

    let results = collect(FrameReader::new(byte_stream(chunks))).await;

    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].as_ref().unwrap(),
        &Frame::Data("{\"type\":\"done\"}".into())
    );
}

#[tokio::test]
async fn test_frame_reader_releases_on_transport_error() {
    let chunks = vec![
        Ok(Bytes::from("data: {\"a\":1}\n")),
        Err(AgentError::Http("connection reset".into())),
        Ok(Bytes::from("data: {\"never\":true}\n")),
    ];

    let mut reader = FrameReader::new(byte_stream(chunks));
    assert!(matches!(reader.next_frame().await, Some(Ok(Frame::Data(_)))));
    assert!(matches!(
        reader.next_frame().await,
        Some(Err(AgentError::Http(_)))
    ));
    assert!(reader.is_released());
    assert!(reader.next_frame().await.is_none());
}
