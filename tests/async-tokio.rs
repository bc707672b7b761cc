//! The async chunk driver must behave exactly like the blocking one.

use quick_sax::{Control, ErrorKind, Event, HandlerError, SaxParser};

mod helpers;
use helpers::*;

use pretty_assertions::assert_eq;

#[tokio::test]
async fn chunked_async_reads_match_sync_parse() {
    let reader = tokio_test::io::Builder::new()
        .read(b"<?xm")
        .read(b"l version=\"1.0\"?><r")
        .read(b"><c a=\"v\"/>tex")
        .read(b"t</r>")
        .build();

    let mut from_async = Recorder::default();
    SaxParser::new()
        .parse_reader_async(reader, &mut from_async)
        .await
        .unwrap();

    let mut whole = Recorder::default();
    quick_sax::parse_str("<?xml version=\"1.0\"?><r><c a=\"v\"/>text</r>", &mut whole).unwrap();
    assert_eq!(from_async.events, whole.events);
}

#[tokio::test]
async fn stop_ceases_reading() {
    // the whole script arrives in one read; the parser must not ask for more
    let reader = tokio_test::io::Builder::new().read(b"<a><b/></a>").build();

    let mut handler = |event: Event<'_>| -> Result<Control, HandlerError> {
        Ok(match event {
            Event::StartElement { .. } => Control::Stop,
            _ => Control::Continue,
        })
    };
    SaxParser::new()
        .parse_reader_async(reader, &mut handler)
        .await
        .unwrap();
}

#[tokio::test]
async fn truncated_input_reports_eof() {
    let reader = tokio_test::io::Builder::new().read(b"<a><open").build();

    let mut recorder = Recorder::default();
    let error = SaxParser::new()
        .parse_reader_async(reader, &mut recorder)
        .await
        .unwrap_err();
    assert!(matches!(error.kind, ErrorKind::UnexpectedEof(_)), "{}", error);
}
