//! Utility types for integration tests: a handler that records every event
//! in owned form, plus shorthands for building expected sequences.
#![allow(dead_code)]

use quick_sax::{Control, Error, Event, HandlerError, SaxHandler};

/// An owned mirror of [`Event`] for equality assertions.
#[derive(Clone, Debug, PartialEq)]
pub enum Ev {
    StartDocument {
        version: String,
        encoding: Option<String>,
        standalone: Option<bool>,
    },
    EndDocument,
    Start(String, Vec<(String, String)>),
    End(String),
    Characters(String),
}

pub fn owned(event: Event<'_>) -> Ev {
    match event {
        Event::StartDocument(prolog) => Ev::StartDocument {
            version: prolog.version.clone(),
            encoding: prolog.encoding.clone(),
            standalone: prolog.standalone,
        },
        Event::EndDocument => Ev::EndDocument,
        Event::StartElement { name, attributes } => Ev::Start(
            name.to_string(),
            attributes
                .iter()
                .map(|a| (a.name.to_string(), a.value.to_string()))
                .collect(),
        ),
        Event::EndElement { name } => Ev::End(name.to_string()),
        Event::Characters(text) => Ev::Characters(text.to_string()),
    }
}

/// Records every event; never stops.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Ev>,
}

impl SaxHandler for Recorder {
    fn event(&mut self, event: Event<'_>) -> Result<Control, HandlerError> {
        self.events.push(owned(event));
        Ok(Control::Continue)
    }
}

/// Parses a complete document and returns the recorded events.
pub fn events(xml: &str) -> Vec<Ev> {
    let mut recorder = Recorder::default();
    quick_sax::parse_str(xml, &mut recorder).expect(xml);
    recorder.events
}

/// Parses a complete document and returns the expected failure.
pub fn parse_error(xml: &str) -> Error {
    quick_sax::parse_str(xml, &mut Recorder::default())
        .expect_err(xml)
}

/// `start_document` with the default prolog.
pub fn start_doc() -> Ev {
    Ev::StartDocument {
        version: "1.0".to_string(),
        encoding: None,
        standalone: None,
    }
}

pub fn start(name: &str, attributes: &[(&str, &str)]) -> Ev {
    Ev::Start(
        name.to_string(),
        attributes
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect(),
    )
}

pub fn end(name: &str) -> Ev {
    Ev::End(name.to_string())
}

pub fn chars(text: &str) -> Ev {
    Ev::Characters(text.to_string())
}
