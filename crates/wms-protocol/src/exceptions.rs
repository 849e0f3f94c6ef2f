//! Parsing of OGC exception reports returned in place of a map image.

use quick_xml::events::Event;
use quick_xml::Reader;

use wms_common::WmsError;

/// Extract the first exception of a WMS `ServiceExceptionReport` or an OWS
/// `ExceptionReport`. Returns `None` when the document holds no exception.
pub fn parse_exception_report(xml: &str) -> Option<WmsError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut in_exception = false;
    let mut code: Option<String> = None;
    let mut message = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if !in_exception && matches!(name.as_ref(), b"ServiceException" | b"Exception") {
                    in_exception = true;
                    code = exception_code(&e);
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.local_name();
                if !in_exception && matches!(name.as_ref(), b"ServiceException" | b"Exception") {
                    return Some(WmsError::ServiceException {
                        code: exception_code(&e),
                        message: String::new(),
                    });
                }
            }
            Ok(Event::Text(t)) if in_exception => {
                if let Ok(text) = t.unescape() {
                    if !message.is_empty() {
                        message.push(' ');
                    }
                    message.push_str(text.trim());
                }
            }
            Ok(Event::CData(c)) if in_exception => {
                message.push_str(String::from_utf8_lossy(&c).trim());
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                if in_exception && matches!(name.as_ref(), b"ServiceException" | b"Exception") {
                    return Some(WmsError::ServiceException { code, message });
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    None
}

fn exception_code(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| matches!(attr.key.local_name().as_ref(), b"code" | b"exceptionCode"))
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}
