use std::fs;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{info, warn};

use crate::analysis::scoring::SuspiciousList;

/// Element holding one entry in an XML blacklist.
const STRING_ELEMENT: &[u8] = b"String";

/// Parse a line-oriented list; blank lines and `#` comments are ignored.
pub fn parse_text_list(body: &str) -> SuspiciousList {
    body.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .collect()
}

/// Parse an XML blacklist made of `<String>...</String>` elements.
///
/// Entity and character references are resolved and CDATA is taken
/// verbatim. Empty and self-closing elements contribute nothing. A
/// malformed document keeps the entries read before the error.
pub fn parse_xml_list(body: &str) -> SuspiciousList {
    let mut reader = Reader::from_str(body);
    let mut entries: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == STRING_ELEMENT => {
                current = Some(String::new());
            }
            Ok(Event::Text(text)) => {
                if let Some(entry) = current.as_mut() {
                    match text.unescape() {
                        Ok(decoded) => entry.push_str(&decoded),
                        Err(err) => {
                            warn!(error = %err, "skipping undecodable suspicious-list text");
                        }
                    }
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(entry) = current.as_mut() {
                    entry.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == STRING_ELEMENT => {
                if let Some(entry) = current.take().filter(|entry| !entry.is_empty()) {
                    entries.push(entry);
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                warn!(
                    position = reader.buffer_position(),
                    error = %err,
                    "malformed suspicious-string XML; keeping entries read so far"
                );
                break;
            }
            Ok(_) => {}
        }
    }

    entries.into_iter().collect()
}

/// Load the suspicious-string list at `path`.
///
/// A missing or unreadable file yields an empty list: scoring still works,
/// just with one signal fewer.
pub fn load_suspicious_list(path: &Path) -> SuspiciousList {
    let body = match fs::read_to_string(path) {
        Ok(body) => body,
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "suspicious-string list unavailable; continuing without it"
            );
            return SuspiciousList::new();
        }
    };
    let is_xml =
        path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("xml"));
    let list = if is_xml { parse_xml_list(&body) } else { parse_text_list(&body) };
    info!(path = %path.display(), entries = list.len(), "loaded suspicious-string list");
    list
}
