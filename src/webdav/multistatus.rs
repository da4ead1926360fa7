//! PROPFIND `207 Multi-Status` response parsing.

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;

use crate::error::{ConfigError, Result};

/// One `<response>` element, with the properties this crate reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PropEntry {
    pub href: String,
    pub is_collection: bool,
    pub content_length: Option<u64>,
    pub last_modified: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Href,
    ContentLength,
    LastModified,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"href" => Some(Self::Href),
            b"getcontentlength" => Some(Self::ContentLength),
            b"getlastmodified" => Some(Self::LastModified),
            _ => None,
        }
    }
}

/// Parse a multistatus body. Namespace prefixes are ignored; elements are
/// matched by local name.
pub(crate) fn parse(xml: &[u8]) -> Result<Vec<PropEntry>> {
    let mut reader = XmlReader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<PropEntry> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"response" => current = Some(PropEntry::default()),
                    b"collection" => mark_collection(&mut current),
                    name => {
                        field = Field::from_local_name(name);
                        text.clear();
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"collection" {
                    mark_collection(&mut current);
                }
            }
            Ok(Event::Text(t)) => {
                if field.is_some() {
                    let decoded = t.decode().map_err(|e| malformed(e.to_string()))?;
                    text.push_str(&decoded);
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if field.is_some() {
                    if let Some(ch) = r.resolve_char_ref().map_err(|e| malformed(e.to_string()))? {
                        text.push(ch);
                    } else {
                        let name = r.decode().map_err(|e| malformed(e.to_string()))?;
                        let resolved = resolve_predefined_entity(&name).ok_or_else(|| {
                            malformed(format!("unknown entity '&{};'", name))
                        })?;
                        text.push_str(resolved);
                    }
                }
            }
            Ok(Event::End(e)) => {
                let local = e.local_name();
                if local.as_ref() == b"response" {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                } else if let (Some(f), Some(entry)) = (field, current.as_mut()) {
                    if Field::from_local_name(local.as_ref()) == Some(f) {
                        let value = std::mem::take(&mut text);
                        match f {
                            Field::Href => entry.href = value,
                            Field::ContentLength => entry.content_length = value.trim().parse().ok(),
                            Field::LastModified => entry.last_modified = Some(value),
                        }
                        field = None;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn mark_collection(current: &mut Option<PropEntry>) {
    if let Some(entry) = current.as_mut() {
        entry.is_collection = true;
    }
}

fn malformed(detail: String) -> ConfigError {
    ConfigError::remote(format!("Malformed PROPFIND response: {}", detail), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/dav/ccr-backups/</d:href>
    <d:propstat><d:prop>
      <d:resourcetype><d:collection/></d:resourcetype>
      <d:getlastmodified>Mon, 01 Jan 2024 10:00:00 GMT</d:getlastmodified>
    </d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/ccr-backups/a%20b&amp;c.json</d:href>
    <d:propstat><d:prop>
      <d:resourcetype/>
      <d:getcontentlength>42</d:getcontentlength>
      <d:getlastmodified>Tue, 02 Jan 2024 10:00:00 GMT</d:getlastmodified>
    </d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
  </d:response>
</d:multistatus>"#;

    #[test]
    fn parses_collections_and_files() {
        let entries = parse(LISTING.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);

        assert!(entries[0].is_collection);
        assert_eq!(entries[0].href, "/dav/ccr-backups/");

        assert!(!entries[1].is_collection);
        assert_eq!(entries[1].href, "/dav/ccr-backups/a%20b&c.json");
        assert_eq!(entries[1].content_length, Some(42));
        assert_eq!(
            entries[1].last_modified.as_deref(),
            Some("Tue, 02 Jan 2024 10:00:00 GMT")
        );
    }

    #[test]
    fn unprefixed_namespace() {
        let xml = r#"<multistatus xmlns="DAV:"><response><href>/x.json</href></response></multistatus>"#;
        let entries = parse(xml.as_bytes()).unwrap();
        assert_eq!(entries[0].href, "/x.json");
    }

    #[test]
    fn garbage_is_remote_error() {
        let err = parse(b"<a><b></a>").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::RemoteError);
    }
}
