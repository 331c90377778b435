//! Session dump/load: XML serialization of stack, conversation, session
//! identity, and the system prompt (spec §4.F).
//!
//! Two format versions. **v2** (current, emitted by [`dump_xml`]) always
//! base64-encodes element bodies, independent of the outbound
//! `base64-to-assistant` flag (spec §9). **v1** (legacy) is loadable only:
//! plain text bodies, self-closing `<file>` elements, no session id.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use synergy_common::Role;
use uuid::Uuid;

use crate::convo::ConversationLog;
use crate::error::SynergyError;
use crate::stack::ContextStack;

/// Everything `,load` replaces atomically.
pub struct LoadedSession {
    pub stack: ContextStack,
    pub convo: ConversationLog,
    pub model: Option<String>,
    pub session_uuid: Option<Uuid>,
    pub system_prompt: Option<String>,
    /// `true` when the dump had no `session=` attribute on `<dump>`.
    pub is_legacy: bool,
}

fn xml_err(err: impl std::fmt::Display) -> SynergyError {
    SynergyError::SessionError(err.to_string())
}

/// Serializes the session to the v2 format described in spec §4.F.
pub fn dump_xml(
    stack: &ContextStack,
    convo: &ConversationLog,
    model_shortname: &str,
    session_uuid: Uuid,
    system_prompt: &str,
) -> Result<String, SynergyError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    let mut dump_start = BytesStart::new("dump");
    dump_start.push_attribute(("session", session_uuid.to_string().as_str()));
    writer.write_event(Event::Start(dump_start)).map_err(xml_err)?;

    write_text_elem(&mut writer, "model", model_shortname, None)?;

    writer.write_event(Event::Start(BytesStart::new("stack"))).map_err(xml_err)?;
    for item in stack.items() {
        match item {
            crate::stack::AttachmentItem::File { path } => {
                let body = std::fs::read(path).unwrap_or_default();
                let mut start = BytesStart::new("file");
                start.push_attribute(("path", path.to_string_lossy().as_ref()));
                start.push_attribute(("encoding", "base64"));
                writer.write_event(Event::Start(start)).map_err(xml_err)?;
                writer.write_event(Event::Text(BytesText::new(&BASE64.encode(body)))).map_err(xml_err)?;
                writer.write_event(Event::End(BytesEnd::new("file"))).map_err(xml_err)?;
            }
            crate::stack::AttachmentItem::Capture { cmd, stdout, .. } => {
                let mut start = BytesStart::new("capture");
                start.push_attribute(("cmd", cmd.as_str()));
                start.push_attribute(("encoding", "base64"));
                writer.write_event(Event::Start(start)).map_err(xml_err)?;
                writer.write_event(Event::Text(BytesText::new(&BASE64.encode(stdout)))).map_err(xml_err)?;
                writer.write_event(Event::End(BytesEnd::new("capture"))).map_err(xml_err)?;
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new("stack"))).map_err(xml_err)?;

    writer.write_event(Event::Start(BytesStart::new("convo"))).map_err(xml_err)?;
    for turn in convo.turns() {
        let mut start = BytesStart::new("elem");
        start.push_attribute(("role", turn.role.as_str()));
        start.push_attribute(("encoding", "base64"));
        writer.write_event(Event::Start(start)).map_err(xml_err)?;
        writer.write_event(Event::Text(BytesText::new(&BASE64.encode(&turn.text)))).map_err(xml_err)?;
        writer.write_event(Event::End(BytesEnd::new("elem"))).map_err(xml_err)?;
    }
    writer.write_event(Event::End(BytesEnd::new("convo"))).map_err(xml_err)?;

    write_text_elem(&mut writer, "prompt", &BASE64.encode(system_prompt), Some("base64"))?;

    writer.write_event(Event::End(BytesEnd::new("dump"))).map_err(xml_err)?;

    let bytes = writer.into_inner().into_inner();
    let mut xml = String::from_utf8(bytes).map_err(xml_err)?;
    xml.push('\n');
    Ok(xml)
}

fn write_text_elem<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
    encoding: Option<&str>,
) -> Result<(), SynergyError> {
    let mut start = BytesStart::new(name);
    if let Some(encoding) = encoding {
        start.push_attribute(("encoding", encoding));
    }
    writer.write_event(Event::Start(start)).map_err(xml_err)?;
    writer.write_event(Event::Text(BytesText::new(text))).map_err(xml_err)?;
    writer.write_event(Event::End(BytesEnd::new(name))).map_err(xml_err)?;
    Ok(())
}

/// Parses a v1 or v2 dump. Format is detected by the presence of a
/// `session=` attribute on the root `<dump>` element.
pub fn parse_dump(xml: &str) -> Result<LoadedSession, SynergyError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut is_legacy = true;
    let mut session_uuid = None;
    let mut model = None;
    let mut system_prompt = None;
    let mut stack = ContextStack::new();
    let mut convo = ConversationLog::new();

    let mut current_file_path = None;
    let mut current_capture_cmd = None;
    let mut current_role = None;
    let mut current_is_base64 = false;
    let mut text_buf = String::new();

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => {
                let local = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                text_buf.clear();

                match local.as_str() {
                    "dump" => {
                        if let Some(uuid_str) = read_attr(&e, &reader, "session")? {
                            is_legacy = false;
                            session_uuid = Uuid::parse_str(&uuid_str).ok();
                        }
                    }
                    "file" => {
                        current_file_path = read_attr(&e, &reader, "path")?;
                        current_is_base64 = read_attr(&e, &reader, "encoding")?.as_deref() == Some("base64");
                        if let Some(path) = current_file_path.clone() {
                            // Self-closing v1 `<file path="..."/>` carries no body.
                            stack.push_file_raw(std::path::PathBuf::from(path));
                        }
                    }
                    "capture" => {
                        current_capture_cmd = read_attr(&e, &reader, "cmd")?;
                        current_is_base64 = read_attr(&e, &reader, "encoding")?.as_deref() == Some("base64");
                    }
                    "elem" => {
                        let role_str = read_attr(&e, &reader, "role")?.unwrap_or_default();
                        current_role = role_str.parse::<Role>().ok();
                        current_is_base64 = read_attr(&e, &reader, "encoding")?.as_deref() == Some("base64");
                    }
                    "prompt" => {
                        current_is_base64 = read_attr(&e, &reader, "encoding")?.as_deref() == Some("base64");
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                text_buf.push_str(&t.unescape().map_err(xml_err)?);
            }
            Event::End(e) => {
                let local = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match local.as_str() {
                    "model" => model = Some(text_buf.trim().to_string()),
                    "file" => {
                        // v2's <file> carries a base64 body; it's loaded to
                        // confirm it decodes, but the stack only retains the
                        // path (push-file never reads the file at push time,
                        // spec §4.B), matching the already-pushed item above.
                        let _ = decode_body(&text_buf, current_is_base64);
                        current_file_path = None;
                    }
                    "capture" => {
                        if let Some(cmd) = current_capture_cmd.take() {
                            let body = decode_body(&text_buf, current_is_base64);
                            stack.push_capture(cmd, body, 0);
                        }
                    }
                    "elem" => {
                        if let Some(role) = current_role.take() {
                            let body = decode_body(&text_buf, current_is_base64);
                            convo.append(role, body);
                        }
                    }
                    "prompt" => {
                        system_prompt = Some(decode_body(&text_buf, current_is_base64));
                    }
                    _ => {}
                }
                text_buf.clear();
            }
            _ => {}
        }
    }

    Ok(LoadedSession { stack, convo, model, session_uuid, system_prompt, is_legacy })
}

/// `dump-<UUID>-<EPOCH-SECONDS[.frac]>.xml`, used when `,dump`/autodump is
/// given no explicit filename (spec §4.F, §6).
pub fn default_dump_filename(session_uuid: Uuid) -> String {
    let epoch = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs_f64();
    format!("dump-{session_uuid}-{epoch}.xml")
}

fn decode_body(text: &str, is_base64: bool) -> String {
    if is_base64 {
        BASE64
            .decode(text.trim())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_default()
    } else {
        text.to_string()
    }
}

fn read_attr(e: &BytesStart, reader: &Reader<&[u8]>, name: &str) -> Result<Option<String>, SynergyError> {
    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = attr.decode_and_unescape_value(reader.decoder()).map_err(xml_err)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
