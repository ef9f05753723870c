//! The secondary "IMSG" container: a self-describing archive of named,
//! length-prefixed sections whose payloads reuse the flat element
//! encodings.
//!
//! The editor's native save format wraps the icon in this archive so
//! future versions can add sections without breaking old readers: a
//! reader skips any section whose name it does not know, using the
//! section's byte length. [`decode`](crate::format::decode) dispatches
//! here when a buffer starts with the `IMSG` magic.

use log::warn;

use crate::error::ViconError;
use crate::format::buffer::LittleEndianBuffer;
use crate::format::{decoder, encoder, MESSAGE_MAGIC};
use crate::model::Icon;

const SECTION_STYLES: &str = "styles";
const SECTION_PATHS: &str = "paths";
const SECTION_SHAPES: &str = "shapes";

/// Serializes an icon into the keyed-archive container.
///
/// Sections are written in dependency order (styles, paths, shapes) so a
/// streaming reader can resolve shape references as it goes.
pub fn encode_message(icon: &Icon) -> Result<Vec<u8>, ViconError> {
    let mut buffer = LittleEndianBuffer::new();
    buffer.write_bytes(MESSAGE_MAGIC);

    let styles = icon.styles().borrow();
    let paths = icon.paths().borrow();
    let shapes = icon.shapes().borrow();

    let mut section = LittleEndianBuffer::new();
    encoder::write_style_section(&mut section, &styles)?;
    write_section(&mut buffer, SECTION_STYLES, &section);

    let mut section = LittleEndianBuffer::new();
    encoder::write_path_section(&mut section, &paths)?;
    write_section(&mut buffer, SECTION_PATHS, &section);

    let mut section = LittleEndianBuffer::new();
    encoder::write_shape_section(&mut section, &shapes, &styles, &paths)?;
    write_section(&mut buffer, SECTION_SHAPES, &section);

    Ok(buffer.into_vec())
}

fn write_section(buffer: &mut LittleEndianBuffer, name: &str, payload: &LittleEndianBuffer) {
    buffer.write_u8(name.len() as u8);
    buffer.write_bytes(name.as_bytes());
    buffer.write_u32(payload.len() as u32);
    buffer.write_buffer(payload);
}

/// Parses the keyed-archive container. Called via
/// [`decode`](crate::format::decode) on magic match.
pub(crate) fn decode_message(data: &[u8]) -> Result<Icon, ViconError> {
    let mut buffer = LittleEndianBuffer::from_bytes(data);
    buffer.skip(MESSAGE_MAGIC.len()).map_err(|_| ViconError::InvalidMagic)?;

    let icon = Icon::new();

    while buffer.remaining() > 0 {
        let name_length = buffer.read_u8()? as usize;
        let name = String::from_utf8_lossy(buffer.read_bytes(name_length)?).into_owned();
        let payload_length = buffer.read_u32()? as usize;
        let payload = buffer.read_bytes(payload_length).map_err(|_| ViconError::UnknownTag)?;
        let mut section = LittleEndianBuffer::from_bytes(payload);

        match name.as_str() {
            SECTION_STYLES => {
                decoder::parse_style_section(&mut section, &mut icon.styles().borrow_mut())?
            }
            SECTION_PATHS => {
                decoder::parse_path_section(&mut section, &mut icon.paths().borrow_mut())?
            }
            SECTION_SHAPES => {
                let styles = icon.styles().borrow();
                let paths = icon.paths().borrow();
                decoder::parse_shape_section(
                    &mut section,
                    &mut icon.shapes().borrow_mut(),
                    &styles,
                    &paths,
                )?
            }
            _ => {
                // Forward compatibility: unknown sections are elided.
                warn!("skipping unknown archive section '{name}'");
            }
        }
    }

    Ok(icon)
}
