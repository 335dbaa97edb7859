//! Diagnostic record wire format
//!
//! A [`DiagnosticRecord`] is one unhandled-fault event. On disk and on the
//! wire it is a UTF-8 text blob: a block of `key:value` header lines, a
//! blank line, then the full fault trace.
//!
//! ```text
//! monitorVersion:20261019
//! apiKey:tenant-42
//! versionName:1.4.2
//! versionCode:42
//! widthPixels:1080
//! heightPixels:1920
//! time:1760000000000
//! deviceIdentifier:device-7
//!
//! panic in thread 'main' (ThreadId(1)): boom
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::errors::RecordError;

/// File extension of stored records, without the leading dot.
pub const RECORD_EXTENSION: &str = "stacktrace";

const KEY_MONITOR_VERSION: &str = "monitorVersion";
const KEY_API_KEY: &str = "apiKey";
const KEY_VERSION_NAME: &str = "versionName";
const KEY_VERSION_CODE: &str = "versionCode";
const KEY_WIDTH: &str = "widthPixels";
const KEY_HEIGHT: &str = "heightPixels";
const KEY_TIME: &str = "time";
const KEY_DEVICE_ID: &str = "deviceIdentifier";

/// One captured unhandled fault
///
/// Records are immutable once written and are identified by their storage
/// location, never by an embedded id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    /// Build id of the capture library
    pub monitor_version: String,
    /// Tenant identifier
    pub api_key: String,
    /// Monitored application's version name
    pub app_version_name: String,
    /// Monitored application's version code
    pub app_version_code: i64,
    /// Primary display width in pixels
    pub display_width_px: u32,
    /// Primary display height in pixels
    pub display_height_px: u32,
    /// Capture time, milliseconds since the Unix epoch
    pub timestamp_millis: i64,
    /// Opaque install/device identifier, when the host provides one
    pub device_identifier: Option<String>,
    /// Fault type, message and full trace text
    pub fault_summary: String,
}

impl DiagnosticRecord {
    /// Renders only the `key:value` header block.
    ///
    /// This is also the heartbeat payload.
    pub fn header_text(&self) -> String {
        let mut out = String::with_capacity(256);
        push_header(&mut out, KEY_MONITOR_VERSION, &self.monitor_version);
        push_header(&mut out, KEY_API_KEY, &self.api_key);
        push_header(&mut out, KEY_VERSION_NAME, &self.app_version_name);
        push_header(&mut out, KEY_VERSION_CODE, &self.app_version_code.to_string());
        push_header(&mut out, KEY_WIDTH, &self.display_width_px.to_string());
        push_header(&mut out, KEY_HEIGHT, &self.display_height_px.to_string());
        push_header(&mut out, KEY_TIME, &self.timestamp_millis.to_string());
        if let Some(ref device) = self.device_identifier {
            push_header(&mut out, KEY_DEVICE_ID, device);
        }
        out
    }

    /// Renders the full record: header, blank line, fault trace.
    pub fn to_wire(&self) -> String {
        let mut out = self.header_text();
        out.push('\n');
        out.push_str(&self.fault_summary);
        out
    }

    /// Parses a stored record.
    ///
    /// Accepts `\r\n` line endings and ignores header keys it does not know,
    /// so records written by older monitor builds still load.
    pub fn parse(text: &str) -> Result<Self, RecordError> {
        let mut fields: HashMap<&str, &str> = HashMap::new();
        let mut offset = 0;
        let mut body_start = None;

        for line in text.split_inclusive('\n') {
            offset += line.len();
            let content = line.trim_end_matches(['\n', '\r']);
            if content.is_empty() {
                body_start = Some(offset);
                break;
            }
            if let Some((key, value)) = content.split_once(':') {
                fields.entry(key.trim()).or_insert(value);
            }
        }

        let body_start = body_start.ok_or(RecordError::MissingSeparator)?;

        let text_field = |key: &'static str| -> Result<String, RecordError> {
            fields
                .get(key)
                .map(|v| v.to_string())
                .ok_or(RecordError::MissingField(key))
        };

        Ok(Self {
            monitor_version: text_field(KEY_MONITOR_VERSION)?,
            api_key: text_field(KEY_API_KEY)?,
            app_version_name: text_field(KEY_VERSION_NAME)?,
            app_version_code: numeric_field(&fields, KEY_VERSION_CODE)?,
            display_width_px: numeric_field(&fields, KEY_WIDTH)?,
            display_height_px: numeric_field(&fields, KEY_HEIGHT)?,
            timestamp_millis: numeric_field(&fields, KEY_TIME)?,
            device_identifier: fields.get(KEY_DEVICE_ID).map(|v| v.to_string()),
            fault_summary: text[body_start..].to_string(),
        })
    }
}

/// Appends one header line; line breaks inside values become spaces.
fn push_header(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push(':');
    out.extend(value.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }));
    out.push('\n');
}

fn numeric_field<T: std::str::FromStr>(
    fields: &HashMap<&str, &str>,
    key: &'static str,
) -> Result<T, RecordError> {
    let raw = fields.get(key).ok_or(RecordError::MissingField(key))?;
    raw.trim().parse().map_err(|_| RecordError::InvalidField {
        field: key,
        value: raw.to_string(),
    })
}
