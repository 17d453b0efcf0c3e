//! Reply framing for the control protocol
//!
//! Every reply line starts with a three-digit status code followed by a
//! separator:
//! - `-` more lines follow
//! - `+` a data block follows, terminated by a line holding a single `.`
//! - ` ` final line of the reply
//!
//! All lines of one reply carry the same status code.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::{ControlError, ControlResult};

/// Status code the peer uses for success
pub const STATUS_OK: u16 = 250;

/// Separator following the status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `-`
    Continuation,
    /// `+`
    Data,
    /// ` `
    Final,
}

impl Separator {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'-' => Some(Self::Continuation),
            b'+' => Some(Self::Data),
            b' ' => Some(Self::Final),
            _ => None,
        }
    }
}

/// One parsed `NNN<sep><text>` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyLine {
    pub code: u16,
    pub separator: Separator,
    pub text: String,
}

impl ReplyLine {
    /// Parse a single line; the line terminator may or may not be present.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let line = raw.trim_end_matches(['\r', '\n']);
        let bytes = line.as_bytes();

        if bytes.len() < 4 {
            return Err(format!("line too short: {:?}", line));
        }
        if !bytes[..3].iter().all(u8::is_ascii_digit) {
            return Err(format!("invalid status code: {:?}", line));
        }
        let separator = Separator::from_byte(bytes[3])
            .ok_or_else(|| format!("invalid separator: {:?}", line))?;

        // First three bytes are ASCII digits, so slicing at 3 and 4 is on char boundaries.
        let code = line[..3]
            .parse()
            .map_err(|_| format!("invalid status code: {:?}", line))?;

        Ok(Self {
            code,
            separator,
            text: line[4..].to_string(),
        })
    }
}

/// One logical entry of a reply: the line text plus any data block it opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEntry {
    pub text: String,
    pub data: Option<String>,
}

/// A complete reply to one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Status code of the final line
    pub code: u16,
    pub entries: Vec<ReplyEntry>,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.code == STATUS_OK
    }

    /// Whole reply body, one entry per line, data blocks inlined after their header
    pub fn body(&self) -> String {
        self.entries
            .iter()
            .map(|entry| match &entry.data {
                Some(data) => format!("{}\n{}", entry.text, data),
                None => entry.text.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Convert a non-250 reply into a protocol error
    pub fn into_result(self) -> ControlResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ControlError::Protocol {
                code: self.code,
                message: self.body(),
            })
        }
    }
}

/// Read one complete reply from `reader`.
///
/// Once the first line has been recognised, a later framing error (bad line,
/// code change, invalid UTF-8) is reported only after the rest of the reply
/// has been consumed up to its final line, so the next exchange starts on a
/// clean frame boundary. An unrecognisable first line leaves no frame to
/// follow and fails at once with [`ControlError::Desynchronized`].
pub async fn read_reply<R>(reader: &mut R) -> ControlResult<Reply>
where
    R: AsyncBufRead + Unpin,
{
    read_reply_resumable(reader, &mut Vec::new()).await
}

/// [`read_reply`] with a caller-owned line buffer.
///
/// Bytes of a line that was only partly received when the future was dropped
/// stay in `partial`, so a later [`skip_reply`] with the same buffer resumes
/// on the same line instead of mid-way through it.
pub async fn read_reply_resumable<R>(
    reader: &mut R,
    partial: &mut Vec<u8>,
) -> ControlResult<Reply>
where
    R: AsyncBufRead + Unpin,
{
    let mut entries = Vec::new();
    let mut first_code: Option<u16> = None;
    let mut framing_error: Option<String> = None;

    let final_code = loop {
        let raw = read_raw_line(reader, partial).await?;

        let line = match (ReplyLine::parse(&raw.text), first_code) {
            (Ok(line), _) => line,
            (Err(e), None) => return Err(ControlError::Desynchronized(e)),
            (Err(e), Some(_)) => {
                framing_error.get_or_insert(e);
                continue;
            }
        };

        if !raw.utf8 {
            framing_error.get_or_insert(format!("invalid UTF-8 in line: {:?}", raw.text));
        }

        match first_code {
            None => first_code = Some(line.code),
            Some(code) if code != line.code => {
                framing_error.get_or_insert(format!(
                    "status code changed mid-reply ({} then {})",
                    code, line.code
                ));
            }
            Some(_) => {}
        }

        let data = match line.separator {
            Separator::Data => {
                let block = read_data_block(reader, partial).await?;
                if !block.utf8 {
                    framing_error.get_or_insert("invalid UTF-8 in data block".to_string());
                }
                Some(block.text)
            }
            _ => None,
        };

        entries.push(ReplyEntry {
            text: line.text,
            data,
        });

        if line.separator == Separator::Final {
            break line.code;
        }
    };

    if let Some(e) = framing_error {
        return Err(ControlError::Malformed(e));
    }

    Ok(Reply {
        code: final_code,
        entries,
    })
}

/// Consume the rest of a reply whose reader went away, without interpreting it.
///
/// `partial` must be the buffer the abandoned read was using. Anything that
/// does not parse is skipped until a final line shows up.
pub async fn skip_reply<R>(reader: &mut R, partial: &mut Vec<u8>) -> ControlResult<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let raw = read_raw_line(reader, partial).await?;
        match ReplyLine::parse(&raw.text) {
            Ok(line) if line.separator == Separator::Final => return Ok(()),
            Ok(line) if line.separator == Separator::Data => {
                read_data_block(reader, partial).await?;
            }
            _ => {}
        }
    }
}

/// Text read off the wire. Invalid UTF-8 is decoded lossily and flagged.
struct RawText {
    text: String,
    utf8: bool,
}

async fn read_data_block<R>(reader: &mut R, partial: &mut Vec<u8>) -> ControlResult<RawText>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = Vec::new();
    let mut utf8 = true;
    loop {
        let raw = read_raw_line(reader, partial).await?;
        utf8 &= raw.utf8;
        let line = raw.text.trim_end_matches(['\r', '\n']);
        if line == "." {
            break;
        }
        // Undo dot-stuffing
        let line = line.strip_prefix('.').filter(|l| l.starts_with('.')).unwrap_or(line);
        lines.push(line.to_string());
    }
    Ok(RawText {
        text: lines.join("\n"),
        utf8,
    })
}

/// Next line, including whatever an earlier cancelled read left in `buf`
async fn read_raw_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> ControlResult<RawText>
where
    R: AsyncBufRead + Unpin,
{
    let n = reader.read_until(b'\n', buf).await?;
    if n == 0 {
        return Err(ControlError::ConnectionClosed);
    }
    Ok(match String::from_utf8(std::mem::take(buf)) {
        Ok(text) => RawText { text, utf8: true },
        Err(e) => RawText {
            text: String::from_utf8_lossy(e.as_bytes()).into_owned(),
            utf8: false,
        },
    })
}
