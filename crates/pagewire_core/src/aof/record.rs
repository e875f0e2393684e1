//! Log line encoding.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};

/// Marker byte for mutation entries.
pub const MUTATION_MARKER: u8 = b'*';

const SEP: u8 = b' ';
const DATE_FORMAT: &str = "%Y/%m/%d";
const TIME_FORMAT: &str = "%H:%M:%S%.6f";

/// A decoded mutation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AofEntry {
    /// Date token as written.
    pub date: String,
    /// Time token as written.
    pub time: String,
    /// Page url.
    pub url: String,
    /// Raw patch bytes.
    pub patch: Vec<u8>,
}

/// Encodes one mutation line, including the trailing newline.
pub fn format_line(now: DateTime<Utc>, url: &str, patch: &[u8]) -> Vec<u8> {
    let stamp = format!(
        "{} {} ",
        now.format(DATE_FORMAT),
        now.format(TIME_FORMAT)
    );
    let mut line = Vec::with_capacity(stamp.len() + url.len() + patch.len() + 4);
    line.extend_from_slice(stamp.as_bytes());
    line.push(MUTATION_MARKER);
    line.push(SEP);
    line.extend_from_slice(url.as_bytes());
    line.push(SEP);
    line.extend_from_slice(patch);
    line.push(b'\n');
    line
}

/// Decodes one line (without its newline).
///
/// Returns `Ok(None)` for well-formed lines carrying a non-mutation marker.
///
/// # Errors
///
/// Returns [`CoreError::LogCorruption`] if the line has fewer than four
/// tokens, or a mutation line has fewer than two tokens after the marker.
pub fn parse_line(line_no: u64, line: &[u8]) -> CoreResult<Option<AofEntry>> {
    let tokens: Vec<&[u8]> = line.splitn(4, |b| *b == SEP).collect();
    let [date, time, marker, rest] = tokens.as_slice() else {
        return Err(CoreError::corruption(
            line_no,
            format!("{} log tokens, expected 4", tokens.len()),
        ));
    };

    if marker.first() != Some(&MUTATION_MARKER) {
        return Ok(None);
    }

    let parts: Vec<&[u8]> = rest.splitn(2, |b| *b == SEP).collect();
    let [url, patch] = parts.as_slice() else {
        return Err(CoreError::corruption(
            line_no,
            format!("{} patch tokens, expected 2", parts.len()),
        ));
    };

    let url = std::str::from_utf8(url)
        .map_err(|_| CoreError::corruption(line_no, "url is not UTF-8"))?;

    Ok(Some(AofEntry {
        date: String::from_utf8_lossy(date).into_owned(),
        time: String::from_utf8_lossy(time).into_owned(),
        url: url.to_string(),
        patch: patch.to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_then_parse() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 3).unwrap();
        let line = format_line(now, "/demo", br#"[{"op":"remove","row":"a b"}]"#);
        assert!(line.starts_with(b"2024/05/01 12:00:03.000000 * /demo "));
        assert_eq!(line.last(), Some(&b'\n'));

        let entry = parse_line(1, &line[..line.len() - 1]).unwrap().unwrap();
        assert_eq!(entry.date, "2024/05/01");
        assert_eq!(entry.url, "/demo");
        assert_eq!(entry.patch, br#"[{"op":"remove","row":"a b"}]"#);
    }

    #[test]
    fn three_tokens_is_corruption() {
        let err = parse_line(4, b"2024/05/01 12:00:00 *").unwrap_err();
        assert!(matches!(err, CoreError::LogCorruption { line: 4, .. }));
    }

    #[test]
    fn one_patch_token_is_corruption() {
        let err = parse_line(2, b"2024/05/01 12:00:00 * /demo").unwrap_err();
        assert!(err.to_string().contains("1 patch tokens"));
    }

    #[test]
    fn other_markers_are_ignored() {
        let entry = parse_line(1, br#"2024/05/01 12:00:00 # {"t":"listen"}"#).unwrap();
        assert!(entry.is_none());
    }

    #[test]
    fn double_space_yields_empty_token() {
        // an empty marker token is not a mutation
        assert!(parse_line(1, b"d t  * /u {}").unwrap().is_none());
    }
}
