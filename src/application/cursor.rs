use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of a row in a listing's sort order. Simple listings order by
/// ascending id and only carry `id`; ticket listings order by
/// `(created_at DESC, id DESC)` and carry both so rows sharing a
/// timestamp are never skipped or repeated across page boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl CursorPosition {
    pub fn by_id(id: i64) -> Self {
        Self {
            id,
            created_at: None,
        }
    }

    pub fn by_created_at(id: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at: Some(created_at),
        }
    }
}

/// Encodes a position as an opaque URL-safe token.
pub fn encode_cursor(position: &CursorPosition) -> String {
    let json = serde_json::to_vec(position).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Fails closed: any token this process did not mint decodes to `None`,
/// which callers treat as "start from the beginning".
pub fn decode_cursor(token: &str) -> Option<CursorPosition> {
    let bytes = URL_SAFE_NO_PAD.decode(token.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Collection response envelope. Empty string means "no cursor".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub next_cursor: String,
    pub prev_cursor: String,
}

/// Shapes a page from `page_size + 1` fetched rows.
///
/// The extra row only probes for more results; it is trimmed before the
/// response is built. `next_cursor` marks the last retained row when the
/// probe hit. `prev_cursor` marks the first retained row, and is set
/// purely as a function of whether the request itself carried a cursor,
/// never of whether an earlier page really exists.
pub fn paginate<T>(
    mut rows: Vec<T>,
    page_size: usize,
    had_cursor: bool,
    position_of: impl Fn(&T) -> CursorPosition,
) -> Page<T> {
    let has_more = rows.len() > page_size;
    rows.truncate(page_size);

    let next_cursor = if has_more {
        rows.last()
            .map(|row| encode_cursor(&position_of(row)))
            .unwrap_or_default()
    } else {
        String::new()
    };
    let prev_cursor = if had_cursor {
        rows.first()
            .map(|row| encode_cursor(&position_of(row)))
            .unwrap_or_default()
    } else {
        String::new()
    };

    Page {
        data: rows,
        next_cursor,
        prev_cursor,
    }
}

/// Clamps the `limit` query parameter to `1..=max_size`, falling back to
/// the configured default when absent.
pub fn clamp_page_size(limit: Option<u32>, default_size: usize, max_size: usize) -> usize {
    match limit {
        Some(limit) => (limit as usize).clamp(1, max_size),
        None => default_size,
    }
}
