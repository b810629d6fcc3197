use uuid::Uuid;

/// Offsets of the dashes in the canonical 8-4-4-4-12 form.
const DASH_OFFSETS: [usize; 4] = [8, 13, 18, 23];
const DASHED_LEN: usize = 36;
const SIMPLE_LEN: usize = 32;

/// Checks whether `raw` is an identifier in its dashed textual form.
///
/// Hex digits are accepted in either case.
pub fn is_identifier(raw: &str) -> bool {
    raw.len() == DASHED_LEN
        && raw.bytes().enumerate().all(|(i, b)| {
            if DASH_OFFSETS.contains(&i) {
                b == b'-'
            } else {
                b.is_ascii_hexdigit()
            }
        })
}

/// Inserts dashes into a 32-character hex string.
///
/// Returns `None` unless `raw` is exactly 32 hex digits.
pub fn insert_dashes(raw: &str) -> Option<String> {
    if raw.len() != SIMPLE_LEN || !raw.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return None;
    }

    Some(format!(
        "{}-{}-{}-{}-{}",
        &raw[..8],
        &raw[8..12],
        &raw[12..16],
        &raw[16..20],
        &raw[20..]
    ))
}

/// Parses either the dashed form or the 32-character form without dashes.
pub fn parse_identifier(raw: &str) -> Option<Uuid> {
    if is_identifier(raw) {
        return Uuid::parse_str(raw).ok();
    }
    insert_dashes(raw).and_then(|dashed| Uuid::parse_str(&dashed).ok())
}

/// The 32-character lowercase form used in request paths.
pub fn remove_dashes(id: &Uuid) -> String {
    id.simple().to_string()
}
