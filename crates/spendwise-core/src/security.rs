use crate::domain::ChatId;

// ============== Authorization ==============

/// Chats are authorized by an explicit allow-list; an empty list allows no one.
pub fn is_authorized(chat_id: ChatId, allowed_chats: &[i64]) -> bool {
    allowed_chats.contains(&chat_id.0)
}

// ============== Shared Secret ==============

/// Compare the internal API secret without short-circuiting on the first mismatch.
pub fn secret_matches(provided: Option<&str>, expected: &str) -> bool {
    let Some(provided) = provided else {
        return false;
    };
    if expected.is_empty() {
        return false;
    }

    let (a, b) = (provided.as_bytes(), expected.as_bytes());
    let mut diff = a.len() ^ b.len();
    for (i, &byte) in b.iter().enumerate() {
        diff |= (a.get(i).copied().unwrap_or(0) ^ byte) as usize;
    }
    diff == 0
}
