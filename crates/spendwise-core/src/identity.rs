//! Display-name resolution for expenses.
//!
//! Names are resolved by trying a fixed list of strategies in order; the first
//! one producing a non-blank name wins.

use std::collections::HashMap;

use crate::domain::ChatId;

/// What the chat platform tells us about the sender.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SenderProfile {
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameStrategy {
    /// Operator-configured name for the chat.
    Configured,
    /// Platform `@username`.
    PlatformUsername,
    /// First and last name.
    FullName,
    /// `User_<chatId>`.
    Placeholder,
}

pub const NAME_STRATEGIES: [NameStrategy; 4] = [
    NameStrategy::Configured,
    NameStrategy::PlatformUsername,
    NameStrategy::FullName,
    NameStrategy::Placeholder,
];

impl NameStrategy {
    pub fn resolve(
        self,
        chat_id: ChatId,
        sender: &SenderProfile,
        configured: &HashMap<i64, String>,
    ) -> Option<String> {
        let name = match self {
            Self::Configured => configured.get(&chat_id.0).cloned(),
            Self::PlatformUsername => sender.username.clone(),
            Self::FullName => Some(format!(
                "{} {}",
                sender.first_name,
                sender.last_name.as_deref().unwrap_or("")
            )),
            Self::Placeholder => Some(format!("User_{chat_id}")),
        }?;

        let name = name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }
}

pub fn resolve_display_name(
    chat_id: ChatId,
    sender: &SenderProfile,
    configured: &HashMap<i64, String>,
) -> String {
    NAME_STRATEGIES
        .iter()
        .find_map(|s| s.resolve(chat_id, sender, configured))
        .unwrap_or_else(|| format!("User_{chat_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(username: Option<&str>, first: &str, last: Option<&str>) -> SenderProfile {
        SenderProfile {
            username: username.map(str::to_string),
            first_name: first.to_string(),
            last_name: last.map(str::to_string),
        }
    }

    #[test]
    fn configured_name_wins() {
        let configured = HashMap::from([(9, "Household".to_string())]);
        let s = sender(Some("alice"), "Alice", None);
        assert_eq!(resolve_display_name(ChatId(9), &s, &configured), "Household");
    }

    #[test]
    fn falls_back_through_strategies() {
        let none = HashMap::new();
        assert_eq!(
            resolve_display_name(ChatId(9), &sender(Some("alice"), "Alice", None), &none),
            "alice"
        );
        assert_eq!(
            resolve_display_name(ChatId(9), &sender(Some(""), "Alice", Some("Smith")), &none),
            "Alice Smith"
        );
        assert_eq!(
            resolve_display_name(ChatId(9), &sender(None, "Alice", None), &none),
            "Alice"
        );
        assert_eq!(
            resolve_display_name(ChatId(-100), &sender(None, " ", None), &none),
            "User_-100"
        );
    }
}
