use crate::expense::contains_number;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Expense,
    Reminders,
    Summary,
    Month,
}

/// What an inbound text message asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inbound {
    Command(BotCommand),
    /// Free text that looks like one or more expense lines.
    Expense,
    Unknown,
}

pub fn classify(text: &str) -> Inbound {
    let text = text.trim();
    if text.starts_with('/') {
        return match command_name(text).as_str() {
            "start" => Inbound::Command(BotCommand::Start),
            "help" => Inbound::Command(BotCommand::Help),
            "expense" => Inbound::Command(BotCommand::Expense),
            "reminders" => Inbound::Command(BotCommand::Reminders),
            "summary" => Inbound::Command(BotCommand::Summary),
            "month" => Inbound::Command(BotCommand::Month),
            _ => Inbound::Unknown,
        };
    }

    if contains_number(text) {
        Inbound::Expense
    } else {
        Inbound::Unknown
    }
}

fn command_name(text: &str) -> String {
    // Telegram may send `/cmd@botname arg1 ...`
    let first = text.split_whitespace().next().unwrap_or("");

    first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

pub const START_TEXT: &str = "Welcome to SpendWise Bot! Use /summary for today's expenses, or log expenses like 'Groceries 50'.";

pub const HELP_TEXT: &str = "SpendWise Bot Help 📖

Commands:
• /start - Welcome message
• /expense - Add a new expense
• /reminders - View your reminders
• /summary - View today's expense summary
• /month - View this month's summary

Expense formats (both work):
• description amount
• amount description

Examples:
Coffee Tea 15.50
25 Lunch at restaurant

Batch example:
Coffee 5.50
12.25 Lunch
Gas bill 45";

pub const EXPENSE_HELP_TEXT: &str = "To add expenses, use either format:

Format 1: description amount
Format 2: amount description

Examples:
• Coffee Tea 5.50
• 25.99 Groceries
• Gas bill 150
• 12 Lunch

Batch example:
Coffee 5.50
12 Lunch
Gas bill 45.75";

pub const UNKNOWN_TEXT: &str =
    "I don't understand that command. Type /help for available commands.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_recognized() {
        assert_eq!(classify("/start"), Inbound::Command(BotCommand::Start));
        assert_eq!(classify(" /HELP "), Inbound::Command(BotCommand::Help));
        assert_eq!(
            classify("/summary@spendwise_bot"),
            Inbound::Command(BotCommand::Summary)
        );
        assert_eq!(classify("/month now"), Inbound::Command(BotCommand::Month));
        assert_eq!(classify("/reminders"), Inbound::Command(BotCommand::Reminders));
        assert_eq!(classify("/expense"), Inbound::Command(BotCommand::Expense));
    }

    #[test]
    fn unknown_commands_are_not_expenses() {
        assert_eq!(classify("/pay 50"), Inbound::Unknown);
    }

    #[test]
    fn text_with_numbers_is_an_expense() {
        assert_eq!(classify("Coffee 5.50"), Inbound::Expense);
        assert_eq!(classify("Coffee\n5 Tea"), Inbound::Expense);
        assert_eq!(classify("hello"), Inbound::Unknown);
        assert_eq!(classify(""), Inbound::Unknown);
    }
}
