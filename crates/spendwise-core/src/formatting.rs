//! User-facing text: currency, reminder lists and batch replies.

use crate::{
    backend::{NotificationPayload, Reminder},
    expense::LineFailure,
};

/// Rupee amount with two decimals and Indian digit grouping (`₹12,34,567.50`).
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let grouped = if int_part.len() <= 3 {
        int_part.to_string()
    } else {
        let (head, tail) = int_part.split_at(int_part.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (h, t) = rest.split_at(rest.len() - 2);
            groups.push(t);
            rest = h;
        }
        groups.push(rest);
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}₹{grouped}.{dec_part}")
}

/// Due text relative to `today` (day of month).
pub fn format_due_date(reminder: &Reminder, today: u32) -> String {
    let (start, end) = (reminder.day_of_month_start, reminder.day_of_month_end);

    if start == end {
        if today == start {
            return "Due Today".to_string();
        }
        return format!("Due on {start}");
    }

    if (start..=end).contains(&today) {
        return "Due Today".to_string();
    }

    format!("Due between {start}-{end}")
}

pub fn format_reminders(payload: &NotificationPayload, today: u32) -> String {
    if payload.reminders.is_empty() {
        return "No reminders found 📝".to_string();
    }

    let mut out = String::from("🔔 Daily Reminders\n\n");
    for r in &payload.reminders {
        out.push_str(&format!(
            "  • {} - {} ({})\n",
            r.description,
            format_currency(r.amount),
            format_due_date(r, today)
        ));
    }
    out.push_str("\nPlease check the app to take action.");
    out
}

/// Lines the user should fix, one per rejected entry.
pub fn format_failures(failures: &[LineFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("• Line {}: \"{}\" - {}", f.line_number, f.raw.trim(), f.reason))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Combined reply after a batch was saved.
///
/// `backend_message` replaces the default count line when present.
pub fn format_batch_reply(
    saved: usize,
    backend_message: Option<&str>,
    failures: &[LineFailure],
) -> String {
    let mut out = match backend_message {
        Some(m) => format!("✅ {m}"),
        None if saved == 1 => "✅ 1 expense saved successfully".to_string(),
        None => format!("✅ {saved} expenses saved successfully"),
    };

    if !failures.is_empty() {
        let noun = if failures.len() == 1 { "line" } else { "lines" };
        out.push_str(&format!(
            "\n\n⚠️ Skipped {} {noun}:\n{}",
            failures.len(),
            format_failures(failures)
        ));
    }
    out
}

/// Reply when no line could be read as an expense.
pub fn format_no_valid_expenses(failures: &[LineFailure]) -> String {
    if failures.is_empty() {
        return "❌ no valid expenses found".to_string();
    }
    format!("❌ no valid expenses found\n{}", format_failures(failures))
}

pub fn format_rejection(error: Option<&str>, details: Option<&str>) -> String {
    let mut out = match error {
        Some(e) => format!("❌ {e}"),
        None => "❌ API Error".to_string(),
    };
    if let Some(d) = details {
        out.push_str(&format!("\nDetails: {d}"));
    }
    out
}
