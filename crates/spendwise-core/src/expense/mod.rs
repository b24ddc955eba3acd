//! Free-text expense entry parsing.
//!
//! `interpret` turns one line into a [`ParsedExpense`]; `aggregate` drives it over a
//! multi-line message and attaches the caller's context to every successful line.
//! Both are pure: no I/O, no logging, no configuration.

mod batch;
mod interpreter;

pub use batch::{
    aggregate, BatchError, BatchResult, ExpenseContext, ExpenseRecord, LineFailure, BOT_SOURCE,
};
pub use interpreter::{contains_number, interpret, LineRejection, ParsedExpense};
