//! Event renderers for stdout.
//!
//! - [`text::TextReporter`]: human-readable lines
//! - [`jsonl::JsonlReporter`]: one JSON object per line
//!
//! Both implement [`crate::events::EventSink`] and write to any `Write`, so
//! tests can capture them in a `Vec<u8>`.

pub mod jsonl;
pub mod text;

pub use jsonl::JsonlReporter;
pub use text::TextReporter;

/// Format an integer with `,` thousands separators.
///
/// # Examples
///
/// ```
/// use symdupe::output::group_digits;
///
/// assert_eq!(group_digits(1234567), "1,234,567");
/// assert_eq!(group_digits(999), "999");
/// ```
#[must_use]
pub fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
