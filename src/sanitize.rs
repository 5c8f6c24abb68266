//! # Output Sanitizer
//!
//! On success, `droid exec` prints a short status banner before its real
//! output: hide-cursor, clear-line, cursor-to-column-1 and show-cursor
//! control sequences, a green checkmark line, then a color reset. Strip
//! exactly that prefix so protocol clients see clean text.

use regex::Regex;
use std::sync::LazyLock;

// ESC[?25l ESC[2K ESC[1G ESC[?25h ESC[32m ✓ <non-newline text> ESC[0m \n
static STATUS_PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\x1b\[\?25l\x1b\[2K\x1b\[1G\x1b\[\?25h\x1b\[32m✓[^\n]*\x1b\[0m\n")
        .expect("status preamble pattern is valid")
});

/// Remove the status banner from the front of `output`, if present.
///
/// The match is anchored at offset 0; anything else returns the text
/// unchanged, so applying this twice is a no-op.
pub fn strip_status_preamble(output: &str) -> String {
    STATUS_PREAMBLE.replace(output, "").into_owned()
}
