// MIT License - Copyright (c) 2026 Peter Wright
// Keypad command parsing

/// A keypad command, as typed. Codes are not checked against the live code here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `A<code>#`
    Arm { code: String },
    /// `B<current>B<new>#`
    ChangeCode { current: String, new: String },
    /// `D<code>#`
    Disarm { code: String },
}

/// Parse a `#`-terminated entry buffer.
///
/// Shapes are tried in order: arm, change-code, disarm. Any buffer starting
/// with `A` is an arm attempt, whatever follows. Change-code looks for
/// `B<digits>B<digits>` at the end of the buffer; keys typed before the
/// first of those two `B`s are ignored.
pub fn parse_command(buffer: &str) -> Option<Command> {
    let body = buffer.strip_suffix('#')?;

    if let Some(code) = body.strip_prefix('A') {
        return Some(Command::Arm {
            code: code.to_string(),
        });
    }

    if let Some((current, new)) = parse_change_code(body) {
        return Some(Command::ChangeCode {
            current: current.to_string(),
            new: new.to_string(),
        });
    }

    body.strip_prefix('D').map(|code| Command::Disarm {
        code: code.to_string(),
    })
}

fn parse_change_code(body: &str) -> Option<(&str, &str)> {
    let (head, new) = body.rsplit_once('B')?;
    let (_, current) = head.rsplit_once('B')?;
    if is_digit_group(current) && is_digit_group(new) {
        Some((current, new))
    } else {
        None
    }
}

fn is_digit_group(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
