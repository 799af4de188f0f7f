/// A recognized admin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Mute { username: String, seconds: i64 },
    Unmute { username: String },
    Help,
}

/// Outcome of tokenizing a `/`-prefixed admin input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    Command(AdminCommand),
    /// `/mute` with the right arity but a non-integer duration.
    BadMuteDuration,
    /// Anything unrecognized, including known commands with the wrong arity.
    Unknown,
}

pub const HELP_TEXT: &str = "/mute (username) (time) - mute a user for a number of seconds\n\
    /unmute (username) - lift a user's mute\n\
    /help - show this command list";

/// Tokenize an admin command line. Commands are case-sensitive and
/// space-delimited.
pub fn parse_command(text: &str) -> ParsedCommand {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let Some(&command) = tokens.first() else {
        return ParsedCommand::Unknown;
    };

    match command {
        "/mute" if tokens.len() == 3 => match tokens[2].parse::<i64>() {
            Ok(seconds) => ParsedCommand::Command(AdminCommand::Mute {
                username: tokens[1].to_string(),
                seconds,
            }),
            Err(_) => ParsedCommand::BadMuteDuration,
        },
        "/unmute" if tokens.len() == 2 => ParsedCommand::Command(AdminCommand::Unmute {
            username: tokens[1].to_string(),
        }),
        "/help" => ParsedCommand::Command(AdminCommand::Help),
        _ => ParsedCommand::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mute_with_duration() {
        assert_eq!(
            parse_command("/mute alice 30"),
            ParsedCommand::Command(AdminCommand::Mute {
                username: "alice".to_string(),
                seconds: 30,
            })
        );
    }

    #[test]
    fn negative_durations_still_parse() {
        assert_eq!(
            parse_command("/mute alice -5"),
            ParsedCommand::Command(AdminCommand::Mute {
                username: "alice".to_string(),
                seconds: -5,
            })
        );
    }

    #[test]
    fn non_integer_duration_is_flagged() {
        assert_eq!(parse_command("/mute alice soon"), ParsedCommand::BadMuteDuration);
    }

    #[test]
    fn wrong_arity_falls_through_to_unknown() {
        assert_eq!(parse_command("/mute alice"), ParsedCommand::Unknown);
        assert_eq!(parse_command("/mute alice 5 extra"), ParsedCommand::Unknown);
        assert_eq!(parse_command("/unmute"), ParsedCommand::Unknown);
        assert_eq!(parse_command("/unmute alice now"), ParsedCommand::Unknown);
    }

    #[test]
    fn parses_unmute_and_help() {
        assert_eq!(
            parse_command("/unmute alice"),
            ParsedCommand::Command(AdminCommand::Unmute {
                username: "alice".to_string(),
            })
        );
        assert_eq!(parse_command("/help"), ParsedCommand::Command(AdminCommand::Help));
    }

    #[test]
    fn unrecognized_input_is_unknown() {
        assert_eq!(parse_command("/ban alice"), ParsedCommand::Unknown);
        assert_eq!(parse_command("/"), ParsedCommand::Unknown);
        assert_eq!(parse_command("   "), ParsedCommand::Unknown);
    }

    #[test]
    fn commands_are_case_sensitive() {
        assert_eq!(parse_command("/MUTE alice 5"), ParsedCommand::Unknown);
        assert_eq!(parse_command("/Help"), ParsedCommand::Unknown);
    }
}
