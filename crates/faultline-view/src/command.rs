//! Line-oriented interaction for the terminal surface.

use faultline_types::EdgeId;

use crate::driver::Command;
use crate::selection::SelectionEvent;

pub const COMMAND_HELP: &str = "commands: pause | live | seek <ms> | step <+/-ms> | back | forward | \
select node <id> | select edge <source> <target> | clear | quit";

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str, step_ms: i64) -> Result<Option<Command>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let command = match words.as_slice() {
        [] => return Ok(None),
        ["pause"] => Command::SetLive(false),
        ["live" | "resume"] => Command::SetLive(true),
        ["seek", ts] => Command::SetCursor(parse_ms(ts)?),
        ["step", delta] => Command::Step(parse_ms(delta)?),
        ["back"] => Command::Step(-step_ms),
        ["forward"] => Command::Step(step_ms),
        ["select", "node", id] => Command::Select(SelectionEvent::node(*id)),
        ["select", "edge", source, target] => {
            Command::Select(SelectionEvent::edge(EdgeId::new(*source, *target)))
        }
        ["clear"] => Command::ClearSelection,
        ["quit" | "exit"] => Command::Shutdown,
        _ => return Err(format!("unrecognized command {line:?}; {COMMAND_HELP}")),
    };
    Ok(Some(command))
}

fn parse_ms(raw: &str) -> Result<i64, String> {
    raw.trim_start_matches('+')
        .parse::<i64>()
        .map_err(|e| format!("invalid milliseconds {raw:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_temporal_commands() {
        assert_eq!(parse_command("pause", 5_000), Ok(Some(Command::SetLive(false))));
        assert_eq!(parse_command("  live ", 5_000), Ok(Some(Command::SetLive(true))));
        assert_eq!(
            parse_command("seek 1700000000000", 5_000),
            Ok(Some(Command::SetCursor(1_700_000_000_000)))
        );
        assert_eq!(parse_command("step +250", 5_000), Ok(Some(Command::Step(250))));
        assert_eq!(parse_command("step -250", 5_000), Ok(Some(Command::Step(-250))));
        assert_eq!(parse_command("back", 5_000), Ok(Some(Command::Step(-5_000))));
        assert_eq!(parse_command("forward", 1_000), Ok(Some(Command::Step(1_000))));
    }

    #[test]
    fn parses_selection_commands() {
        assert_eq!(
            parse_command("select node api-gateway", 5_000),
            Ok(Some(Command::Select(SelectionEvent::node("api-gateway"))))
        );
        assert_eq!(
            parse_command("select edge a b", 5_000),
            Ok(Some(Command::Select(SelectionEvent::edge(EdgeId::new("a", "b")))))
        );
        assert_eq!(parse_command("clear", 5_000), Ok(Some(Command::ClearSelection)));
        assert_eq!(parse_command("quit", 5_000), Ok(Some(Command::Shutdown)));
    }

    #[test]
    fn blank_and_invalid_lines() {
        assert_eq!(parse_command("   ", 5_000), Ok(None));
        assert!(parse_command("seek soon", 5_000).is_err());
        assert!(parse_command("select edge a", 5_000).is_err());
        assert!(parse_command("rewind", 5_000).is_err());
    }
}
