use std::str::FromStr;

pub const HELP: &str = "Команды: start | stop | send | test | diag | status | text [новый текст] | \
focus on|off | delay <перед_мс> <после_мс> | help | quit";

/// Команда интерактивной консоли режима `run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Send,
    Test,
    Diagnose,
    Status,
    ShowText,
    SetText(String),
    Focus(bool),
    Delay { pre_type_ms: u64, post_send_ms: u64 },
    Help,
    Quit,
    Empty,
}

impl FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "" => ConsoleCommand::Empty,
            "start" => ConsoleCommand::Start,
            "stop" => ConsoleCommand::Stop,
            "send" => ConsoleCommand::Send,
            "test" => ConsoleCommand::Test,
            "diag" | "diagnose" => ConsoleCommand::Diagnose,
            "status" => ConsoleCommand::Status,
            "text" if rest.is_empty() => ConsoleCommand::ShowText,
            "text" => ConsoleCommand::SetText(rest.to_string()),
            "focus" => match rest {
                "on" => ConsoleCommand::Focus(true),
                "off" => ConsoleCommand::Focus(false),
                _ => return Err(format!("focus ожидает on|off, получено '{}'", rest)),
            },
            "delay" => {
                let values: Vec<&str> = rest.split_whitespace().collect();
                match values.as_slice() {
                    [pre, post] => ConsoleCommand::Delay {
                        pre_type_ms: parse_ms(pre)?,
                        post_send_ms: parse_ms(post)?,
                    },
                    _ => return Err("delay ожидает два числа: <перед_мс> <после_мс>".to_string()),
                }
            }
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => return Err(format!("Неизвестная команда '{}'. {}", other, HELP)),
        };

        Ok(command)
    }
}

fn parse_ms(value: &str) -> Result<u64, String> {
    value
        .parse()
        .map_err(|_| format!("'{}' не является числом миллисекунд", value))
}
