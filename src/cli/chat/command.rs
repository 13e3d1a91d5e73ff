use regex::Regex;

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    List,
    Open(String),
    New,
    History,
    Clear,
    Help,
    Quit,
}

impl Command {
    /// Lines starting with `/` are commands; everything else is a message.
    pub fn parse(input: &str) -> Result<Command, String> {
        let trimmed = input.trim();
        if !trimmed.starts_with('/') {
            return Ok(Command::Send(input.trim_end_matches(['\r', '\n']).to_string()));
        }

        let re = Regex::new(r"^/(\w+)(?:\s+(.*))?$").map_err(|e| e.to_string())?;
        let Some(captures) = re.captures(trimmed) else {
            return Err(format!("Unknown command: {}", trimmed));
        };
        let name = captures.get(1).map_or("", |m| m.as_str());
        let arg = captures.get(2).map(|m| m.as_str().trim()).filter(|s| !s.is_empty());

        match (name, arg) {
            ("list", None) => Ok(Command::List),
            ("open", Some(selector)) => Ok(Command::Open(selector.to_string())),
            ("open", None) => Err("Usage: /open <number|id>".to_string()),
            ("new", None) => Ok(Command::New),
            ("history", None) => Ok(Command::History),
            ("clear", None) => Ok(Command::Clear),
            ("help", None) => Ok(Command::Help),
            ("quit", None) => Ok(Command::Quit),
            ("list" | "new" | "history" | "clear" | "help" | "quit", Some(_)) => {
                Err(format!("/{} takes no arguments", name))
            }
            _ => Err(format!("Unknown command: /{}", name)),
        }
    }
}
