use iva_core::types::{Registration, View};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Register(Registration),
    ShowRegister,
    ShowLogin,
    /// Empty line: press or release the talk button.
    ToggleRecording,
    Say(String),
    Health,
    Logout,
    Help,
    Quit,
}

pub fn help(view: View) -> &'static str {
    match view {
        View::Login => "login <email> <password> | register | quit",
        View::Register => {
            "register <first> <last> <email> <password> <registration-number> | back | quit"
        }
        View::Authenticated => {
            "<enter> start/stop talking | <text> send a message | /health | /logout | /quit"
        }
    }
}

/// Interpret one input line for the screen currently shown.
pub fn parse(line: &str, view: View) -> Result<Command, String> {
    let trimmed = line.trim();
    let mut words = trimmed.split_whitespace();
    let head = words.next().unwrap_or_default();
    let rest: Vec<&str> = words.collect();

    match view {
        View::Authenticated => Ok(match trimmed {
            "" => Command::ToggleRecording,
            "/logout" => Command::Logout,
            "/quit" => Command::Quit,
            "/health" => Command::Health,
            "/help" => Command::Help,
            text => Command::Say(text.to_string()),
        }),
        View::Login => match (head, rest.as_slice()) {
            ("login", [email, password]) => Ok(Command::Login {
                email: email.to_string(),
                password: password.to_string(),
            }),
            ("login", _) => Err("usage: login <email> <password>".into()),
            ("register", []) => Ok(Command::ShowRegister),
            ("quit", []) => Ok(Command::Quit),
            ("help", _) | ("", _) => Ok(Command::Help),
            _ => Err(format!("unknown command: {head}")),
        },
        View::Register => match (head, rest.as_slice()) {
            ("register", [first, last, email, password, number]) => {
                Ok(Command::Register(Registration {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    registration_number: number.to_string(),
                }))
            }
            ("register", _) => Err(
                "usage: register <first> <last> <email> <password> <registration-number>".into(),
            ),
            ("back", []) | ("login", []) => Ok(Command::ShowLogin),
            ("quit", []) => Ok(Command::Quit),
            ("help", _) | ("", _) => Ok(Command::Help),
            _ => Err(format!("unknown command: {head}")),
        },
    }
}
