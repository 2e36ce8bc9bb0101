use colored::{ColoredString, Colorize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Info,
    Success,
    Wait,
    Error,
    Night,
}

pub fn line(status: Status, message: &str) -> ColoredString {
    let text = format!("# {message}");
    match status {
        Status::Info => text.cyan(),
        Status::Success => text.green(),
        Status::Wait => text.yellow(),
        Status::Error => text.red(),
        Status::Night => text.blue(),
    }
}

pub fn print(status: Status, message: &str) {
    println!("{}", line(status, message));
}
