use colored::{ColoredString, Colorize};

/// Outcome line styles for command output.
#[derive(Debug, Clone, Copy)]
pub enum Status {
    Ok,
    Failed,
    Warning,
}

impl Status {
    fn marker(self) -> ColoredString {
        match self {
            Status::Ok => "✓".green().bold(),
            Status::Failed => "✗".red().bold(),
            Status::Warning => "⚠".yellow().bold(),
        }
    }

    fn paint(self, text: &str) -> ColoredString {
        match self {
            Status::Ok => text.green(),
            Status::Failed => text.red(),
            Status::Warning => text.yellow(),
        }
    }
}

pub fn header(title: &str) {
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(title.chars().count()).cyan());
}

pub fn status(kind: Status, text: &str) {
    println!("{} {}", kind.marker(), kind.paint(text));
}
