use std::io::{self, Read};
use std::str::FromStr;
use std::time::Duration;

/// Command line text that is read from stdin when given as "-". A literal
/// dash can be passed as "\-". The trailing newline most shells and pipes
/// append is dropped so it does not end up inside the QR payload or prompt.
#[derive(Debug, Clone)]
pub struct StringInput(pub String);

impl FromStr for StringInput {
    type Err = std::io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "-" => {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                Ok(StringInput(strip_line_ending(buffer)))
            }
            r"\-" => Ok(StringInput("-".to_string())),
            _ => Ok(StringInput(s.to_string())),
        }
    }
}

fn strip_line_ending(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

impl AsRef<str> for StringInput {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StringInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse a whole number of seconds into a non-zero timeout.
pub fn parse_seconds(s: &str) -> Result<Duration, String> {
    match s.trim().parse::<u64>() {
        Ok(0) => Err("Timeout must be at least one second".to_string()),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(err) => Err(format!("Invalid number of seconds: {err}")),
    }
}
