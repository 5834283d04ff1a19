use std::fmt;
use std::str::FromStr;

/// Largest command a client may send
pub const MAX_COMMAND_BYTES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Invalid,
}

impl Command {
    /// Parse one client message: first line, trimmed, case-insensitive
    pub fn parse(bytes: &[u8]) -> Self {
        let Ok(text) = std::str::from_utf8(bytes) else {
            return Command::Invalid;
        };

        let line = text.lines().next().unwrap_or("").trim();
        if line.eq_ignore_ascii_case("START") {
            Command::Start
        } else if line.eq_ignore_ascii_case("STOP") {
            Command::Stop
        } else {
            Command::Invalid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Start => "START",
            Command::Stop => "STOP",
            Command::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one of these is written back per connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    RecordingStarted,
    AlreadyRecording,
    NotRecording,
    TooShort,
    NoAudio,
    NoSpeech,
    InvalidCommand,
    Exception,
    /// Recognized text, sent without prefix
    Transcript(String),
}

impl Reply {
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            Reply::RecordingStarted | Reply::AlreadyRecording | Reply::Transcript(_)
        )
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::RecordingStarted => f.write_str("RECORDING_STARTED"),
            Reply::AlreadyRecording => f.write_str("ALREADY_RECORDING"),
            Reply::NotRecording => f.write_str("ERROR:NOT_RECORDING"),
            Reply::TooShort => f.write_str("ERROR:TOO_SHORT"),
            Reply::NoAudio => f.write_str("ERROR:NO_AUDIO"),
            Reply::NoSpeech => f.write_str("ERROR:NO_SPEECH"),
            Reply::InvalidCommand => f.write_str("ERROR:INVALID_COMMAND"),
            Reply::Exception => f.write_str("ERROR:EXCEPTION"),
            Reply::Transcript(text) => f.write_str(text),
        }
    }
}

impl FromStr for Reply {
    type Err = std::convert::Infallible;

    /// Anything outside the fixed vocabulary is transcribed text
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "RECORDING_STARTED" => Reply::RecordingStarted,
            "ALREADY_RECORDING" => Reply::AlreadyRecording,
            "ERROR:NOT_RECORDING" => Reply::NotRecording,
            "ERROR:TOO_SHORT" => Reply::TooShort,
            "ERROR:NO_AUDIO" => Reply::NoAudio,
            "ERROR:NO_SPEECH" => Reply::NoSpeech,
            "ERROR:INVALID_COMMAND" => Reply::InvalidCommand,
            "ERROR:EXCEPTION" => Reply::Exception,
            text => Reply::Transcript(text.to_string()),
        })
    }
}
