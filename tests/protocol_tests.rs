// Tests for the wire vocabulary: command parsing and reply strings

use speech_daemon::server::MAX_COMMAND_BYTES;
use speech_daemon::{Command, Reply};

#[test]
fn test_parse_commands() {
    assert_eq!(Command::parse(b"START"), Command::Start);
    assert_eq!(Command::parse(b"STOP"), Command::Stop);
    assert_eq!(Command::parse(b"start"), Command::Start);
    assert_eq!(Command::parse(b"Stop"), Command::Stop);
    assert_eq!(Command::parse(b"  START\r\n"), Command::Start);
}

#[test]
fn test_only_first_line_counts() {
    assert_eq!(Command::parse(b"STOP\nSTART\n"), Command::Stop);
    assert_eq!(Command::parse(b"\nSTART"), Command::Invalid);
}

#[test]
fn test_unknown_commands_are_invalid() {
    assert_eq!(Command::parse(b""), Command::Invalid);
    assert_eq!(Command::parse(b"STARTX"), Command::Invalid);
    assert_eq!(Command::parse(b"START NOW"), Command::Invalid);
    assert_eq!(Command::parse(b"PAUSE"), Command::Invalid);
    assert_eq!(Command::parse(&[0xc3, 0x28]), Command::Invalid);
    assert_eq!(Command::parse(&vec![b'A'; MAX_COMMAND_BYTES]), Command::Invalid);
}

#[test]
fn test_reply_wire_strings() {
    let cases = [
        (Reply::RecordingStarted, "RECORDING_STARTED"),
        (Reply::AlreadyRecording, "ALREADY_RECORDING"),
        (Reply::NotRecording, "ERROR:NOT_RECORDING"),
        (Reply::TooShort, "ERROR:TOO_SHORT"),
        (Reply::NoAudio, "ERROR:NO_AUDIO"),
        (Reply::NoSpeech, "ERROR:NO_SPEECH"),
        (Reply::InvalidCommand, "ERROR:INVALID_COMMAND"),
        (Reply::Exception, "ERROR:EXCEPTION"),
    ];

    for (reply, wire) in cases {
        assert_eq!(reply.to_string(), wire);
        assert_eq!(wire.parse::<Reply>(), Ok(reply));
    }
}

#[test]
fn test_error_replies_share_prefix() {
    for reply in [
        Reply::NotRecording,
        Reply::TooShort,
        Reply::NoAudio,
        Reply::NoSpeech,
        Reply::InvalidCommand,
        Reply::Exception,
    ] {
        assert!(reply.is_error());
        assert!(reply.to_string().starts_with("ERROR:"));
    }

    assert!(!Reply::RecordingStarted.is_error());
    assert!(!Reply::AlreadyRecording.is_error());
}

#[test]
fn test_transcript_is_sent_verbatim() {
    let reply: Reply = "turn on the kitchen lights".parse().unwrap();

    assert_eq!(reply, Reply::Transcript("turn on the kitchen lights".to_string()));
    assert_eq!(reply.to_string(), "turn on the kitchen lights");
    assert!(!reply.is_error());
}
