//! Slash command handling
//!
//! Decodes the form payload Slack posts for slash commands and produces the
//! synchronous reply. The only command with real grammar is `/logtime`:
//! `<hours> [hours] on <details>`.

use super::SlackError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static LOGTIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*(?:hours?|hrs?|h)?\s+on\s+(.+?)\s*$")
        .expect("logtime pattern compiles")
});

const LOGTIME_USAGE: &str =
    "Please provide time details. Example: `/logtime 2.5 hours on Project A - Task 1`";

/// The fields of a slash-command form payload this service uses
#[derive(Debug, Clone, Default)]
pub struct SlashCommand {
    pub command: String,
    pub text: String,
    pub user_id: String,
    pub user_name: String,
    pub channel_id: String,
}

impl SlashCommand {
    /// Decode an `application/x-www-form-urlencoded` body.
    pub fn from_form(body: &str) -> Result<Self, SlackError> {
        let mut cmd = SlashCommand::default();
        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            match key.as_ref() {
                "command" => cmd.command = value.into_owned(),
                "text" => cmd.text = value.into_owned(),
                "user_id" => cmd.user_id = value.into_owned(),
                "user_name" => cmd.user_name = value.into_owned(),
                "channel_id" => cmd.channel_id = value.into_owned(),
                _ => {}
            }
        }

        if cmd.command.is_empty() {
            return Err(SlackError::BadPayload("missing command field".to_string()));
        }
        Ok(cmd)
    }
}

/// Where Slack shows the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    InChannel,
    Ephemeral,
}

/// Synchronous reply returned in the HTTP response body
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub response_type: ResponseType,
    pub text: String,
}

impl CommandResponse {
    fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            text: text.into(),
        }
    }
}

/// A parsed `/logtime` request
#[derive(Debug, PartialEq)]
pub struct TimeEntryRequest {
    pub hours: f64,
    pub details: String,
}

/// Parse `/logtime` text into hours and free-form details.
pub fn parse_logtime(text: &str) -> Result<TimeEntryRequest, SlackError> {
    let caps = LOGTIME
        .captures(text)
        .ok_or_else(|| SlackError::BadPayload("unrecognized /logtime format".to_string()))?;

    let hours: f64 = caps[1]
        .parse()
        .map_err(|_| SlackError::BadPayload("unparseable hour count".to_string()))?;

    if hours <= 0.0 || hours > 24.0 {
        return Err(SlackError::BadPayload(format!(
            "hours out of range: {}",
            hours
        )));
    }

    Ok(TimeEntryRequest {
        hours,
        details: caps[2].to_string(),
    })
}

/// Produce the reply for a decoded slash command.
pub fn respond(cmd: &SlashCommand) -> CommandResponse {
    match cmd.command.as_str() {
        "/logtime" => match parse_logtime(&cmd.text) {
            Ok(entry) => CommandResponse::ephemeral(format!(
                "Time entry logged: {} hours on {}",
                entry.hours, entry.details
            )),
            Err(_) => CommandResponse::ephemeral(LOGTIME_USAGE),
        },
        "/status" => CommandResponse::ephemeral(format!(
            "{}: no timer running. Use `/logtime` to record time.",
            cmd.user_name
        )),
        "/projects" => {
            CommandResponse::ephemeral("Your projects are listed in the Timeclock dashboard.")
        }
        "/tasks" => {
            CommandResponse::ephemeral("Your tasks are listed in the Timeclock dashboard.")
        }
        other => CommandResponse::ephemeral(format!("Unknown command: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_form_payload() {
        let body = "command=%2Flogtime&text=2.5+hours+on+Project+A+-+Task+1&user_id=U123&user_name=roadrunner&channel_id=C42";
        let cmd = SlashCommand::from_form(body).unwrap();
        assert_eq!(cmd.command, "/logtime");
        assert_eq!(cmd.text, "2.5 hours on Project A - Task 1");
        assert_eq!(cmd.user_name, "roadrunner");
        assert_eq!(cmd.channel_id, "C42");
    }

    #[test]
    fn form_without_command_is_rejected() {
        assert!(matches!(
            SlashCommand::from_form("text=hello"),
            Err(SlackError::BadPayload(_))
        ));
    }

    #[test]
    fn parses_logtime_grammar() {
        let entry = parse_logtime("2.5 hours on Project A - Task 1").unwrap();
        assert_eq!(entry.hours, 2.5);
        assert_eq!(entry.details, "Project A - Task 1");

        let entry = parse_logtime("1 hour on standup").unwrap();
        assert_eq!(entry.hours, 1.0);

        // Bare number, no unit
        let entry = parse_logtime("8 on sprint review").unwrap();
        assert_eq!(entry.hours, 8.0);
        assert_eq!(entry.details, "sprint review");
    }

    #[test]
    fn logtime_keeps_details_after_first_separator() {
        let entry = parse_logtime("3 hours on working on the docs").unwrap();
        assert_eq!(entry.details, "working on the docs");
    }

    #[test]
    fn rejects_bad_logtime_input() {
        assert!(parse_logtime("").is_err());
        assert!(parse_logtime("lots of time on stuff").is_err());
        assert!(parse_logtime("2.5 hours").is_err());
        assert!(parse_logtime("0 hours on idling").is_err());
        assert!(parse_logtime("25 hours on crunch").is_err());
    }

    #[test]
    fn responds_to_known_and_unknown_commands() {
        let mut cmd = SlashCommand {
            command: "/logtime".to_string(),
            text: "2 hours on Project A".to_string(),
            user_name: "roadrunner".to_string(),
            ..Default::default()
        };
        let reply = respond(&cmd);
        assert_eq!(reply.response_type, ResponseType::Ephemeral);
        assert!(reply.text.contains("2 hours on Project A"));

        cmd.command = "/frobnicate".to_string();
        let reply = respond(&cmd);
        assert!(reply.text.contains("Unknown command"));

        cmd.command = "/logtime".to_string();
        cmd.text = "gibberish".to_string();
        let reply = respond(&cmd);
        assert!(reply.text.contains("Example"));
    }
}
