// File: ./src/cli.rs
//! Command-line parsing and help text.
use crate::model::EventColor;
use anyhow::{Result, bail};
use std::path::PathBuf;
use strum::IntoEnumIterator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Seven columns starting Monday, shifted by `offset` weeks.
    Week { offset: i64 },
    /// One column for today, shifted by `offset` days.
    Today { offset: i64 },
    NextMeeting,
    Calendars,
    /// First-run consent flow writing the account's token file.
    Auth { account: String, client_secret: PathBuf },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub root: Option<PathBuf>,
    pub command: Command,
}

/// Parses `args` (without the binary name).
pub fn parse_args(args: &[String]) -> Result<Cli> {
    let mut root: Option<PathBuf> = None;
    let mut positional: Vec<String> = Vec::new();
    let mut client_secret: Option<PathBuf> = None;
    let mut offset: i64 = 0;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" | "help" => {
                return Ok(Cli {
                    root,
                    command: Command::Help,
                });
            }
            "--root" | "-r" => {
                let Some(value) = args.get(i + 1) else {
                    bail!("--root needs a path");
                };
                root = Some(PathBuf::from(value));
                i += 1;
            }
            "--offset" | "-o" => {
                let Some(value) = args.get(i + 1) else {
                    bail!("--offset needs a number");
                };
                offset = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("invalid offset '{}'", value))?;
                i += 1;
            }
            "--client-secret" | "-s" => {
                let Some(value) = args.get(i + 1) else {
                    bail!("--client-secret needs a path");
                };
                client_secret = Some(PathBuf::from(value));
                i += 1;
            }
            arg if !arg.starts_with('-') => {
                positional.push(arg.to_string());
            }
            arg => bail!("unexpected argument '{}'", arg),
        }
        i += 1;
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        None | Some("week") => Command::Week { offset },
        Some("today") => Command::Today { offset },
        Some("next-meeting") => Command::NextMeeting,
        Some("calendars") => Command::Calendars,
        Some("auth") => {
            let Some(account) = positional.next() else {
                bail!("auth needs an account name");
            };
            let Some(client_secret) = client_secret.take() else {
                bail!("auth needs --client-secret <path>");
            };
            Command::Auth {
                account,
                client_secret,
            }
        }
        Some(other) => bail!("unknown command '{}'", other),
    };
    if let Some(extra) = positional.next() {
        bail!("unexpected argument '{}'", extra);
    }
    if client_secret.is_some() {
        bail!("--client-secret only applies to auth");
    }
    Ok(Cli { root, command })
}

pub fn print_help(binary_name: &str) {
    println!(
        "gcal-tui v{} - Google Calendar in your terminal",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [--root <path>] [week] [--offset <weeks>]", binary_name);
    println!("    {} today [--offset <days>]", binary_name);
    println!("    {} next-meeting", binary_name);
    println!("    {} calendars", binary_name);
    println!("    {} auth <account> --client-secret <path>", binary_name);
    println!("    {} --help", binary_name);
    println!();
    println!("COMMANDS:");
    println!("    week              Week view, Monday to Sunday (default)");
    println!("    today             Single day view");
    println!("    next-meeting      Countdown to the next upcoming event");
    println!("    calendars         List the calendars each account can see");
    println!("    auth              Grant access for one account and save its token file");
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -o, --offset <n>      Shift the window by n weeks (week) or days (today).");
    println!("    -s, --client-secret <path>");
    println!("                          OAuth client JSON from the Google Cloud console (auth).");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("KEYBINDINGS:");
    println!("    h / Left          Scroll days left");
    println!("    l / Right         Scroll days right");
    println!("    k / Up / Ctrl+B   Scroll up");
    println!("    j / Down / Ctrl+F Scroll down");
    println!("    p / n             Previous / next week or day");
    println!("    r                 Refresh now");
    println!("    q / Esc           Quit");
    println!();
    let colors: Vec<&'static str> = EventColor::iter().map(|c| c.as_tag()).collect();
    println!("CALENDAR COLORS:");
    println!("    {}", colors.join(", "));
    println!("    Unknown or missing colors fall back to orange.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_default_is_week() {
        let cli = parse_args(&[]).unwrap();
        assert_eq!(cli.command, Command::Week { offset: 0 });
        assert!(cli.root.is_none());
    }

    #[test]
    fn test_commands_and_options() {
        assert_eq!(
            parse_args(&args("today --offset -1")).unwrap().command,
            Command::Today { offset: -1 }
        );
        assert_eq!(
            parse_args(&args("--offset 2 week")).unwrap().command,
            Command::Week { offset: 2 }
        );
        assert_eq!(
            parse_args(&args("next-meeting")).unwrap().command,
            Command::NextMeeting
        );
        let cli = parse_args(&args("-r /tmp/gc calendars")).unwrap();
        assert_eq!(cli.command, Command::Calendars);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/gc")));
        assert_eq!(parse_args(&args("week -h")).unwrap().command, Command::Help);
    }

    #[test]
    fn test_auth_command() {
        assert_eq!(
            parse_args(&args("auth work --client-secret ~/Downloads/cs.json"))
                .unwrap()
                .command,
            Command::Auth {
                account: "work".into(),
                client_secret: PathBuf::from("~/Downloads/cs.json"),
            }
        );
        assert_eq!(
            parse_args(&args("-s cs.json auth home")).unwrap().command,
            Command::Auth {
                account: "home".into(),
                client_secret: PathBuf::from("cs.json"),
            }
        );
        assert!(parse_args(&args("auth")).is_err());
        assert!(parse_args(&args("auth work")).is_err());
        assert!(parse_args(&args("week -s cs.json")).is_err());
        assert!(parse_args(&args("auth a b -s cs.json")).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_args(&args("yesterday")).is_err());
        assert!(parse_args(&args("week --offset x")).is_err());
        assert!(parse_args(&args("--root")).is_err());
        assert!(parse_args(&args("--verbose")).is_err());
        assert!(parse_args(&args("week today")).is_err());
    }
}
