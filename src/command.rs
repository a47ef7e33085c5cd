//! Parsing of shell input lines into [`Command`]s.

use std::str::FromStr;

use crate::error::Error;
use crate::registry::Handle;
use crate::sort::SortKey;
use crate::transport::FlagOp;

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect(String),
    Disconnect,
    Login,
    Select(String),
    Capability,
    Search(Vec<String>),
    Sort {
        keys: Vec<SortKey>,
        search: Vec<String>,
    },
    List(Option<Handle>),
    Uniq {
        handle: Handle,
        report_only: bool,
    },
    Flags {
        op: FlagOp,
        flags: Vec<String>,
        handle: Handle,
    },
    Delete(Handle),
    Expunge,
    Help,
    Quit,
}

/// Usage lines, in the order `help` prints them.
pub const USAGE: &[(&str, &str)] = &[
    ("connect <server>", "open a TLS connection"),
    ("disconnect", "log out and close the connection"),
    ("login", "authenticate (prompts for user and password)"),
    ("select <mailbox>", "select a folder"),
    ("capability", "list server capabilities"),
    ("search <keyword>...", "run SEARCH and save the result"),
    ("sort <key[,key...]> [<keyword>...]", "run SORT and save the result"),
    ("list [<handle>]", "summarize saved results, or show one"),
    ("uniq [-n] <handle>", "flag adjacent duplicates (-n: only report)"),
    ("flags add|remove <flag>... <handle>", "change flags on saved messages"),
    ("delete <handle>", "discard a saved result"),
    ("expunge", "permanently remove \\Deleted messages"),
    ("help", "show this list"),
    ("quit", "leave the shell"),
];

const FLAGS_USAGE: &str = "flags add|remove <flag>... <handle>";

fn handle(word: &str, usage: &'static str) -> Result<Handle, Error> {
    word.parse().map_err(|_| Error::Usage(usage))
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Command {
    /// Parses one input line. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, Error> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let (name, args) = match words.split_first() {
            Some((name, args)) => (*name, args),
            None => return Ok(None),
        };

        let cmd = match (name, args) {
            ("quit", []) | ("exit", []) => Command::Quit,
            ("help", []) | ("?", []) => Command::Help,
            ("connect", [server]) => Command::Connect(server.to_string()),
            ("connect", _) => return Err(Error::Usage("connect <server>")),
            ("disconnect", []) => Command::Disconnect,
            ("login", []) => Command::Login,
            ("select", [mailbox]) => Command::Select(mailbox.to_string()),
            ("select", _) => return Err(Error::Usage("select <mailbox>")),
            ("capability", []) => Command::Capability,
            ("search", []) => return Err(Error::Usage("search <keyword>...")),
            ("search", keywords) => Command::Search(strings(keywords)),
            ("sort", [keys, search @ ..]) => Command::Sort {
                keys: SortKey::parse_list(keys)
                    .map_err(|_| Error::Usage("sort <key[,key...]> [<keyword>...]"))?,
                search: strings(search),
            },
            ("sort", []) => return Err(Error::Usage("sort <key[,key...]> [<keyword>...]")),
            ("list", []) => Command::List(None),
            ("list", [h]) => Command::List(Some(handle(h, "list [<handle>]")?)),
            ("list", _) => return Err(Error::Usage("list [<handle>]")),
            ("uniq", [h]) => Command::Uniq {
                handle: handle(h, "uniq [-n] <handle>")?,
                report_only: false,
            },
            ("uniq", ["-n", h]) => Command::Uniq {
                handle: handle(h, "uniq [-n] <handle>")?,
                report_only: true,
            },
            ("uniq", _) => return Err(Error::Usage("uniq [-n] <handle>")),
            ("flags", [op, flags @ .., h]) => {
                let op = match op.to_ascii_lowercase().as_str() {
                    "add" => FlagOp::Add,
                    "remove" => FlagOp::Remove,
                    _ => return Err(Error::Usage(FLAGS_USAGE)),
                };
                Command::Flags {
                    op,
                    flags: strings(flags),
                    handle: handle(h, FLAGS_USAGE)?,
                }
            }
            ("flags", _) => return Err(Error::Usage(FLAGS_USAGE)),
            ("delete", [h]) => Command::Delete(handle(h, "delete <handle>")?),
            ("delete", _) => return Err(Error::Usage("delete <handle>")),
            ("expunge", []) => Command::Expunge,
            (name, _) if is_known(name) => return Err(Error::Usage(usage_for(name))),
            (name, _) => return Err(Error::UnknownCommand(name.to_string())),
        };
        Ok(Some(cmd))
    }
}

fn is_known(name: &str) -> bool {
    USAGE
        .iter()
        .any(|(usage, _)| usage.split(' ').next() == Some(name))
}

fn usage_for(name: &str) -> &'static str {
    USAGE
        .iter()
        .map(|(usage, _)| *usage)
        .find(|usage| usage.split(' ').next() == Some(name))
        .unwrap_or("help")
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)?.ok_or(Error::Usage("help"))
    }
}
