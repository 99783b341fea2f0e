use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("I don't understand that command. Please type `/help` for a list of commands.")]
    Unrecognized,
    #[error("Invalid command format. Usage: `{0}`")]
    Usage(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub kind: String,
    pub target: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    VaultListAll,
    VaultListDir { directory: String },
    VaultGetContent { filepath: String },
    VaultAppend { filepath: String, content: String },
    VaultPatch { filepath: String, patch: Patch },
    VaultSearch { query: String },
    VaultDelete { filepath: String },
    DockerListImages,
    DockerListContainers,
    DockerCreate { image: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Help,
    VaultListAll,
    VaultListDir,
    VaultGetContent,
    VaultAppend,
    VaultPatch,
    VaultSearch,
    VaultDelete,
    DockerListImages,
    DockerListContainers,
    DockerCreate,
}

struct CommandSpec {
    keyword: &'static str,
    arity: usize,
    usage: &'static str,
    summary: &'static str,
    kind: Kind,
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        keyword: "/help",
        arity: 0,
        usage: "/help",
        summary: "Show this help message.",
        kind: Kind::Help,
    },
    CommandSpec {
        keyword: "/obsidian_list_all",
        arity: 0,
        usage: "/obsidian_list_all",
        summary: "List all files and directories in the root of the Obsidian vault.",
        kind: Kind::VaultListAll,
    },
    CommandSpec {
        keyword: "/obsidian_list_dir",
        arity: 1,
        usage: "/obsidian_list_dir [directory]",
        summary: "List files and directories in a specific Obsidian directory.",
        kind: Kind::VaultListDir,
    },
    CommandSpec {
        keyword: "/obsidian_get_content",
        arity: 1,
        usage: "/obsidian_get_content [filepath]",
        summary: "Read a file from the Obsidian vault.",
        kind: Kind::VaultGetContent,
    },
    CommandSpec {
        keyword: "/obsidian_append",
        arity: 2,
        usage: "/obsidian_append [filepath] [content]",
        summary: "Append content to an Obsidian file.",
        kind: Kind::VaultAppend,
    },
    CommandSpec {
        keyword: "/obsidian_patch",
        arity: 4,
        usage: "/obsidian_patch [filepath] [patch_type] [patch_target] [new_content]",
        summary: "Patch content to an Obsidian file.",
        kind: Kind::VaultPatch,
    },
    CommandSpec {
        keyword: "/obsidian_search",
        arity: 1,
        usage: "/obsidian_search [query]",
        summary: "Search for text in the Obsidian vault.",
        kind: Kind::VaultSearch,
    },
    CommandSpec {
        keyword: "/obsidian_delete",
        arity: 1,
        usage: "/obsidian_delete [filepath]",
        summary: "Delete a file or directory from the Obsidian vault.",
        kind: Kind::VaultDelete,
    },
    CommandSpec {
        keyword: "/docker_list_images",
        arity: 0,
        usage: "/docker_list_images",
        summary: "List all Docker images.",
        kind: Kind::DockerListImages,
    },
    CommandSpec {
        keyword: "/docker_list_containers",
        arity: 0,
        usage: "/docker_list_containers",
        summary: "List all running Docker containers.",
        kind: Kind::DockerListContainers,
    },
    CommandSpec {
        keyword: "/docker_create",
        arity: 1,
        usage: "/docker_create [image_name]",
        summary: "Create and run a container from an image.",
        kind: Kind::DockerCreate,
    },
];

/// Parse one line of user input into a [`Command`].
///
/// Keywords are matched case-insensitively, longest first, and only when
/// followed by whitespace or the end of the line. Arguments keep their case.
/// The last argument takes the rest of the line, spaces included.
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let input = input.trim();
    let spec = match_keyword(input).ok_or(ParseError::Unrecognized)?;
    let remainder = input[spec.keyword.len()..].trim();
    let args = split_args(remainder, spec.arity).ok_or(ParseError::Usage(spec.usage))?;
    Ok(build(spec.kind, args))
}

/// A keyword only matches when followed by whitespace or the end of input, so
/// at most one entry can match and table order does not matter.
fn match_keyword(input: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| {
        let Some(head) = input.get(..spec.keyword.len()) else {
            return false;
        };
        head.eq_ignore_ascii_case(spec.keyword)
            && input[spec.keyword.len()..]
                .chars()
                .next()
                .is_none_or(char::is_whitespace)
    })
}

fn split_args(remainder: &str, arity: usize) -> Option<Vec<String>> {
    if arity == 0 {
        return Some(Vec::new());
    }
    let parts: Vec<String> = remainder.splitn(arity, ' ').map(str::to_string).collect();
    if parts.len() < arity || parts.iter().any(|p| p.trim().is_empty()) {
        return None;
    }
    Some(parts)
}

fn build(kind: Kind, args: Vec<String>) -> Command {
    let mut args = args.into_iter();
    let mut next = || args.next().unwrap_or_default();
    match kind {
        Kind::Help => Command::Help,
        Kind::VaultListAll => Command::VaultListAll,
        Kind::VaultListDir => Command::VaultListDir { directory: next() },
        Kind::VaultGetContent => Command::VaultGetContent { filepath: next() },
        Kind::VaultAppend => Command::VaultAppend {
            filepath: next(),
            content: next(),
        },
        Kind::VaultPatch => Command::VaultPatch {
            filepath: next(),
            patch: Patch {
                kind: next(),
                target: next(),
                content: next(),
            },
        },
        Kind::VaultSearch => Command::VaultSearch { query: next() },
        Kind::VaultDelete => Command::VaultDelete { filepath: next() },
        Kind::DockerListImages => Command::DockerListImages,
        Kind::DockerListContainers => Command::DockerListContainers,
        Kind::DockerCreate => Command::DockerCreate { image: next() },
    }
}

/// All command keywords in table order.
pub fn keywords() -> Vec<&'static str> {
    COMMANDS.iter().map(|spec| spec.keyword).collect()
}

pub fn help_text() -> String {
    let mut output = String::from("### Available Commands:\n");
    for spec in COMMANDS {
        output.push_str(&format!("- `{}`: {}\n", spec.usage, spec.summary));
    }
    output.truncate(output.trim_end().len());
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_keyword_matches_only_itself() {
        for spec in COMMANDS {
            let matched = match_keyword(spec.keyword).unwrap();
            assert_eq!(matched.keyword, spec.keyword);
            let upper = format!("{} arg", spec.keyword.to_uppercase());
            assert_eq!(match_keyword(&upper).unwrap().keyword, spec.keyword);
            assert!(match_keyword(&format!("{}_x", spec.keyword)).is_none());
        }
    }

    #[test]
    fn parses_argumentless_commands() {
        assert_eq!(parse_command("/help").unwrap(), Command::Help);
        assert_eq!(
            parse_command("/obsidian_list_all").unwrap(),
            Command::VaultListAll
        );
        assert_eq!(
            parse_command("  /docker_list_images  ").unwrap(),
            Command::DockerListImages
        );
        assert_eq!(
            parse_command("/docker_list_containers").unwrap(),
            Command::DockerListContainers
        );
    }

    #[test]
    fn keyword_match_ignores_case_but_arguments_keep_it() {
        assert_eq!(
            parse_command("/OBSIDIAN_GET_CONTENT Notes/Daily.md").unwrap(),
            Command::VaultGetContent {
                filepath: "Notes/Daily.md".to_string()
            }
        );
    }

    #[test]
    fn single_argument_takes_rest_of_line() {
        assert_eq!(
            parse_command("/obsidian_search rust async traits").unwrap(),
            Command::VaultSearch {
                query: "rust async traits".to_string()
            }
        );
        assert_eq!(
            parse_command("/obsidian_list_dir notes").unwrap(),
            Command::VaultListDir {
                directory: "notes".to_string()
            }
        );
    }

    #[test]
    fn append_keeps_spaces_in_content() {
        assert_eq!(
            parse_command("/obsidian_append todo.md buy milk and eggs").unwrap(),
            Command::VaultAppend {
                filepath: "todo.md".to_string(),
                content: "buy milk and eggs".to_string()
            }
        );
    }

    #[test]
    fn patch_extracts_four_arguments() {
        assert_eq!(
            parse_command("/obsidian_patch plan.md heading Goals ship the release").unwrap(),
            Command::VaultPatch {
                filepath: "plan.md".to_string(),
                patch: Patch {
                    kind: "heading".to_string(),
                    target: "Goals".to_string(),
                    content: "ship the release".to_string(),
                }
            }
        );
    }

    #[test]
    fn missing_arguments_yield_usage() {
        let cases = [
            ("/obsidian_list_dir", "/obsidian_list_dir [directory]"),
            ("/obsidian_get_content", "/obsidian_get_content [filepath]"),
            ("/obsidian_append todo.md", "/obsidian_append [filepath] [content]"),
            (
                "/obsidian_patch plan.md heading Goals",
                "/obsidian_patch [filepath] [patch_type] [patch_target] [new_content]",
            ),
            ("/obsidian_search   ", "/obsidian_search [query]"),
            ("/obsidian_delete", "/obsidian_delete [filepath]"),
            ("/docker_create", "/docker_create [image_name]"),
        ];
        for (input, usage) in cases {
            assert_eq!(parse_command(input), Err(ParseError::Usage(usage)), "{input}");
        }
    }

    #[test]
    fn empty_middle_argument_is_rejected() {
        assert!(matches!(
            parse_command("/obsidian_patch plan.md  Goals text"),
            Err(ParseError::Usage(_))
        ));
    }

    #[test]
    fn unknown_input_is_unrecognized() {
        assert_eq!(parse_command("hello there"), Err(ParseError::Unrecognized));
        assert_eq!(parse_command("/unknown"), Err(ParseError::Unrecognized));
        assert_eq!(parse_command(""), Err(ParseError::Unrecognized));
    }

    #[test]
    fn keyword_requires_boundary() {
        assert_eq!(
            parse_command("/docker_list_imagesfoo"),
            Err(ParseError::Unrecognized)
        );
        assert_eq!(parse_command("/helpme"), Err(ParseError::Unrecognized));
    }

    #[test]
    fn longer_keyword_wins_over_shared_prefix() {
        // "/obsidian_list_dir" and "/obsidian_list_all" share a prefix with each
        // other; neither may capture the other's input.
        assert_eq!(
            parse_command("/obsidian_list_all extra").unwrap(),
            Command::VaultListAll
        );
        assert!(matches!(
            parse_command("/obsidian_list_dir"),
            Err(ParseError::Usage(_))
        ));
    }

    #[test]
    fn non_ascii_input_does_not_panic() {
        assert_eq!(parse_command("/héllo"), Err(ParseError::Unrecognized));
        assert_eq!(parse_command("ü"), Err(ParseError::Unrecognized));
    }

    #[test]
    fn help_lists_every_keyword() {
        let help = help_text();
        for keyword in keywords() {
            assert!(help.contains(keyword), "{keyword}");
        }
        assert!(help.starts_with("### Available Commands:"));
    }

    #[test]
    fn error_messages_match_display_text() {
        assert_eq!(
            ParseError::Usage("/docker_create [image_name]").to_string(),
            "Invalid command format. Usage: `/docker_create [image_name]`"
        );
        assert!(ParseError::Unrecognized.to_string().contains("/help"));
    }
}
