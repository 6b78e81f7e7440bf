use crate::{
    commands::show::describe,
    config::{ConfigStore, WorkflowConfig},
    core::{perform, Action, AppState, Side},
    git::Vcs,
};
use regex::Regex;
use std::io::{self, BufRead, Write};

const HELP: &str = r#"
# Commands:
# set <field> <value>   change a field, fields are:
#                       dir, url, source-branch, target-branch, new-branch, message
#                       (a \n in the message starts a new line)
# show                  print the fields and the clones
# clone                 clone <dir> and <dir>_copy
# checkout source       switch the first clone to source-branch
# checkout target       switch the second clone to target-branch
# sync                  copy the first clone's files over the second one
# branch                create new-branch in the second clone
# commit                commit and push the second clone if anything changed
# save                  save the fields
# help, quit
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Directory,
    Url,
    SourceBranch,
    TargetBranch,
    NewBranch,
    Message,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "dir" | "directory" => Some(Field::Directory),
            "url" => Some(Field::Url),
            "source-branch" => Some(Field::SourceBranch),
            "target-branch" => Some(Field::TargetBranch),
            "new-branch" => Some(Field::NewBranch),
            "message" => Some(Field::Message),
            _ => None,
        }
    }

    fn assign(self, config: &mut WorkflowConfig, value: String) {
        let field = match self {
            Field::Directory => &mut config.directory_name,
            Field::Url => &mut config.git_url,
            Field::SourceBranch => &mut config.source_branch,
            Field::TargetBranch => &mut config.target_branch,
            Field::NewBranch => &mut config.new_branch,
            Field::Message => &mut config.commit_message,
        };
        *field = value;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Empty,
    Set(Field, String),
    Show,
    Action(Action),
    Help,
    Quit,
}

const SET_PATTERN: &str = r"^set\s+(?P<field>[a-z-]+)(?:\s+(?P<value>.*))?$";

/// Turns input lines into [`Line`]s, the pattern is compiled once
pub struct LineParser {
    set_re: Regex,
}

impl LineParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            set_re: Regex::new(SET_PATTERN)?,
        })
    }

    pub fn parse(&self, line: &str) -> Result<Line, String> {
        parse_line(&self.set_re, line)
    }
}

fn parse_line(set_re: &Regex, line: &str) -> Result<Line, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(Line::Empty);
    }

    if let Some(caps) = set_re.captures(line) {
        let name = &caps["field"];
        let field = Field::from_name(name).ok_or_else(|| format!("Unknown field '{}'", name))?;
        let value = caps.name("value").map(|m| m.as_str()).unwrap_or_default();
        let value = match field {
            Field::Message => value.replace("\\n", "\n"),
            _ => value.to_string(),
        };
        return Ok(Line::Set(field, value));
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    let parsed = match words.as_slice() {
        ["show"] => Line::Show,
        ["clone"] => Line::Action(Action::Clone),
        ["checkout", "source"] => Line::Action(Action::Checkout(Side::Source)),
        ["checkout", "target"] => Line::Action(Action::Checkout(Side::Target)),
        ["sync"] => Line::Action(Action::SyncContents),
        ["branch"] => Line::Action(Action::CreateBranch),
        ["commit"] => Line::Action(Action::CommitAndPush),
        ["save"] => Line::Action(Action::PersistConfig),
        ["help"] => Line::Help,
        ["quit"] | ["exit"] => Line::Quit,
        _ => return Err(format!("Unknown command '{}', try help", line)),
    };
    Ok(parsed)
}

/// Read commands until `quit` or end of input, one notification per action
pub fn run<V: Vcs, R: BufRead, W: Write>(
    vcs: &V,
    store: &ConfigStore,
    state: &mut AppState,
    input: R,
    mut output: W,
) -> io::Result<()> {
    let parser = LineParser::new().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    writeln!(output, "{}", HELP.trim())?;

    for line in input.lines() {
        let line = line?;
        match parser.parse(&line) {
            Ok(Line::Empty) => {}
            Ok(Line::Quit) => break,
            Ok(Line::Help) => writeln!(output, "{}", HELP.trim())?,
            Ok(Line::Show) => write!(output, "{}", describe(state))?,
            Ok(Line::Set(field, value)) => {
                log::debug!("{:?} set to {:?}", field, value);
                field.assign(&mut state.config, value);
            }
            Ok(Line::Action(action)) => {
                let notification = perform(action, vcs, store, state);
                writeln!(output, "{}", notification)?;
            }
            Err(message) => writeln!(output, "❌ {}", message)?,
        }
        output.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::{Call, MockVcs};

    fn parse(line: &str) -> Result<Line, String> {
        LineParser::new().unwrap().parse(line)
    }

    #[test]
    fn test_parse_set_keeps_the_rest_of_the_line() {
        let line = parse("set url https://example.com/r.git").unwrap();
        assert_eq!(
            line,
            Line::Set(Field::Url, "https://example.com/r.git".to_string())
        );

        let line = parse("  set message Sync develop  into main  ").unwrap();
        assert_eq!(
            line,
            Line::Set(Field::Message, "Sync develop  into main".to_string())
        );
    }

    #[test]
    fn test_parse_set_message_with_new_lines() {
        let line = parse(r"set message title\n\nbody").unwrap();

        assert_eq!(line, Line::Set(Field::Message, "title\n\nbody".to_string()));
    }

    #[test]
    fn test_parse_set_without_value_clears_field() {
        let line = parse("set new-branch").unwrap();

        assert_eq!(line, Line::Set(Field::NewBranch, String::new()));
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(
            parse("checkout source").unwrap(),
            Line::Action(Action::Checkout(Side::Source))
        );
        assert_eq!(
            parse("checkout   target").unwrap(),
            Line::Action(Action::Checkout(Side::Target))
        );
        assert_eq!(parse("sync").unwrap(), Line::Action(Action::SyncContents));
        assert_eq!(parse("save").unwrap(), Line::Action(Action::PersistConfig));
        assert_eq!(parse("# comment").unwrap(), Line::Empty);
        assert_eq!(parse("exit").unwrap(), Line::Quit);
    }

    #[test]
    fn test_parse_rejects_unknown_input() {
        assert!(parse("set colour blue").is_err());
        assert!(parse("checkout").is_err());
        assert!(parse("push --force").is_err());
    }

    #[test]
    fn test_one_parser_handles_a_whole_session() {
        let parser = LineParser::new().unwrap();

        let lines: Vec<Line> = ["set dir proj", "clone", "", "set colour blue", "quit"]
            .iter()
            .map(|line| parser.parse(line).unwrap_or(Line::Help))
            .collect();

        assert_eq!(
            lines,
            vec![
                Line::Set(Field::Directory, "proj".to_string()),
                Line::Action(Action::Clone),
                Line::Empty,
                Line::Help,
                Line::Quit,
            ]
        );
    }

    #[test]
    fn test_shell_keeps_state_between_commands() {
        let vcs = MockVcs::new();
        let store = ConfigStore::new("unused.json");
        let mut state = AppState::default();
        let input = "set dir proj\nset url https://example.com/r.git\nclone\nbogus\nset new-branch feature-x\nbranch\nquit\ncommit\n";
        let mut output = Vec::new();

        run(&vcs, &store, &mut state, input.as_bytes(), &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("✅ Repository cloned into two directories"));
        assert!(output.contains("❌ Unknown command 'bogus'"));
        assert!(output.contains("✅ Created and switched to branch feature-x"));
        assert_eq!(
            state.target.as_ref().unwrap().branch.as_deref(),
            Some("feature-x")
        );
        // nothing after quit runs
        assert!(!vcs
            .get_calls()
            .iter()
            .any(|call| matches!(call, Call::IsDirty(_))));
    }
}
