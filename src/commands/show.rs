use crate::core::{AppState, Side};

/// The fields and the state of both clones, one per line
pub fn describe(state: &AppState) -> String {
    let config = &state.config;
    let mut output = String::new();

    let fields = [
        ("directory name", &config.directory_name),
        ("git URL", &config.git_url),
        ("source branch", &config.source_branch),
        ("target branch", &config.target_branch),
        ("new branch", &config.new_branch),
    ];
    for (label, value) in fields {
        output.push_str(&format!("{:<17}{}\n", format!("{}:", label), value));
    }

    // continuation lines of a multi-line message are indented under the first one
    let message = config.commit_message.replace('\n', &format!("\n{:17}", ""));
    output.push_str(&format!("{:<17}{}\n", "commit message:", message));

    for side in [Side::Source, Side::Target] {
        let label = format!("{} repository:", side.label());
        let status = match state.handle(side) {
            Some(handle) => format!(
                "{} (on {}, from {})",
                handle.path.display(),
                handle.branch.as_deref().unwrap_or("detached HEAD"),
                handle.remote_url
            ),
            None => "not cloned".to_string(),
        };
        output.push_str(&format!("{:<20}{}\n", label, status));
    }

    output
}
