use annotext_config::Config;
use annotext_engine::{
    CommentPlacement, CursorPosition, FileState, HistoryManager, ScrollPosition, SessionDocument,
    SnapshotTimer, TickOutcome, create_anchor, io,
};
use anyhow::{Context, Result};
use relative_path::{RelativePath, RelativePathBuf};
use std::{
    env,
    path::PathBuf,
    process, thread,
    time::Instant,
};

const COMMANDS: &str = "\
Commands:
  anchor <file> <from> <to>                   print the anchor for a character range
  attach <file> <from> <to> <user> <text...>  comment on a character range
  locate <file>                               show where each comment now sits
  snapshot <file> [line column]               record the file if it changed
  watch <file>                                keep recording the file on the snapshot interval
  history <file>                              list snapshots of the file
  undo <file>                                 step back one snapshot
  redo <file>                                 step forward one snapshot
  autosave on|off                             toggle autosave";

const AUTOSAVE_ON: &str =
    "Autosave is on, so no snapshot history is kept. Run `autosave off` to start one.";

/// Everything a command needs: where the workspace is and how to treat it
struct Workspace {
    root: PathBuf,
    config: Config,
}

impl Workspace {
    fn session(&self) -> Result<SessionDocument> {
        io::load_session(&self.root)
            .with_context(|| format!("Failed to load session for {}", self.root.display()))
    }

    fn history(&self, session: &SessionDocument) -> HistoryManager {
        session.history_manager(self.config.history.history_config())
    }

    fn read(&self, file: &RelativePath) -> Result<String> {
        io::read_file(file, &self.root).with_context(|| format!("Failed to read {file}"))
    }

    fn save(&self, session: &SessionDocument) -> Result<()> {
        io::save_session(&self.root, session)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("annotext");
    let config_path = Config::config_path();

    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", config_path.display());
            process::exit(1);
        }
    };

    // Workspace comes from the config file, falling back to the current directory
    let from_config = config.workspace_path.is_some();
    let root = match &config.workspace_path {
        Some(path) => path.clone(),
        None => env::current_dir()?,
    };

    if let Err(e) = io::validate_workspace(&root) {
        let source = if from_config {
            format!(" from config file '{}'", config_path.display())
        } else {
            String::new()
        };
        eprintln!(
            "Error: Workspace '{}'{} is invalid: {e}",
            root.display(),
            source
        );
        process::exit(1);
    }

    let workspace = Workspace { root, config };
    let rest: Vec<&str> = args.iter().skip(2).map(String::as_str).collect();

    match (args.get(1).map(String::as_str), rest.as_slice()) {
        (Some("anchor"), [file, from, to]) => anchor(&workspace, file, from, to),
        (Some("attach"), [file, from, to, user, text @ ..]) if !text.is_empty() => {
            attach(&workspace, file, from, to, user, &text.join(" "))
        }
        (Some("locate"), [file]) => locate(&workspace, file),
        (Some("snapshot"), [file]) => snapshot(&workspace, file, CursorPosition::default()),
        (Some("snapshot"), [file, line, column]) => {
            let cursor =
                CursorPosition::new(parse_number(line, "line")?, parse_number(column, "column")?);
            snapshot(&workspace, file, cursor)
        }
        (Some("watch"), [file]) => watch(&workspace, file),
        (Some("history"), [file]) => history(&workspace, file),
        (Some("undo"), [file]) => step(&workspace, file, Step::Undo),
        (Some("redo"), [file]) => step(&workspace, file, Step::Redo),
        (Some("autosave"), ["on"]) => autosave(&workspace, true),
        (Some("autosave"), ["off"]) => autosave(&workspace, false),
        _ => usage(program),
    }
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <command> [args]");
    eprintln!("{COMMANDS}");
    process::exit(1);
}

fn parse_number(value: &str, name: &str) -> Result<usize> {
    value
        .parse()
        .with_context(|| format!("{name} must be a non-negative number, got '{value}'"))
}

fn anchor(workspace: &Workspace, file: &str, from: &str, to: &str) -> Result<()> {
    let content = workspace.read(RelativePath::new(file))?;
    let anchor = create_anchor(
        &content,
        parse_number(from, "from")?,
        parse_number(to, "to")?,
    )?;
    println!("{}", serde_json::to_string_pretty(&anchor)?);
    Ok(())
}

fn attach(
    workspace: &Workspace,
    file: &str,
    from: &str,
    to: &str,
    user: &str,
    text: &str,
) -> Result<()> {
    let file = RelativePath::new(file);
    let content = workspace.read(file)?;
    let mut session = workspace.session()?;
    let mut comments = session.comment_store();

    let id = comments
        .attach(
            file,
            user,
            &content,
            parse_number(from, "from")?,
            parse_number(to, "to")?,
            text,
        )?
        .id
        .clone();

    session.store_comments(&comments);
    workspace.save(&session)?;
    println!("{id}");
    Ok(())
}

fn locate(workspace: &Workspace, file: &str) -> Result<()> {
    let file = RelativePath::new(file);
    let content = workspace.read(file)?;
    let comments = workspace.session()?.comment_store();

    for placement in comments.locate(file, &content, &workspace.config.anchoring) {
        let comment = placement.comment();
        let text = comment
            .thread
            .first()
            .map(|reply| reply.text.as_str())
            .unwrap_or_default();
        let status = if comment.resolved { " (resolved)" } else { "" };
        match placement {
            CommentPlacement::Anchored { range, .. } => {
                println!("{} {}..{}{status} {text}", comment.id, range.from, range.to)
            }
            CommentPlacement::Orphaned { .. } => {
                println!("{} orphaned{status} {text}", comment.id)
            }
        }
    }
    Ok(())
}

fn snapshot(workspace: &Workspace, file: &str, cursor: CursorPosition) -> Result<()> {
    let file = RelativePathBuf::from(file);
    let content = workspace.read(&file)?;
    let mut session = workspace.session()?;
    if !session.keeps_history() {
        println!("{AUTOSAVE_ON}");
        return Ok(());
    }
    let mut history = workspace.history(&session);

    let recorded = history.record_if_changed(FileState {
        file_path: file.clone(),
        content,
        cursor,
        scroll: ScrollPosition::default(),
    });

    if recorded {
        session.session.active_file = Some(file.clone());
        if !session.session.open_files.contains(&file) {
            session.session.open_files.push(file.clone());
        }
        session.store_file_history(&history, &file);
        workspace.save(&session)?;
        println!("recorded");
    } else {
        println!("unchanged");
    }
    Ok(())
}

fn watch(workspace: &Workspace, file: &str) -> Result<()> {
    let file = RelativePathBuf::from(file);
    if !workspace.session()?.keeps_history() {
        println!("{AUTOSAVE_ON}");
        return Ok(());
    }
    let mut timer = SnapshotTimer::new(workspace.config.history.snapshot_interval());

    let root = workspace.root.clone();
    let watched = file.clone();
    timer.start(move || match io::read_file(&watched, &root) {
        Ok(content) => Some(FileState {
            file_path: watched.clone(),
            content,
            cursor: CursorPosition::default(),
            scroll: ScrollPosition::default(),
        }),
        Err(e) => {
            log::warn!("Skipping snapshot of {watched}: {e}");
            None
        }
    });

    log::info!("Watching {file} every {:?}", timer.interval());
    println!("Watching {file}, press Ctrl-C to stop");

    while let Some(due) = timer.next_due() {
        thread::sleep(due.saturating_duration_since(Instant::now()));

        // Other commands may have saved the session since the last tick
        let mut session = workspace.session()?;
        if !session.keeps_history() {
            timer.stop();
            println!("Autosave was turned on, stopped watching {file}");
            break;
        }
        let mut history = workspace.history(&session);

        if timer.tick(Instant::now(), &mut history) == TickOutcome::Recorded {
            session.store_file_history(&history, &file);
            workspace.save(&session)?;
            let count = history.history(&file).map_or(0, |h| h.len());
            println!("recorded snapshot {count}");
        }
    }
    Ok(())
}

fn history(workspace: &Workspace, file: &str) -> Result<()> {
    let session = workspace.session()?;
    let Some(file_history) = session.file_history.get(RelativePath::new(file)) else {
        println!("No history for {file}");
        return Ok(());
    };

    for (index, snapshot) in file_history.snapshots().iter().enumerate() {
        let marker = if file_history.current_index() == Some(index) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {index:>3}  {}  {} chars  cursor {}:{}",
            snapshot.timestamp,
            snapshot.content.chars().count(),
            snapshot.cursor.line,
            snapshot.cursor.column
        );
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Step {
    Undo,
    Redo,
}

fn step(workspace: &Workspace, file: &str, step: Step) -> Result<()> {
    let file = RelativePath::new(file);
    let mut session = workspace.session()?;
    let mut history = workspace.history(&session);

    let restored = match step {
        Step::Undo => history.undo(file),
        Step::Redo => history.redo(file),
    }
    .map(|snapshot| snapshot.content.clone());

    let Some(content) = restored else {
        let action = match step {
            Step::Undo => "undo",
            Step::Redo => "redo",
        };
        println!("Nothing to {action} for {file}");
        return Ok(());
    };

    io::write_file(file, &workspace.root, &content)
        .with_context(|| format!("Failed to write {file}"))?;
    session.store_history(&history);
    workspace.save(&session)?;
    print!("{content}");
    Ok(())
}

fn autosave(workspace: &Workspace, enabled: bool) -> Result<()> {
    let mut session = workspace.session()?;
    let mut history = workspace.history(&session);
    session.set_autosave(enabled, &mut history);
    workspace.save(&session)?;
    println!("autosave {}", if enabled { "on" } else { "off" });
    Ok(())
}

