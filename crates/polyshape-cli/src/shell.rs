//! Interactive admin session.
//!
//! The shell reads commands line by line and keeps one list per tab. A
//! one-second tick drives the inactivity monitor, so the session can expire
//! while the shell waits for input, including halfway through a form.

use std::future::Future;
use std::io::Write;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use polyshape_client::{ProjectsClient, PublicationsClient};
use polyshape_core::abort::AbortController;
use polyshape_core::actions::{CollectionApi, ListActions};
use polyshape_core::config::AdminConfig;
use polyshape_core::form::RecordForm;
use polyshape_core::listing::filter_and_sort;
use polyshape_core::models::{Collection, ListedDetail, Projects, Publications};
use polyshape_core::session::{InactivityMonitor, SessionEvent};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::config::CollectionArg;
use crate::progress::LoadingIndicator;
use crate::render::{self, RowDisplay};

const HELP: &str = "Commands:
  tab <publications|projects>  switch tab
  list                         show the current page
  search [text]                filter by title (no text clears the filter)
  page <n> | next | prev       change page
  refresh                      reload the list
  show <row>                   show one item
  add                          create an item
  edit <row>                   edit an item
  delete <row>                 delete an item
  stay                         keep the session alive
  logout                       sign out
  quit                         leave the shell

In forms, press Enter to keep a value, end multi-line fields with a single '.'
line, and type 'cancel' to discard the form.";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Help,
    Tab(CollectionArg),
    List,
    Search(String),
    Page(usize),
    Next,
    Prev,
    Refresh,
    Show(usize),
    Add,
    Edit(usize),
    Delete(usize),
    Stay,
    Logout,
    Quit,
}

/// Parses one input line. Errors are messages for the user.
pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let row = |name: &str| -> Result<usize, String> {
        match rest.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("Usage: {} <row>", name)),
        }
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => ShellCommand::Empty,
        "help" | "?" => ShellCommand::Help,
        "tab" => ShellCommand::Tab(
            CollectionArg::from_str(rest, true)
                .map_err(|_| "Usage: tab <publications|projects>".to_string())?,
        ),
        "list" | "ls" => ShellCommand::List,
        "search" => ShellCommand::Search(rest.to_string()),
        "page" => ShellCommand::Page(rest.parse().map_err(|_| "Usage: page <n>".to_string())?),
        "next" => ShellCommand::Next,
        "prev" => ShellCommand::Prev,
        "refresh" => ShellCommand::Refresh,
        "show" => ShellCommand::Show(row("show")?),
        "add" => ShellCommand::Add,
        "edit" => ShellCommand::Edit(row("edit")?),
        "delete" | "rm" => ShellCommand::Delete(row("delete")?),
        "stay" => ShellCommand::Stay,
        "logout" => ShellCommand::Logout,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("Unknown command '{}'. Type 'help' for commands.", other)),
    };
    Ok(command)
}

/// Whether a countdown update is worth printing.
pub fn should_announce(remaining: Duration) -> bool {
    let secs = remaining.as_secs();
    secs <= 5 || secs % 15 == 0
}

/// How the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    Quit,
    LoggedOut,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormProgress {
    field: usize,
    /// Lines collected so far for a multi-line field.
    lines: Option<Vec<String>>,
}

impl FormProgress {
    fn at(field: usize) -> Self {
        Self { field, lines: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Browse,
    Form(FormProgress),
    ConfirmDelete(String),
}

pub struct Shell {
    settings: AdminConfig,
    publications: ListActions<Publications, PublicationsClient>,
    projects: ListActions<Projects, ProjectsClient>,
    tab: CollectionArg,
    mode: Mode,
    monitor: InactivityMonitor,
    loading: LoadingIndicator,
}

/// Runs `$body` with `$actions` bound to the active tab's list actions.
macro_rules! with_tab {
    ($shell:ident, $actions:ident => $body:expr) => {
        match $shell.tab {
            CollectionArg::Publications => {
                let $actions = &mut $shell.publications;
                $body
            }
            CollectionArg::Projects => {
                let $actions = &mut $shell.projects;
                $body
            }
        }
    };
}

impl Shell {
    pub fn new(
        settings: AdminConfig,
        publications: PublicationsClient,
        projects: ProjectsClient,
        tab: CollectionArg,
    ) -> Self {
        let monitor = InactivityMonitor::new(&settings.session, Instant::now());
        Self {
            settings,
            publications: ListActions::new(publications),
            projects: ListActions::new(projects),
            tab,
            mode: Mode::Browse,
            monitor,
            loading: LoadingIndicator::new(),
        }
    }

    pub async fn run(mut self) -> anyhow::Result<ShellExit> {
        render::print_header(
            self.settings.api_root.as_deref().unwrap_or_default(),
            self.settings.token.is_some(),
        );
        if self.monitor.is_enabled() {
            debug!(
                "Auto-logout after {}s of inactivity",
                self.settings.session.idle_timeout.as_secs()
            );
        }

        self.load_tabs().await;
        self.show_tab();

        let interrupt = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        self.serve(spawn_stdin_reader(), interrupt).await
    }

    /// Handles input lines and session ticks until the session ends.
    ///
    /// The shell quits when `input` closes or `interrupt` completes.
    async fn serve<F>(
        mut self,
        mut input: mpsc::UnboundedReceiver<std::io::Result<String>>,
        interrupt: F,
    ) -> anyhow::Result<ShellExit>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.prompt();
        loop {
            tokio::select! {
                _ = &mut interrupt => {
                    println!();
                    return Ok(self.finish(ShellExit::Quit));
                }
                line = input.recv() => {
                    let Some(line) = line else {
                        return Ok(self.finish(ShellExit::Quit));
                    };
                    if let Some(exit) = self.handle_line(&line?).await {
                        return Ok(self.finish(exit));
                    }
                    self.prompt();
                }
                _ = tick.tick() => {
                    match self.monitor.poll(Instant::now()) {
                        SessionEvent::Active => {}
                        SessionEvent::WarningShown { remaining } => {
                            render::print_session_warning(remaining);
                            self.prompt();
                        }
                        SessionEvent::Countdown { remaining } => {
                            if should_announce(remaining) {
                                println!("   {} left", render::format_remaining(remaining));
                            }
                        }
                        SessionEvent::Expired => return Ok(self.finish(ShellExit::Expired)),
                    }
                }
            }
        }
    }

    /// Loads both tabs once. Ctrl-C aborts the loads.
    async fn load_tabs(&mut self) {
        let controller = AbortController::new();
        let signal = controller.signal();
        let abort_on_ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                controller.abort();
            }
        });

        self.loading.start("Loading publications and projects...");
        tokio::join!(
            self.publications.load(&signal),
            self.projects.load(&signal)
        );
        self.loading.stop();
        abort_on_ctrl_c.abort();

        if signal.is_aborted() {
            println!("Loading cancelled. Type 'refresh' to try again.");
        }
    }

    fn finish(&self, exit: ShellExit) -> ShellExit {
        match exit {
            ShellExit::Quit => println!("Bye."),
            ShellExit::LoggedOut => {
                render::print_signed_out(false, self.settings.logout_url.as_deref())
            }
            ShellExit::Expired => render::print_signed_out(true, self.settings.logout_url.as_deref()),
        }
        exit
    }

    fn show_tab(&self) {
        println!("\n{}", render::format_tabs(self.tab));
        match self.tab {
            CollectionArg::Publications => {
                render::print_list(self.publications.state(), self.publications.view())
            }
            CollectionArg::Projects => render::print_list(self.projects.state(), self.projects.view()),
        }
    }

    fn prompt(&self) {
        match &self.mode {
            Mode::Browse => print!("{}> ", self.tab.title().to_lowercase()),
            Mode::ConfirmDelete(_) => {}
            Mode::Form(progress) => match self.tab {
                CollectionArg::Publications => form_prompt(&self.publications, progress),
                CollectionArg::Projects => form_prompt(&self.projects, progress),
            },
        }
        let _ = std::io::stdout().flush();
    }

    async fn handle_line(&mut self, line: &str) -> Option<ShellExit> {
        let now = Instant::now();

        if self.monitor.warning_visible() {
            if line.trim().eq_ignore_ascii_case("stay") {
                self.monitor.extend(now);
                println!("✓ Your session has been extended.");
            } else {
                println!("Type 'stay' to remain signed in.");
            }
            return None;
        }
        self.monitor.record_activity(now);

        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Browse => match parse_command(line) {
                Ok(command) => self.handle_command(command).await,
                Err(message) => {
                    println!("{}", message);
                    None
                }
            },
            Mode::Form(progress) => {
                let loading = &mut self.loading;
                self.mode = with_tab!(self, actions => form_input(actions, loading, progress, line).await);
                None
            }
            Mode::ConfirmDelete(pathname) => {
                let loading = &mut self.loading;
                with_tab!(self, actions => confirm_delete(actions, loading, &pathname, line).await);
                None
            }
        }
    }

    async fn handle_command(&mut self, command: ShellCommand) -> Option<ShellExit> {
        match command {
            ShellCommand::Empty => {}
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Tab(tab) => {
                self.tab = tab;
                self.show_tab();
            }
            ShellCommand::Stay => {
                self.monitor.extend(Instant::now());
                println!("Session active.");
            }
            ShellCommand::Logout => return Some(ShellExit::LoggedOut),
            ShellCommand::Quit => return Some(ShellExit::Quit),
            command => {
                let loading = &mut self.loading;
                self.mode = with_tab!(self, actions => browse(actions, loading, command).await);
            }
        }
        None
    }
}

/// Reads stdin on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Pathname of a 1-based row in the current sorted, filtered list.
fn row_pathname<C, A>(actions: &ListActions<C, A>, row: usize) -> Option<String>
where
    C: Collection,
    A: CollectionApi<C>,
{
    let items = actions.state().items.as_ref()?;
    filter_and_sort(items, &actions.state().search_query)
        .get(row.checked_sub(1)?)
        .map(|item| item.pathname.clone())
}

async fn browse<C, A>(
    actions: &mut ListActions<C, A>,
    loading: &mut LoadingIndicator,
    command: ShellCommand,
) -> Mode
where
    C: Collection,
    C::Detail: RowDisplay,
    A: CollectionApi<C>,
{
    match command {
        ShellCommand::List => {}
        ShellCommand::Search(query) => actions.set_search(query),
        ShellCommand::Page(page) => actions.set_page(page),
        ShellCommand::Next | ShellCommand::Prev => {
            let Some((current, total)) = actions
                .view()
                .map(|view| (view.current_page, view.total_pages))
            else {
                println!("Still loading.");
                return Mode::Browse;
            };
            let target = if command == ShellCommand::Next {
                (current < total).then_some(current + 1)
            } else {
                (current > 1).then_some(current - 1)
            };
            match target {
                Some(page) => actions.set_page(page),
                None => {
                    println!("No more pages.");
                    return Mode::Browse;
                }
            }
        }
        ShellCommand::Refresh => {
            loading.start(&format!("Refreshing {}...", C::NAME));
            actions.refresh().await;
            loading.stop();
        }
        ShellCommand::Show(row) => {
            match row_pathname(actions, row).and_then(|pathname| actions.item(&pathname)) {
                Some(item) => render::print_detail(item),
                None => println!("No row {}.", row),
            }
            return Mode::Browse;
        }
        ShellCommand::Add => {
            actions.open_add();
            println!("\nNew {} ('cancel' to discard)", C::LABEL);
            return Mode::Form(FormProgress::at(0));
        }
        ShellCommand::Edit(row) => {
            let Some(pathname) = row_pathname(actions, row) else {
                println!("No row {}.", row);
                return Mode::Browse;
            };
            if !actions.open_edit(&pathname) {
                println!("Row {} has no details to edit.", row);
                return Mode::Browse;
            }
            println!("\nEdit {} ('cancel' to discard)", C::LABEL);
            return Mode::Form(FormProgress::at(0));
        }
        ShellCommand::Delete(row) => {
            let Some(pathname) = row_pathname(actions, row) else {
                println!("No row {}.", row);
                return Mode::Browse;
            };
            let name = actions
                .item(&pathname)
                .and_then(|item| item.detail.as_ref())
                .map(|detail| detail.title().to_string())
                .unwrap_or_else(|| pathname.clone());
            actions.request_delete(pathname.clone());
            print!("Delete \"{}\"? [y/N] ", name);
            return Mode::ConfirmDelete(pathname);
        }
        _ => return Mode::Browse,
    }

    render::print_list(actions.state(), actions.view());
    Mode::Browse
}

fn form_prompt<C, A>(actions: &ListActions<C, A>, progress: &FormProgress)
where
    C: Collection,
    A: CollectionApi<C>,
{
    let Some(spec) = <C::Form as RecordForm>::FIELDS.get(progress.field) else {
        return;
    };
    if progress.lines.is_some() {
        print!("> ");
        return;
    }

    let current = actions.state().form.value(spec.key).unwrap_or_default();
    let hint = spec.hint.map(|h| format!(" ({})", h)).unwrap_or_default();
    if spec.multiline {
        println!("{}{}, end with '.' on its own line:", spec.label, hint);
        if !current.is_empty() {
            println!("  current: {}", render::truncate_text(current, 70));
            println!("  (a lone '.' keeps it)");
        }
        print!("> ");
    } else if current.is_empty() {
        print!("{}{}: ", spec.label, hint);
    } else {
        print!("{}{} [{}]: ", spec.label, hint, render::truncate_text(current, 50));
    }
}

async fn form_input<C, A>(
    actions: &mut ListActions<C, A>,
    loading: &mut LoadingIndicator,
    mut progress: FormProgress,
    line: &str,
) -> Mode
where
    C: Collection,
    C::Detail: RowDisplay,
    A: CollectionApi<C>,
{
    let fields = <C::Form as RecordForm>::FIELDS;
    let Some(spec) = fields.get(progress.field) else {
        return Mode::Browse;
    };

    if line.trim().eq_ignore_ascii_case("cancel") {
        actions.close_form();
        println!("Discarded.");
        return Mode::Browse;
    }

    if spec.multiline {
        let mut lines = progress.lines.take().unwrap_or_default();
        if line.trim() != "." {
            lines.push(line.to_string());
            progress.lines = Some(lines);
            return Mode::Form(progress);
        }
        if !lines.is_empty() {
            actions.form_mut().set_value(spec.key, lines.join("\n"));
        }
    } else if !line.trim().is_empty() {
        actions.form_mut().set_value(spec.key, line.trim().to_string());
    }

    if progress.field + 1 < fields.len() {
        return Mode::Form(FormProgress::at(progress.field + 1));
    }

    loading.start(&format!("Saving {}...", C::LABEL));
    let saved = actions.submit_form().await;
    loading.stop();

    if saved {
        println!("✓ Saved {}.", C::LABEL);
        render::print_list(actions.state(), actions.view());
        return Mode::Browse;
    }

    if let Some(error) = &actions.state().form_error {
        println!("✗ {}", error);
    }
    println!("Check the fields again, or type 'cancel'.");
    Mode::Form(FormProgress::at(0))
}

async fn confirm_delete<C, A>(
    actions: &mut ListActions<C, A>,
    loading: &mut LoadingIndicator,
    pathname: &str,
    line: &str,
) where
    C: Collection,
    C::Detail: RowDisplay,
    A: CollectionApi<C>,
{
    if !matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
        actions.cancel_delete();
        println!("Kept.");
        return;
    }

    loading.start(&format!("Deleting {}...", C::LABEL));
    actions.delete(pathname).await;
    loading.stop();

    if actions.state().error.is_none() {
        println!("✓ Deleted.");
    }
    render::print_list(actions.state(), actions.view());
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyshape_core::config::{HttpConfig, SessionConfig};
    use tokio::sync::oneshot;

    fn shell() -> Shell {
        let settings = AdminConfig {
            api_root: Some("http://127.0.0.1:9".to_string()),
            session: SessionConfig {
                enabled: false,
                ..SessionConfig::default()
            },
            ..AdminConfig::default()
        };
        let http = HttpConfig::default();
        let publications = PublicationsClient::new("http://127.0.0.1:9", None, &http).unwrap();
        let projects = ProjectsClient::new("http://127.0.0.1:9", None, &http).unwrap();
        Shell::new(settings, publications, projects, CollectionArg::Publications)
    }

    #[tokio::test]
    async fn test_interrupt_ends_session() {
        let (_tx, input) = mpsc::unbounded_channel();
        let (stop, stopped) = oneshot::channel::<()>();
        stop.send(()).unwrap();

        let exit = shell()
            .serve(input, async {
                let _ = stopped.await;
            })
            .await
            .unwrap();
        assert_eq!(exit, ShellExit::Quit);
    }

    #[tokio::test]
    async fn test_closed_input_quits() {
        let (tx, input) = mpsc::unbounded_channel();
        drop(tx);

        let exit = shell()
            .serve(input, std::future::pending())
            .await
            .unwrap();
        assert_eq!(exit, ShellExit::Quit);
    }

    #[tokio::test]
    async fn test_logout_command_signs_out() {
        let (tx, input) = mpsc::unbounded_channel();
        tx.send(Ok("help".to_string())).unwrap();
        tx.send(Ok("stay".to_string())).unwrap();
        tx.send(Ok("logout".to_string())).unwrap();

        let exit = shell()
            .serve(input, std::future::pending())
            .await
            .unwrap();
        assert_eq!(exit, ShellExit::LoggedOut);
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("  "), Ok(ShellCommand::Empty));
        assert_eq!(parse_command("help"), Ok(ShellCommand::Help));
        assert_eq!(parse_command("NEXT"), Ok(ShellCommand::Next));
        assert_eq!(parse_command("quit"), Ok(ShellCommand::Quit));
        assert_eq!(parse_command("stay"), Ok(ShellCommand::Stay));
    }

    #[test]
    fn test_parse_tab() {
        assert_eq!(
            parse_command("tab projects"),
            Ok(ShellCommand::Tab(CollectionArg::Projects))
        );
        assert_eq!(
            parse_command("tab Publications"),
            Ok(ShellCommand::Tab(CollectionArg::Publications))
        );
        assert!(parse_command("tab blog").is_err());
    }

    #[test]
    fn test_parse_search_keeps_text() {
        assert_eq!(
            parse_command("search  beta item "),
            Ok(ShellCommand::Search("beta item".to_string()))
        );
        assert_eq!(parse_command("search"), Ok(ShellCommand::Search(String::new())));
    }

    #[test]
    fn test_parse_rows() {
        assert_eq!(parse_command("show 3"), Ok(ShellCommand::Show(3)));
        assert_eq!(parse_command("edit 1"), Ok(ShellCommand::Edit(1)));
        assert_eq!(parse_command("delete 2"), Ok(ShellCommand::Delete(2)));
        assert_eq!(
            parse_command("show 0"),
            Err("Usage: show <row>".to_string())
        );
        assert!(parse_command("edit x").is_err());
        assert_eq!(parse_command("page 4"), Ok(ShellCommand::Page(4)));
    }

    #[test]
    fn test_parse_unknown() {
        let err = parse_command("frobnicate now").unwrap_err();
        assert!(err.contains("frobnicate"));
    }

    #[test]
    fn test_should_announce() {
        assert!(should_announce(Duration::from_secs(45)));
        assert!(should_announce(Duration::from_secs(3)));
        assert!(!should_announce(Duration::from_secs(44)));
    }
}
