use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use tally::app::{App, AppSettings, InputMode};
use tally::config::{self, Config, DataPaths};
use tally::core::{Action, Context, Defaults, PageNav, PromptKind};
use tally::infrastructure::ethereum::ProviderConfig;
use tally::infrastructure::runtime::{BatchSettings, PriceSettings, WorkerSettings};
use tally::infrastructure::RuntimeBridge;
use tally::store::{KeyValueStore, MemoryStore, SqliteStore};
use tally::ui;

#[derive(Debug, Parser)]
#[command(
    name = "tally",
    version,
    about = "Tally: track Ethereum address balances from the terminal"
)]
struct Args {
    /// HTTP JSON-RPC endpoint (e.g. https://ethereum-rpc.publicnode.com)
    #[arg(long)]
    rpc: Option<String>,

    /// WebSocket endpoint (e.g. ws://localhost:8546)
    #[arg(long)]
    ws: Option<String>,

    /// IPC path (e.g. ~/.ethereum/geth.ipc). Unix only.
    #[arg(long)]
    ipc: Option<PathBuf>,

    /// Directory for the database, log and exports
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let root = args
        .data_dir
        .clone()
        .or_else(config::data_dir)
        .unwrap_or_else(|| PathBuf::from(".tally"));
    let paths = DataPaths::new(root);
    fs::create_dir_all(&paths.root)?;
    init_logging(&paths.log());
    // Loaded after the logger so a malformed file is reported
    let config = config::load();

    let provider = provider_from_args_and_config(&args, &config)?;
    log::info!("starting with endpoint {}", provider.display());

    let storage = open_storage(&paths.db());
    let ctx = Context::load(
        storage,
        Defaults {
            title: config.table.title.clone(),
            page_size: config.table.page_size,
        },
    );
    let mut app = App::new(
        ctx,
        AppSettings {
            endpoint: provider.display(),
            fiat_symbol: config.price.symbol.clone(),
            toast_duration: config.toast_duration(),
            exports_dir: paths.exports(),
        },
    );

    let runtime = RuntimeBridge::new(WorkerSettings {
        provider,
        batch: BatchSettings {
            group_size: config.query.group_size,
            delay: config.query.delay(),
        },
        price: PriceSettings {
            url: config.price.url.clone(),
            asset: config.price.asset.clone(),
            fiat: config.price.fiat.clone(),
        },
    })?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &runtime);
    app.shutdown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("{err:?}");
        eprintln!("{err:?}");
    }

    Ok(())
}

/// Log to a file so output never lands on the alternate screen
fn init_logging(path: &Path) {
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

fn open_storage(path: &Path) -> Box<dyn KeyValueStore> {
    match SqliteStore::open(path) {
        Ok(store) => Box::new(store),
        Err(err) => {
            log::warn!(
                "cannot open {}: {:#}; changes will not be saved",
                path.display(),
                err
            );
            Box::new(MemoryStore::new())
        }
    }
}

/// CLI flags win over the config file, which wins over the public default
fn provider_from_args_and_config(args: &Args, config: &Config) -> Result<ProviderConfig> {
    if let Some(ipc) = args.ipc.clone() {
        #[cfg(unix)]
        {
            return Ok(ProviderConfig::Ipc(ipc));
        }
        #[cfg(not(unix))]
        {
            let _ = ipc;
            return Err(anyhow::anyhow!("IPC is not supported on this platform"));
        }
    }
    if let Some(ws) = non_empty(args.ws.as_deref()) {
        return Ok(ProviderConfig::WebSocket(ws.to_string()));
    }
    if let Some(rpc) = non_empty(args.rpc.as_deref()) {
        return Ok(ProviderConfig::Http(normalize_http_endpoint(rpc)));
    }

    #[cfg(unix)]
    {
        if let Some(ipc) = non_empty(config.ipc.as_deref()) {
            return Ok(ProviderConfig::Ipc(tally::domain::import::expand_path(ipc)));
        }
    }
    if let Some(ws) = non_empty(config.ws.as_deref()) {
        return Ok(ProviderConfig::WebSocket(ws.to_string()));
    }
    if let Some(rpc) = non_empty(config.rpc.as_deref()) {
        return Ok(ProviderConfig::Http(normalize_http_endpoint(rpc)));
    }

    Ok(ProviderConfig::Http(config::DEFAULT_RPC.to_string()))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn normalize_http_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runtime: &RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(app, runtime);
        terminal.draw(|f| ui::draw(f, app))?;
        if app.should_quit {
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => handle_key(app, key),
                Event::Paste(text) => app.paste(&text),
                Event::Resize(_, _) => {}
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

/// Apply worker events and forward queued commands
fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for event in runtime.poll_events() {
        app.apply_runtime_event(event);
    }
    for cmd in app.take_runtime_commands() {
        if let Err(err) = runtime.send(cmd) {
            log::error!("runtime unavailable: {:#}", err);
            app.apply_action(Action::error("Background worker stopped"));
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.help_open {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.help_open = false;
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
        InputMode::Prompt(kind) => handle_prompt_mode(app, key, kind),
        InputMode::Confirm => handle_confirm_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('c') {
            app.should_quit = true;
        }
        return;
    }

    let action = match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('?') => Action::OpenHelp,
        KeyCode::Char(':') => {
            app.enter_command();
            Action::None
        }
        KeyCode::Esc => {
            if app.select_mode {
                app.cancel_delete();
            }
            Action::None
        }

        // Rows and pages
        KeyCode::Char('j') | KeyCode::Down => {
            app.move_cursor(1);
            Action::None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.move_cursor(-1);
            Action::None
        }
        KeyCode::Char('g') => {
            app.cursor_to_top();
            Action::None
        }
        KeyCode::Char('G') => {
            app.cursor_to_bottom();
            Action::None
        }
        KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => {
            app.navigate(PageNav::Prev);
            Action::None
        }
        KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => {
            app.navigate(PageNav::Next);
            Action::None
        }
        KeyCode::Home => {
            app.navigate(PageNav::First);
            Action::None
        }
        KeyCode::End => {
            app.navigate(PageNav::Last);
            Action::None
        }

        // Selection
        KeyCode::Char('v') => {
            app.toggle_select_mode();
            Action::None
        }
        KeyCode::Char(' ') => {
            app.toggle_current_selected();
            Action::None
        }
        KeyCode::Char('a') if app.select_mode => {
            app.toggle_select_all();
            Action::None
        }

        // Editing
        KeyCode::Char('a') => app.add_row(None, None),
        KeyCode::Char('e') | KeyCode::Enter => match app.current_id() {
            Some(id) => Action::OpenPrompt(PromptKind::Address(id)),
            None => Action::warn("No row selected"),
        },
        KeyCode::Char('n') => match app.current_id() {
            Some(id) => Action::OpenPrompt(PromptKind::Label(id)),
            None => Action::warn("No row selected"),
        },
        KeyCode::Char('d') => {
            app.press_delete();
            Action::None
        }
        KeyCode::Char('t') => Action::OpenPrompt(PromptKind::Title),
        KeyCode::Char('z') => app.cycle_page_size(),

        // Queries
        KeyCode::Char('r') => app.refresh_current(),
        KeyCode::Char('R') => app.query_all(),
        KeyCode::Char('S') => app.stop_query(),
        KeyCode::Char('s') => {
            app.refresh_stats();
            Action::info("Updating stats...")
        }

        // Import / export
        KeyCode::Char('i') => Action::OpenPrompt(PromptKind::ImportFile),
        KeyCode::Char('I') => Action::OpenPrompt(PromptKind::ImportText),
        KeyCode::Char('y') => app.copy_addresses(),
        KeyCode::Char('E') => app.export_csv(),

        _ => Action::None,
    };
    app.apply_action(action);
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_command(),
        KeyCode::Enter => app.apply_command(),
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.push_input(ch);
        }
        _ => {}
    }
}

fn handle_prompt_mode(app: &mut App, key: KeyEvent, kind: PromptKind) {
    match key.code {
        KeyCode::Esc => app.exit_prompt(),
        KeyCode::Enter => app.apply_prompt(kind),
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.push_input(ch);
        }
        _ => {}
    }
}

fn handle_confirm_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => app.confirm_delete(),
        KeyCode::Char('n') | KeyCode::Esc => app.cancel_delete(),
        _ => {}
    }
}
