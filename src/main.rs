use std::{
    fs::File,
    io::{self, Write},
    time::Duration,
};

use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use env_logger::{Builder, Target};
use log::{error, info, warn, LevelFilter};
use ratatui::{backend::CrosstermBackend, Terminal};

use happiness_atlas::{
    app::App,
    args::Args,
    config::{DashboardConfig, DEFAULT_LOG_FILE},
    map_draw::MapView,
    render::JsonLinesDispatcher,
    state::{Dashboard, DashboardError, LOADING_MESSAGE},
    ui::{self, TerminalDispatcher},
};

fn init_logging(args: &Args, log_file: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut builder = Builder::new();
    builder.filter_level(level).parse_default_env();
    // The terminal belongs to the UI, so records go to a file there.
    if let Some(path) = log_file {
        builder.target(Target::Pipe(Box::new(File::create(path)?)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DashboardConfig::from_json(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(world) = &args.world {
        config.world_geojson = Some(world.clone());
    }
    if let Some(log_file) = &args.log_file {
        config.log_file = Some(log_file.clone());
    }

    if args.dump {
        init_logging(&args, None)?;
        return dump(&args, &config);
    }

    let log_file = config
        .log_file
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
    init_logging(&args, Some(&log_file))?;
    info!("main: {:?}", config);

    let map = config
        .world_geojson
        .as_ref()
        .and_then(|path| match MapView::from_file(path) {
            Ok(map) => Some(map),
            Err(e) => {
                warn!("main: no map from {}: {}", path, e);
                None
            }
        });

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &args, &config, map);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    args: &Args,
    config: &DashboardConfig,
    map: Option<MapView>,
) -> Result<(), Box<dyn std::error::Error>> {
    terminal.draw(|f| ui::draw_loading(f, LOADING_MESSAGE))?;

    let dispatcher = TerminalDispatcher::new(map);
    let dashboard = match Dashboard::bootstrap_at(config.read_sources(), dispatcher, args.year) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            error!("run: {}", e);
            return wait_for_quit(terminal, &e);
        }
    };
    let mut app = App::new(dashboard);

    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) = event::read()?
            {
                if app.handle_input(code) {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Keeps the no-data screen up until the user quits.
fn wait_for_quit(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    err: &DashboardError,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw_no_data(f, err))?;
        if let Event::Key(KeyEvent {
            code: KeyCode::Char('q') | KeyCode::Esc,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        {
            return Ok(());
        }
    }
}

/// Writes the initial state of every view to stdout and exits.
fn dump(args: &Args, config: &DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut out = JsonLinesDispatcher::new(stdout.lock());
    // A failed load has already written the no-data message for every
    // surface; the error itself goes to the log.
    let res = Dashboard::bootstrap_at(config.read_sources(), &mut out, args.year).map(|_| ());
    out.into_inner().flush()?;
    if let Err(e) = res {
        error!("dump: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
