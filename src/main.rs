use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};

use acx_comments::api::{
    CommentApi, CommentRecord, CommentSort, DEFAULT_BASE_URL, MemoryCommentApi, SubstackClient,
    UnimplementedCommentApi, count_comments, parse_comments,
};
use acx_comments::app::App;
use acx_comments::cli::{Cli, Commands, OptionsCommands};
use acx_comments::comment_tree::CommentOrder;
use acx_comments::event::{Event, EventHandler};
use acx_comments::options::OptionsPipeline;
use acx_comments::session::CommentSession;
use acx_comments::settings::{self, Settings};
use acx_comments::{keys, logging, print, tui, views};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_dir = settings::config_dir(cli.config_dir.as_ref());

    if let Some(Commands::Options(args)) = &cli.command {
        return handle_options_command(&args.command, config_dir.as_deref());
    }
    run(cli, config_dir).await
}

fn load_settings(config_dir: Option<&Path>) -> Settings {
    config_dir
        .map(|dir| {
            let path = settings::settings_path(dir);
            Settings::load(&path).unwrap_or_else(|e| {
                eprintln!("Warning: {}", e);
                Settings::default()
            })
        })
        .unwrap_or_default()
}

fn handle_options_command(command: &OptionsCommands, config_dir: Option<&Path>) -> Result<()> {
    match command {
        OptionsCommands::List => {
            let settings = load_settings(config_dir);
            let mut options = OptionsPipeline::with_builtin();
            options.load_values(&settings.options);
            for spec in options.specs() {
                let value = options.get(spec.key).unwrap_or(&spec.default);
                println!("{} = {}  ({})", spec.key, value, spec.kind.describe());
                println!("    {}", spec.description_short);
                if !spec.description_long.is_empty() {
                    println!("    {}", spec.description_long);
                }
            }
        }
        OptionsCommands::Set { key, value } => {
            let dir = config_dir.context("Could not determine config directory")?;
            let path = settings::settings_path(dir);
            let mut settings = Settings::load(&path)?;
            let options = OptionsPipeline::with_builtin();
            let Some(spec) = options.spec(key) else {
                bail!(
                    "Unknown option '{}'. Use 'acx options list' to see available options.",
                    key
                );
            };
            let parsed = spec.kind.parse(value).with_context(|| {
                format!(
                    "Invalid value '{}' for {} (expected {})",
                    value,
                    key,
                    spec.kind.describe()
                )
            })?;
            println!("{} = {}", key, parsed);
            settings.options.insert(key.clone(), parsed);
            settings.save(&path)?;
        }
    }
    Ok(())
}

fn read_records(path: &Path) -> Result<Vec<CommentRecord>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read comments from {}", path.display()))?;
    parse_comments(&json)
        .with_context(|| format!("Failed to parse comments from {}", path.display()))
}

fn select_api(cli: &Cli, settings: &Settings, viewer: Option<u64>) -> Result<Arc<dyn CommentApi>> {
    if cli.demo {
        info!("demo mode: comment changes stay local");
        let user_id = viewer.unwrap_or(0);
        return Ok(Arc::new(MemoryCommentApi::new(user_id, "You")));
    }
    if let Some(post_id) = cli.post_id {
        let base_url = cli
            .base_url
            .clone()
            .or_else(|| settings.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        info!(%base_url, post_id, "using live comment API");
        let client = SubstackClient::new(base_url, post_id)
            .context("Failed to create HTTP client")?;
        return Ok(Arc::new(client));
    }
    Ok(Arc::new(UnimplementedCommentApi))
}

async fn run(cli: Cli, config_dir: Option<PathBuf>) -> Result<()> {
    let Some(file) = cli.file.clone() else {
        bail!("No comments file given. Run 'acx --help' for usage.");
    };

    let _log_guard = match &config_dir {
        Some(dir) => {
            let (guard, path) = logging::init(dir, cli.verbose)?;
            if cli.verbose {
                eprintln!("Logging to {}", path.display());
            }
            Some(guard)
        }
        None => None,
    };

    let settings = load_settings(config_dir.as_deref());
    let records = read_records(&file)?;
    let sort = CommentSort::from(cli.sort);
    info!(
        file = %file.display(),
        comments = count_comments(&records),
        sort = sort.as_param(),
        "loaded comments"
    );

    let mut viewer = cli.user_id.or(settings.user_id);
    if cli.demo && viewer.is_none() {
        viewer = Some(0);
    }
    if viewer.is_none() {
        warn!("no user id configured, commenting is disabled");
    }
    let api = select_api(&cli, &settings, viewer)?;

    let mut options = OptionsPipeline::with_builtin();
    options.load_values(&settings.options);
    let session = CommentSession::new(&records, CommentOrder::from(sort), options, api, viewer);

    if cli.print {
        print!("{}", print::render_plain(session.tree(), cli.width));
        return Ok(());
    }

    let title = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "comments".to_string());
    run_tui(App::new(session, title)).await
}

async fn run_tui(mut app: App) -> Result<()> {
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(250);

    let result = async {
        loop {
            terminal.draw(|frame| views::render(frame, &mut app))?;

            // Poll async results (non-blocking)
            while let Ok(result) = app.result_rx.try_recv() {
                app.handle_async_result(result);
            }

            if app.should_quit {
                break;
            }

            match events.next().await? {
                Event::Key(key) => {
                    if let Some(msg) = keys::handle_key(key, &app) {
                        app.update(msg);
                    }
                }
                Event::Tick | Event::Resize => {}
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}
