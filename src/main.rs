use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use lcdmenu::config::{self, LoadedMenu, MenuFile, Storage};

#[derive(Parser, Debug)]
#[command(name = "lcdmenu", version, about = "Inspect and edit menus for small displays")]
struct Cli {
    /// Menu description (JSON). Defaults to $LCDMENU_CONFIG, ./lcdmenu.json,
    /// then ~/.config/lcdmenu/menu.json.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints the visible items of a page.
    Show {
        /// Page name. Defaults to the first page.
        #[arg(long)]
        page: Option<String>,
    },
    /// Commits a value to an item and prints the page afterwards.
    Set {
        #[arg(long)]
        page: String,
        /// Item title.
        #[arg(long)]
        item: String,
        /// New value, or an option name for selects.
        value: String,
    },
    /// Lists pages with their visible item counts.
    Pages,
    /// Prints the menu path that would be used (if any).
    ConfigPath,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format(|buf, record| writeln!(buf, "[lcdmenu] {}: {}", record.level(), record.args()))
        .init();

    let cli = Cli::parse();

    if let Command::ConfigPath = cli.command {
        if let Some(path) = cli.config.or_else(config::resolve_config_path) {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let file = load_file(cli.config.as_deref())?;
    let storage = Storage::from_file(&file).context("allocate menu variables")?;
    let mut loaded = config::build(&file, &storage).context("build menu")?;

    match cli.command {
        Command::Show { page } => {
            let page = match page {
                Some(name) => loaded.page(&name)?,
                None => first_page(&file, &loaded)?,
            };
            print_page(&loaded, page)?;
        }
        Command::Set { page, item, value } => {
            let page = loaded.page(&page)?;
            let id = loaded
                .menu
                .visible_items(page)?
                .find(|id| {
                    loaded
                        .menu
                        .item(*id)
                        .is_ok_and(|it| it.title() == Some(item.as_str()))
                })
                .ok_or_else(|| anyhow!("No visible item titled '{item}'"))?;
            loaded
                .menu
                .commit(id, &value)
                .with_context(|| format!("set '{item}' to '{value}'"))?;
            print_page(&loaded, page)?;
        }
        Command::Pages => {
            for (_, page) in loaded.menu.pages() {
                println!(
                    "{} ({} of {} visible)",
                    page.title(),
                    page.visible_count(),
                    page.len()
                );
            }
        }
        Command::ConfigPath => {}
    }

    Ok(())
}

fn load_file(explicit: Option<&std::path::Path>) -> Result<MenuFile> {
    if let Some(path) = explicit {
        return config::load(path);
    }
    match config::load_optional()? {
        Some(file) => Ok(file),
        None => bail!("No menu description found (pass --config or set LCDMENU_CONFIG)"),
    }
}

fn first_page(file: &MenuFile, loaded: &LoadedMenu<'_>) -> Result<lcdmenu::PageId> {
    let first = file
        .pages
        .first()
        .ok_or_else(|| anyhow!("Menu description has no pages"))?;
    loaded.page(&first.name)
}

fn print_page(loaded: &LoadedMenu<'_>, page: lcdmenu::PageId) -> Result<()> {
    println!("{}", loaded.menu.page(page)?.title());
    for line in loaded.menu.outline(page)? {
        println!("  {line}");
    }
    Ok(())
}
