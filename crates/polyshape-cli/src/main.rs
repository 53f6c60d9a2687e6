use std::io::Write;

use anyhow::{bail, Context};
use clap::Parser;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use polyshape_admin::progress::LoadingIndicator;
use polyshape_admin::render::{self, RowDisplay};
use polyshape_admin::{CollectionArg, Command, Config, RecordArgs, Shell};
use polyshape_client::{CollectionClient, ProjectsClient, PublicationsClient};
use polyshape_core::config::{default_config_path, load_config, AdminConfig};
use polyshape_core::{
    AbortController, Collection, ListActions, ListedDetail, Projects, Publications,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Parse command line arguments
    let config = Config::parse();

    // Setup logging (stderr to keep stdout clean for --json)
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let settings = load_settings(&config)?;
    let api_root = settings.api_root.clone().context(
        "No API root configured. Pass --api-root, set POLYSHAPE_API_ROOT, or add api_root to config.toml",
    )?;
    if settings.token.is_none() {
        warn!("No token configured; requests are sent without authorization");
    }

    // Execute command
    match config.command {
        Command::List {
            collection,
            search,
            page,
            json,
        } => match collection {
            CollectionArg::Publications => {
                list::<Publications>(&settings, &api_root, search, page, json).await?
            }
            CollectionArg::Projects => {
                list::<Projects>(&settings, &api_root, search, page, json).await?
            }
        },
        Command::Create { collection, fields } => match collection {
            CollectionArg::Publications => {
                save::<Publications>(&settings, &api_root, None, &fields).await?
            }
            CollectionArg::Projects => save::<Projects>(&settings, &api_root, None, &fields).await?,
        },
        Command::Update {
            collection,
            id,
            fields,
        } => match collection {
            CollectionArg::Publications => {
                save::<Publications>(&settings, &api_root, Some(&id), &fields).await?
            }
            CollectionArg::Projects => {
                save::<Projects>(&settings, &api_root, Some(&id), &fields).await?
            }
        },
        Command::Delete {
            collection,
            target,
            yes,
        } => match collection {
            CollectionArg::Publications => {
                delete::<Publications>(&settings, &api_root, &target, yes).await?
            }
            CollectionArg::Projects => {
                delete::<Projects>(&settings, &api_root, &target, yes).await?
            }
        },
        Command::Shell { tab } => {
            let publications = PublicationsClient::new(&api_root, settings.token.clone(), &settings.http)
                .context("Invalid API root")?;
            let projects = ProjectsClient::new(&api_root, settings.token.clone(), &settings.http)
                .context("Invalid API root")?;

            let exit = Shell::new(settings, publications, projects, tab).run().await?;
            info!("Shell ended: {:?}", exit);
        }
    }

    Ok(())
}

/// Layers the config file, environment and flags.
fn load_settings(config: &Config) -> anyhow::Result<AdminConfig> {
    let from_file = match &config.config {
        Some(path) => Some(
            load_config(path)?
                .with_context(|| format!("Config file not found: {}", path.display()))?,
        ),
        None => match default_config_path() {
            Some(path) => load_config(&path)?,
            None => None,
        },
    };

    Ok(config.merge_into(from_file.unwrap_or_default()))
}

fn client<C: Collection>(settings: &AdminConfig, api_root: &str) -> anyhow::Result<CollectionClient<C>> {
    CollectionClient::new(api_root, settings.token.clone(), &settings.http)
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .context("Invalid API root")
}

/// Loads a collection, failing with the list error if it could not be fetched.
async fn load<C: Collection>(
    settings: &AdminConfig,
    api_root: &str,
    quiet: bool,
) -> anyhow::Result<ListActions<C, CollectionClient<C>>> {
    let mut actions = ListActions::new(client::<C>(settings, api_root)?);
    let mut loading = if quiet {
        LoadingIndicator::hidden()
    } else {
        LoadingIndicator::new()
    };

    info!("Loading {}...", C::NAME);
    loading.start(&format!("Loading {}...", C::NAME));
    actions.load(&AbortController::new().signal()).await;
    loading.stop();

    if let Some(error) = &actions.state().error {
        bail!("Failed to load {}: {}", C::NAME, error);
    }
    Ok(actions)
}

/// List one page of a collection
async fn list<C>(
    settings: &AdminConfig,
    api_root: &str,
    search: Option<String>,
    page: usize,
    json: bool,
) -> anyhow::Result<()>
where
    C: Collection,
    C::Detail: RowDisplay,
{
    let mut actions = load::<C>(settings, api_root, json).await?;
    if let Some(query) = search {
        actions.set_search(query);
    }
    actions.set_page(page);

    let Some(view) = actions.view() else {
        bail!("{} are still loading", C::NAME);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&view.items)?);
    } else {
        render::print_list(actions.state(), Some(view));
    }

    Ok(())
}

/// Create a record, or update the record matching `id`
async fn save<C>(
    settings: &AdminConfig,
    api_root: &str,
    id: Option<&str>,
    fields: &RecordArgs,
) -> anyhow::Result<()>
where
    C: Collection,
    C::Detail: RowDisplay,
{
    let mut actions = load::<C>(settings, api_root, false).await?;

    match id {
        Some(id) => {
            let pathname = actions
                .find(id)
                .map(|item| item.pathname.clone())
                .with_context(|| format!("No {} matches '{}'", C::LABEL, id))?;
            if !actions.open_edit(&pathname) {
                let reason = actions
                    .item(&pathname)
                    .and_then(|item| item.error.clone())
                    .unwrap_or_else(|| "details not loaded".to_string());
                bail!("Cannot edit {}: {}", pathname, reason);
            }
        }
        None => actions.open_add(),
    }

    let rejected = fields
        .apply(actions.form_mut())
        .context("Failed to read --content-file")?;
    if !rejected.is_empty() {
        bail!("{} do not apply to {}", rejected.join(", "), C::NAME);
    }

    let mut loading = LoadingIndicator::new();
    loading.start(&format!("Saving {}...", C::LABEL));
    let saved = actions.submit_form().await;
    loading.stop();

    if !saved {
        let error = actions.state().form_error.clone().unwrap_or_default();
        bail!("{}", error);
    }

    match id {
        Some(id) => println!("✓ Updated {} {}", C::LABEL, id),
        None => println!("✓ Created {}", C::LABEL),
    }
    Ok(())
}

/// Delete a record by filename or pathname
async fn delete<C>(
    settings: &AdminConfig,
    api_root: &str,
    target: &str,
    yes: bool,
) -> anyhow::Result<()>
where
    C: Collection,
    C::Detail: RowDisplay,
{
    let mut actions = load::<C>(settings, api_root, false).await?;

    let (pathname, name) = match actions.find(target) {
        Some(item) => (
            item.pathname.clone(),
            item.detail
                .as_ref()
                .map(|detail| detail.title().to_string())
                .unwrap_or_else(|| item.pathname.clone()),
        ),
        None => {
            warn!("{} is not in the {} list", target, C::NAME);
            (target.to_string(), target.to_string())
        }
    };

    if !yes && !confirm(&format!("Delete \"{}\"? [y/N] ", name))? {
        println!("Kept.");
        return Ok(());
    }

    let mut loading = LoadingIndicator::new();
    loading.start(&format!("Deleting {}...", C::LABEL));
    actions.request_delete(pathname.clone());
    actions.delete(&pathname).await;
    loading.stop();

    if let Some(error) = &actions.state().error {
        bail!("Failed to delete {}: {}", pathname, error);
    }
    println!("✓ Deleted {}", pathname);
    Ok(())
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{}", question);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
