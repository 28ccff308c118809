use clap::Parser;
use directories::ProjectDirs;
use directory_client::api::DEFAULT_API_URL;
use directory_client::{
    ApiError, CachedUser, Directory, FileStorage, FormError, HttpUserApi, ListView, SyncState,
    UserCache,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt};

mod args;
use args::{Cli, Commands, FieldArgs};

const API_URL_VAR: &str = "USER_DIRECTORY_API_URL";

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("could not determine a cache directory, pass --cache-dir")]
    NoCacheDir,

    #[error("no user with id {0}")]
    UnknownUser(String),
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let api_url = cli
        .api_url
        .or_else(|| std::env::var(API_URL_VAR).ok())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let cache_dir = match cli.cache_dir {
        Some(dir) => dir,
        None => default_cache_dir().ok_or(CliError::NoCacheDir)?,
    };

    let api = Arc::new(HttpUserApi::new(api_url)?);
    let cache = UserCache::new(Arc::new(FileStorage::new(cache_dir)));
    let directory = Directory::new(api, cache);
    directory.start().await;

    match cli.command {
        Some(Commands::List { search }) => {
            directory.set_search(search.unwrap_or_default());
            print_view(&directory.view());
        }
        None => print_view(&directory.view()),
        Some(Commands::Create { fields }) => {
            apply_fields(&directory, fields);
            submit(&directory).await?;
        }
        Some(Commands::Edit { id, fields }) => {
            if !directory.edit(&id) {
                return Err(CliError::UnknownUser(id));
            }
            apply_fields(&directory, fields);
            submit(&directory).await?;
        }
        Some(Commands::Delete { id }) => {
            let outcome = directory.delete(&id).await;
            if !outcome.removed && !outcome.deleted_remotely {
                return Err(CliError::UnknownUser(id));
            }
            println!("User deleted successfully");
            if !outcome.deleted_remotely {
                println!("(removed locally; the API did not confirm)");
            }
        }
        Some(Commands::Sync) => {
            let report = directory.sync().await;
            println!(
                "created {}, updated {}, conflicts {}, still pending {}",
                report.created, report.updated, report.conflicts, report.still_pending
            );
        }
    }

    Ok(())
}

fn default_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "user-directory", "user-directory")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

fn apply_fields(directory: &Directory, fields: FieldArgs) {
    let form = directory.form();
    if let Some(name) = fields.name {
        form.set_name(name);
    }
    if let Some(gender) = fields.gender {
        form.set_gender(gender);
    }
    if let Some(designation) = fields.designation {
        form.set_designation(designation);
    }
    if !fields.favorites.is_empty() {
        form.set_favorites(fields.favorites);
    }
}

async fn submit(directory: &Directory) -> Result<(), CliError> {
    match directory.submit().await {
        Ok(outcome) => {
            println!("{} ({})", outcome.message(), outcome.user().id);
            if !outcome.saved_remotely() {
                println!("(API unreachable; saved to the local cache only)");
            }
            Ok(())
        }
        Err(FormError::Invalid(errors)) => {
            for (field, message) in errors.iter() {
                eprintln!("  {field}: {message}");
            }
            Err(FormError::Invalid(errors).into())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_view(view: &ListView) {
    match view {
        ListView::Loading => println!("Loading users..."),
        ListView::Error(message) => println!("{message}"),
        ListView::Empty => println!("No users found. Create a new user to get started."),
        ListView::NoMatches => println!("No users match your search criteria."),
        ListView::Users(users) => {
            println!(
                "{:<34} {:<20} {:<7} {:<10} {}",
                "ID", "NAME", "GENDER", "ROLE", "FAVORITES"
            );
            for user in users {
                print_row(user);
            }
        }
    }
}

fn print_row(user: &CachedUser) {
    let marker = match user.sync {
        SyncState::Synced => "",
        SyncState::Pending => " *",
        SyncState::Conflict => " !",
    };
    println!(
        "{:<34} {:<20} {:<7} {:<10} {}{}",
        user.id,
        user.fields.name,
        user.fields.gender,
        user.fields.designation,
        user.fields.favorites.join(", "),
        marker
    );
}
