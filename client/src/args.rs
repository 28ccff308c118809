use clap::{Args, Parser, Subcommand};
use directory_model::{Designation, Favorite, Gender};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "user-directory")]
#[command(about = "Create, list, search, edit and delete users in the user directory", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Base URL of the users API (overrides USER_DIRECTORY_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory holding the local cache
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List users, optionally filtered
    #[command(alias = "ls")]
    List {
        /// Case-insensitive search over name, gender, designation and favorites
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Create a user
    #[command(alias = "n")]
    Create {
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Edit a user; fields not given keep their value
    #[command(alias = "e")]
    Edit {
        /// Id of the user (server or temp_ id)
        id: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Delete a user
    #[command(alias = "rm")]
    Delete {
        /// Id of the user (server or temp_ id)
        id: String,
    },

    /// Push users saved only locally to the API
    Sync,
}

#[derive(Args, Debug)]
pub struct FieldArgs {
    #[arg(long)]
    pub name: Option<String>,

    /// Male or Female
    #[arg(long)]
    pub gender: Option<Gender>,

    /// Developer, Designer, Manager, Tester or DevOps
    #[arg(long)]
    pub designation: Option<Designation>,

    /// Reading, Sports, Music, Movies, Travel or Cooking (repeatable)
    #[arg(long = "favorite")]
    pub favorites: Vec<Favorite>,
}
