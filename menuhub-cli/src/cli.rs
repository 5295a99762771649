use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "menuhub",
    about = "Menuhub - manage businesses and menus from the terminal",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, env = "MENUHUB_API_URL", default_value = "http://127.0.0.1:8080")]
    pub api_url: String,

    #[arg(long, global = true, env = "MENUHUB_TIMEOUT_SECS", default_value = "30")]
    pub timeout: u64,

    #[arg(long, global = true, env = "MENUHUB_REFRESH_PATH", help = "Override the token refresh path")]
    pub refresh_path: Option<String>,

    #[arg(
        long,
        global = true,
        env = "MENUHUB_STORE",
        help = "Session file (default: <config dir>/menuhub/session.json)"
    )]
    pub store: Option<PathBuf>,

    #[arg(short, long, global = true, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Sign in with username and password")]
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "MENUHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },

    #[command(about = "Forget the stored session")]
    Logout,

    #[command(about = "Show the stored session")]
    Whoami {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "List your businesses")]
    Businesses {
        #[command(flatten)]
        paging: Paging,

        #[arg(long, help = "Sort expression, e.g. 'name'")]
        sort: Option<String>,

        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "List the categories of a business")]
    Categories {
        #[arg(long, help = "Business slug")]
        slug: String,

        #[command(flatten)]
        paging: Paging,

        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Show the menu of a business")]
    Menu {
        #[arg(help = "Business slug")]
        slug: String,

        #[arg(long, help = "Fetch the public storefront menu without signing in")]
        public: bool,

        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Upload an image to temporary storage")]
    Upload {
        #[arg(help = "Image file")]
        file: PathBuf,

        #[arg(long, help = "Content type (guessed from the extension by default)")]
        content_type: Option<String>,

        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Send an arbitrary authenticated request")]
    Request {
        #[arg(help = "HTTP method (GET, POST, PUT, DELETE, ...)")]
        method: String,

        #[arg(help = "Path relative to the API URL, e.g. /panel/categories")]
        path: String,

        #[arg(long, help = "JSON request body")]
        body: Option<String>,

        #[arg(long, help = "Business slug sent as x-slug")]
        slug: Option<String>,

        #[arg(long = "query", value_parser = parse_key_val, help = "Query parameter as key=value (repeatable)")]
        query: Vec<(String, String)>,
    },
}

#[derive(clap::Args)]
pub struct Paging {
    #[arg(long, default_value = "1")]
    pub page: u32,

    #[arg(long, default_value = "10")]
    pub page_size: u32,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
