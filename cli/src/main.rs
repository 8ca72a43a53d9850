use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use hris::client::nav::{Navbar, shows_navbar};
use hris::client::notice::{Action, Notice};
use hris::client::{
    ApiClient, AuthSession, ClientError, FileStore, Navigator, RegisterData,
    Route,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "HRIS authentication from a terminal")]
struct Args {
    /// API base URL.
    #[arg(long, env = "HRIS_URL", default_value = "http://127.0.0.1:8888")]
    url: String,
    /// Directory keeping the bearer token.
    #[arg(long, env = "HRIS_STORE", default_value = ".hris")]
    store: PathBuf,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Log in and keep the token.
    Login {
        email: String,
        #[arg(long, env = "HRIS_PASSWORD")]
        password: String,
    },
    /// Create an account and keep the token.
    Register {
        name: String,
        email: String,
        #[arg(long, env = "HRIS_PASSWORD")]
        password: String,
        /// Defaults to `--password`.
        #[arg(long)]
        password_confirmation: Option<String>,
    },
    /// Revoke the token and forget it.
    Logout,
    /// Print the signed-in user.
    Whoami,
    /// Print the navigation bar shown at `path`.
    Nav {
        #[arg(default_value = "/")]
        path: String,
    },
}

/// Prints every navigation.
struct Terminal;

impl Navigator for Terminal {
    fn push(&mut self, route: Route) {
        println!("-> {route}");
    }
}

fn report(action: Action, result: &Result<(), ClientError>) {
    match Notice::from_result(action, result) {
        Notice::Success(text) => println!("{text}"),
        Notice::Error(text) => eprintln!("{text}"),
    }
}

fn print_nav(path: &str) {
    if !shows_navbar(path) {
        println!("{path} renders without navigation bar");
        return;
    }

    for link in Navbar::default().links() {
        println!("{:<10} {}", link.title, link.url);
    }
}

async fn run(args: Args) -> Result<bool, ClientError> {
    let store = FileStore::new(&args.store)?;
    let api = ApiClient::new(&args.url, store)?;
    let mut session = AuthSession::new(api, Terminal);

    let ok = match args.cmd {
        Commands::Login { email, password } => {
            let result = session.login(&email, &password).await;
            report(Action::Login, &result);
            result.is_ok()
        },
        Commands::Register {
            name,
            email,
            password,
            password_confirmation,
        } => {
            let data = RegisterData {
                name,
                email,
                password_confirmation: password_confirmation
                    .unwrap_or_else(|| password.clone()),
                password,
            };
            let result = session.register(&data).await;
            report(Action::Register, &result);
            result.is_ok()
        },
        Commands::Logout => {
            session.logout().await?;
            println!("Logged out");
            true
        },
        Commands::Whoami => {
            session.check_auth().await;
            match session.user() {
                Some(user) => {
                    println!("{} <{}> (#{})", user.name, user.email, user.id);
                    true
                },
                None => {
                    eprintln!("Not logged in");
                    false
                },
            }
        },
        Commands::Nav { path } => {
            print_nav(&path);
            true
        },
    };

    Ok(ok)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        },
    }
}
