//! # Boardust
//!
//! A terminal kanban board for a remote task API. Boardust combines a scriptable CLI with an
//! interactive board (TUI) where cards are dragged between the `A fazer`, `Fazendo` and `Pronto`
//! columns.
//!
//! ## Features
//!
//! *   **Drag and drop**: Move cards with the mouse or the keyboard. The board updates at once and
//!     the server is asked to confirm the new status; a refused move is rolled back.
//! *   **Users and tasks**: Register users, create and edit tasks with a sector and priority.
//! *   **Client-side validation**: Forms are checked before anything is sent.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! boardust
//! # or explicitly
//! boardust ui
//! ```
//!
//! #### TUI Key Bindings
//!
//! *   `q`: Quit
//! *   Arrows / `hjkl`: Select a card
//! *   `Space`: Grab the selected card, arrows to choose where, `Space`/`Enter` to drop, `Esc` to cancel
//! *   Mouse: press on a card and release it over a column
//! *   `a`: New task, `e`: Edit task, `u`: Register user, `d`: Delete
//! *   `r`: Refresh, `v`: Switch between board and tables
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! boardust board
//! boardust user add "Ana Souza" ana@example.com
//! boardust task add --user 1 --description "Trocar toner" --sector TI --priority high
//! boardust task move 5 doing
//! boardust task remove 5 --force
//! ```
//!
//! ## Configuration
//!
//! Settings are read from `~/.config/boardust/config.json` (override with `BOARDUST_CONFIG`).
//! The API address defaults to `http://localhost:8000/api/` and can be set with `--api-url` or
//! `BOARDUST_API_URL`. Logging is controlled by `-v` flags or `BOARDUST_LOG`.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing::error;

use boardust::api::{HttpApi, TaskApi};
use boardust::board::Column;
use boardust::commands::*;
use boardust::config::Config;
use boardust::drag::BoardController;
use boardust::error::Error;
use boardust::logging::{self, LogTarget};
use boardust::models::{TaskId, UserId};
use boardust::tui::run_tui;
use boardust::validation::{TaskForm, UserForm};

#[derive(Parser)]
#[command(name = "boardust")]
#[command(about = "Terminal kanban board for a remote task API", long_about = None)]
struct Cli {
    /// Base URL of the REST API
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// More log output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the three columns side by side
    Board,
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive board
    Ui,
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List all tasks
    List,
    /// Create a task in the TODO column
    Add {
        /// Owner user id
        #[arg(short, long)]
        user: UserId,
        /// What needs to be done
        #[arg(short, long)]
        description: String,
        /// Sector name
        #[arg(short, long)]
        sector: String,
        /// low, med or high
        #[arg(short, long)]
        priority: String,
    },
    /// Edit a task's details
    Edit {
        id: TaskId,
        /// New owner user id
        #[arg(short, long)]
        user: Option<UserId>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New sector
        #[arg(short, long)]
        sector: Option<String>,
        /// New priority
        #[arg(short, long)]
        priority: Option<String>,
    },
    /// Move a task to a column (todo, doing, done)
    Move {
        id: TaskId,
        column: Column,
        /// Position in the destination column (0 = top)
        #[arg(short, long)]
        index: Option<usize>,
    },
    /// Remove a task
    Remove {
        id: TaskId,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users
    List,
    /// Register a user
    Add {
        /// Full name
        name: String,
        /// E-mail address
        email: String,
    },
    /// Remove a user and their tasks
    Remove {
        id: UserId,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Commands {
    /// Completes "Erro ao ..." in messages shown for API failures.
    fn action(&self) -> &'static str {
        match self {
            Commands::Board | Commands::Ui | Commands::Completions { .. } => "carregar as tarefas",
            Commands::Task { command } => match command {
                TaskCommands::List => "carregar as tarefas",
                TaskCommands::Add { .. } => "criar a tarefa",
                TaskCommands::Edit { .. } => "atualizar a tarefa",
                TaskCommands::Move { .. } => "atualizar o status da tarefa",
                TaskCommands::Remove { .. } => "excluir a tarefa",
            },
            Commands::User { command } => match command {
                UserCommands::List => "carregar os usuários",
                UserCommands::Add { .. } => "cadastrar o usuário",
                UserCommands::Remove { .. } => "excluir o usuário",
            },
        }
    }
}

fn report(e: &Error, action: &str) {
    match e {
        Error::Api(api) => eprintln!("{}", api.user_message(action)),
        Error::Invalid(result) => {
            for (field, message) in result.field_errors() {
                eprintln!("{}: {}", field, message);
            }
        }
        other => eprintln!("Error: {}", other),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }

    let command = cli.command.unwrap_or(Commands::Ui);
    if let Commands::Completions { shell } = &command {
        let shell_enum = match shell.as_str() {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            "powershell" => Shell::PowerShell,
            "elvish" => Shell::Elvish,
            _ => {
                eprintln!("Unsupported shell: {}", shell);
                return ExitCode::FAILURE;
            }
        };
        let mut cmd = Cli::command();
        generate(shell_enum, &mut cmd, "boardust", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    let log_path = config.log_path();
    let log_target = match &command {
        Commands::Ui => LogTarget::File(&log_path),
        _ => LogTarget::Stderr,
    };
    if let Err(e) = logging::init(log_target, cli.verbose) {
        eprintln!("Warning: could not open log file: {}", e);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: could not start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let api = match HttpApi::new(&config) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let action = command.action();
    let result = match command {
        Commands::Ui => {
            let api: Arc<dyn TaskApi> = Arc::new(api);
            let controller = BoardController::new(config.on_move_failure);
            run_tui(api, runtime.handle().clone(), controller).map_err(Error::from)
        }
        command => runtime.block_on(dispatch(&api, command, &config)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            report(&e, action);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(api: &dyn TaskApi, command: Commands, config: &Config) -> Result<(), Error> {
    match command {
        Commands::Board => cmd_board(api).await,
        Commands::Task { command } => match command {
            TaskCommands::List => cmd_task_list(api).await,
            TaskCommands::Add { user, description, sector, priority } => {
                let form = TaskForm {
                    user_id: user.to_string(),
                    description,
                    sector_name: sector,
                    priority,
                };
                cmd_task_add(api, form, false).await.map(|_| ())
            }
            TaskCommands::Edit { id, user, description, sector, priority } => {
                let edit = TaskEdit { user, description, sector, priority };
                cmd_task_edit(api, id, edit, false).await.map(|_| ())
            }
            TaskCommands::Move { id, column, index } => {
                cmd_task_move(api, id, column, index, config.on_move_failure, false)
                    .await
                    .map(|_| ())
            }
            TaskCommands::Remove { id, force } => cmd_task_remove(api, id, force, false).await,
        },
        Commands::User { command } => match command {
            UserCommands::List => cmd_user_list(api).await,
            UserCommands::Add { name, email } => {
                cmd_user_add(api, UserForm::new(name, email), false).await
            }
            UserCommands::Remove { id, force } => cmd_user_remove(api, id, force, false).await,
        },
        Commands::Completions { .. } | Commands::Ui => Ok(()),
    }
}
