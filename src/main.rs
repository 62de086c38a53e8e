use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use staffdesk::app::App;
use staffdesk::auth::{AuthProvider, LocalAuthProvider};
use staffdesk::config::Config;
use staffdesk::form::formatters::format_currency;
use staffdesk::gateway::Gateway;
use staffdesk::logging;
use staffdesk::services::{DepartmentService, EmployeeService};
use staffdesk::store::open_store;
use staffdesk::types::{Employee, EmployeeStatus};
use staffdesk::ui::install_panic_hook;

#[derive(Parser)]
#[command(name = "staffdesk")]
#[command(about = "Employee registration and department management in the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage employee records
    Employees {
        #[command(subcommand)]
        action: EmployeeCommand,
    },

    /// Manage departments
    Departments {
        #[command(subcommand)]
        action: DepartmentCommand,
    },

    /// Manage sign-in accounts
    Users {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Inspect or persist settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings as TOML
    Show,

    /// Write the effective settings to the user config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum EmployeeCommand {
    /// List employees, newest first
    List {
        /// Only show employees with this status
        #[arg(short, long)]
        status: Option<StatusArg>,
    },

    /// Delete employees by id
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum DepartmentCommand {
    /// List departments with manager and member count
    List {
        /// Filter by department or manager name/email
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Delete departments by id; every id is attempted
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Create a sign-in account
    Register {
        email: String,

        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Active,
    Inactive,
}

impl From<StatusArg> for EmployeeStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Active => EmployeeStatus::Active,
            StatusArg::Inactive => EmployeeStatus::Inactive,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging setup needs the config
    let config = Config::load(cli.config.as_deref())?;

    // No subcommand runs the TUI, which logs to a file instead of stderr
    let is_tui_mode = cli.command.is_none();
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    match cli.command {
        Some(Commands::Employees { action }) => cmd_employees(&config, action).await?,
        Some(Commands::Departments { action }) => cmd_departments(&config, action).await?,
        Some(Commands::Users { action }) => cmd_users(&config, action).await?,
        Some(Commands::Config { action }) => cmd_config(&config, action)?,
        None => run_tui(config, logging_handle.log_file_path).await?,
    }

    Ok(())
}

async fn run_tui(config: Config, log_file_path: Option<PathBuf>) -> Result<()> {
    install_panic_hook();

    let mut app = App::new(config)?;
    let result = app.run().await;
    app.shutdown();

    if let Some(log_path) = log_file_path {
        if log_path.metadata().is_ok_and(|m| m.len() > 0) {
            eprintln!("Session log: {}", log_path.display());
        }
    }

    result
}

fn print_employee(employee: &Employee) {
    println!(
        "{:<34} {:<28} {:<30} {:<14} {:>14} {}",
        employee.id.as_deref().unwrap_or("-"),
        employee.full_name(),
        employee.personal_info.email,
        employee.job_info.department,
        format_currency(employee.job_info.salary),
        employee.status.as_str(),
    );
}

async fn cmd_employees(config: &Config, action: EmployeeCommand) -> Result<()> {
    let service = EmployeeService::new(open_store(config));

    match action {
        EmployeeCommand::List { status } => {
            let employees = match status {
                Some(status) => {
                    let status = EmployeeStatus::from(status);
                    service
                        .list_by("status", status.as_str().into())
                        .await
                        .context("Failed to list employees")?
                }
                None => service.list().await.context("Failed to list employees")?,
            };

            if employees.is_empty() {
                println!("No employees registered");
                return Ok(());
            }
            println!("Employees ({})", employees.len());
            println!("{}", "─".repeat(60));
            for employee in &employees {
                print_employee(employee);
            }
        }
        EmployeeCommand::Delete { ids } => {
            let report = service.delete_many(&ids).await;
            for id in &report.deleted {
                println!("Deleted {id}");
            }
            for (id, err) in &report.failed {
                eprintln!("Failed to delete {id}: {err}");
            }
            println!("{}", report.summary());
            if !report.is_complete() {
                bail!("{} employee(s) could not be deleted", report.failed.len());
            }
        }
    }

    Ok(())
}

async fn cmd_departments(config: &Config, action: DepartmentCommand) -> Result<()> {
    let service = DepartmentService::new(open_store(config));

    match action {
        DepartmentCommand::List { search } => {
            let departments = service
                .search(search.as_deref().unwrap_or_default())
                .await
                .context("Failed to list departments")?;

            if departments.is_empty() {
                println!("No departments found");
                return Ok(());
            }
            println!("Departments ({})", departments.len());
            println!("{}", "─".repeat(60));
            for details in &departments {
                let manager = details
                    .manager
                    .as_ref()
                    .map(|m| m.name.as_str())
                    .unwrap_or("-");
                println!(
                    "{:<34} {:<24} {:<28} {} member(s)",
                    details.department.id.as_deref().unwrap_or("-"),
                    details.department.name,
                    manager,
                    details.employee_count,
                );
            }
        }
        DepartmentCommand::Delete { ids } => {
            let report = service.delete_many(&ids).await;
            for (id, err) in &report.failed {
                eprintln!("Failed to delete {id}: {err}");
            }
            println!("{}", report.summary());
            if !report.is_complete() {
                bail!("{} department(s) could not be deleted", report.failed.len());
            }
        }
    }

    Ok(())
}

async fn cmd_users(config: &Config, action: UserCommand) -> Result<()> {
    match action {
        UserCommand::Register { email, password } => {
            let password = match password {
                Some(password) => password,
                None => {
                    print!("Password: ");
                    io::stdout().flush()?;
                    let mut line = String::new();
                    io::stdin()
                        .lock()
                        .read_line(&mut line)
                        .context("Failed to read password")?;
                    line.trim_end_matches(['\r', '\n']).to_string()
                }
            };

            let provider = LocalAuthProvider::new(config.users_path(), config.auth.clone());
            match provider.register(&email, &password).await {
                Ok(user) => println!("Registered {} ({})", user.email, user.uid),
                Err(e) => bail!("{} ({})", e.user_message(), e.code()),
            }
        }
    }

    Ok(())
}

fn cmd_config(config: &Config, action: ConfigCommand) -> Result<()> {
    match action {
        ConfigCommand::Show => print!("{}", config.to_toml()?),
        ConfigCommand::Init { force } => {
            if let Some(path) = Config::user_config_path() {
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
            }
            let path = config.save()?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
