// SPDX-License-Identifier: PMPL-1.0-or-later

//! chaos-agent: inject process and JVM faults, then recover them.

use anyhow::Result;
use chaos_agent::agent::Agent;
use chaos_agent::attack::{Dispatcher, JvmAttack, ProcessKillAttack};
use chaos_agent::config::AgentConfig;
use chaos_agent::env::HostEnvironment;
use chaos_agent::error::AttackError;
use chaos_agent::logger;
use chaos_agent::storage::{ExperimentStatus, FileExperimentStore};
use chaos_agent::tool::ShellRunner;
use chaos_agent::types::{AttackConfig, JvmAction, JvmCommand, ProcessCommand};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

const EXIT_ERROR: i32 = 1;
const EXIT_BAD_ARGS: i32 = 128;

#[derive(Parser)]
#[command(name = "chaos-agent")]
#[command(version)]
#[command(about = "Host-level fault injection with persisted recovery")]
#[command(long_about = None)]
struct Cli {
    /// Agent config file (JSON or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process attack related commands
    Process {
        #[command(subcommand)]
        command: ProcessCommands,
    },

    /// JVM attack related commands
    Jvm {
        #[command(subcommand)]
        command: JvmCommands,
    },

    /// Recover an experiment by uid
    Recover {
        #[arg(value_name = "UID")]
        uid: String,
    },

    /// List recorded experiments
    List,
}

#[derive(Subcommand)]
enum ProcessCommands {
    /// Kill process, default signal 9
    Kill {
        /// The process name or the process ID
        #[arg(short, long)]
        process: Option<String>,

        /// Signal number to deliver
        #[arg(short, long, default_value_t = libc::SIGKILL)]
        signal: i32,
    },
}

#[derive(Subcommand)]
enum JvmCommands {
    /// Attach the byteman agent to a running JVM
    Install {
        /// Port the agent listens on
        #[arg(long, default_value_t = 9288)]
        port: u16,

        /// Target JVM process ID
        #[arg(long)]
        pid: u32,
    },

    /// Load a fault rule into an attached JVM
    Submit {
        #[arg(long, default_value_t = 9288)]
        port: u16,

        /// latency, exception, return, stress or gc
        #[arg(short, long)]
        action: String,

        /// Rule name
        #[arg(short, long)]
        name: String,

        /// Target class
        #[arg(long, default_value = "")]
        class: String,

        /// Target method
        #[arg(long, default_value = "")]
        method: String,

        /// Latency in milliseconds
        #[arg(long)]
        latency: Option<u64>,

        /// Exception to throw, e.g. 'java.io.IOException("boom")'
        #[arg(long)]
        exception: Option<String>,

        /// Value to return
        #[arg(long)]
        value: Option<String>,

        /// CPU cores to burn
        #[arg(long, default_value_t = 0)]
        cpu_count: u32,

        /// Memory to allocate, e.g. 1GB
        #[arg(long)]
        mem_size: Option<String>,

        /// Raw rule statement, replaces the one derived from the action
        #[arg(long = "do")]
        do_statement: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match AgentConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => exit_with_error(EXIT_BAD_ARGS, &err),
    };
    logger::init_logger(&logger::level_for(cli.verbose, config.log_level.as_deref()));

    // Requests are built and checked before the agent exists, so a bad
    // argument never reaches the store or the dispatcher.
    let request = match build_request(&cli.command) {
        Ok(request) => request,
        Err(err) => exit_with_error(EXIT_BAD_ARGS, &anyhow::Error::from(err)),
    };

    if let Err(err) = run(&config, cli.command, request) {
        let code = match err.downcast_ref::<AttackError>() {
            Some(e) if e.is_bad_argument() => EXIT_BAD_ARGS,
            _ => EXIT_ERROR,
        };
        exit_with_error(code, &err);
    }
}

fn exit_with_error(code: i32, err: &anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), err);
    process::exit(code);
}

fn build_request(command: &Commands) -> Result<Option<AttackConfig>, AttackError> {
    let config = match command {
        Commands::Process {
            command: ProcessCommands::Kill { process, signal },
        } => AttackConfig::Process(ProcessCommand::from_flag(process.clone())?.with_signal(*signal)),
        Commands::Jvm {
            command: JvmCommands::Install { port, pid },
        } => AttackConfig::Jvm(JvmCommand::install(*port, *pid)),
        Commands::Jvm {
            command:
                JvmCommands::Submit {
                    port,
                    action,
                    name,
                    class,
                    method,
                    latency,
                    exception,
                    value,
                    cpu_count,
                    mem_size,
                    do_statement,
                },
        } => {
            let mut cmd = JvmCommand::submit(*port, JvmAction::from(action.as_str()))
                .rule(name, class, method);
            cmd.latency_duration = *latency;
            cmd.throw_exception = exception.clone();
            cmd.return_value = value.clone();
            cmd.cpu_count = *cpu_count;
            cmd.memory_size = mem_size.clone();
            cmd.do_statement = do_statement.clone();
            AttackConfig::Jvm(cmd)
        }
        Commands::Recover { .. } | Commands::List => return Ok(None),
    };
    config.validate()?;
    Ok(Some(config))
}

fn build_agent(config: &AgentConfig) -> Result<Agent> {
    let runner = ShellRunner::with_timeout(config.tool_timeout());
    let dispatcher = Dispatcher::new(vec![
        Box::new(ProcessKillAttack),
        Box::new(JvmAttack::new(
            config.rule_dir.clone(),
            config.byteman_bin.clone(),
        )),
    ]);
    let store = FileExperimentStore::open(&config.experiment_dir)?;
    Ok(Agent::new(
        dispatcher,
        Arc::new(store),
        Arc::new(HostEnvironment::new(runner)),
    ))
}

fn run(config: &AgentConfig, command: Commands, request: Option<AttackConfig>) -> Result<()> {
    let agent = build_agent(config)?;

    if let Some(request) = request {
        let experiment = agent.attack(request)?;
        println!(
            "{} {} {} attack applied, uid: {}",
            "OK".green().bold(),
            experiment.kind,
            experiment.action,
            experiment.uid.yellow()
        );
        return Ok(());
    }

    match command {
        Commands::Recover { uid } => {
            let experiment = agent.recover(&uid)?;
            println!(
                "{} experiment {} recovered",
                "OK".green().bold(),
                experiment.uid.yellow()
            );
        }
        Commands::List => {
            let experiments = agent.experiments()?;
            if experiments.is_empty() {
                println!("No experiments recorded in {}", config.experiment_dir.display());
            }
            for exp in &experiments {
                let status = match exp.status {
                    ExperimentStatus::Success => exp.status.to_string().green(),
                    ExperimentStatus::Error => exp.status.to_string().red(),
                    _ => exp.status.to_string().normal(),
                };
                println!(
                    "  {} | {} | {} | {} | {}",
                    exp.uid.yellow(),
                    exp.kind,
                    exp.action,
                    status,
                    exp.created_at.to_rfc3339()
                );
            }
        }
        Commands::Process { .. } | Commands::Jvm { .. } => {}
    }

    Ok(())
}
