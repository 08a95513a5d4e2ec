pub mod launch;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fpgabox")]
#[command(version)]
#[command(about = "Containerized development environment for FPGA toolchain workflows", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open an interactive development shell in the container
    Shell {
        #[command(flatten)]
        container: ContainerOpts,

        #[command(flatten)]
        run: RunOpts,
    },

    /// Run a command inside the container and propagate its exit code
    Run {
        #[command(flatten)]
        container: ContainerOpts,

        #[command(flatten)]
        run: RunOpts,

        /// Command with arguments to execute in the container
        #[arg(required = true, trailing_var_arg = true, value_name = "COMMAND")]
        command: Vec<String>,
    },

    /// Print version information for the tool and the container image
    Version {
        #[command(flatten)]
        container: ContainerOpts,

        #[command(flatten)]
        run: RunOpts,
    },
}

/// Options shared by every action that touches the container runtime.
#[derive(Args, Debug, Default)]
pub struct ContainerOpts {
    /// Container image to use
    #[arg(long, env = "FPGABOX_IMAGE")]
    pub image: Option<String>,

    /// Extra option passed verbatim to `docker run`; may be given multiple times
    #[arg(short = 'o', long = "docker-option", value_name = "OPT", allow_hyphen_values = true)]
    pub docker_options: Vec<String>,

    /// Print the assembled docker invocation before running it
    #[arg(short, long)]
    pub verbose: bool,
}

/// Options controlling what gets mounted and how the container runs.
#[derive(Args, Debug, Default)]
pub struct RunOpts {
    /// Do not add USB support (device tree mount and privileged mode)
    #[arg(long)]
    pub without_usb: bool,

    /// Do not enable X applications (socket mount and DISPLAY passthrough)
    #[arg(long)]
    pub without_x: bool,

    /// Host directory mounted as the in-container workspace
    #[arg(long, env = "FPGABOX_WORKSPACE")]
    pub workspace: Option<String>,

    /// Host directory backing the in-container home
    #[arg(long, env = "FPGABOX_HOME_PATH")]
    pub home_path: Option<String>,

    /// Mount a Python module at the given path; may be given multiple times
    #[arg(short = 'm', long = "add-module", value_name = "PATH")]
    pub python_modules: Vec<String>,

    /// Copy the named environment variable into the container; may be given
    /// multiple times
    #[arg(short = 'e', long = "copy-env-var", value_name = "NAME")]
    pub copy_env_var: Vec<String>,

    /// Set an environment variable in the container; may be given multiple
    /// times
    #[arg(short = 'g', long = "add-env-var", value_name = "NAME=VALUE")]
    pub add_env_var: Vec<String>,

    /// Use a Xilinx Vivado installed under the given path
    #[arg(long, env = "XILINX_VIVADO", value_name = "PATH")]
    pub xilinx_vivado_path: Option<String>,

    /// Use a Xilinx ISE installed under the given path
    #[arg(long, env = "XILINX_ISE", value_name = "PATH")]
    pub xilinx_ise_path: Option<String>,

    /// Numeric user and group for the container user (e.g. 1000:1000);
    /// defaults to the invoking user
    #[arg(short = 'u', long, value_name = "UID:GID")]
    pub user_group: Option<String>,

    /// Load configuration from the given JSON file instead of fpgabox.json
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Ignore any configuration file
    #[arg(long)]
    pub ignore_config: bool,

    /// Add a mountpoint, optionally with an alias after ':'; may be given
    /// multiple times
    #[arg(short = 'f', long = "add-mountpoint", value_name = "PATH[:ALIAS]")]
    pub mountpoints: Vec<String>,

    /// Do not allocate a pseudo-tty
    #[arg(long)]
    pub no_tty: bool,

    /// Do not keep stdin open
    #[arg(long)]
    pub no_stdin: bool,
}

impl Cli {
    /// Dispatch the selected action; returns the process exit code.
    pub fn execute(self) -> Result<i32> {
        match self.command {
            Commands::Shell { container, run } => launch::shell(container, run),
            Commands::Run {
                container,
                run,
                command,
            } => launch::command(container, run, command),
            Commands::Version { container, run } => launch::version(container, run),
        }
    }
}
