use anyhow::Result;
use colored::Colorize;

use crate::config::{CliOverlay, ConfigFile, Settings};
use crate::docker::{runner, Invocation, Streams};
use crate::host::HostEnv;

use super::{ContainerOpts, RunOpts};

/// Sentinel command understood by the image entrypoint; reports the
/// toolchain versions shipped in the image.
const VERSION_SENTINEL: &str = "version-info";

/// Open an interactive development shell in the container.
pub fn shell(container: ContainerOpts, run: RunOpts) -> Result<i32> {
    launch(container, run, None)
}

/// Run a single command in the container. The words are joined into one
/// command string handed to the image entrypoint.
pub fn command(container: ContainerOpts, run: RunOpts, words: Vec<String>) -> Result<i32> {
    launch(container, run, Some(words.join(" ")))
}

/// Print the tool's own version, then query the image for its toolchain
/// versions.
pub fn version(container: ContainerOpts, run: RunOpts) -> Result<i32> {
    println!(
        "{} {}\n",
        "fpgabox".green().bold(),
        env!("CARGO_PKG_VERSION")
    );
    launch(container, run, Some(VERSION_SENTINEL.to_string()))
}

fn launch(container: ContainerOpts, run: RunOpts, command: Option<String>) -> Result<i32> {
    let host = HostEnv::capture();
    let file = ConfigFile::discover(run.config.as_deref(), run.ignore_config)?;
    let settings = Settings::resolve(overlay(container, run), file, &host)?;
    let invocation = Invocation::build(&settings, &host, command)?;
    runner::run(&invocation, settings.verbose, Streams::default())
}

/// Map parsed flags onto the merge overlay. Boolean flags become tri-state
/// here: an unset flag must not mask a config file value.
fn overlay(container: ContainerOpts, run: RunOpts) -> CliOverlay {
    CliOverlay {
        image: container.image,
        workspace: run.workspace,
        home_path: run.home_path,
        user_group: run.user_group,
        xilinx_vivado_path: run.xilinx_vivado_path,
        xilinx_ise_path: run.xilinx_ise_path,
        with_usb: run.without_usb.then_some(false),
        with_x: run.without_x.then_some(false),
        no_stdin: run.no_stdin.then_some(true),
        no_tty: run.no_tty.then_some(true),
        verbose: container.verbose.then_some(true),
        docker_options: container.docker_options,
        python_modules: run.python_modules,
        mountpoints: run.mountpoints,
        copy_env_var: run.copy_env_var,
        add_env_var: run.add_env_var,
    }
}
