use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::config::Settings;
use crate::host::HostEnv;
use crate::utils::paths;

/// Fixed in-container workspace path.
pub const CONTAINER_WORKSPACE: &str = "/workspace";

/// Fixed in-container home path.
pub const CONTAINER_HOME: &str = "/home";

/// Directory under which Python modules are mounted.
pub const CONTAINER_MODULES: &str = "/modules";

/// Directory under which aliased mountpoints are exposed.
pub const CONTAINER_MOUNTPOINTS: &str = "/mountpoints";

/// Well-known path of the Vivado settings script inside the container.
pub const VIVADO_SETTINGS: &str = "/opt/Xilinx/Vivado/settings64.sh";

/// A host-to-container bind mount, optionally read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub host: String,
    pub container: String,
    pub read_only: bool,
}

impl Volume {
    fn new(host: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
            read_only: false,
        }
    }

    fn read_only(host: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
            read_only: true,
        }
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.container)?;
        if self.read_only {
            write!(f, ":ro")?;
        }
        Ok(())
    }
}

/// Invocation assembly errors. All of these surface before any subprocess is
/// spawned.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("path for module `{name}` does not exist ({path})")]
    ModuleNotFound { name: String, path: String },

    #[error("invalid module path `{0}`")]
    InvalidModulePath(String),

    #[error("invalid mountpoint `{spec}`: {reason}")]
    MountParse { spec: String, reason: String },

    #[error("failed to create home directory {path}: {source}")]
    HomeCreate {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to resolve path `{path}`: {source}")]
    Path {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The derived, ordered `docker run` argument plan.
///
/// Derived once from [`Settings`] plus the host snapshot and consumed
/// immediately by the runner; never persisted.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub options: Vec<String>,
    pub environment: BTreeMap<String, String>,
    pub volumes: Vec<Volume>,
    pub image: String,
    pub command: Option<String>,
}

impl Invocation {
    /// Assemble the container invocation from merged settings.
    ///
    /// The assembly is linear: seed defaults, mount Python modules, mount
    /// aliased mountpoints, collect runtime options, attach workspace and
    /// home, attach toolchain installs, apply USB/X passthrough, finalize
    /// `PYTHONPATH`. Ordering is deterministic throughout; the environment
    /// map renders in sorted key order.
    pub fn build(
        settings: &Settings,
        host: &HostEnv,
        command: Option<String>,
    ) -> Result<Self, InvocationError> {
        let mut environment = settings.environment.clone();
        let mut python_path = vec![CONTAINER_WORKSPACE.to_string()];
        let mut volumes = vec![Volume::new("/tmp", "/tmp")];

        let user_group = settings
            .user_group
            .clone()
            .unwrap_or_else(|| host.user_group());

        for module in &settings.python_modules {
            let path = absolutize(module)?;
            let name = Path::new(&path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| InvocationError::InvalidModulePath(module.clone()))?;
            if !Path::new(&path).exists() {
                return Err(InvocationError::ModuleNotFound { name, path });
            }
            let target = format!("{}/{}", CONTAINER_MODULES, name);
            volumes.push(Volume::new(path, target.clone()));
            python_path.push(target);
        }

        for mountpoint in &settings.mountpoints {
            apply_mountpoint(mountpoint, &mut volumes, &mut environment)?;
        }

        let mut options = vec![
            "--tty".to_string(),
            "--rm".to_string(),
            "--init".to_string(),
            "--network=host".to_string(),
            "--user".to_string(),
            user_group,
        ];
        options.extend(settings.docker_options.iter().cloned());
        if !settings.no_stdin {
            options.push("-i".to_string());
        }
        if !settings.no_tty {
            options.push("-t".to_string());
        }

        if !settings.workspace.is_empty() {
            let workspace = absolutize(&settings.workspace)?;
            volumes.push(Volume::new(workspace, CONTAINER_WORKSPACE));
            options.push("--workdir".to_string());
            options.push(CONTAINER_WORKSPACE.to_string());
        }

        let home = paths::expand_tilde(&settings.home_path);
        let home = absolutize(&home)?;
        if !Path::new(&home).exists() {
            std::fs::create_dir_all(&home).map_err(|source| InvocationError::HomeCreate {
                path: home.clone(),
                source,
            })?;
        }
        volumes.push(Volume::new(home, CONTAINER_HOME));

        if let Some(vivado) = &settings.xilinx_vivado_path {
            let vivado = absolutize(vivado)?;
            volumes.push(Volume::read_only(vivado.clone(), vivado.clone()));
            volumes.push(Volume::new(
                format!("{}/settings64.sh", vivado),
                VIVADO_SETTINGS,
            ));
        }
        if let Some(ise) = &settings.xilinx_ise_path {
            let ise = absolutize(ise)?;
            volumes.push(Volume::read_only(ise.clone(), ise));
        }

        if settings.with_usb {
            volumes.push(Volume::new("/dev/bus/usb", "/dev/bus/usb"));
            options.push("--privileged".to_string());
        }

        if settings.with_x {
            if let Some(display) = host.var("DISPLAY") {
                environment.insert("DISPLAY".to_string(), display.to_string());
            }
            volumes.push(Volume::new("/tmp/.X11-unix", "/tmp/.X11-unix"));
        }

        environment.insert("PYTHONPATH".to_string(), python_path.join(":"));

        Ok(Self {
            options,
            environment,
            volumes,
            image: settings.image.clone(),
            command,
        })
    }

    /// Render the final argument vector for `docker`, as discrete tokens:
    /// the `run` subcommand, runtime options, environment assignments,
    /// volume binds, the image reference and the optional trailing command.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec!["run".to_string()];
        argv.extend(self.options.iter().cloned());
        for (name, value) in &self.environment {
            argv.push("--env".to_string());
            argv.push(format!("{}={}", name, value));
        }
        for volume in &self.volumes {
            argv.push("-v".to_string());
            argv.push(volume.to_string());
        }
        argv.push(self.image.clone());
        if let Some(command) = &self.command {
            argv.push("-c".to_string());
            argv.push(command.clone());
        }
        argv
    }
}

fn absolutize(path: impl AsRef<Path>) -> Result<String, InvocationError> {
    let path = path.as_ref();
    let absolute = paths::absolutize(path).map_err(|source| InvocationError::Path {
        path: path.display().to_string(),
        source,
    })?;
    Ok(absolute.to_string_lossy().into_owned())
}

/// Attach one `path[:alias]` mountpoint.
///
/// An absolute alias binds the host path directly at that container path. A
/// relative alias (defaulting to the path's base name) binds under
/// `/mountpoints` and synthesizes an upper-cased environment variable so
/// in-container code can discover the mount by name.
fn apply_mountpoint(
    spec: &str,
    volumes: &mut Vec<Volume>,
    environment: &mut BTreeMap<String, String>,
) -> Result<(), InvocationError> {
    let (path, alias) = match spec.split_once(':') {
        Some((path, alias)) => (path.to_string(), alias.to_string()),
        None => {
            let alias = Path::new(spec)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (spec.to_string(), alias)
        }
    };
    if path.is_empty() {
        return Err(InvocationError::MountParse {
            spec: spec.to_string(),
            reason: "empty host path".to_string(),
        });
    }
    if alias.is_empty() {
        return Err(InvocationError::MountParse {
            spec: spec.to_string(),
            reason: "empty alias".to_string(),
        });
    }

    let host_path = absolutize(&path)?;
    if Path::new(&alias).is_absolute() {
        volumes.push(Volume::new(host_path, alias));
    } else {
        let target = format!("{}/{}", CONTAINER_MOUNTPOINTS, alias);
        volumes.push(Volume::new(host_path, target.clone()));
        let var_name = alias.replace('.', "_").to_uppercase();
        environment.insert(var_name, target);
    }
    Ok(())
}
