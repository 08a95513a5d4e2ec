use std::collections::BTreeMap;

use crate::config::file::{ConfigError, ConfigFile};
use crate::host::HostEnv;

/// Default container image, overridable via `FPGABOX_IMAGE`, the config file
/// or `--image`.
pub const DEFAULT_IMAGE: &str = "fpgabox/toolchain:latest";

/// Default workspace: the invoking directory.
pub const DEFAULT_WORKSPACE: &str = "./";

/// Default in-container home backing store on the host.
pub const DEFAULT_HOME_PATH: &str = "~/.fpgabox";

/// Values collected from the command line, one slot per configurable setting.
///
/// `None` / empty means "not given", which leaves the lower-priority layers
/// untouched during the merge. Boolean flags are tri-state so that an
/// explicit flag can force a value in either direction.
#[derive(Debug, Clone, Default)]
pub struct CliOverlay {
    pub image: Option<String>,
    pub workspace: Option<String>,
    pub home_path: Option<String>,
    pub user_group: Option<String>,
    pub xilinx_vivado_path: Option<String>,
    pub xilinx_ise_path: Option<String>,
    pub with_usb: Option<bool>,
    pub with_x: Option<bool>,
    pub no_stdin: Option<bool>,
    pub no_tty: Option<bool>,
    pub verbose: Option<bool>,
    pub docker_options: Vec<String>,
    pub python_modules: Vec<String>,
    pub mountpoints: Vec<String>,
    pub copy_env_var: Vec<String>,
    pub add_env_var: Vec<String>,
}

/// The fully merged configuration record driving container invocation.
///
/// Built once per invocation by [`Settings::resolve`] and immutable
/// thereafter.
#[derive(Debug, Clone)]
pub struct Settings {
    pub image: String,
    pub workspace: String,
    pub home_path: String,
    pub user_group: Option<String>,
    pub xilinx_vivado_path: Option<String>,
    pub xilinx_ise_path: Option<String>,
    pub with_usb: bool,
    pub with_x: bool,
    pub no_stdin: bool,
    pub no_tty: bool,
    pub verbose: bool,
    pub docker_options: Vec<String>,
    pub python_modules: Vec<String>,
    pub mountpoints: Vec<String>,
    pub environment: BTreeMap<String, String>,
}

impl Settings {
    /// Built-in defaults. `with_x` defaults to whether the invoking
    /// environment carries a `DISPLAY`; config file and CLI can still
    /// override the computed value.
    pub fn defaults(host: &HostEnv) -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            workspace: DEFAULT_WORKSPACE.to_string(),
            home_path: DEFAULT_HOME_PATH.to_string(),
            user_group: None,
            xilinx_vivado_path: None,
            xilinx_ise_path: None,
            with_usb: true,
            with_x: host.has_var("DISPLAY"),
            no_stdin: false,
            no_tty: false,
            verbose: false,
            docker_options: Vec::new(),
            python_modules: Vec::new(),
            mountpoints: Vec::new(),
            environment: BTreeMap::new(),
        }
    }

    /// Merge the four configuration layers into one record.
    ///
    /// Scalars: config file overrides the built-in default, CLI overrides the
    /// config file (environment-sourced flag values enter through the CLI
    /// layer). Lists accumulate: CLI entries first, then config file entries.
    /// The container environment is assembled last: config file `environment`
    /// entries, then `copy_env_var` names resolved against the host snapshot,
    /// then `add_env_var` literals, so a literal wins for the same name.
    pub fn resolve(
        cli: CliOverlay,
        file: ConfigFile,
        host: &HostEnv,
    ) -> Result<Self, ConfigError> {
        let mut settings = Self::defaults(host);

        override_scalar(&mut settings.image, file.image, cli.image);
        override_scalar(&mut settings.workspace, file.workspace, cli.workspace);
        override_scalar(&mut settings.home_path, file.home_path, cli.home_path);
        override_option(&mut settings.user_group, file.user_group, cli.user_group);
        override_option(
            &mut settings.xilinx_vivado_path,
            file.xilinx_vivado_path,
            cli.xilinx_vivado_path,
        );
        override_option(
            &mut settings.xilinx_ise_path,
            file.xilinx_ise_path,
            cli.xilinx_ise_path,
        );
        override_scalar(&mut settings.with_usb, file.with_usb, cli.with_usb);
        override_scalar(&mut settings.with_x, file.with_x, cli.with_x);
        override_scalar(&mut settings.no_stdin, file.no_stdin, cli.no_stdin);
        override_scalar(&mut settings.no_tty, file.no_tty, cli.no_tty);
        override_scalar(&mut settings.verbose, file.verbose, cli.verbose);

        settings.docker_options.extend(cli.docker_options);
        settings.docker_options.extend(file.docker_options);
        settings.python_modules.extend(cli.python_modules);
        settings.python_modules.extend(file.python_modules);
        settings.mountpoints.extend(cli.mountpoints);
        settings.mountpoints.extend(file.mountpoints);

        for (name, value) in file.environment {
            settings.environment.insert(name, value);
        }

        let mut copy_env_var = cli.copy_env_var;
        copy_env_var.extend(file.copy_env_var);
        for name in copy_env_var {
            let value = host
                .var(&name)
                .ok_or_else(|| ConfigError::MissingEnvVar(name.clone()))?;
            settings.environment.insert(name, value.to_string());
        }

        let mut add_env_var = cli.add_env_var;
        add_env_var.extend(file.add_env_var);
        for entry in add_env_var {
            let (name, value) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedEnvEntry(entry.clone()))?;
            if name.is_empty() {
                return Err(ConfigError::MalformedEnvEntry(entry.clone()));
            }
            settings
                .environment
                .insert(name.to_string(), value.to_string());
        }

        Ok(settings)
    }
}

fn override_scalar<T>(slot: &mut T, file: Option<T>, cli: Option<T>) {
    if let Some(value) = file {
        *slot = value;
    }
    if let Some(value) = cli {
        *slot = value;
    }
}

fn override_option<T>(slot: &mut Option<T>, file: Option<T>, cli: Option<T>) {
    if file.is_some() {
        *slot = file;
    }
    if cli.is_some() {
        *slot = cli;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn host_with(vars: &[(&str, &str)]) -> HostEnv {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        HostEnv::new(vars, 1000, 1000)
    }

    #[test]
    fn defaults_apply_when_no_overlays() {
        let settings =
            Settings::resolve(CliOverlay::default(), ConfigFile::default(), &host_with(&[]))
                .unwrap();

        assert_eq!(settings.image, DEFAULT_IMAGE);
        assert_eq!(settings.workspace, DEFAULT_WORKSPACE);
        assert_eq!(settings.home_path, DEFAULT_HOME_PATH);
        assert!(settings.with_usb);
        assert!(!settings.verbose);
        assert!(settings.docker_options.is_empty());
    }

    #[test]
    fn cli_wins_over_file_for_scalars() {
        let cli = CliOverlay {
            image: Some("cli:latest".to_string()),
            ..Default::default()
        };
        let file = ConfigFile {
            image: Some("file:latest".to_string()),
            workspace: Some("/srv/project".to_string()),
            ..Default::default()
        };

        let settings = Settings::resolve(cli, file, &host_with(&[])).unwrap();
        assert_eq!(settings.image, "cli:latest");
        assert_eq!(settings.workspace, "/srv/project");
    }

    #[test]
    fn explicit_false_overrides_default_true() {
        let file = ConfigFile {
            with_usb: Some(false),
            ..Default::default()
        };

        let settings = Settings::resolve(CliOverlay::default(), file, &host_with(&[])).unwrap();
        assert!(!settings.with_usb);
    }

    #[test]
    fn lists_accumulate_cli_entries_before_file_entries() {
        let cli = CliOverlay {
            docker_options: vec!["--cpus=2".to_string(), "--memory=1g".to_string()],
            mountpoints: vec!["/data".to_string()],
            ..Default::default()
        };
        let file = ConfigFile {
            docker_options: vec!["--shm-size=2g".to_string()],
            mountpoints: vec!["/cal:calibration".to_string()],
            ..Default::default()
        };

        let settings = Settings::resolve(cli, file, &host_with(&[])).unwrap();
        assert_eq!(
            settings.docker_options,
            vec!["--cpus=2", "--memory=1g", "--shm-size=2g"]
        );
        assert_eq!(settings.mountpoints, vec!["/data", "/cal:calibration"]);
    }

    #[test]
    fn with_x_defaults_from_display_presence() {
        let without = Settings::resolve(
            CliOverlay::default(),
            ConfigFile::default(),
            &host_with(&[]),
        )
        .unwrap();
        assert!(!without.with_x);

        let with = Settings::resolve(
            CliOverlay::default(),
            ConfigFile::default(),
            &host_with(&[("DISPLAY", ":0")]),
        )
        .unwrap();
        assert!(with.with_x);
    }

    #[test]
    fn with_x_computed_default_is_still_overridable() {
        let cli = CliOverlay {
            with_x: Some(false),
            ..Default::default()
        };
        let settings =
            Settings::resolve(cli, ConfigFile::default(), &host_with(&[("DISPLAY", ":0")]))
                .unwrap();
        assert!(!settings.with_x);
    }

    #[test]
    fn copy_env_var_resolves_from_host_snapshot() {
        let cli = CliOverlay {
            copy_env_var: vec!["ARTIQ_MASTER".to_string()],
            ..Default::default()
        };
        let settings = Settings::resolve(
            cli,
            ConfigFile::default(),
            &host_with(&[("ARTIQ_MASTER", "10.0.0.5")]),
        )
        .unwrap();
        assert_eq!(settings.environment.get("ARTIQ_MASTER").unwrap(), "10.0.0.5");
    }

    #[test]
    fn copy_env_var_of_unset_variable_is_fatal() {
        let cli = CliOverlay {
            copy_env_var: vec!["NOT_SET".to_string()],
            ..Default::default()
        };
        let err = Settings::resolve(cli, ConfigFile::default(), &host_with(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == "NOT_SET"));
    }

    #[test]
    fn add_env_var_literal_wins_over_copied_value() {
        let cli = CliOverlay {
            copy_env_var: vec!["MODE".to_string()],
            add_env_var: vec!["MODE=literal".to_string()],
            ..Default::default()
        };
        let settings =
            Settings::resolve(cli, ConfigFile::default(), &host_with(&[("MODE", "copied")]))
                .unwrap();
        assert_eq!(settings.environment.get("MODE").unwrap(), "literal");
    }

    #[test]
    fn add_env_var_splits_on_first_equals() {
        let cli = CliOverlay {
            add_env_var: vec!["OPTS=a=b".to_string()],
            ..Default::default()
        };
        let settings = Settings::resolve(cli, ConfigFile::default(), &host_with(&[])).unwrap();
        assert_eq!(settings.environment.get("OPTS").unwrap(), "a=b");
    }

    #[test]
    fn add_env_var_without_equals_is_fatal() {
        let cli = CliOverlay {
            add_env_var: vec!["NOEQUALS".to_string()],
            ..Default::default()
        };
        let err = Settings::resolve(cli, ConfigFile::default(), &host_with(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedEnvEntry(_)));
    }

    #[test]
    fn file_environment_merges_into_defaults() {
        let mut environment = BTreeMap::new();
        environment.insert("ARTIQ_LOG".to_string(), "debug".to_string());
        let file = ConfigFile {
            environment,
            ..Default::default()
        };

        let settings = Settings::resolve(CliOverlay::default(), file, &host_with(&[])).unwrap();
        assert_eq!(settings.environment.get("ARTIQ_LOG").unwrap(), "debug");
    }
}
