use std::collections::HashMap;

/// Snapshot of the invoking host, taken once at startup.
///
/// Configuration resolution and invocation assembly only ever consult this
/// snapshot, never the ambient process environment, so both stay testable
/// without a real host.
#[derive(Debug, Clone)]
pub struct HostEnv {
    vars: HashMap<String, String>,
    uid: u32,
    gid: u32,
}

impl HostEnv {
    /// Capture the calling process's environment table and numeric identity.
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars().collect(),
            uid: nix::unistd::getuid().as_raw(),
            gid: nix::unistd::getgid().as_raw(),
        }
    }

    /// Build a snapshot from explicit values (used by tests).
    pub fn new(vars: HashMap<String, String>, uid: u32, gid: u32) -> Self {
        Self { vars, uid, gid }
    }

    /// Look up a variable in the snapshot.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Whether a variable exists in the snapshot.
    pub fn has_var(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// The invoking user's identity as a `uid:gid` pair.
    pub fn user_group(&self) -> String {
        format!("{}:{}", self.uid, self.gid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_group_formats_numeric_pair() {
        let host = HostEnv::new(HashMap::new(), 1000, 1001);
        assert_eq!(host.user_group(), "1000:1001");
    }

    #[test]
    fn var_lookup() {
        let mut vars = HashMap::new();
        vars.insert("DISPLAY".to_string(), ":0".to_string());
        let host = HostEnv::new(vars, 0, 0);

        assert!(host.has_var("DISPLAY"));
        assert_eq!(host.var("DISPLAY"), Some(":0"));
        assert_eq!(host.var("MISSING"), None);
    }
}
