//! Console variable registry.
//!
//! Named, typed, tunable values the rest of the engine reads through the
//! registry. Variables carry a default, an optional clamping range for
//! numeric types, and two flags: `config_writable` (may be changed by
//! executing a config file or console command) and `server` (applied by
//! the server-only config pass).
//!
//! The command language is line oriented:
//!
//! ```text
//! // comment
//! set cl_particles 1
//! set r_clearcolor 0.1 0.1 0.2 1.0
//! set sv_hostname "my server"
//! ```
//!
//! `set <var> <args...>` is the only command; argument count and types
//! must match the variable. Config files are just sequences of commands.

use bevy_ecs::prelude::Resource;
use log::{info, warn};
use rustc_hash::FxHashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Typed value of a console variable.
#[derive(Debug, Clone, PartialEq)]
pub enum CvarValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2i(i32, i32),
    Vec2f(f32, f32),
    Vec3i(i32, i32, i32),
    Vec3f(f32, f32, f32),
    Vec4f(f32, f32, f32, f32),
    Str(String),
}

impl fmt::Display for CvarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CvarValue::Bool(v) => write!(f, "{}", *v as i32),
            CvarValue::Int(v) => write!(f, "{}", v),
            CvarValue::Float(v) => write!(f, "{}", v),
            CvarValue::Vec2i(x, y) => write!(f, "{} {}", x, y),
            CvarValue::Vec2f(x, y) => write!(f, "{} {}", x, y),
            CvarValue::Vec3i(x, y, z) => write!(f, "{} {} {}", x, y, z),
            CvarValue::Vec3f(x, y, z) => write!(f, "{} {} {}", x, y, z),
            CvarValue::Vec4f(x, y, z, w) => write!(f, "{} {} {} {}", x, y, z, w),
            CvarValue::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Outcome of executing one console command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmdOutcome {
    /// Command applied (or the line was blank/a comment).
    Ok,
    UnknownCommand(String),
    UnknownVariable(String),
    /// Arguments missing, malformed, or of the wrong arity.
    InvalidArgs(String),
    /// Variable exists but is not config-writable.
    NotWritable(String),
}

/// A registered console variable.
#[derive(Debug, Clone)]
pub struct Cvar {
    pub value: CvarValue,
    pub default: CvarValue,
    /// Clamp range for Int/Float variables.
    pub range: Option<(f32, f32)>,
    /// May be modified by commands and config files.
    pub config_writable: bool,
    /// Applied by the server-only config pass.
    pub server: bool,
}

/// Registry of console variables, indexed by name.
#[derive(Resource, Default)]
pub struct CvarRegistry {
    vars: FxHashMap<String, Cvar>,
}

impl CvarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable. Re-registering a name replaces it.
    pub fn register(&mut self, name: impl Into<String>, value: CvarValue, config_writable: bool) {
        self.register_full(name, value, None, config_writable, false);
    }

    /// Register a numeric variable with a clamp range.
    pub fn register_ranged(
        &mut self,
        name: impl Into<String>,
        value: CvarValue,
        min: f32,
        max: f32,
        config_writable: bool,
    ) {
        self.register_full(name, value, Some((min, max)), config_writable, false);
    }

    /// Register a server variable (picked up by the server-only pass).
    pub fn register_server(&mut self, name: impl Into<String>, value: CvarValue) {
        self.register_full(name, value, None, true, true);
    }

    pub fn register_full(
        &mut self,
        name: impl Into<String>,
        value: CvarValue,
        range: Option<(f32, f32)>,
        config_writable: bool,
        server: bool,
    ) {
        let name = name.into();
        self.vars.insert(
            name,
            Cvar {
                default: value.clone(),
                value,
                range,
                config_writable,
                server,
            },
        );
    }

    /// Remove a variable from the registry.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&CvarValue> {
        self.vars.get(name).map(|v| &v.value)
    }

    pub fn bool_of(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            CvarValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn int_of(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            CvarValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn float_of(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            CvarValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn str_of(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            CvarValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn vec4_of(&self, name: &str) -> Option<(f32, f32, f32, f32)> {
        match self.get(name)? {
            CvarValue::Vec4f(x, y, z, w) => Some((*x, *y, *z, *w)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Execute one command line.
    pub fn command(&mut self, line: &str) -> CmdOutcome {
        self.command_filtered(line, false)
    }

    fn command_filtered(&mut self, line: &str, server_only: bool) -> CmdOutcome {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return CmdOutcome::Ok;
        }
        let mut tokens = tokenize(line);
        if tokens.is_empty() {
            return CmdOutcome::Ok;
        }
        let cmd = tokens.remove(0);
        if cmd != "set" {
            return CmdOutcome::UnknownCommand(cmd);
        }
        if tokens.is_empty() {
            return CmdOutcome::InvalidArgs("set needs a variable name".into());
        }
        let name = tokens.remove(0);
        let var = match self.vars.get_mut(&name) {
            Some(var) => var,
            None => return CmdOutcome::UnknownVariable(name),
        };
        if !var.config_writable {
            return CmdOutcome::NotWritable(name);
        }
        if server_only && !var.server {
            // Filtered out by the server-only pass; not an error.
            return CmdOutcome::Ok;
        }
        match parse_value(&var.value, var.range, &tokens) {
            Ok(value) => {
                var.value = value;
                CmdOutcome::Ok
            }
            Err(e) => CmdOutcome::InvalidArgs(format!("{}: {}", name, e)),
        }
    }

    /// Execute every command in a config file. Per-line failures are
    /// logged and skipped; only file-level IO errors are returned.
    pub fn exec_config(&mut self, path: impl AsRef<Path>) -> Result<(), String> {
        self.exec_config_filtered(path, false)
    }

    /// As [`exec_config`](Self::exec_config), but only variables flagged
    /// `server` are applied.
    pub fn exec_config_server_only(&mut self, path: impl AsRef<Path>) -> Result<(), String> {
        self.exec_config_filtered(path, true)
    }

    fn exec_config_filtered(
        &mut self,
        path: impl AsRef<Path>,
        server_only: bool,
    ) -> Result<(), String> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        for (lineno, line) in text.lines().enumerate() {
            match self.command_filtered(line, server_only) {
                CmdOutcome::Ok => {}
                outcome => warn!(
                    "{}:{}: {:?} in '{}'",
                    path.display(),
                    lineno + 1,
                    outcome,
                    line.trim()
                ),
            }
        }
        info!("executed config {}", path.display());
        Ok(())
    }

    /// Write a config file of `set` lines for every config-writable
    /// variable, parseable back by [`exec_config`](Self::exec_config).
    pub fn save_config(&self, path: impl AsRef<Path>) -> Result<(), String> {
        let path = path.as_ref();
        let mut names: Vec<&String> = self
            .vars
            .iter()
            .filter(|(_, v)| v.config_writable)
            .map(|(n, _)| n)
            .collect();
        names.sort();
        let mut out = String::new();
        for name in names {
            out.push_str(&format!("set {} {}\n", name, self.vars[name].value));
        }
        fs::write(path, out)
            .map_err(|e| format!("failed to write config {}: {}", path.display(), e))?;
        info!("saved config {}", path.display());
        Ok(())
    }

    /// Sorted names starting with `prefix` (console completion).
    pub fn vars_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .vars
            .keys()
            .filter(|n| n.starts_with(prefix))
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Display string `"name value"` for one variable.
    pub fn format_var(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .map(|v| format!("{} {}", name, v.value))
    }
}

/// Split a command line into tokens; double quotes group words.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => {
                if in_quotes {
                    tokens.push(std::mem::take(&mut current));
                }
                in_quotes = !in_quotes;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parse `args` into a value of the same type as `current`, clamping
/// numeric values into `range` when one is set.
fn parse_value(
    current: &CvarValue,
    range: Option<(f32, f32)>,
    args: &[String],
) -> Result<CvarValue, String> {
    let need = |n: usize| {
        if args.len() == n {
            Ok(())
        } else {
            Err(format!("expected {} argument(s), got {}", n, args.len()))
        }
    };
    let int = |s: &String| {
        s.parse::<i32>()
            .map_err(|_| format!("'{}' is not an integer", s))
    };
    let float = |s: &String| {
        s.parse::<f32>()
            .map_err(|_| format!("'{}' is not a number", s))
    };
    match current {
        CvarValue::Bool(_) => {
            need(1)?;
            match args[0].as_str() {
                "1" | "true" => Ok(CvarValue::Bool(true)),
                "0" | "false" => Ok(CvarValue::Bool(false)),
                other => Err(format!("'{}' is not a boolean", other)),
            }
        }
        CvarValue::Int(_) => {
            need(1)?;
            let mut v = int(&args[0])?;
            if let Some((min, max)) = range {
                v = v.clamp(min as i32, max as i32);
            }
            Ok(CvarValue::Int(v))
        }
        CvarValue::Float(_) => {
            need(1)?;
            let mut v = float(&args[0])?;
            if let Some((min, max)) = range {
                v = v.clamp(min, max);
            }
            Ok(CvarValue::Float(v))
        }
        CvarValue::Vec2i(..) => {
            need(2)?;
            Ok(CvarValue::Vec2i(int(&args[0])?, int(&args[1])?))
        }
        CvarValue::Vec2f(..) => {
            need(2)?;
            Ok(CvarValue::Vec2f(float(&args[0])?, float(&args[1])?))
        }
        CvarValue::Vec3i(..) => {
            need(3)?;
            Ok(CvarValue::Vec3i(
                int(&args[0])?,
                int(&args[1])?,
                int(&args[2])?,
            ))
        }
        CvarValue::Vec3f(..) => {
            need(3)?;
            Ok(CvarValue::Vec3f(
                float(&args[0])?,
                float(&args[1])?,
                float(&args[2])?,
            ))
        }
        CvarValue::Vec4f(..) => {
            need(4)?;
            Ok(CvarValue::Vec4f(
                float(&args[0])?,
                float(&args[1])?,
                float(&args[2])?,
                float(&args[3])?,
            ))
        }
        CvarValue::Str(_) => {
            if args.is_empty() {
                return Err("expected a string argument".into());
            }
            Ok(CvarValue::Str(args.join(" ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CvarRegistry {
        let mut reg = CvarRegistry::new();
        reg.register("cl_particles", CvarValue::Bool(true), true);
        reg.register_ranged("r_maxfps", CvarValue::Int(60), 30.0, 240.0, true);
        reg.register_ranged("s_volume", CvarValue::Float(0.8), 0.0, 1.0, true);
        reg.register("r_clearcolor", CvarValue::Vec4f(0.0, 0.0, 0.0, 1.0), true);
        reg.register("cl_name", CvarValue::Str("player".into()), true);
        reg.register("r_gldriver", CvarValue::Str("default".into()), false);
        reg.register_server("sv_hostname", CvarValue::Str("dusk".into()));
        reg
    }

    #[test]
    fn set_updates_typed_values() {
        let mut reg = registry();
        assert_eq!(reg.command("set cl_particles 0"), CmdOutcome::Ok);
        assert_eq!(reg.bool_of("cl_particles"), Some(false));
        assert_eq!(reg.command("set r_maxfps 120"), CmdOutcome::Ok);
        assert_eq!(reg.int_of("r_maxfps"), Some(120));
        assert_eq!(
            reg.command("set r_clearcolor 0.1 0.2 0.3 1"),
            CmdOutcome::Ok
        );
        assert_eq!(reg.vec4_of("r_clearcolor"), Some((0.1, 0.2, 0.3, 1.0)));
    }

    #[test]
    fn integer_vectors_parse_and_format() {
        let mut reg = registry();
        reg.register("r_windowpos", CvarValue::Vec3i(0, 0, 0), true);
        assert_eq!(reg.command("set r_windowpos 640 480 1"), CmdOutcome::Ok);
        assert_eq!(reg.get("r_windowpos"), Some(&CvarValue::Vec3i(640, 480, 1)));
        assert_eq!(
            reg.format_var("r_windowpos"),
            Some("r_windowpos 640 480 1".into())
        );
        // Wrong arity is refused.
        assert!(matches!(
            reg.command("set r_windowpos 640 480"),
            CmdOutcome::InvalidArgs(_)
        ));
    }

    #[test]
    fn numeric_values_clamp_to_range() {
        let mut reg = registry();
        reg.command("set r_maxfps 10000");
        assert_eq!(reg.int_of("r_maxfps"), Some(240));
        reg.command("set s_volume -3");
        assert_eq!(reg.float_of("s_volume"), Some(0.0));
    }

    #[test]
    fn quoted_strings_keep_spaces() {
        let mut reg = registry();
        assert_eq!(reg.command("set cl_name \"jane doe\""), CmdOutcome::Ok);
        assert_eq!(reg.str_of("cl_name"), Some("jane doe"));
    }

    #[test]
    fn bad_lines_report_outcomes() {
        let mut reg = registry();
        assert!(matches!(
            reg.command("frobnicate x"),
            CmdOutcome::UnknownCommand(_)
        ));
        assert!(matches!(
            reg.command("set nosuchvar 1"),
            CmdOutcome::UnknownVariable(_)
        ));
        assert!(matches!(
            reg.command("set r_maxfps notanumber"),
            CmdOutcome::InvalidArgs(_)
        ));
        assert!(matches!(
            reg.command("set r_maxfps 1 2"),
            CmdOutcome::InvalidArgs(_)
        ));
        assert!(matches!(
            reg.command("set r_gldriver other"),
            CmdOutcome::NotWritable(_)
        ));
        assert!(matches!(reg.command("set"), CmdOutcome::InvalidArgs(_)));
    }

    #[test]
    fn comments_and_blanks_are_noops() {
        let mut reg = registry();
        assert_eq!(reg.command(""), CmdOutcome::Ok);
        assert_eq!(reg.command("   "), CmdOutcome::Ok);
        assert_eq!(reg.command("// set cl_particles 0"), CmdOutcome::Ok);
        assert_eq!(reg.bool_of("cl_particles"), Some(true));
    }

    #[test]
    fn unregistered_vars_stop_responding() {
        let mut reg = registry();
        assert!(reg.unregister("cl_particles"));
        assert!(!reg.unregister("cl_particles"));
        assert!(matches!(
            reg.command("set cl_particles 0"),
            CmdOutcome::UnknownVariable(_)
        ));
    }

    #[test]
    fn prefix_listing_is_sorted() {
        let reg = registry();
        assert_eq!(
            reg.vars_with_prefix("r_"),
            vec![
                "r_clearcolor".to_string(),
                "r_gldriver".to_string(),
                "r_maxfps".to_string()
            ]
        );
        assert!(reg.vars_with_prefix("zz_").is_empty());
    }

    #[test]
    fn format_var_shows_name_and_value() {
        let reg = registry();
        assert_eq!(
            reg.format_var("r_maxfps").as_deref(),
            Some("r_maxfps 60")
        );
        assert_eq!(
            reg.format_var("cl_name").as_deref(),
            Some("cl_name \"player\"")
        );
        assert!(reg.format_var("nosuchvar").is_none());
    }

    #[test]
    fn config_round_trip_through_file() {
        let mut reg = registry();
        reg.command("set r_maxfps 144");
        reg.command("set cl_name \"round trip\"");
        let dir = std::env::temp_dir().join("duskengine-cvar-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("autoexec.cfg");
        reg.save_config(&path).unwrap();

        let mut fresh = registry();
        fresh.exec_config(&path).unwrap();
        assert_eq!(fresh.int_of("r_maxfps"), Some(144));
        assert_eq!(fresh.str_of("cl_name"), Some("round trip"));
        // Non-writable vars are never saved.
        assert_eq!(fresh.str_of("r_gldriver"), Some("default"));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn server_only_pass_skips_client_vars() {
        let dir = std::env::temp_dir().join("duskengine-cvar-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("server.cfg");
        fs::write(&path, "set sv_hostname arena\nset r_maxfps 144\n").unwrap();

        let mut reg = registry();
        reg.exec_config_server_only(&path).unwrap();
        assert_eq!(reg.str_of("sv_hostname"), Some("arena"));
        assert_eq!(reg.int_of("r_maxfps"), Some(60));
        fs::remove_file(&path).ok();
    }
}
