// ─── Command Builder ───
// Assembles the java invocation as an ordered token list:
// executable, JVM args, natives property, -cp pair, main class, game args.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::classpath::{join_classpath, safe_path_str};

#[derive(Debug, Clone)]
pub struct CommandBuilder {
    java: PathBuf,
    main_class: String,
    jvm_args: Vec<String>,
    natives_dir: Option<PathBuf>,
    classpath: Option<String>,
    game_args: Vec<String>,
}

impl CommandBuilder {
    pub fn new(java: impl Into<PathBuf>, main_class: impl Into<String>) -> Self {
        Self {
            java: java.into(),
            main_class: main_class.into(),
            jvm_args: Vec::new(),
            natives_dir: None,
            classpath: None,
            game_args: Vec::new(),
        }
    }

    pub fn jvm_arg(mut self, arg: impl Into<String>) -> Self {
        self.jvm_args.push(arg.into());
        self
    }

    pub fn jvm_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.jvm_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds `-Djava.library.path=<dir>` after the JVM args.
    pub fn natives_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.natives_dir = Some(dir.into());
        self
    }

    /// An empty entry list adds no `-cp` pair.
    pub fn classpath(mut self, entries: &[PathBuf], separator: &str) -> Self {
        self.classpath = if entries.is_empty() {
            None
        } else {
            Some(join_classpath(entries, separator))
        };
        self
    }

    pub fn game_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.game_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> CommandDescription {
        let mut tokens = Vec::with_capacity(4 + self.jvm_args.len() + self.game_args.len());
        tokens.push(self.java.to_string_lossy().into_owned());
        tokens.extend(self.jvm_args);
        if let Some(dir) = &self.natives_dir {
            tokens.push(format!("-Djava.library.path={}", safe_path_str(dir)));
        }
        if let Some(classpath) = self.classpath {
            tokens.push("-cp".into());
            tokens.push(classpath);
        }
        tokens.push(self.main_class);
        tokens.extend(self.game_args);

        CommandDescription {
            tokens,
            natives_dir: self.natives_dir,
        }
    }
}

/// A finished invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDescription {
    tokens: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    natives_dir: Option<PathBuf>,
}

impl CommandDescription {
    /// The whole invocation, executable first.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    pub fn natives_dir(&self) -> Option<&Path> {
        self.natives_dir.as_deref()
    }

    /// Shell-like rendering for logs; not meant to be re-parsed.
    pub fn display_line(&self) -> String {
        self.tokens
            .iter()
            .map(|t| shell_escape(t))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}

// ─── Loader argument substitution ───

/// Substitute `${name}` placeholders in loader-declared JVM args.
///
/// Loader `-cp`/`-classpath` pairs are dropped since the classpath is always
/// supplied by the builder.
pub fn sanitize_jvm_args(raw: &[String], values: &[(&str, String)]) -> Vec<String> {
    let mut sanitized = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        let arg = &raw[i];
        if arg == "-cp" || arg == "-classpath" || arg == "--class-path" {
            i += 2;
            continue;
        }
        push_resolved(&mut sanitized, arg, values);
        i += 1;
    }
    sanitized
}

/// Substitute `${name}` placeholders in loader-declared game args.
pub fn sanitize_game_args(raw: &[String], values: &[(&str, String)]) -> Vec<String> {
    let mut sanitized = Vec::new();
    for arg in raw {
        push_resolved(&mut sanitized, arg, values);
    }
    sanitized
}

/// An argument with a placeholder we cannot fill is dropped. When it is a
/// bare value, the option flag right before it goes too; an inline option
/// such as `-Dx=${y}` only drops itself.
fn push_resolved(out: &mut Vec<String>, arg: &str, values: &[(&str, String)]) {
    let mut resolved = arg.to_string();
    for (name, value) in values {
        resolved = resolved.replace(&format!("${{{name}}}"), value);
    }

    if resolved.contains("${") {
        if !resolved.starts_with('-') {
            drop_dangling_option(out);
        }
        return;
    }
    out.push(resolved);
}

fn drop_dangling_option(args: &mut Vec<String>) {
    if args.last().is_some_and(|last| last.starts_with('-')) {
        let _ = args.pop();
    }
}
