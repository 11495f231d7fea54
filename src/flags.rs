//! Flag files: plain text files of command-line flags.
//!
//! Any argument of the form `@path` is replaced in place by the flags read
//! from `path`, so `lipread @configs/base.txt @configs/small.txt transcribe`
//! behaves as if the contents of both files had been typed at that position.
//! Later occurrences of a flag override earlier ones, both across files and
//! against flags given directly on the command line.
//!
//! File format:
//! - one flag per line, optionally followed by its value (`--hidden-size 256`
//!   or `--hidden-size=256`); the value is the rest of the line
//! - blank lines and lines starting with `#` are ignored
//! - a line holding `@other.txt` includes another flag file, resolved
//!   relative to the including file

use crate::error::{LipreadError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Prefix marking an argument as a flag file reference.
pub const FLAG_FILE_PREFIX: char = '@';

/// Expand every `@path` argument into the flags it contains.
///
/// Arguments after a bare `--` are passed through untouched.
pub fn expand_args<I, S>(args: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut expanded = Vec::new();
    let mut passthrough = false;

    for arg in args {
        let arg = arg.into();
        if passthrough {
            expanded.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            expanded.push(arg);
            continue;
        }
        match arg.strip_prefix(FLAG_FILE_PREFIX) {
            Some(path) if !path.is_empty() => {
                let mut stack = Vec::new();
                expand_file(Path::new(path), &mut stack, &mut expanded)?;
            }
            _ => expanded.push(arg),
        }
    }

    Ok(expanded)
}

/// Read one flag file, appending its flags to `out`.
///
/// `stack` holds the files currently being expanded, for cycle detection.
fn expand_file(path: &Path, stack: &mut Vec<PathBuf>, out: &mut Vec<String>) -> Result<()> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LipreadError::FlagFileNotFound {
                path: path.display().to_string(),
            }
        } else {
            LipreadError::Io(e)
        }
    })?;

    let identity = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if stack.contains(&identity) {
        return Err(LipreadError::FlagFileCycle {
            path: path.display().to_string(),
        });
    }
    stack.push(identity);
    tracing::debug!(path = %path.display(), "expanding flag file");

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(include) = line.strip_prefix(FLAG_FILE_PREFIX) {
            expand_file(&base.join(include.trim()), stack, out)?;
            continue;
        }
        out.extend(split_line(line));
    }

    stack.pop();
    Ok(())
}

/// Split a flag line into the flag and its (possibly space-containing) value.
fn split_line(line: &str) -> Vec<String> {
    if !line.starts_with('-') || (line.contains('=') && !line.contains(char::is_whitespace)) {
        return vec![line.to_string()];
    }
    match line.split_once(char::is_whitespace) {
        Some((flag, value)) => vec![flag.to_string(), value.trim().to_string()],
        None => vec![line.to_string()],
    }
}

/// Effective flag values after left-to-right overriding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagSet {
    values: BTreeMap<String, Option<String>>,
}

impl FlagSet {
    /// Value of `--name`, if the flag was given with a value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name.trim_start_matches('-'))
            .and_then(|v| v.as_deref())
    }

    /// Whether `--name` appeared at all.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name.trim_start_matches('-'))
    }

    /// Iterate `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolve every `--flag` in `args` to its last occurrence.
///
/// A flag takes a value either inline (`--flag=value`) or from the next
/// argument when that argument does not itself look like a flag.
/// Positional arguments are ignored.
pub fn effective_flags(args: &[String]) -> FlagSet {
    let mut values = BTreeMap::new();
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if arg == "--" {
            break;
        }
        if let Some(body) = arg.strip_prefix("--")
            && !body.is_empty()
        {
            if let Some((name, value)) = body.split_once('=') {
                values.insert(name.to_string(), Some(value.to_string()));
            } else if let Some(next) = args.get(i + 1).filter(|n| !is_flag(n)) {
                values.insert(body.to_string(), Some(next.clone()));
                i += 1;
            } else {
                values.insert(body.to_string(), None);
            }
        }
        i += 1;
    }
    FlagSet { values }
}

fn is_flag(arg: &str) -> bool {
    arg.starts_with('-') && arg.len() > 1 && arg.parse::<f64>().is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plain_args_pass_through() {
        let args = expand_args(["lipread", "transcribe", "--beam-width", "4"]).unwrap();
        assert_eq!(args, strings(&["lipread", "transcribe", "--beam-width", "4"]));
    }

    #[test]
    fn flag_file_expands_in_place() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "base.txt", "--hidden-size 128\n--bidirectional\n");
        let args = expand_args([
            "lipread".to_string(),
            format!("@{}", path.display()),
            "transcribe".to_string(),
        ])
        .unwrap();
        assert_eq!(
            args,
            strings(&["lipread", "--hidden-size", "128", "--bidirectional", "transcribe"])
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "c.txt", "# model\n\n   \n--rnn-type gru\n  # trailing\n");
        let args = expand_args([format!("@{}", path.display())]).unwrap();
        assert_eq!(args, strings(&["--rnn-type", "gru"]));
    }

    #[test]
    fn inline_equals_stays_one_token() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "c.txt", "--decoder=ctc-beam\n");
        let args = expand_args([format!("@{}", path.display())]).unwrap();
        assert_eq!(args, strings(&["--decoder=ctc-beam"]));
    }

    #[test]
    fn value_keeps_inner_spaces() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "c.txt", "--transcript  bin blue at f two now\n");
        let args = expand_args([format!("@{}", path.display())]).unwrap();
        assert_eq!(args, strings(&["--transcript", "bin blue at f two now"]));
    }

    #[test]
    fn nested_include_resolves_relative_to_file() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "base.txt", "--hidden-size 64\n");
        let top = write_file(&dir, "top.txt", "@base.txt\n--hidden-size 256\n");
        let args = expand_args([format!("@{}", top.display())]).unwrap();
        assert_eq!(
            args,
            strings(&["--hidden-size", "64", "--hidden-size", "256"])
        );
    }

    #[test]
    fn include_cycle_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.txt", "@b.txt\n");
        write_file(&dir, "b.txt", "@a.txt\n");
        let result = expand_args([format!("@{}", dir.path().join("a.txt").display())]);
        assert!(matches!(result, Err(LipreadError::FlagFileCycle { .. })));
    }

    #[test]
    fn same_file_twice_is_not_a_cycle() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.txt", "--fps 25\n");
        let arg = format!("@{}", path.display());
        let args = expand_args([arg.clone(), arg]).unwrap();
        assert_eq!(args, strings(&["--fps", "25", "--fps", "25"]));
    }

    #[test]
    fn missing_flag_file_is_reported() {
        let result = expand_args(["@/nonexistent/lipread/flags.txt"]);
        match result {
            Err(LipreadError::FlagFileNotFound { path }) => {
                assert!(path.contains("flags.txt"));
            }
            other => panic!("expected FlagFileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn arguments_after_double_dash_are_untouched() {
        let args = expand_args(["--", "@not-a-file"]).unwrap();
        assert_eq!(args, strings(&["--", "@not-a-file"]));
    }

    #[test]
    fn last_occurrence_wins() {
        let args = strings(&[
            "--hidden-size",
            "64",
            "--decoder",
            "ctc-greedy",
            "--hidden-size",
            "256",
        ]);
        let flags = effective_flags(&args);
        assert_eq!(flags.get("hidden-size"), Some("256"));
        assert_eq!(flags.get("--decoder"), Some("ctc-greedy"));
        assert_eq!(flags.len(), 2);
    }

    #[test]
    fn last_occurrence_wins_across_concatenated_files() {
        let dir = TempDir::new().unwrap();
        let base = write_file(&dir, "base.txt", "--hidden-size 64\n--fps 25\n");
        let small = write_file(&dir, "small.txt", "--hidden-size 128\n");
        let args = expand_args([
            format!("@{}", base.display()),
            format!("@{}", small.display()),
            "--fps=30".to_string(),
        ])
        .unwrap();
        let flags = effective_flags(&args);
        assert_eq!(flags.get("hidden-size"), Some("128"));
        assert_eq!(flags.get("fps"), Some("30"));
    }

    #[test]
    fn switches_have_no_value() {
        let flags = effective_flags(&strings(&["--bidirectional", "--hidden-size", "8"]));
        assert!(flags.contains("bidirectional"));
        assert_eq!(flags.get("bidirectional"), None);
        assert_eq!(flags.get("hidden-size"), Some("8"));
    }

    #[test]
    fn negative_numbers_are_values() {
        let flags = effective_flags(&strings(&["--offset", "-3"]));
        assert_eq!(flags.get("offset"), Some("-3"));
    }
}
