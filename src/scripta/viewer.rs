use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Program and leading arguments used to open a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opener {
    pub program: PathBuf,
    pub args: Vec<String>,
}

const MACOS_OPENER: (&str, &[&str]) = ("open", &[]);
const WINDOWS_OPENER: (&str, &[&str]) = ("cmd", &["/C", "start", ""]);
const XDG_OPENER: (&str, &[&str]) = ("xdg-open", &[]);

fn platform_default() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        MACOS_OPENER
    } else if cfg!(windows) {
        WINDOWS_OPENER
    } else {
        XDG_OPENER
    }
}

/// `SCRIPTA_OPENER` wins; otherwise the platform handler, located on PATH.
pub fn resolve_opener() -> Result<Opener> {
    if let Ok(custom) = env::var("SCRIPTA_OPENER") {
        let mut parts = custom.split_whitespace();
        if let Some(program) = parts.next() {
            return Ok(Opener {
                program: which::which(program)
                    .with_context(|| format!("SCRIPTA_OPENER program `{program}` not found"))?,
                args: parts.map(str::to_string).collect(),
            });
        }
    }

    let (program, args) = platform_default();
    let program = which::which(program)
        .with_context(|| format!("document opener `{program}` not found on PATH"))?;
    Ok(Opener {
        program,
        args: args.iter().map(|a| a.to_string()).collect(),
    })
}

/// Hands `path` to the opener. The opener's exit status is not inspected.
pub fn open_document(opener: &Opener, path: &Path) -> Result<()> {
    Command::new(&opener.program)
        .args(&opener.args)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| {
            format!(
                "failed to launch {} for {}",
                opener.program.display(),
                path.display()
            )
        })?;
    Ok(())
}
