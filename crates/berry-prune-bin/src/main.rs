use berry_lockfile::{BerryLockfile, Entry, transitive_closure};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use miette::{IntoDiagnostic, Result, WrapErr, bail};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};

mod logging;

#[derive(Parser, Debug)]
#[command(name = "berry-prune")]
#[command(about = "Decode, query and prune Yarn Berry lockfiles")]
struct Cli {
  /// Log at debug level unless a log filter is given
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Log filter, e.g. `berry_lockfile=trace`. Falls back to RUST_LOG
  #[arg(long, global = true, env = logging::LOG_ENV, value_name = "FILTER")]
  log: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Decode a lockfile and dump its entries
  Dump {
    /// Path to a lockfile to decode
    #[arg(value_name = "LOCKFILE")]
    lockfile: Option<PathBuf>,

    /// Use a bundled fixture name instead of a path (reads from repo fixtures/)
    #[arg(short, long, value_name = "NAME", conflicts_with = "lockfile")]
    fixture: Option<String>,

    /// Print JSON instead of the Rust structs
    #[arg(long)]
    json: bool,
  },

  /// Resolve a dependency to its lockfile key
  Resolve {
    #[arg(value_name = "LOCKFILE")]
    lockfile: PathBuf,

    /// Package name, e.g. `@babel/core`
    name: String,

    /// The range as written in a package.json, e.g. `^7.0.0`
    specifier: String,
  },

  /// Cut a lockfile down to what the given workspaces need
  Prune {
    #[arg(value_name = "LOCKFILE")]
    lockfile: PathBuf,

    /// Workspace to keep, may be given more than once
    #[arg(short, long = "workspace", value_name = "NAME", required = true)]
    workspaces: Vec<String>,

    /// Write the pruned lockfile here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Don't keep the root workspace and its dependencies
    #[arg(long)]
    no_root: bool,
  },
}

fn decode_path(path: &Path) -> Result<BerryLockfile> {
  let contents = fs::read(path)
    .into_diagnostic()
    .wrap_err_with(|| format!("failed to read {}", path.display()))?;
  let lockfile = BerryLockfile::decode(&contents)
    .wrap_err_with(|| format!("failed to decode {}", path.display()))?;
  debug!(path = %path.display(), keys = lockfile.len(), "decoded lockfile");
  Ok(lockfile)
}

fn dump(lockfile: Option<PathBuf>, fixture: Option<String>, json: bool) -> Result<()> {
  let path = match (fixture, lockfile) {
    (Some(fixture), _) => berry_lockfile_test::fixtures_dir().join(fixture),
    (None, Some(path)) => path,
    (None, None) => bail!("Provide a lockfile path or --fixture <name>"),
  };
  let lockfile = decode_path(&path)?;

  let mut stdout = io::stdout().lock();
  if json {
    let entries: IndexMap<&str, &Entry> = lockfile
      .entries()
      .map(|(key, entry)| (key, entry.as_ref()))
      .collect();
    let document = serde_json::json!({
      "metadata": {
        "version": lockfile.metadata().version,
        "cacheKey": lockfile.metadata().cache_key,
      },
      "entries": entries,
    });
    serde_json::to_writer_pretty(&mut stdout, &document).into_diagnostic()?;
    writeln!(stdout).into_diagnostic()?;
  } else {
    writeln!(stdout, "metadata: {:#?}", lockfile.metadata()).into_diagnostic()?;
    writeln!(stdout, "entries: {}", lockfile.len()).into_diagnostic()?;
    for (key, entry) in lockfile.entries() {
      writeln!(stdout, "{key}: {entry:#?}").into_diagnostic()?;
    }
  }
  Ok(())
}

fn resolve(lockfile: &Path, name: &str, specifier: &str) -> Result<ExitCode> {
  let lockfile = decode_path(lockfile)?;
  match lockfile.resolve_package(name, specifier) {
    Some(resolved) => {
      println!("{} -> {}", resolved.key, resolved.version);
      Ok(ExitCode::SUCCESS)
    }
    None => {
      eprintln!("{name}@{specifier} is not in the lockfile");
      Ok(ExitCode::FAILURE)
    }
  }
}

fn prune(
  lockfile: &Path,
  workspaces: &[String],
  output: Option<&Path>,
  no_root: bool,
) -> Result<()> {
  let lockfile = decode_path(lockfile)?;

  let mut roots = Vec::with_capacity(workspaces.len() + 1);
  if !no_root {
    match lockfile.root_workspace_key() {
      Some(key) => roots.push(key),
      None => warn!("lockfile has no root workspace"),
    }
  }
  for name in workspaces {
    let Some(key) = lockfile.workspace_key(name) else {
      bail!("workspace `{name}` is not in the lockfile");
    };
    roots.push(key);
  }

  let reachable = transitive_closure(&lockfile, roots);
  let keys: Vec<String> = lockfile
    .expand_aliases(reachable.iter().map(String::as_str))
    .into_iter()
    .collect();
  let pruned = lockfile.subgraph(&keys);
  info!(
    kept = pruned.len(),
    dropped = lockfile.len() - pruned.len(),
    "pruned lockfile"
  );

  match output {
    Some(path) => write_output(&pruned, path),
    None => {
      let mut stdout = io::stdout().lock();
      pruned.encode(&mut stdout)?;
      Ok(())
    }
  }
}

fn write_output(lockfile: &BerryLockfile, path: &Path) -> Result<()> {
  let file = File::create(path)
    .into_diagnostic()
    .wrap_err_with(|| format!("failed to create {}", path.display()))?;
  let mut writer = BufWriter::new(file);

  if let Err(e) = lockfile.encode(&mut writer) {
    drop(writer);
    if let Err(remove) = fs::remove_file(path) {
      warn!(path = %path.display(), error = %remove, "failed to remove partial lockfile");
    }
    return Err(e).wrap_err_with(|| format!("failed to write {}", path.display()));
  }
  Ok(())
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();
  logging::init(cli.log.as_deref(), cli.verbose);

  match cli.command {
    Command::Dump {
      lockfile,
      fixture,
      json,
    } => dump(lockfile, fixture, json).map(|()| ExitCode::SUCCESS),
    Command::Resolve {
      lockfile,
      name,
      specifier,
    } => resolve(&lockfile, &name, &specifier),
    Command::Prune {
      lockfile,
      workspaces,
      output,
      no_root,
    } => prune(&lockfile, &workspaces, output.as_deref(), no_root).map(|()| ExitCode::SUCCESS),
  }
}
