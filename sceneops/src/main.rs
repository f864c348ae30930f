//! Command-line client for a running scene editor's skill server.
//!
//! Every command that talks to the editor probes availability first; an
//! unreachable server exits with `UNAVAILABLE` before any skill call.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;

use sceneops::core::node_ref::NodeRef;
use sceneops::core::types::{Condition, MaterialAsset, Rgba, SweepCandidate};
use sceneops::exit_codes;
use sceneops::io::config::{ClientConfig, DEFAULT_CONFIG_PATH, load_config, write_config};
use sceneops::io::transport::{HttpSkillClient, SkillClient};
use sceneops::logging;
use sceneops::material::{ChainReport, MaterialPlan};
use sceneops::scene::ObjectSpec;
use sceneops::session::{Session, Unavailable};
use sceneops::sweep::{CleanupInterrupted, CleanupReport};

#[derive(Parser)]
#[command(
    name = "sceneops",
    version,
    about = "Reconciling client for a remote scene editor's skill API"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Print reports as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default config file if missing.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Check whether the skill server is reachable.
    Probe,
    /// Delete every object with the given exact names (default: configured catalog).
    Sweep {
        /// Exact object name to drain (repeatable).
        #[arg(long = "name")]
        names: Vec<String>,
        /// Maximum deletions per name (default: `sweep.max_attempts`).
        #[arg(long)]
        max_attempts: Option<u32>,
    },
    /// Create objects (duplicates share the name).
    Spawn {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "Cube")]
        primitive: String,
        /// Position as `x,y,z`.
        #[arg(long, value_parser = parse_position, default_value = "0,0,0")]
        at: [f32; 3],
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Create a material, assign it to nodes, and optionally set its color.
    Material {
        /// Logical material name.
        #[arg(long)]
        name: String,
        /// Asset-database path, e.g. `Assets/Materials/M.mat`.
        #[arg(long)]
        save_path: String,
        /// Assign to the node with this exact name (repeatable).
        #[arg(long = "node")]
        nodes: Vec<String>,
        /// Assign to the node at this `/`-separated path (repeatable).
        #[arg(long = "node-path")]
        node_paths: Vec<String>,
        /// Color as `r,g,b` or `r,g,b,a` in `0..=1`.
        #[arg(long, value_parser = Rgba::parse)]
        color: Option<Rgba>,
        /// Color property to set; omit to try every configured name.
        #[arg(long)]
        property: Option<String>,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            if err.downcast_ref::<Unavailable>().is_some() {
                std::process::exit(exit_codes::UNAVAILABLE);
            }
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::InitConfig { force } => cmd_init_config(&cli.config, force),
        Command::Probe => {
            let (_, client) = open(&cli.config)?;
            cmd_probe(&client)
        }
        Command::Sweep {
            names,
            max_attempts,
        } => {
            let (cfg, client) = open(&cli.config)?;
            let session = Session::connect(client, &cfg)?;
            let catalog = sweep_catalog(&cfg, names, max_attempts)?;
            let report = match session.cleanup(&catalog) {
                Ok(report) => report,
                Err(err) => {
                    if let Some(interrupted) = err.downcast_ref::<CleanupInterrupted>() {
                        print_cleanup(&interrupted.completed, cli.json)?;
                    }
                    return Err(err);
                }
            };
            print_cleanup(&report, cli.json)?;
            Ok(exit_code(&report.conditions()))
        }
        Command::Spawn {
            name,
            primitive,
            at,
            count,
        } => {
            let (cfg, client) = open(&cli.config)?;
            let session = Session::connect(client, &cfg)?;
            let spec = ObjectSpec {
                name,
                primitive: Some(primitive),
                position: at,
            };
            let created = session.spawn(&spec, count)?;
            println!("created {created}/{count} '{}'", spec.name);
            Ok(if created == count {
                exit_codes::OK
            } else {
                exit_codes::PARTIAL
            })
        }
        Command::Material {
            name,
            save_path,
            nodes,
            node_paths,
            color,
            property,
        } => {
            let assignees: Vec<NodeRef> = nodes
                .into_iter()
                .map(NodeRef::Name)
                .chain(node_paths.iter().map(|raw| NodeRef::parse_path(raw)))
                .collect();
            if assignees.is_empty() && color.is_some() {
                bail!("--color needs at least one --node or --node-path to reach the material");
            }
            let (cfg, client) = open(&cli.config)?;
            let session = Session::connect(client, &cfg)?;
            let plan = MaterialPlan {
                asset: MaterialAsset::new(name, save_path),
                assignees,
                color,
                property,
            };
            let report = session.run_material_chain(&plan)?;
            print_chain(&report, cli.json)?;
            Ok(exit_code(&report.conditions))
        }
    }
}

fn open(config_path: &Path) -> Result<(ClientConfig, HttpSkillClient)> {
    let cfg = load_config(config_path)?;
    let client = HttpSkillClient::from_config(&cfg)?;
    Ok((cfg, client))
}

fn cmd_init_config(path: &Path, force: bool) -> Result<i32> {
    if !force && path.exists() {
        println!("{} already exists (use --force to overwrite)", path.display());
        return Ok(exit_codes::OK);
    }
    write_config(path, &ClientConfig::default())
        .with_context(|| format!("write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_probe<C: SkillClient>(client: &C) -> Result<i32> {
    if client.probe_availability() {
        println!("available: {}", client.endpoint());
        Ok(exit_codes::OK)
    } else {
        println!("unavailable: {}", client.endpoint());
        Ok(exit_codes::UNAVAILABLE)
    }
}

fn sweep_catalog(
    cfg: &ClientConfig,
    names: Vec<String>,
    max_attempts: Option<u32>,
) -> Result<Vec<SweepCandidate>> {
    let bound = max_attempts.unwrap_or(cfg.sweep.max_attempts);
    if bound == 0 {
        bail!("--max-attempts must be > 0");
    }
    if names.is_empty() {
        let mut catalog = cfg.sweep_catalog();
        for candidate in &mut catalog {
            candidate.max_attempts = bound;
        }
        return Ok(catalog);
    }
    if let Some(blank) = names.iter().find(|name| name.trim().is_empty()) {
        bail!("--name must be non-empty (got {blank:?})");
    }
    Ok(names
        .into_iter()
        .map(|name| SweepCandidate::new(name, bound))
        .collect())
}

fn exit_code(conditions: &[Condition]) -> i32 {
    if conditions.is_empty() {
        exit_codes::OK
    } else {
        exit_codes::PARTIAL
    }
}

fn print_cleanup(report: &CleanupReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }
    for entry in &report.reports {
        let marker = if entry.aborted() {
            " (aborted: bound reached)"
        } else {
            ""
        };
        println!(
            "{}: deleted {} in {} calls{}",
            entry.name, entry.attempts_used, entry.calls, marker
        );
    }
    println!("total deleted: {}", report.deleted());
    Ok(())
}

fn print_chain(report: &ChainReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }
    println!("{}: {:?}", report.save_path, report.state);
    for step in &report.steps {
        let property = step
            .property
            .as_deref()
            .map(|p| format!(" [{p}]"))
            .unwrap_or_default();
        println!(
            "  {} {}{}: {:?}",
            step.skill, step.target, property, step.status
        );
    }
    for condition in &report.conditions {
        println!("  ! {condition}");
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut payload = serde_json::to_string_pretty(value).context("serialize report")?;
    payload.push('\n');
    print!("{payload}");
    Ok(())
}

fn parse_position(raw: &str) -> std::result::Result<[f32; 3], String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [x, y, z] = *parts.as_slice() else {
        return Err(format!("expected x,y,z, got '{raw}'"));
    };
    let parse = |part: &str| {
        part.parse::<f32>()
            .map_err(|err| format!("invalid coordinate '{part}': {err}"))
    };
    Ok([parse(x)?, parse(y)?, parse(z)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sweep_with_names() {
        let cli = Cli::parse_from([
            "sceneops",
            "sweep",
            "--name",
            "Ghost",
            "--name",
            "MyCube",
            "--max-attempts",
            "5",
        ]);
        match cli.command {
            Command::Sweep {
                names,
                max_attempts,
            } => {
                assert_eq!(names, vec!["Ghost", "MyCube"]);
                assert_eq!(max_attempts, Some(5));
            }
            _ => panic!("expected sweep"),
        }
    }

    #[test]
    fn parse_material_with_color() {
        let cli = Cli::parse_from([
            "sceneops",
            "material",
            "--name",
            "M",
            "--save-path",
            "Assets/M.mat",
            "--node",
            "Cube1",
            "--node-path",
            "Cube1/ChildCube",
            "--color",
            "1,0,0",
            "--property",
            "_BaseColor",
        ]);
        match cli.command {
            Command::Material {
                nodes,
                node_paths,
                color,
                property,
                ..
            } => {
                assert_eq!(nodes, vec!["Cube1"]);
                assert_eq!(node_paths, vec!["Cube1/ChildCube"]);
                assert_eq!(color, Some(Rgba::RED));
                assert_eq!(property.as_deref(), Some("_BaseColor"));
            }
            _ => panic!("expected material"),
        }
    }

    #[test]
    fn parse_global_config_after_subcommand() {
        let cli = Cli::parse_from(["sceneops", "probe", "--config", "other.toml", "--json"]);
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(cli.json);
    }

    #[test]
    fn sweep_catalog_defaults_to_config() {
        let cfg = ClientConfig::default();
        let catalog = sweep_catalog(&cfg, Vec::new(), None).expect("catalog");
        assert_eq!(catalog.len(), cfg.sweep.candidates.len());
        assert!(catalog.iter().all(|c| c.max_attempts == 20));
    }

    #[test]
    fn sweep_catalog_rejects_zero_bound_and_blank_names() {
        let cfg = ClientConfig::default();
        assert!(sweep_catalog(&cfg, vec!["A".to_string()], Some(0)).is_err());
        assert!(sweep_catalog(&cfg, vec![" ".to_string()], None).is_err());
    }

    #[test]
    fn parse_position_requires_three_numbers() {
        assert_eq!(parse_position("1, 2.5, -3"), Ok([1.0, 2.5, -3.0]));
        assert!(parse_position("1,2").is_err());
        assert!(parse_position("a,b,c").is_err());
    }

    #[test]
    fn exit_code_reflects_conditions() {
        assert_eq!(exit_code(&[]), exit_codes::OK);
        assert_eq!(
            exit_code(&[Condition::SweepAborted {
                name: "A".to_string(),
                max_attempts: 1
            }]),
            exit_codes::PARTIAL
        );
    }
}
