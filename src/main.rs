//! ontograph CLI: manage an ontology stored in a local data directory.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use ontograph::config::OntologyConfig;
use ontograph::model::{Label, PropertyMap};
use ontograph::ontology::{ObjectDraft, ObjectPatch, Ontology, RelationAssignment};
use ontograph::store::DurableGraphStore;

const DEFAULT_DATA_DIR: &str = ".ontograph";
const CONFIG_FILE: &str = "ontograph.toml";

#[derive(Parser)]
#[command(name = "ontograph", version, about = "Property-graph ontology store")]
struct Cli {
    /// Path to a TOML config file. Defaults to `<data-dir>/ontograph.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for persistent storage.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new data directory and write its config file.
    Init {
        /// Namespace used in generated uris.
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Manage classes.
    Class {
        #[command(subcommand)]
        action: ClassAction,
    },

    /// Manage datatype and object properties.
    Attr {
        #[command(subcommand)]
        action: AttrAction,
    },

    /// Manage objects.
    Object {
        #[command(subcommand)]
        action: ObjectAction,
    },

    /// Dump every node and edge as JSON.
    Export,
}

#[derive(Subcommand)]
enum ClassAction {
    /// Create a class.
    Create {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Uri of the direct parent class.
        #[arg(long)]
        parent: Option<String>,
    },
    /// List all classes.
    List,
    /// Show a class with its parents, children, and direct instances.
    Show { uri: String },
    /// List classes without a parent.
    Roots,
    /// Delete a class, its subclasses, and all their instances.
    Delete {
        uri: String,
        /// Print what would be deleted without deleting it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Add or remove a direct SUBCLASSOF edge.
    Parent {
        /// Uri of the parent class.
        parent: String,
        /// Uri of the child class.
        child: String,
        #[arg(long)]
        remove: bool,
    },
    /// Print the resolved signature of a class.
    Signature { uri: String },
}

#[derive(Subcommand)]
enum AttrAction {
    /// Add a datatype property to a class.
    Add { class: String, title: String },
    /// Add an object property from a class to a range class.
    AddRelation {
        class: String,
        title: String,
        range: String,
    },
    /// Remove a datatype or object property.
    Remove { uri: String },
}

#[derive(Subcommand)]
enum ObjectAction {
    /// Create an instance of a class.
    Create {
        class: String,
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// JSON object keyed by datatype property uri.
        #[arg(long)]
        properties: Option<String>,
        /// JSON array of `{relation_uri, target_uri, direction}`.
        #[arg(long)]
        relations: Option<String>,
    },
    /// Show an object and its class.
    Show { uri: String },
    /// Update an object from a JSON patch.
    Update {
        uri: String,
        /// JSON object with optional `title`, `description`, `properties`, `relations`.
        patch: String,
    },
    /// Delete an object.
    Delete { uri: String },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    let cli = Cli::parse();
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let config = load_config(cli.config.as_deref(), &data_dir)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { namespace } => {
            let mut config = config;
            if let Some(namespace) = namespace {
                config.namespace = namespace;
            }
            let config_path = cli
                .config
                .unwrap_or_else(|| data_dir.join(CONFIG_FILE));
            config.save(&config_path).into_diagnostic()?;
            let onto = Ontology::open(config).into_diagnostic()?;
            println!("Initialized ontograph at {}", data_dir.display());
            println!("  config: {}", config_path.display());
            println!("  nodes:  {}", onto.store().memory().node_count());
            println!("  edges:  {}", onto.store().memory().edge_count());
        }

        Commands::Class { action } => {
            let onto = Ontology::open(config).into_diagnostic()?;
            run_class(&onto, action)?;
        }

        Commands::Attr { action } => {
            let onto = Ontology::open(config).into_diagnostic()?;
            run_attr(&onto, action)?;
        }

        Commands::Object { action } => {
            let onto = Ontology::open(config).into_diagnostic()?;
            run_object(&onto, action)?;
        }

        Commands::Export => {
            let onto = Ontology::open(config).into_diagnostic()?;
            print_json(&onto.graph_snapshot().into_diagnostic()?)?;
        }
    }

    Ok(())
}

/// Resolve the effective config: explicit file, else the data dir's file, else defaults.
fn load_config(explicit: Option<&Path>, data_dir: &Path) -> Result<OntologyConfig> {
    let implicit = data_dir.join(CONFIG_FILE);
    let mut config = match explicit {
        Some(path) => OntologyConfig::load(path).into_diagnostic()?,
        None if implicit.exists() => OntologyConfig::load(&implicit).into_diagnostic()?,
        None => OntologyConfig::default(),
    };
    config.data_dir = Some(data_dir.to_path_buf());
    Ok(config)
}

fn run_class(onto: &Ontology<DurableGraphStore>, action: ClassAction) -> Result<()> {
    match action {
        ClassAction::Create {
            title,
            description,
            parent,
        } => {
            let class = onto
                .create_class(&title, &description, parent.as_deref())
                .into_diagnostic()?;
            print_json(&class)?;
        }
        ClassAction::List => {
            for class in onto.classes().into_diagnostic()? {
                println!("{}  {}", class.uri, class.title());
            }
        }
        ClassAction::Show { uri } => {
            let Some(class) = onto.get_class(&uri).into_diagnostic()? else {
                miette::bail!("no class with uri {uri}");
            };
            let uris = |nodes: Vec<ontograph::model::Node>| -> Vec<String> {
                nodes.into_iter().map(|n| n.uri).collect()
            };
            print_json(&serde_json::json!({
                "class": class,
                "parents": uris(onto.parents(&uri).into_diagnostic()?),
                "children": uris(onto.children(&uri).into_diagnostic()?),
                "objects": uris(onto.class_objects(&uri).into_diagnostic()?),
            }))?;
        }
        ClassAction::Roots => {
            for class in onto.root_classes().into_diagnostic()? {
                println!("{}  {}", class.uri, class.title());
            }
        }
        ClassAction::Delete { uri, dry_run } => {
            if dry_run {
                match onto.plan_class_cascade(&uri).into_diagnostic()? {
                    Some(plan) => print_json(&plan)?,
                    None => println!("No class with uri {uri}"),
                }
            } else if onto.delete_class(&uri).into_diagnostic()? {
                println!("Deleted class {uri}");
            } else {
                println!("No class with uri {uri}");
            }
        }
        ClassAction::Parent {
            parent,
            child,
            remove,
        } => {
            if remove {
                let removed = onto.remove_class_parent(&parent, &child).into_diagnostic()?;
                println!("{}", if removed { "Removed" } else { "No such edge" });
            } else {
                onto.add_class_parent(&parent, &child).into_diagnostic()?;
                println!("{child} SUBCLASSOF {parent}");
            }
        }
        ClassAction::Signature { uri } => {
            print_json(&onto.resolve_signature(&uri).into_diagnostic()?)?;
        }
    }
    Ok(())
}

fn run_attr(onto: &Ontology<DurableGraphStore>, action: AttrAction) -> Result<()> {
    match action {
        AttrAction::Add { class, title } => {
            print_json(&onto.add_datatype_property(&class, &title).into_diagnostic()?)?;
        }
        AttrAction::AddRelation { class, title, range } => {
            print_json(
                &onto
                    .add_object_property(&class, &title, &range)
                    .into_diagnostic()?,
            )?;
        }
        AttrAction::Remove { uri } => {
            let property = onto.get_property(&uri).into_diagnostic()?;
            let removed = match property.label {
                Label::DatatypeProperty => onto.delete_datatype_property(&uri),
                _ => onto.delete_object_property(&uri),
            }
            .into_diagnostic()?;
            if removed {
                println!("Removed {} {uri}", property.label);
            }
        }
    }
    Ok(())
}

fn run_object(onto: &Ontology<DurableGraphStore>, action: ObjectAction) -> Result<()> {
    match action {
        ObjectAction::Create {
            class,
            title,
            description,
            properties,
            relations,
        } => {
            let properties: PropertyMap = match properties {
                Some(json) => serde_json::from_str(&json).into_diagnostic()?,
                None => PropertyMap::new(),
            };
            let relations: Vec<RelationAssignment> = match relations {
                Some(json) => serde_json::from_str(&json).into_diagnostic()?,
                None => Vec::new(),
            };
            let draft = ObjectDraft {
                title,
                description,
                properties,
                relations,
            };
            print_json(&onto.create_object(&class, draft).into_diagnostic()?)?;
        }
        ObjectAction::Show { uri } => {
            let Some(object) = onto.get_object(&uri).into_diagnostic()? else {
                miette::bail!("no object with uri {uri}");
            };
            let class = onto.object_class(&uri).into_diagnostic()?;
            print_json(&serde_json::json!({
                "object": object,
                "class": class.map(|c| c.uri),
            }))?;
        }
        ObjectAction::Update { uri, patch } => {
            let patch: ObjectPatch = serde_json::from_str(&patch).into_diagnostic()?;
            print_json(&onto.update_object(&uri, patch).into_diagnostic()?)?;
        }
        ObjectAction::Delete { uri } => {
            if onto.delete_object(&uri).into_diagnostic()? {
                println!("Deleted object {uri}");
            } else {
                println!("No object with uri {uri}");
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
