use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mtree",
    about = "Materialized-path tree store — attach nodes and query relationships",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON record store file
    #[arg(short, long, global = true, default_value = "mtree.json")]
    pub store: PathBuf,

    /// TOML tree configuration (column mapping, parent cache)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new root node
    Root(NewNodeArgs),
    /// Create a new node under a parent
    AddChild(AddChildArgs),
    /// Create a new node next to an existing one
    AddSibling(AddSiblingArgs),
    /// Re-attach an existing node (its descendants keep their paths)
    Attach(AttachArgs),
    /// Show one node with its parent and root
    Show(NodeArgs),
    /// List direct children
    Children(NodeArgs),
    /// List all descendants, shallowest first
    Descendants(NodeArgs),
    /// List ancestors, root first
    Ancestors(NodeArgs),
    /// List nodes sharing a parent
    Siblings(NodeArgs),
    /// Print the tree under a root
    Tree(TreeArgs),
    /// List all root nodes
    Roots,
}

#[derive(Args)]
pub struct NewNodeArgs {
    /// Optional title attribute
    #[arg(short, long)]
    pub title: Option<String>,
}

#[derive(Args)]
pub struct AddChildArgs {
    pub parent: u64,
    #[arg(short, long)]
    pub title: Option<String>,
}

#[derive(Args)]
pub struct AddSiblingArgs {
    pub sibling: u64,
    #[arg(short, long)]
    pub title: Option<String>,
}

#[derive(Args)]
pub struct AttachArgs {
    pub id: u64,
    #[command(flatten)]
    pub position: Position,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct Position {
    /// Make the node a root
    #[arg(long)]
    pub root: bool,
    /// Make the node a child of this node
    #[arg(long, value_name = "PARENT")]
    pub child_of: Option<u64>,
    /// Make the node a sibling of this node
    #[arg(long, value_name = "SIBLING")]
    pub sibling_of: Option<u64>,
}

#[derive(Args)]
pub struct NodeArgs {
    pub id: u64,
}

#[derive(Args)]
pub struct TreeArgs {
    pub root: u64,
    /// Leave the root out, listing only nodes under it
    #[arg(long)]
    pub exclude_root: bool,
}
