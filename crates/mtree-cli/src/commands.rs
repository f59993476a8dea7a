use anyhow::Context;
use colored::Colorize;

use mtree_store::FileRecordStore;
use mtree_tree::{Node, NodeId, PathTree, TreeConfig};

use crate::cli::*;

type Tree = PathTree<FileRecordStore>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => TreeConfig::load(path)?,
        None => TreeConfig::default(),
    };
    let store = FileRecordStore::open(&cli.store)
        .with_context(|| format!("opening store {}", cli.store.display()))?;
    let tree = PathTree::new(store, config)?;
    let format = cli.format;

    match cli.command {
        Command::Root(args) => {
            let node = tree.attach_as_root(new_node(args.title))?;
            print_created(&node, format)
        }
        Command::AddChild(args) => {
            let parent = load(&tree, args.parent)?;
            let node = tree.attach_as_child_of(new_node(args.title), &parent)?;
            print_created(&node, format)
        }
        Command::AddSibling(args) => {
            let sibling = load(&tree, args.sibling)?;
            let node = tree.attach_as_sibling_of(new_node(args.title), &sibling)?;
            print_created(&node, format)
        }
        Command::Attach(args) => cmd_attach(&tree, args, format),
        Command::Show(args) => cmd_show(&tree, args.id, format),
        Command::Children(args) => {
            let node = load(&tree, args.id)?;
            print_nodes(&tree.children(&node)?.get()?, format)
        }
        Command::Descendants(args) => {
            let node = load(&tree, args.id)?;
            print_nodes(&tree.descendants(&node)?.get()?, format)
        }
        Command::Ancestors(args) => {
            let node = load(&tree, args.id)?;
            print_nodes(&tree.ancestors(&node)?.get()?, format)
        }
        Command::Siblings(args) => {
            let node = load(&tree, args.id)?;
            print_nodes(&tree.siblings(&node)?.get()?, format)
        }
        Command::Tree(args) => cmd_tree(&tree, args, format),
        Command::Roots => print_nodes(&tree.roots().get()?, format),
    }
}

fn new_node(title: Option<String>) -> Node {
    match title {
        Some(title) => Node::new().with_attribute("title", title),
        None => Node::new(),
    }
}

fn load(tree: &Tree, id: u64) -> anyhow::Result<Node> {
    tree.find(NodeId::new(id))?
        .with_context(|| format!("node {id} not found"))
}

fn cmd_attach(tree: &Tree, args: AttachArgs, format: OutputFormat) -> anyhow::Result<()> {
    let node = load(tree, args.id)?;
    let position = args.position;
    let node = if position.root {
        tree.attach_as_root(node)?
    } else if let Some(parent) = position.child_of {
        let parent = load(tree, parent)?;
        tree.attach_as_child_of(node, &parent)?
    } else if let Some(sibling) = position.sibling_of {
        let sibling = load(tree, sibling)?;
        tree.attach_as_sibling_of(node, &sibling)?
    } else {
        anyhow::bail!("one of --root, --child-of, --sibling-of is required");
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&node)?),
        OutputFormat::Text => {
            println!("{} Attached {}", "✓".green().bold(), describe(&node));
            let stale = tree
                .children(&node)?
                .get()?
                .iter()
                .filter(|child| match (&node.path, &child.path) {
                    (Some(own), Some(theirs)) => !own.is_ancestor_of(theirs),
                    _ => true,
                })
                .count();
            if stale > 0 {
                println!(
                    "  {} {stale} children keep their previous paths",
                    "note:".yellow()
                );
            }
        }
    }
    Ok(())
}

fn cmd_show(tree: &Tree, id: u64, format: OutputFormat) -> anyhow::Result<()> {
    let node = load(tree, id)?;
    let parent = tree.parent(&node)?;
    let root = tree.root(&node)?;

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "node": node,
                "parent": parent,
                "root": root,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            println!("{}", describe(&node));
            match parent {
                Some(parent) => println!("  parent: {}", describe(&parent)),
                None => println!("  parent: {}", "(root)".dimmed()),
            }
            println!("  root:   {}", describe(&root));
            for (name, value) in &node.attributes {
                println!("  {}: {}", name.bold(), value);
            }
        }
    }
    Ok(())
}

fn cmd_tree(tree: &Tree, args: TreeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let root_id = NodeId::new(args.root);
    let root = load(tree, args.root)?;
    if !root.is_root() {
        let actual = tree.root(&root)?;
        anyhow::bail!(
            "node {} is not a root; its tree is rooted at {}",
            args.root,
            label(&actual)
        );
    }
    let nodes = if args.exclude_root {
        tree.fetch_tree(root_id).get()?
    } else {
        tree.fetch_tree_with_root(root_id).get()?
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&nodes)?),
        OutputFormat::Text => {
            let base = root.path.as_ref().map_or(1, |p| p.len()) + usize::from(args.exclude_root);
            for line in render_tree(&nodes, base) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// Indented pre-order listing. Nodes are ordered by their path segments, so
/// every node follows its ancestors; `base_len` is the segment count that
/// renders without indentation.
pub(crate) fn render_tree(nodes: &[Node], base_len: usize) -> Vec<String> {
    let mut ordered: Vec<&Node> = nodes.iter().collect();
    ordered.sort_by(|a, b| {
        let a = a.path.as_ref().map(|p| p.ids());
        let b = b.path.as_ref().map(|p| p.ids());
        a.cmp(&b)
    });

    ordered
        .into_iter()
        .map(|node| {
            let depth = node
                .path
                .as_ref()
                .map_or(0, |p| p.len().saturating_sub(base_len));
            format!("{}{}", "  ".repeat(depth), label(node))
        })
        .collect()
}

fn label(node: &Node) -> String {
    let id = node.id.map(|id| id.to_string()).unwrap_or_else(|| "?".into());
    match node.attribute("title").and_then(|v| v.as_str()) {
        Some(title) => format!("{id} {title}"),
        None => id,
    }
}

fn describe(node: &Node) -> String {
    format!(
        "{} {} level={}",
        label(node).yellow(),
        node.path_string().cyan(),
        node.level
    )
}

fn print_created(node: &Node, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(node)?),
        OutputFormat::Text => println!("{} Created {}", "✓".green().bold(), describe(node)),
    }
    Ok(())
}

fn print_nodes(nodes: &[Node], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(nodes)?),
        OutputFormat::Text if nodes.is_empty() => println!("{}", "(none)".dimmed()),
        OutputFormat::Text => {
            for node in nodes {
                println!("{}", describe(node));
            }
        }
    }
    Ok(())
}
