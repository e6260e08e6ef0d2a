use std::env;
use std::fs;
use std::path::Path;

use catalog::document;
use catalog::import::{ImportPayload, classify};
use catalog::layer_extent;
use catalog::services::ServiceRegistry;
use catalog::tree::{CatalogTree, ChildrenState, NodeId};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    match cmd.as_str() {
        "tree" => cmd_tree(args),
        "extent" => cmd_extent(args),
        "import" => cmd_import(args),
        _ => Err(usage()),
    }
}

fn usage() -> String {
    [
        "usage: geobrowse <command> [args]",
        "",
        "commands:",
        "  tree <catalog.json> [more.json ...]   load and merge catalog files, print the tree",
        "  extent <catalog.json> <layer name>    resolve the named layer's geographic extent",
        "  import <catalog.json> <drop.json>     merge a drag-and-drop payload, print the result",
    ]
    .join("\n")
}

fn cmd_tree(args: Vec<String>) -> Result<(), String> {
    if args.is_empty() {
        return Err(usage());
    }

    let mut tree = CatalogTree::new();
    let mut registry = ServiceRegistry::new();
    for path in &args {
        merge_file(&mut tree, &mut registry, path)?;
    }

    print_tree(&tree);
    print_services(&registry);
    Ok(())
}

fn cmd_extent(args: Vec<String>) -> Result<(), String> {
    if args.len() != 2 {
        return Err(usage());
    }

    let doc = read_json(&args[0])?;
    let layer_name = &args[1];
    let Some(layer) = find_layer(&doc, layer_name) else {
        return Err(format!("no layer named {layer_name:?} in {}", args[0]));
    };

    match layer_extent(layer) {
        Some(extent) => println!(
            "{layer_name}: west={} south={} east={} north={}",
            extent.west, extent.south, extent.east, extent.north
        ),
        None => println!("{layer_name}: no extent defined"),
    }
    Ok(())
}

fn cmd_import(args: Vec<String>) -> Result<(), String> {
    if args.len() != 2 {
        return Err(usage());
    }

    let mut tree = CatalogTree::new();
    let mut registry = ServiceRegistry::new();
    merge_file(&mut tree, &mut registry, &args[0])?;
    merge_file(&mut tree, &mut registry, &args[1])?;

    print_tree(&tree);
    print_services(&registry);
    Ok(())
}

fn merge_file(
    tree: &mut CatalogTree,
    registry: &mut ServiceRegistry,
    path: &str,
) -> Result<(), String> {
    let file_name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);
    let bytes = fs::read(path).map_err(|e| format!("read {path}: {e}"))?;

    match classify(file_name, &bytes).map_err(|e| format!("{path}: {e}"))? {
        ImportPayload::Collections(collections) => {
            for collection in collections {
                if document::name(&collection).is_none() {
                    eprintln!("warning: skipping unnamed collection in {path}");
                    continue;
                }
                tree.merge_top_level(collection);
            }
        }
        ImportPayload::Services(services) => registry.add_services(&services),
    }
    Ok(())
}

fn read_json(path: &str) -> Result<Value, String> {
    let bytes = fs::read(path).map_err(|e| format!("read {path}: {e}"))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("parse {path}: {e}"))
}

fn print_tree(tree: &CatalogTree) {
    for root in tree.roots() {
        print_node(tree, *root, 0);
    }
}

fn print_node(tree: &CatalogTree, id: NodeId, depth: usize) {
    let Some(node) = tree.node(id) else {
        return;
    };

    let indent = "  ".repeat(depth);
    let marker = if node.is_leaf() { "-" } else { "+" };
    let note = match node.state() {
        ChildrenState::NotRequested => " (capabilities not loaded)",
        ChildrenState::Loading => " (loading)",
        ChildrenState::Failed(_) => " (load failed)",
        ChildrenState::Loaded => "",
    };
    let name = if node.name.is_empty() {
        "(unnamed)"
    } else {
        node.name.as_str()
    };
    println!("{indent}{marker} {name}{note}");

    for child in node.children() {
        print_node(tree, *child, depth + 1);
    }
}

fn print_services(registry: &ServiceRegistry) {
    if registry.is_empty() {
        return;
    }
    println!("\nregistered services: {}", registry.len());
}

/// Depth-first search for a layer entry by name across nested child lists.
fn find_layer<'a>(doc: &'a Value, name: &str) -> Option<&'a Value> {
    if document::name(doc) == Some(name) {
        return Some(doc);
    }
    for entry in document::layers(doc).map(|l| l.as_slice()).unwrap_or(&[]) {
        if let Some(found) = find_layer(entry, name) {
            return Some(found);
        }
    }
    None
}
