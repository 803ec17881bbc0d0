//! jsonapi-codec CLI
//!
//! Envelope-level tooling for resource documents: structural checks and
//! quick inspection, independent of any registered resource type.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "jsonapi-codec")]
#[command(about = "Check and inspect resource documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a document's envelope structure
    Check {
        /// Document file to check
        file: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Suppress the per-finding listing, only report the summary
        #[arg(long, short)]
        quiet: bool,
    },

    /// Summarize a document: primary resources, relationships, included
    Inspect {
        /// Document file to inspect
        file: PathBuf,

        /// Output the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct Diagnostic {
    path: String,
    message: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { file, json, quiet } => run_check(&file, json, quiet),
        Commands::Inspect { file, json } => run_inspect(&file, json),
    }
}

fn load_document(path: &Path) -> Result<Value, ExitCode> {
    if !path.exists() {
        eprintln!("error: file not found: {}", path.display());
        return Err(ExitCode::from(3));
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", path.display());
            return Err(ExitCode::from(3));
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Ok(value),
        Err(err) => {
            eprintln!("error: invalid JSON: {err}");
            Err(ExitCode::from(2))
        }
    }
}

fn run_check(file: &Path, json: bool, quiet: bool) -> ExitCode {
    let document = match load_document(file) {
        Ok(document) => document,
        Err(code) => return code,
    };

    let diagnostics = check_document(&document);

    if json {
        let report = serde_json::json!({
            "ok": diagnostics.is_empty(),
            "diagnostics": diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    } else {
        if !quiet {
            for diagnostic in &diagnostics {
                println!("{}: {}", diagnostic.path, diagnostic.message);
            }
        }
        if diagnostics.is_empty() {
            println!("ok: document envelope is well-formed");
        } else {
            println!("{} finding(s)", diagnostics.len());
        }
    }

    if diagnostics.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn check_document(document: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let Some(root) = document.as_object() else {
        diagnostics.push(finding("", "top level must be an object"));
        return diagnostics;
    };

    let has_data = root.contains_key("data");
    let has_errors = root.contains_key("errors");
    if has_data && has_errors {
        diagnostics.push(finding("", "data and errors must not coexist"));
    }
    if !has_data && !has_errors {
        diagnostics.push(finding("", "document has neither data nor errors"));
    }

    match root.get("data") {
        None | Some(Value::Null) => {}
        Some(Value::Object(node)) => check_node(node, "/data", &mut diagnostics),
        Some(Value::Array(nodes)) => {
            for (i, node) in nodes.iter().enumerate() {
                let path = format!("/data/{i}");
                match node.as_object() {
                    Some(node) => check_node(node, &path, &mut diagnostics),
                    None => diagnostics.push(finding(&path, "resource must be an object")),
                }
            }
        }
        Some(_) => diagnostics.push(finding("/data", "must be an object, array, or null")),
    }

    if let Some(included) = root.get("included") {
        match included.as_array() {
            Some(nodes) => {
                let mut seen = Vec::new();
                for (i, node) in nodes.iter().enumerate() {
                    let path = format!("/included/{i}");
                    let Some(node) = node.as_object() else {
                        diagnostics.push(finding(&path, "resource must be an object"));
                        continue;
                    };
                    check_node(node, &path, &mut diagnostics);
                    if node.get("id").and_then(Value::as_str).is_none() {
                        diagnostics.push(finding(&path, "included resource must carry an id"));
                    }
                    let key = (
                        node.get("type").and_then(Value::as_str).unwrap_or_default(),
                        node.get("id").and_then(Value::as_str).unwrap_or_default(),
                    );
                    if seen.contains(&key) {
                        diagnostics.push(finding(
                            &path,
                            &format!("duplicate included key \"{},{}\"", key.0, key.1),
                        ));
                    } else {
                        seen.push(key);
                    }
                }
            }
            None => diagnostics.push(finding("/included", "must be an array")),
        }
    }

    diagnostics
}

fn check_node(node: &Map<String, Value>, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    match node.get("type").and_then(Value::as_str) {
        Some(t) if !t.is_empty() => {}
        Some(_) => diagnostics.push(finding(path, "resource type must not be empty")),
        None => diagnostics.push(finding(path, "resource must carry a string type")),
    }

    if let Some(id) = node.get("id") {
        if !id.is_string() {
            diagnostics.push(finding(
                &format!("{path}/id"),
                "ids are always strings on the wire",
            ));
        }
    }

    for member in ["attributes", "links", "meta"] {
        if let Some(value) = node.get(member) {
            if !value.is_object() {
                diagnostics.push(finding(&format!("{path}/{member}"), "must be an object"));
            }
        }
    }

    if let Some(relationships) = node.get("relationships") {
        let Some(relationships) = relationships.as_object() else {
            diagnostics.push(finding(&format!("{path}/relationships"), "must be an object"));
            return;
        };
        for (name, entry) in relationships {
            let rel_path = format!("{path}/relationships/{name}");
            let Some(entry) = entry.as_object() else {
                diagnostics.push(finding(&rel_path, "must be an object"));
                continue;
            };
            match entry.get("data") {
                None => diagnostics.push(finding(&rel_path, "missing data member")),
                Some(Value::Null) => {}
                Some(Value::Object(reference)) => {
                    check_node(reference, &format!("{rel_path}/data"), diagnostics);
                }
                Some(Value::Array(references)) => {
                    for (i, reference) in references.iter().enumerate() {
                        let ref_path = format!("{rel_path}/data/{i}");
                        match reference.as_object() {
                            Some(reference) => check_node(reference, &ref_path, diagnostics),
                            None => diagnostics
                                .push(finding(&ref_path, "reference must be an object")),
                        }
                    }
                }
                Some(_) => {
                    diagnostics.push(finding(
                        &format!("{rel_path}/data"),
                        "must be an object, array, or null",
                    ));
                }
            }
        }
    }
}

fn finding(path: &str, message: &str) -> Diagnostic {
    Diagnostic {
        path: if path.is_empty() { "/".into() } else { path.into() },
        message: message.into(),
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    primary_type: Option<String>,
    primary_count: usize,
    primary_ids: Vec<String>,
    relationships: Vec<String>,
    included_count: usize,
    included_types: Vec<String>,
}

fn run_inspect(file: &Path, json: bool) -> ExitCode {
    let document = match load_document(file) {
        Ok(document) => document,
        Err(code) => return code,
    };

    let summary = summarize(&document);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).unwrap_or_default()
        );
    } else {
        match &summary.primary_type {
            Some(primary) => println!(
                "primary: {} {} resource(s) [{}]",
                summary.primary_count,
                primary,
                summary.primary_ids.join(", ")
            ),
            None => println!("primary: none"),
        }
        if !summary.relationships.is_empty() {
            println!("relationships: {}", summary.relationships.join(", "));
        }
        println!(
            "included: {} resource(s){}",
            summary.included_count,
            if summary.included_types.is_empty() {
                String::new()
            } else {
                format!(" ({})", summary.included_types.join(", "))
            }
        );
    }

    ExitCode::SUCCESS
}

fn summarize(document: &Value) -> Summary {
    let nodes: Vec<&Value> = match document.get("data") {
        Some(Value::Object(_)) => vec![&document["data"]],
        Some(Value::Array(nodes)) => nodes.iter().collect(),
        _ => Vec::new(),
    };

    let mut relationships: Vec<String> = Vec::new();
    let mut primary_ids = Vec::new();
    for node in &nodes {
        if let Some(id) = node.get("id").and_then(Value::as_str) {
            primary_ids.push(id.to_string());
        }
        if let Some(rels) = node.get("relationships").and_then(Value::as_object) {
            for name in rels.keys() {
                if !relationships.contains(name) {
                    relationships.push(name.clone());
                }
            }
        }
    }

    let included = document
        .get("included")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let mut included_types: Vec<String> = Vec::new();
    for node in included {
        if let Some(t) = node.get("type").and_then(Value::as_str) {
            if !included_types.iter().any(|seen| seen == t) {
                included_types.push(t.to_string());
            }
        }
    }

    Summary {
        primary_type: nodes
            .first()
            .and_then(|node| node.get("type"))
            .and_then(Value::as_str)
            .map(String::from),
        primary_count: nodes.len(),
        primary_ids,
        relationships,
        included_count: included.len(),
        included_types,
    }
}
