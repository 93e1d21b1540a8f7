//! Weft CLI
//!
//! Usage:
//!   weft [OPTIONS] [FILE]
//!
//! Options:
//!   -d, --data <FILE>    JSON data file with bindings to apply
//!   -c, --config <FILE>  Markup configuration (TOML format)
//!   --strict             Fail when a bound key matches nothing
//!   --keep-markup        Keep directive/template attributes in the output
//!   -s, --syntax         Show the binding syntax reference
//!   -h, --help           Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;

use weft::{BindError, BindValue, Binder, MarkupConfig};

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Declarative data binding for HTML documents")]
struct Cli {
    /// Markup file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// JSON data file with bindings to apply
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Markup configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fail when a bound key matches no directive or placeholder
    #[arg(long)]
    strict: bool,

    /// Keep directive and template attributes in the output
    #[arg(long)]
    keep_markup: bool,

    /// Show the binding syntax reference
    #[arg(short, long)]
    syntax: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.syntax {
        print_syntax();
        return;
    }

    // If no input file and stdin is a terminal (interactive), show intro help
    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    // Load configuration
    let config = match &cli.config {
        Some(path) => match MarkupConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => MarkupConfig::default(),
    };
    let config = config.with_strict(cli.strict);

    // Read markup
    let markup = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let mut binder = match Binder::from_html_with_config(&markup, config) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Apply data bindings
    if let Some(path) = &cli.data {
        let entries = match load_data(path) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("Error loading data '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        };
        for (key, value) in entries {
            if let Err(e) = apply_entry(&mut binder, &key, value) {
                eprintln!("Error binding '{}': {}", key, e);
                std::process::exit(1);
            }
        }
    }

    if !cli.keep_markup {
        binder.cleanup();
    }
    println!("{}", binder.to_html());
}

/// Read the data file: a JSON object whose entries are applied in order
fn load_data(path: &PathBuf) -> Result<Vec<(String, BindValue)>, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let json: serde_json::Value = serde_json::from_str(&content).map_err(|e| e.to_string())?;
    match BindValue::from(json) {
        BindValue::Map(entries) => Ok(entries),
        _ => Err("data file must contain a JSON object".to_string()),
    }
}

/// Bind one top-level data entry
///
/// Arrays go through list binding, trying the key as an explicit template
/// name before structural resolution; everything else is a plain bind, so
/// table directives pick up object-shaped values.
fn apply_entry(binder: &mut Binder, key: &str, value: BindValue) -> Result<(), BindError> {
    if let BindValue::Seq(items) = &value {
        match binder.bind_list(items, None, Some(key)) {
            Err(BindError::TemplateNotFound { name: Some(_) }) => {}
            other => return other.map(|_| ()),
        }
        match binder.bind_list(items, None, None) {
            Err(BindError::TemplateNotFound { name: None }) => {}
            other => return other.map(|_| ()),
        }
    }
    binder.bind(Some(key), value)
}

fn print_intro() {
    println!(
        r#"Weft - declarative data binding for HTML documents

USAGE:
    weft [OPTIONS] [FILE]
    cat page.html | weft --data values.json

OPTIONS:
    -d, --data <FILE>     JSON data file with bindings to apply
    -c, --config <FILE>   Markup configuration (TOML)
    --strict              Fail when a bound key matches nothing
    --keep-markup         Keep directive/template attributes in the output
    -s, --syntax          Show the binding syntax reference
    -h, --help            Print help

QUICK START:
    echo '<h1 data-weft:text="title"></h1>' | weft --data <(echo '{{"title":"Hi"}}')

Run --syntax for the directive and placeholder reference."#
    );
}

fn print_syntax() {
    println!(
        r#"WEFT BINDING SYNTAX
===================

DIRECTIVES
----------
Attributes of the form data-weft:<property>="[modifier]key[ token]".

    data-weft:text="title"        Set text content from key "title"
    data-weft:text                Keyless: matches binds without a key
    data-weft:html="body"         Set inner HTML (unescaped)
    data-weft:class="accent"      Add the bound value as a class token
    data-weft:value="qty"         Set a form control value
    data-weft:table="rows"        Bind tabular data onto contained tables
    data-weft:href="link"         Any other property sets that attribute

MODIFIERS
---------
    :key token     Add/remove `token` on the named attribute by truthiness
                   data-weft:class=":isSelected selected-item"
    ?key           Toggle attribute presence by truthiness
                   data-weft:disabled="?locked"
    ?!key          Inverted toggle
                   data-weft:hidden="?!visible"
    @attr          Copy another attribute's current value
                   data-weft:name="@id"

PLACEHOLDERS
------------
    {{{{key}}}}                 Substituted with the bound value
    {{{{key ?? default}}}}      Shows `default` until a non-empty bind

TEMPLATES
---------
    <li data-weft-template>...</li>          Unnamed, resolved structurally
    <li data-weft-template="rows">...</li>   Named template

Template elements are removed from the output and cloned once per bound
item. Nested templates repeat per nested sequence.

TABLES
------
Accepted data shapes (JSON):
    [["Day","Weather"],["Mon","Sun"]]            row-major
    {{"Day":["Mon"],"Weather":["Sun"]}}            column-major
    [["Q1","Q2"],{{"Revenue":["10","12"]}}]        double-header rows

Header cells may carry data-weft-key="k" to name a column independently
of the displayed text."#
    );
}
