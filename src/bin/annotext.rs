use annotext::{CommonMarkSource, Document, RenderConfig, commonmark};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a JSON document as CommonMark
    Render {
        /// Document JSON file, or `-` for stdin
        input: PathBuf,
        /// Bullet character for unordered lists
        #[arg(long, default_value_t = '-')]
        bullet: char,
    },
    /// Print the normalized tree of a JSON document
    Tree {
        /// Document JSON file, or `-` for stdin
        input: PathBuf,
    },
    /// Parse CommonMark into a JSON document
    Parse {
        /// Markdown file, or `-` for stdin
        input: PathBuf,
    },
    /// Check that CommonMark survives parse, render and re-parse
    Roundtrip {
        /// Markdown file, or `-` for stdin
        input: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Render { input, bullet } => render_command(input, *bullet),
        Commands::Tree { input } => tree_command(input),
        Commands::Parse { input } => parse_command(input),
        Commands::Roundtrip { input } => roundtrip_command(input),
    }
}

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}

fn read_input(input: &Path) -> String {
    let result = if input == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer).map(|_| buffer)
    } else {
        std::fs::read_to_string(input)
    };
    result.unwrap_or_else(|err| fail(format!("{}: {err}", input.display())))
}

fn read_document(input: &Path) -> Document {
    let text = read_input(input);
    serde_json::from_str(&text).unwrap_or_else(|err| fail(err))
}

fn parse_markdown(markdown: &str) -> Document {
    CommonMarkSource::parse(markdown).unwrap_or_else(|err| fail(err))
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => fail(err),
    }
}

fn render_command(input: &Path, bullet: char) {
    let doc = read_document(input);
    let config = RenderConfig {
        bullet,
        ..RenderConfig::default()
    };
    match commonmark::render_with_config(&doc, &config) {
        Ok(markdown) => println!("{markdown}"),
        Err(err) => fail(err),
    }
}

fn tree_command(input: &Path) {
    let doc = read_document(input);
    match doc.normalize() {
        Ok(tree) => print_json(&tree),
        Err(err) => fail(err),
    }
}

fn parse_command(input: &Path) {
    let doc = parse_markdown(&read_input(input));
    print_json(&doc);
}

fn roundtrip_command(input: &Path) {
    let original = parse_markdown(&read_input(input));
    let rendered = original.to_commonmark().unwrap_or_else(|err| fail(err));
    let reparsed = parse_markdown(&rendered);

    match original.structurally_eq(&reparsed) {
        Ok(true) => println!("{rendered}"),
        Ok(false) => {
            eprintln!("Round trip changed the document structure:");
            eprintln!("{rendered}");
            std::process::exit(1);
        }
        Err(err) => fail(err),
    }
}
