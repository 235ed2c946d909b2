use anyhow::{anyhow, Result};
use log::{debug, LevelFilter};
use simple_logger::SimpleLogger;
use std::fs;
use std::io::Read;
use tessera_html5::document::Document;
use tessera_html5::parser::{Html5Parser, Html5ParserOptions, ParserStatus};
use tessera_html5::testing::tree_dump::dump_tree;
use tessera_html5::tree_adapter::{Namespace, TreeAdapter};
use tessera_html5::writer::DocumentWriter;

fn main() -> Result<()> {
    let matches = clap::Command::new("Tessera HTML5 parser")
        .version("0.1.0")
        .arg(
            clap::Arg::new("file")
                .help("The file to parse, stdin when omitted")
                .index(1),
        )
        .arg(
            clap::Arg::new("fragment")
                .help("Parse the input as the contents of this element")
                .long("fragment")
                .value_name("TAG"),
        )
        .arg(
            clap::Arg::new("no-scripting")
                .help("Parse as if scripting is disabled")
                .long("no-scripting")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("chunk-size")
                .help("Feed the input to the parser in chunks of this many characters")
                .long("chunk-size")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            clap::Arg::new("errors")
                .help("Print the parse errors")
                .short('e')
                .long("errors")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("format")
                .help("Output format")
                .long("format")
                .value_parser(["tree", "html"])
                .default_value("tree"),
        )
        .arg(
            clap::Arg::new("verbose")
                .help("Increase log output, can be repeated")
                .short('v')
                .action(clap::ArgAction::Count),
        )
        .get_matches();

    let level = match matches.get_count("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::new().with_level(level).init()?;

    let html = match matches.get_one::<String>("file") {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let scripting = !matches.get_flag("no-scripting");
    let options = Html5ParserOptions::default()
        .with_scripting(scripting)
        .with_source_locations(true)
        .with_pause_on_script(true);

    let mut parser = match matches.get_one::<String>("fragment") {
        Some(tag) => {
            let mut document = Document::new();
            let context = document.create_element(&tag.to_ascii_lowercase(), Namespace::Html, Vec::new());
            Html5Parser::new_fragment(document, Some(context), Some(options))
        }
        None => Html5Parser::new_document(Document::new(), Some(options)),
    };

    let chunk_size = matches.get_one::<usize>("chunk-size").copied().unwrap_or(usize::MAX);
    if chunk_size == 0 {
        return Err(anyhow!("chunk size must be at least 1"));
    }

    let chars: Vec<char> = html.chars().collect();
    let mut chunks = chars.chunks(chunk_size.min(chars.len().max(1)));
    loop {
        match parser.run() {
            ParserStatus::NeedMoreInput => match chunks.next() {
                Some(chunk) => parser.write(&chunk.iter().collect::<String>())?,
                None => break,
            },
            ParserStatus::ScriptPending(script) => {
                debug!("script {script} is pending, not executing it");
                parser.resume();
            }
            ParserStatus::Finished => break,
        }
    }

    let parsed = parser.finish();

    match matches.get_one::<String>("format").map(String::as_str) {
        Some("html") => println!("{}", DocumentWriter::write_with_scripting(&parsed.adapter, &parsed.root, scripting)),
        _ => println!("{}", dump_tree(&parsed.adapter, &parsed.root)),
    }

    if matches.get_flag("errors") {
        for e in &parsed.errors {
            println!("Parse Error ({}:{}): {}", e.location.line, e.location.column, e.message);
        }
    }

    Ok(())
}
