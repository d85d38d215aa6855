use clap::Parser;
use colored::*;
use nginx_conf::cli::{Cli, ColorChoice, Commands, DumpArgs, FindArgs, GetArgs, Scope, ServersArgs, SourceArgs};
use nginx_conf::{ConditionalProperties, Http, Properties};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Set up color output
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {}
    }

    let result = match cli.command {
        Commands::Servers(args) => run_servers(args),
        Commands::Find(args) => run_find(args),
        Commands::Get(args) => run_get(args),
        Commands::Dump(args) => run_dump(args),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nginx_conf={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_http(source: &SourceArgs, part: bool) -> Result<Option<Http>, String> {
    let reader = source.reader();

    if part {
        reader
            .read_part(&source.input)
            .map(Some)
            .map_err(|e| e.to_string())
    } else {
        reader
            .read(&source.input)
            .map(|config| config.http)
            .map_err(|e| e.to_string())
    }
}

fn run_servers(args: ServersArgs) -> Result<(), String> {
    let servers = load_http(&args.source, args.part)?
        .map(|http| http.servers_list())
        .unwrap_or_default();

    if args.json {
        let output = serde_json::to_string_pretty(&servers)
            .map_err(|e| format!("Failed to encode JSON: {}", e))?;
        println!("{}", output);
        return Ok(());
    }

    if servers.is_empty() {
        println!("{}", "No servers defined.".yellow());
    }

    for entry in servers {
        match entry.rsplit_once(':') {
            Some((name, "https")) => println!("{}:{}", name.bold(), "https".green()),
            Some((name, protocol)) => println!("{}:{}", name.bold(), protocol),
            None => println!("{}", entry),
        }
    }

    Ok(())
}

fn run_find(args: FindArgs) -> Result<(), String> {
    let http = load_http(&args.source, args.part)?
        .ok_or_else(|| format!("No http block in {}", args.source.input.display()))?;

    let server = http.find_server(&args.name, &args.protocol).ok_or_else(|| {
        format!(
            "No server named {} listening for {}",
            args.name, args.protocol
        )
    })?;

    println!("{} #{}", "server".cyan().bold(), server.id.0);
    print_conditional(&server.properties, "  ");

    for location in &server.locations {
        println!();
        let modifier = location.modifier.as_str();
        if modifier.is_empty() {
            println!("  {} {}", "location".cyan().bold(), location.uri);
        } else {
            println!("  {} {} {}", "location".cyan().bold(), modifier, location.uri);
        }
        print_conditional(&location.properties, "    ");
    }

    Ok(())
}

fn run_get(args: GetArgs) -> Result<(), String> {
    let config = args
        .source
        .reader()
        .read(&args.source.input)
        .map_err(|e| e.to_string())?;

    let props: Option<&Properties> = match args.scope {
        Scope::Core => Some(&config.core),
        Scope::Events => config.events.as_ref(),
        Scope::Stream => config.stream.as_ref(),
        Scope::Http => config.http.as_ref().map(|h| &h.properties),
        Scope::Types => config.http.as_ref().map(|h| &h.types),
    };
    let props = props.ok_or_else(|| format!("No {} block in {}", args.scope.name(), config))?;

    let value = args
        .kind
        .read(props, &args.directive)
        .map_err(|e| format!("{}: {}", args.directive, e))?;

    println!("{}", value);
    Ok(())
}

fn run_dump(args: DumpArgs) -> Result<(), String> {
    let output = if args.part {
        let http = load_http(&args.source, true)?;
        serde_json::to_string_pretty(&http)
    } else {
        let config = args
            .source
            .reader()
            .read(&args.source.input)
            .map_err(|e| e.to_string())?;
        serde_json::to_string_pretty(&config)
    }
    .map_err(|e| format!("Failed to encode JSON: {}", e))?;

    println!("{}", output);
    Ok(())
}

fn print_conditional(props: &ConditionalProperties, indent: &str) {
    let mut names: Vec<&str> = props.names().collect();
    names.sort_unstable();

    for name in names {
        for entry in props.entries(name) {
            match entry.condition.and_then(|i| props.conditions().get(i)) {
                Some(condition) => println!(
                    "{}{} {} {}",
                    indent,
                    name,
                    entry.value,
                    format!("(if {})", condition).dimmed()
                ),
                None => println!("{}{} {}", indent, name, entry.value),
            }
        }
    }
}
