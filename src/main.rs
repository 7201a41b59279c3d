use clap::{Args, Parser as ClapParser, Subcommand};
use navql::cli::{self, CliError, QueryOptions, ResolveOptions, RunOptions};
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "navql")]
#[command(about = "navql - resolve include paths and build GraphQL-style query documents")]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "debug", "navql=trace")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an include expression and print its path and operators
    Resolve {
        /// Include expression, e.g. "x => x.Comments.Take(5)"
        expression: String,
    },

    /// Build a query and print its document
    Render {
        #[command(flatten)]
        query: QueryArgs,

        /// Also print the variables as JSON
        #[arg(long)]
        variables: bool,
    },

    /// Build a query and materialize it against JSON rows
    Run {
        #[command(flatten)]
        query: QueryArgs,

        /// JSON rows (reads from stdin if not provided)
        #[arg(short, long)]
        rows: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

#[derive(Args)]
struct QueryArgs {
    /// Root field name
    name: String,

    /// Build a single-result query
    #[arg(long)]
    item: bool,

    /// Query argument as NAME=VALUE (repeatable)
    #[arg(short, long = "arg")]
    arg: Vec<String>,

    /// Include expression (repeatable)
    #[arg(short, long)]
    include: Vec<String>,

    /// Selector expression, e.g. "p => p.Title"
    #[arg(short, long)]
    select: Option<String>,

    /// JSON context configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Spell field names in lowerCamelCase
    #[arg(long)]
    camel_case: bool,
}

impl QueryArgs {
    fn into_options(self) -> Result<QueryOptions, CliError> {
        Ok(QueryOptions {
            config: cli::load_config(self.config.as_deref(), self.camel_case)?,
            name: self.name,
            item: self.item,
            arguments: self.arg,
            includes: self.include,
            select: self.select,
        })
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Resolve { expression } => run_resolve(expression),
        Commands::Render { query, variables } => run_render(query, variables),
        Commands::Run {
            query,
            rows,
            pretty,
        } => run_query(query, rows, pretty),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn run_resolve(expression: String) -> Result<(), CliError> {
    let path = cli::execute_resolve(&ResolveOptions { expression })?;
    println!("{}", serde_json::to_string_pretty(&path)?);
    Ok(())
}

fn run_render(query: QueryArgs, variables: bool) -> Result<(), CliError> {
    let output = cli::execute_render(&query.into_options()?)?;
    print!("{}", output.document.text);
    if variables {
        println!("{}", serde_json::to_string_pretty(&output.document.variables)?);
    }
    Ok(())
}

fn run_query(query: QueryArgs, rows: Option<String>, pretty: bool) -> Result<(), CliError> {
    let rows = match rows {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = RunOptions {
        query: query.into_options()?,
        rows,
    };
    let output = cli::execute_run(&options)?;
    let json = if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }?;
    println!("{}", json);
    Ok(())
}
