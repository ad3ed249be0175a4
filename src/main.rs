use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use cyberlite::{
    Input, MetaCommand, OpenMode, Outcome, PAGE_SIZE, Pager, PagerConfig, RecordError, Row,
    RowLayout, TABLE_MAX_PAGES, Table,
};
use prettytable::{Cell, Row as PrettyRow, Table as PrettyTable};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use thiserror::Error;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cyberlite", version, about = "Single-table paged database shell")]
struct Args {
    /// Database file, created if missing
    path: PathBuf,

    /// Discard any existing contents of the database file
    #[arg(long)]
    truncate: bool,

    /// Bytes per page
    #[arg(long, default_value_t = PAGE_SIZE)]
    page_size: usize,

    /// Maximum number of pages in the table
    #[arg(long, default_value_t = TABLE_MAX_PAGES)]
    max_pages: usize,
}

impl Args {
    fn pager_config(&self) -> PagerConfig {
        PagerConfig {
            page_size: self.page_size,
            max_pages: self.max_pages,
            open_mode: if self.truncate {
                OpenMode::Truncate
            } else {
                OpenMode::Preserve
            },
        }
    }
}

#[derive(Debug, Error)]
enum ShellError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("Line editor error: {0}")]
    Readline(#[from] ReadlineError),
}

impl ShellError {
    fn code(&self) -> &'static str {
        match self {
            ShellError::Record(RecordError::File(err)) => err.code(),
            ShellError::Record(RecordError::InvalidLayout(_)) => "CYBERLITE_CONFIG",
            ShellError::Record(_) => "CYBERLITE_INTERNAL",
            ShellError::Readline(_) => "IOERR_READ",
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(code = err.code(), path = %args.path.display(), "{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<(), ShellError> {
    let pager = Pager::open(&args.path, args.pager_config()).await.map_err(RecordError::from)?;
    let mut table = Table::load(pager, RowLayout::default()).await?;
    let mut editor = DefaultEditor::new()?;

    loop {
        let line = match editor.readline("db > ") {
            Ok(line) => line,
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(err) => return Err(err.into()),
        };
        let _ = editor.add_history_entry(line.as_str());

        let statement = match Input::parse(&line, table.layout()) {
            Ok(Input::Meta(MetaCommand::Exit)) => break,
            Ok(Input::Meta(MetaCommand::Constants)) => {
                print_constants(&table);
                continue;
            }
            Ok(Input::Statement(statement)) => statement,
            Err(err) => {
                println!("{}", err);
                continue;
            }
        };

        match statement.execute(&mut table).await {
            Ok(Outcome::Inserted(_)) => println!("Executed."),
            Ok(Outcome::Rows(rows)) => {
                print_rows(&rows);
                println!("Executed.");
            }
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(RecordError::TableFull(_)) => println!("Error: Table full."),
            Err(err) => println!("Error: {}", err),
        }
    }

    // Inserts stay in the cache until here
    table.flush().await?;
    Ok(())
}

fn print_rows(rows: &[Row]) {
    if rows.is_empty() {
        return;
    }

    let mut out = PrettyTable::new();
    out.set_titles(PrettyRow::new(vec![
        Cell::new("id"),
        Cell::new("username"),
        Cell::new("email"),
    ]));
    for row in rows {
        out.add_row(PrettyRow::new(vec![
            Cell::new(&row.id.to_string()),
            Cell::new(&row.username),
            Cell::new(&row.email),
        ]));
    }
    out.printstd();
}

fn print_constants(table: &Table) {
    let layout = table.layout();
    let config = table.pager().config();
    println!("Constants:");
    println!("ROW_SIZE: {}", layout.row_size());
    println!("PAGE_SIZE: {}", config.page_size);
    println!("ROWS_PER_PAGE: {}", table.rows_per_page());
    println!("TABLE_MAX_PAGES: {}", config.max_pages);
    println!("TABLE_MAX_ROWS: {}", table.max_rows());
    println!("NUM_ROWS: {}", table.num_rows());
}
