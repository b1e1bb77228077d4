use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use crm_lookup_tools::config::AppRegistration;
use crm_lookup_tools::io::{self, ExportFormat};
use crm_lookup_tools::query::{QueryKind, SearchTerms};
use crm_lookup_tools::remote::HttpCrmService;
use crm_lookup_tools::render::{DEFAULT_MAX_WIDTH, render_table};
use crm_lookup_tools::session::{
    self, LoginMode, OAuthFlow, Prompt, SystemBrowser, TerminalPrompt,
};
use crm_lookup_tools::workspace::{LogoutOutcome, QueryOutcome, Workspace};
use crm_lookup_tools::{LookupError, Result, logging};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    logging::init()?;
    let registration = AppRegistration::load()?;
    let service = HttpCrmService::new(registration.clone())?;
    let mut shell = Shell {
        workspace: Workspace::new(service),
        registration,
        auth: cli.auth,
        prompt: TerminalPrompt,
        browser: SystemBrowser,
    };

    match cli.command.unwrap_or(Command::Shell) {
        Command::Shell => shell.interactive(),
        Command::Query(args) => shell.one_shot(args),
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Look up construction, sales-request and phone-line records in the CRM."
)]
struct Cli {
    /// How to authenticate against the CRM.
    #[arg(long, value_enum, default_value_t = AuthMode::Sso, global = true)]
    auth: AuthMode,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive session (the default).
    Shell,
    /// Log in, run a single query, print it and optionally export it.
    Query(QueryArgs),
}

#[derive(clap::Args)]
struct QueryArgs {
    /// Which search to run.
    #[arg(long, value_enum)]
    kind: QueryKindArg,

    /// Street address fragment.
    #[arg(long, default_value = "")]
    address: String,

    /// Zip code or phone fragment (phone line details only).
    #[arg(long, alias = "zip", default_value = "")]
    phone: String,

    /// Export destination.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Export format; guessed from the output extension when omitted.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum AuthMode {
    /// Username, password and security token.
    Password,
    /// Browser single sign-on with a pasted redirect URL.
    Sso,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum QueryKindArg {
    PartQuoteRequest,
    InsideWiringSurvey,
    PhoneLineDetails,
}

impl From<QueryKindArg> for QueryKind {
    fn from(kind: QueryKindArg) -> Self {
        match kind {
            QueryKindArg::PartQuoteRequest => QueryKind::PartQuoteRequest,
            QueryKindArg::InsideWiringSurvey => QueryKind::InsideWiringSurvey,
            QueryKindArg::PhoneLineDetails => QueryKind::PhoneLineDetails,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    Csv,
    Xlsx,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Xlsx => ExportFormat::Xlsx,
        }
    }
}

const HELP: &str = "\
Commands:
  login                  log in with username, password and security token
  sso                    log in through the browser (single sign-on)
  query [kind]           run a search: part-quote-request | inside-wiring-survey | phone-line-details
  export <path> [fmt]    save the last results as csv or xlsx
  logout                 end the session
  whoami                 show the logged-in user
  help                   show this list
  quit                   leave";

/// A line typed at the shell prompt.
#[derive(Debug, PartialEq)]
enum ShellCommand {
    Login,
    Sso,
    Query(Option<QueryKind>),
    Export {
        path: PathBuf,
        format: Option<ExportFormat>,
    },
    Logout,
    WhoAmI,
    Help,
    Quit,
    Empty,
}

fn parse_command(line: &str) -> std::result::Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Ok(ShellCommand::Empty),
        "login" => Ok(ShellCommand::Login),
        "sso" => Ok(ShellCommand::Sso),
        "query" | "run" if rest.is_empty() => Ok(ShellCommand::Query(None)),
        "query" | "run" => rest.parse().map(|kind| ShellCommand::Query(Some(kind))),
        "export" => parse_export(rest),
        "logout" => Ok(ShellCommand::Logout),
        "whoami" => Ok(ShellCommand::WhoAmI),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" => Ok(ShellCommand::Quit),
        other => Err(format!("unknown command '{other}', type 'help'")),
    }
}

fn parse_export(rest: &str) -> std::result::Result<ShellCommand, String> {
    if rest.is_empty() {
        return Err("usage: export <path> [csv|xlsx]".to_string());
    }
    let named = rest
        .rsplit_once(char::is_whitespace)
        .and_then(|(path, word)| match word.to_ascii_lowercase().as_str() {
            "csv" => Some((path.trim(), ExportFormat::Csv)),
            "xlsx" => Some((path.trim(), ExportFormat::Xlsx)),
            _ => None,
        });
    let (path, format) = match named {
        Some((path, format)) => (path, Some(format)),
        None => (rest, None),
    };
    Ok(ShellCommand::Export {
        path: PathBuf::from(path),
        format,
    })
}

struct Shell {
    workspace: Workspace<HttpCrmService>,
    registration: AppRegistration,
    auth: AuthMode,
    prompt: TerminalPrompt,
    browser: SystemBrowser,
}

impl Shell {
    fn interactive(&mut self) -> Result<()> {
        println!("CRM lookup tool. Type 'help' for commands.");
        loop {
            let Some(line) = self.prompt.ask_line(">") else {
                break;
            };
            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(message) => {
                    eprintln!("{message}");
                    continue;
                }
            };

            let outcome = match command {
                ShellCommand::Empty => Ok(()),
                ShellCommand::Quit => break,
                ShellCommand::Help => {
                    println!("{HELP}");
                    Ok(())
                }
                ShellCommand::Login => self.login(AuthMode::Password),
                ShellCommand::Sso => self.login(AuthMode::Sso),
                ShellCommand::Query(kind) => self.query_interactively(kind),
                ShellCommand::Export { path, format } => self.export(&path, format),
                ShellCommand::Logout => {
                    self.logout();
                    Ok(())
                }
                ShellCommand::WhoAmI => {
                    match self.workspace.session() {
                        Some(session) => println!(
                            "Logged in as {} ({})",
                            session.display_name(),
                            session.instance_url()
                        ),
                        None => println!("Not logged in."),
                    }
                    Ok(())
                }
            };

            if let Err(error) = outcome {
                eprintln!("error: {error}");
            }
        }
        Ok(())
    }

    fn one_shot(&mut self, args: QueryArgs) -> Result<()> {
        self.login(self.auth)?;
        let terms = SearchTerms::new(args.address, args.phone);
        self.query(args.kind.into(), &terms)?;
        if let Some(output) = args.output {
            self.export(&output, args.format.map(ExportFormat::from))?;
        }
        Ok(())
    }

    fn login(&mut self, mode: AuthMode) -> Result<()> {
        let mode = match mode {
            AuthMode::Password => {
                LoginMode::Credentials(session::ask_credentials(&self.prompt)?)
            }
            AuthMode::Sso => LoginMode::OAuth(OAuthFlow {
                registration: &self.registration,
                browser: &self.browser,
                prompt: &self.prompt,
            }),
        };

        let session = self.workspace.login(mode)?;
        if session.display_name().is_empty() {
            println!("Connected to {}.", session.instance_url());
        } else {
            println!("You're now logged in, {}!", session.display_name());
        }
        Ok(())
    }

    fn query_interactively(&mut self, kind: Option<QueryKind>) -> Result<()> {
        let kind = match kind {
            Some(kind) => kind,
            None => self.ask_kind()?,
        };
        let address = self
            .prompt
            .ask_line("Street address:")
            .ok_or(LookupError::UserCancelled)?;
        let zip_or_phone = self
            .prompt
            .ask_line("Zip code / phone (for phone line details):")
            .ok_or(LookupError::UserCancelled)?;
        self.query(kind, &SearchTerms::new(address, zip_or_phone))
    }

    fn ask_kind(&self) -> Result<QueryKind> {
        for (idx, kind) in QueryKind::ALL.iter().enumerate() {
            println!("  {}. {kind}", idx + 1);
        }
        let answer = self
            .prompt
            .ask_line("Query:")
            .ok_or(LookupError::UserCancelled)?;
        let by_number = answer
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|number| number.checked_sub(1))
            .and_then(|idx| QueryKind::ALL.get(idx).copied());
        match by_number {
            Some(kind) => Ok(kind),
            None => answer.parse().map_err(LookupError::InvalidInput),
        }
    }

    fn query(&mut self, kind: QueryKind, terms: &SearchTerms) -> Result<()> {
        match self.workspace.run_query(kind, terms)? {
            QueryOutcome::Rows(table) => {
                print!("{}", render_table(table, DEFAULT_MAX_WIDTH));
                println!("{} record(s).", table.len());
            }
            QueryOutcome::NoResults => println!("No matching records found."),
        }
        Ok(())
    }

    fn export(&self, path: &std::path::Path, format: Option<ExportFormat>) -> Result<()> {
        let (path, format) = io::resolve_destination(path, format)?;
        self.workspace.export(&path, format)?;
        println!("Data saved to {}", path.display());
        Ok(())
    }

    fn logout(&mut self) {
        match self.workspace.logout(&self.prompt) {
            LogoutOutcome::NotLoggedIn => println!("Not logged in."),
            LogoutOutcome::Kept => {}
            LogoutOutcome::LoggedOut => println!("You have been successfully logged out."),
        }
    }
}
