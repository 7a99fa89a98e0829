use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "sygaldry",
    about = "Add LLM agents, tools and prompt templates to your project from a component registry",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/sygaldry/logs/sygaldry.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to settings.yaml config file")]
    pub config: Option<PathBuf>,

    /// Project directory (defaults to the current directory)
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create sygaldry.json and the component directories
    Init {
        /// Overwrite an existing sygaldry.json
        #[arg(long)]
        force: bool,

        /// Directory for agents
        #[arg(long)]
        agent_dir: Option<String>,

        /// Directory for tools
        #[arg(long)]
        tool_dir: Option<String>,

        /// Default LLM provider written to the config
        #[arg(long)]
        provider: Option<String>,

        /// Default model written to the config
        #[arg(long)]
        model: Option<String>,

        /// Registry index URL or path for the default source
        #[arg(long)]
        registry: Option<String>,
    },

    /// Add a component (name, name@version, or manifest URL) to the project
    Add {
        /// Component identifier
        component: String,

        /// Only look in this registry source
        #[arg(long, short = 's')]
        source: Option<String>,

        /// LLM provider substituted into templates
        #[arg(long)]
        provider: Option<String>,

        /// Model substituted into templates
        #[arg(long)]
        model: Option<String>,

        /// Enable streaming responses in templates
        #[arg(long)]
        stream: bool,

        /// Enable Lilypad tracing in components that support it
        #[arg(long)]
        with_lilypad: bool,

        /// Extra template variable (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Overwrite the component if it already exists
        #[arg(long, short = 'f')]
        force: bool,

        /// Don't add registry dependencies
        #[arg(long)]
        no_deps: bool,

        /// Show what would be written without writing
        #[arg(long)]
        dry_run: bool,

        /// Report format (default: text)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// List components available in the registry
    List {
        /// Filter by component type
        #[arg(long, short = 't')]
        r#type: Option<String>,

        /// Only list this registry source
        #[arg(long, short = 's')]
        source: Option<String>,

        /// List components installed in this project instead
        #[arg(long)]
        installed: bool,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Search registry components by name, description or tag
    Search {
        /// Search query
        query: String,

        /// Filter by component type
        #[arg(long, short = 't')]
        r#type: Option<String>,

        /// Only search this registry source
        #[arg(long, short = 's')]
        source: Option<String>,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Build a registry index.json from component manifests
    Build {
        /// Registry root to scan
        #[arg(default_value = "packages/sygaldry_registry")]
        registry_dir: PathBuf,

        /// Where to write the index (defaults to <registry_dir>/index.json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Validate manifests without writing the index
        #[arg(long)]
        check: bool,
    },

    /// Component documentation
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Manage registry sources
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum DocsAction {
    /// Generate sygaldry.md for each component
    Generate {
        /// Directory to scan (defaults to the project's component directories)
        path: Option<PathBuf>,

        /// Only this component type
        #[arg(long, short = 't')]
        r#type: Option<String>,

        /// Overwrite existing sygaldry.md files
        #[arg(long, short = 'f')]
        force: bool,

        /// Report without writing
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum SourceAction {
    /// Add or replace a registry source
    Add {
        /// Source name
        name: String,

        /// Index URL or path
        url: String,

        /// Lookup priority (lower is searched first, default 100)
        #[arg(long)]
        priority: Option<i32>,

        /// Add the source disabled
        #[arg(long)]
        disabled: bool,
    },

    /// List registry sources
    List {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Remove a registry source
    Remove {
        /// Source name
        name: String,
    },
}
