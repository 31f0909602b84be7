//! Clap CLI definitions for the `kb` command.
//!
//! One subcommand per operation group the engine exposes: `create`, `show`,
//! `list`, `update`, `delete`, `search`, `tag`, `status`, `type`, `state`,
//! `move`, `rebuild`, plus `init` and `version`.

use clap::{Args, Parser, Subcommand};

/// kb -- local knowledge-base engine.
#[derive(Parser, Debug)]
#[command(
    name = "kb",
    about = "Local knowledge-base engine: Markdown files with a SQLite search index",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to a config file (default: `KB_CONFIG` env, then `.kb/config.yaml`
    /// discovered by walking up from the current directory).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output machine-readable JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug logging on stderr.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a data root in the current directory.
    Init(InitArgs),

    /// Print version, build info, and platform.
    Version,

    /// Create a new item.
    Create(CreateArgs),

    /// Show one item's full detail.
    Show(ShowArgs),

    /// List item summaries for a type.
    List(ListArgs),

    /// Update fields on an existing item.
    Update(UpdateArgs),

    /// Delete an item.
    Delete(DeleteArgs),

    /// Full-text search across items.
    Search(SearchArgs),

    /// Manage tags and tag-filtered search.
    Tag(TagArgs),

    /// Read-only access to the workflow status registry.
    Status(StatusArgs),

    /// Manage registered item types.
    #[command(name = "type")]
    TypeCmd(TypeArgs),

    /// Read or overwrite the singleton current-state artifact.
    State(StateArgs),

    /// Move an item to a different type of the same base kind.
    #[command(name = "move")]
    MoveCmd(MoveArgs),

    /// Drop and reconstruct the index from the Markdown tree.
    Rebuild(RebuildArgs),
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Data root to initialize (default: current directory).
    pub path: Option<String>,
}

// ---------------------------------------------------------------------------
// create
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Item type (e.g. issues, docs, sessions, dailies).
    #[arg(short = 't', long = "type")]
    pub type_name: String,

    /// Item title (positional argument).
    pub title: Option<String>,

    /// Item title (alternative to the positional argument).
    #[arg(long = "title")]
    pub title_flag: Option<String>,

    /// Short description.
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Markdown body.
    #[arg(short = 'c', long)]
    pub content: Option<String>,

    /// Priority (high|medium|low); required for tasks-kind types.
    #[arg(short = 'p', long)]
    pub priority: Option<String>,

    /// Status name; required for tasks-kind types.
    #[arg(short = 's', long)]
    pub status: Option<String>,

    /// Tag to attach (repeatable).
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Start date (tasks-kind only), `YYYY-MM-DD`.
    #[arg(long)]
    pub start_date: Option<String>,

    /// End date (tasks-kind only), `YYYY-MM-DD`.
    #[arg(long)]
    pub end_date: Option<String>,

    /// Related item reference `type-id` (repeatable).
    #[arg(long = "related")]
    pub related: Vec<String>,

    /// Explicit id: the date for `dailies` (`YYYY-MM-DD`), or a caller-chosen
    /// timestamp id for `sessions`. Ignored for numeric-id types.
    #[arg(long)]
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Item type.
    #[arg(short = 't', long = "type")]
    pub type_name: String,

    /// Item id.
    pub id: String,
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Item type.
    #[arg(short = 't', long = "type")]
    pub type_name: String,

    /// Include closed-status items (tasks-kind types only; excluded by default).
    #[arg(long)]
    pub include_closed: bool,

    /// Restrict to these status names (repeatable); overrides --include-closed.
    #[arg(long = "status")]
    pub statuses: Vec<String>,

    /// Inclusive start of the date range (by id for sessions/dailies, by
    /// `updated_at` otherwise).
    #[arg(long)]
    pub start_date: Option<String>,

    /// Inclusive end of the date range.
    #[arg(long)]
    pub end_date: Option<String>,

    /// Maximum number of results.
    #[arg(long)]
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// update
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Item type.
    #[arg(short = 't', long = "type")]
    pub type_name: String,

    /// Item id.
    pub id: String,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New description.
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Clear the description.
    #[arg(long)]
    pub clear_description: bool,

    /// New Markdown body.
    #[arg(short = 'c', long)]
    pub content: Option<String>,

    /// Clear the content.
    #[arg(long)]
    pub clear_content: bool,

    /// New priority (high|medium|low).
    #[arg(short = 'p', long)]
    pub priority: Option<String>,

    /// New status.
    #[arg(short = 's', long)]
    pub status: Option<String>,

    /// Replace the full tag set (repeatable).
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// New start date.
    #[arg(long)]
    pub start_date: Option<String>,

    /// Clear the start date.
    #[arg(long)]
    pub clear_start_date: bool,

    /// New end date.
    #[arg(long)]
    pub end_date: Option<String>,

    /// Clear the end date.
    #[arg(long)]
    pub clear_end_date: bool,

    /// Replace the full related-reference set (repeatable).
    #[arg(long = "related")]
    pub related: Vec<String>,
}

// ---------------------------------------------------------------------------
// delete
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Item type.
    #[arg(short = 't', long = "type")]
    pub type_name: String,

    /// Item id.
    pub id: String,
}

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Boolean full-text query (`title:x AND -content:y`, etc), or a title
    /// prefix when `--suggest` is given.
    pub query: String,

    /// Restrict to one or more item types; repeat for more than one.
    #[arg(short = 't', long = "type")]
    pub types: Vec<String>,

    /// Maximum number of results.
    #[arg(long)]
    pub limit: Option<i64>,

    /// Skip this many leading results.
    #[arg(long)]
    pub offset: Option<i64>,

    /// Title-prefix autocomplete instead of a full-text query.
    #[arg(long)]
    pub suggest: bool,
}

// ---------------------------------------------------------------------------
// tag
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct TagArgs {
    #[command(subcommand)]
    pub command: TagCommand,
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// List every registered tag.
    List,

    /// Create a tag (tags are also created implicitly on first use).
    Create { name: String },

    /// Delete a tag; fails if still attached to an item unless --force.
    Delete {
        name: String,
        #[arg(long)]
        force: bool,
    },

    /// Substring-search tag names for autocomplete.
    Search {
        prefix: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// List items carrying a tag, grouped by type.
    Items {
        name: String,
        #[arg(short = 't', long = "type")]
        types: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(subcommand)]
    pub command: StatusCommand,
}

#[derive(Subcommand, Debug)]
pub enum StatusCommand {
    /// List the fixed set of workflow statuses.
    List,
}

// ---------------------------------------------------------------------------
// type
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct TypeArgs {
    #[command(subcommand)]
    pub command: TypeCommand,
}

#[derive(Subcommand, Debug)]
pub enum TypeCommand {
    /// List every registered type.
    List,

    /// Register a new type.
    Create {
        name: String,
        /// Base kind: tasks|documents|sessions.
        #[arg(long = "base-kind")]
        base_kind: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a type; fails for built-ins or types that still have items.
    Delete { name: String },
}

// ---------------------------------------------------------------------------
// state
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct StateArgs {
    #[command(subcommand)]
    pub command: StateCommand,
}

#[derive(Subcommand, Debug)]
pub enum StateCommand {
    /// Print the current-state artifact.
    Show,

    /// Overwrite the current-state artifact.
    Set {
        content: String,
        #[arg(long = "related")]
        related: Vec<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        updated_by: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// move
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Source item type.
    #[arg(long = "from-type")]
    pub from_type: String,

    /// Source item id.
    #[arg(long = "from-id")]
    pub from_id: String,

    /// Destination type (must share the source's base kind).
    #[arg(long = "to-type")]
    pub to_type: String,
}

// ---------------------------------------------------------------------------
// rebuild
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct RebuildArgs {}
