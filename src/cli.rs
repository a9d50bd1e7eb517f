use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task
    Add {
        #[arg(value_name = "TEXT")]
        text: String,
    },
    /// List all tasks
    List,
    /// Mark a task as completed
    Done {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Mark a task as not completed
    Undone {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Replace the text of a task
    Edit {
        #[arg(value_name = "ID")]
        id: i64,
        #[arg(value_name = "TEXT")]
        text: String,
    },
    /// Remove a task
    Rm {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Replace the tags of a task
    Tag {
        #[arg(value_name = "ID")]
        id: i64,
        #[arg(value_name = "TAGS")]
        tags: Vec<String>,
    },
    /// Fuzzy-search tasks by text
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
    },
    /// Remove all tasks (WARNING: deletes everything)
    Clear,
    /// Launch TUI interface
    Tui,
    /// Generate shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}
