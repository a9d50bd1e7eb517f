mod cli;
mod models;
mod repo;
mod store;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use fuzzy_matcher::FuzzyMatcher;

use cli::{Cli, Commands};
use models::{Task, TaskPatch};
use repo::TaskRepository;
use store::JsonFileStore;
use ui::run_tui;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let repo = TaskRepository::new(JsonFileStore::new());

    match cli.command {
        Some(Commands::Add { text }) => {
            if repo.add(&text) {
                println!("Task added successfully");
            } else {
                println!("Error: task text cannot be empty");
            }
        }
        Some(Commands::List) => {
            print_tasks(&repo.list());
        }
        Some(Commands::Done { id }) => {
            if repo.update_by_id(id, &TaskPatch::completed(true)) {
                println!("Task {} marked as completed", id);
            } else {
                println!("Task {} not found", id);
            }
        }
        Some(Commands::Undone { id }) => {
            if repo.update_by_id(id, &TaskPatch::completed(false)) {
                println!("Task {} marked as not completed", id);
            } else {
                println!("Task {} not found", id);
            }
        }
        Some(Commands::Edit { id, text }) => {
            if repo.update_by_id(id, &TaskPatch::text(text)) {
                println!("Task {} updated", id);
            } else {
                println!("Task {} not found (or replacement text was empty)", id);
            }
        }
        Some(Commands::Rm { id }) => {
            if repo.remove_by_id(id) {
                println!("Task {} removed", id);
            } else {
                println!("Task {} not found", id);
            }
        }
        Some(Commands::Tag { id, tags }) => {
            if repo.update_by_id(id, &TaskPatch::tags(tags)) {
                println!("Task {} tags updated", id);
            } else {
                println!("Task {} not found", id);
            }
        }
        Some(Commands::Search { query }) => {
            let tasks = repo.list();
            let matches = search_tasks(&tasks, &query);
            if matches.is_empty() {
                println!("No matches found for '{}'", query);
            } else {
                print_tasks(&matches.into_iter().cloned().collect::<Vec<_>>());
            }
        }
        Some(Commands::Clear) => {
            if repo.clear() {
                println!("All tasks cleared successfully!");
            } else {
                println!("Error: could not clear tasks");
            }
        }
        Some(Commands::Tui) => {
            run_tui(repo)?;
        }
        Some(Commands::Completions { shell }) => {
            use clap_complete::{generate, Shell};
            let shell = shell.to_lowercase();
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "elvish" => Shell::Elvish,
                "powershell" => Shell::PowerShell,
                _ => {
                    println!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "tend", &mut std::io::stdout());
        }
        None => {
            // Default behavior: launch TUI
            run_tui(repo)?;
        }
    }

    Ok(())
}

fn print_tasks(tasks: &[Task]) {
    println!("Tasks:");
    println!("------");
    if tasks.is_empty() {
        println!("(none)");
        return;
    }
    for task in tasks {
        let mark = if task.completed { "x" } else { " " };
        if task.tags.is_empty() {
            println!("{} | [{}] {} | Created: {}", task.id, mark, task.text, task.created_at);
        } else {
            println!(
                "{} | [{}] {} | Tags: {} | Created: {}",
                task.id,
                mark,
                task.text,
                task.tags.join(", "),
                task.created_at
            );
        }
    }
}

/// Fuzzy-matches tasks by text, best matches first.
fn search_tasks<'a>(tasks: &'a [Task], query: &str) -> Vec<&'a Task> {
    let matcher = fuzzy_matcher::skim::SkimMatcherV2::default();
    let mut scored: Vec<(i64, &Task)> = tasks
        .iter()
        .filter_map(|task| matcher.fuzzy_match(&task.text, query).map(|score| (score, task)))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, task)| task).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: i64, text: &str) -> Task {
        Task {
            id,
            text: text.to_string(),
            completed: false,
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn search_ranks_closer_matches_first() {
        let tasks = vec![
            sample(1, "Buy milk"),
            sample(2, "Call the bank"),
            sample(3, "milk the cows"),
        ];

        let results = search_tasks(&tasks, "milk");
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|t| t.text.contains("milk")));
    }

    #[test]
    fn search_returns_empty_for_no_match() {
        let tasks = vec![sample(1, "Buy milk")];
        assert!(search_tasks(&tasks, "zzzzqq").is_empty());
    }
}
