use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::sync::Arc;
use termimad::MadSkin;
use tracing::debug;
use wanderplan_core::config::Config;
use wanderplan_core::providers::{create_model_client, create_search};
use wanderplan_core::{TravelGroupSpec, TripPlanner};

const BUDGETS: [&str; 4] = ["(skip)", "low", "medium", "high"];

fn print_step(step: usize, total: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, total, title))
            .cyan()
            .bold()
    );
    println!();
}

pub fn parse_ages(raw: &str) -> Result<Vec<u32>, String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| format!("'{part}' is not a valid age"))
        })
        .collect()
}

fn optional_text(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn ask_ages(prompt: &str) -> Result<Vec<u32>> {
    let raw: String = Input::new()
        .with_prompt(prompt)
        .validate_with(|input: &String| parse_ages(input).map(|_| ()))
        .interact_text()
        .context("Failed to read ages")?;
    parse_ages(&raw).map_err(anyhow::Error::msg)
}

fn collect_group() -> Result<TravelGroupSpec> {
    let total = 3;

    print_step(1, total, "Group");
    let total_persons: u32 = Input::new()
        .with_prompt("How many persons are traveling?")
        .default(2)
        .validate_with(|n: &u32| {
            if *n >= 1 {
                Ok(())
            } else {
                Err("At least one person must travel")
            }
        })
        .interact_text()
        .context("Failed to read group size")?;
    let with_children = Confirm::new()
        .with_prompt("Traveling with children?")
        .default(false)
        .interact()?;
    let with_seniors = Confirm::new()
        .with_prompt("Traveling with senior citizens?")
        .default(false)
        .interact()?;

    let mut group = TravelGroupSpec::new(total_persons);

    print_step(2, total, "Ages");
    if with_children {
        group.children = ask_ages("Ages of children (e.g. 4, 9)")?;
    }
    if with_seniors {
        group.seniors = ask_ages("Ages of senior citizens (e.g. 68, 72)")?;
    }
    if !with_children && !with_seniors {
        println!("  {}", style("Young adults only, nothing to add.").dim());
    }

    print_step(3, total, "Details");
    let destination: String = Input::new()
        .with_prompt("Destination (optional)")
        .allow_empty(true)
        .interact_text()?;
    group.destination_hint = optional_text(destination);

    let days: String = Input::new()
        .with_prompt("Trip length in days (optional)")
        .allow_empty(true)
        .validate_with(|input: &String| match input.trim() {
            "" => Ok(()),
            value => match value.parse::<u32>() {
                Ok(d) if d >= 1 => Ok(()),
                _ => Err("Enter a whole number of at least 1"),
            },
        })
        .interact_text()?;
    group.days = days.trim().parse().ok();

    let budget = Select::new()
        .with_prompt("Budget level (optional)")
        .items(&BUDGETS)
        .default(0)
        .interact()?;
    group.budget_level = (budget > 0).then(|| BUDGETS[budget].to_string());

    Ok(group)
}

pub async fn run(config: &Config) -> Result<()> {
    let search = Arc::new(create_search(config)?);
    let model = Arc::new(create_model_client(config)?);
    let planner = TripPlanner::new(search, model, config.planner);
    let skin = MadSkin::default();

    loop {
        let group = collect_group()?;

        println!();
        println!("{}", style("Planning your trip...").dim());
        match planner.plan(&group).await {
            Ok(plan) => {
                println!();
                skin.print_text(&plan);
                println!();
            }
            Err(e) => {
                debug!(error = ?e, "trip planning failed");
                eprintln!("{} {}", style("✗").red(), e);
            }
        }

        let again = Confirm::new()
            .with_prompt("Plan another?")
            .default(false)
            .interact()?;
        if !again {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ages_accept_commas_and_spaces() {
        assert_eq!(parse_ages("4, 9 12").unwrap(), vec![4, 9, 12]);
        assert_eq!(parse_ages("  ").unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn ages_reject_non_numbers() {
        let err = parse_ages("4, ten").unwrap_err();
        assert!(err.contains("ten"));
    }

    #[test]
    fn blank_text_is_none() {
        assert_eq!(optional_text("  ".into()), None);
        assert_eq!(optional_text(" Kyoto ".into()), Some("Kyoto".into()));
    }
}
