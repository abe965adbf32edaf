use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Password, Select};
use wanderplan_core::config::{self, Config, DEFAULT_AZURE_API_VERSION};

const BANNER: &str = r"
    -------------------------------------

     w a n d e r p l a n

     trips that fit every age

    -------------------------------------
";

const DEPLOYMENTS: [&str; 4] = ["gpt-4.1", "gpt-4o", "gpt-4o-mini", "Other..."];

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

fn optional_secret(prompt: &str) -> Result<Option<String>> {
    let value = Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .context("Failed to read secret")?;
    Ok((!value.trim().is_empty()).then(|| value.trim().to_string()))
}

fn setup_endpoint(existing: Option<&str>) -> Result<String> {
    let mut input = Input::<String>::new()
        .with_prompt("Azure OpenAI endpoint (ENDPOINT_URL)")
        .validate_with(|url: &String| {
            if url.starts_with("https://") || url.starts_with("http://") {
                Ok(())
            } else {
                Err("Endpoint must be an http(s) URL")
            }
        });
    if let Some(existing) = existing {
        input = input.default(existing.to_string());
    }
    input.interact_text().context("Failed to read endpoint")
}

fn setup_deployment() -> Result<String> {
    let selection = Select::new()
        .with_prompt("Select your deployment (DEPLOYMENT_NAME)")
        .items(&DEPLOYMENTS)
        .default(0)
        .interact()
        .context("Failed to select deployment")?;

    if selection + 1 < DEPLOYMENTS.len() {
        return Ok(DEPLOYMENTS[selection].to_string());
    }

    let name: String = Input::new()
        .with_prompt("Deployment name")
        .interact_text()
        .context("Failed to read deployment name")?;

    if name.trim().is_empty() {
        return Err(anyhow::anyhow!("Deployment name cannot be empty"));
    }
    Ok(name.trim().to_string())
}

pub fn run_onboard() -> Result<Config> {
    println!("{}", style(BANNER).cyan().bold());

    println!("  {}", style("Welcome to wanderplan!").white().bold());
    println!(
        "  {}",
        style("Values from the environment or .env still take precedence over this file.").dim()
    );
    println!();

    let mut config = if config::config_exists() {
        config::load_config_from(&config::get_config_path())?
    } else {
        Config::default()
    };

    print_step(1, 3, "Azure OpenAI");
    config.azure_endpoint = Some(setup_endpoint(config::non_empty(&config.azure_endpoint))?);
    config.azure_deployment = Some(setup_deployment()?);
    config.azure_api_version = Input::new()
        .with_prompt("API version")
        .default(DEFAULT_AZURE_API_VERSION.to_string())
        .interact_text()
        .context("Failed to read API version")?;

    print_step(2, 3, "Credentials");
    println!(
        "  {}",
        style("Leave blank to keep secrets in AZURE_OPENAI_API_KEY / PERPLEXITY_API_KEY.").dim()
    );
    if let Some(key) = optional_secret("Azure OpenAI API key")? {
        config.azure_api_key = Some(key);
    }
    if let Some(key) = optional_secret("Perplexity API key")? {
        config.perplexity_api_key = Some(key);
    }

    print_step(3, 3, "Server");
    config.port = Input::new()
        .with_prompt("Port for `wanderplan serve`")
        .default(config.port)
        .interact_text()
        .context("Failed to read port")?;

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} Config saved to {}",
        style("→").green(),
        style(config::get_config_path().display()).cyan()
    );
    println!();
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("wanderplan chat").cyan().bold()
    );
    println!();

    Ok(config)
}
