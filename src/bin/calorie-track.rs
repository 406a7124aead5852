use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use calorie_track::catalog::{Catalog, Selection};
use calorie_track::models::{Food, Meal};
use calorie_track::CalorieTrack;

#[derive(Parser)]
#[command(name = "calorie-track")]
#[command(version)]
#[command(about = "Track today's calories against your daily goal", long_about = None)]
struct Cli {
    /// Account email
    #[arg(long, env = "CALORIE_TRACK_EMAIL", global = true)]
    email: Option<String>,

    /// Account password
    #[arg(long, env = "CALORIE_TRACK_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup,

    /// Show today's meals, entries and progress
    Today,

    /// Search the built-in food list
    Foods {
        /// Part of a food name
        query: String,
    },

    /// Log foods for today
    Add {
        /// Meal name (defaults to the first meal)
        #[arg(long, short)]
        meal: Option<String>,

        /// Catalog food names, or `name=calories` for anything else
        #[arg(required = true)]
        foods: Vec<String>,
    },

    /// Show or edit the profile
    Profile {
        #[command(subcommand)]
        command: Option<ProfileCommand>,
    },

    /// Upload a profile picture
    Avatar {
        /// Image file
        file: PathBuf,
    },

    /// Manage meals
    Meal {
        #[command(subcommand)]
        command: MealCommand,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Print the profile
    Show,

    /// Save username and daily calorie goal
    Set {
        #[arg(long)]
        username: String,

        #[arg(long)]
        goal: u32,
    },
}

#[derive(Subcommand)]
enum MealCommand {
    /// Create a meal
    New {
        name: String,

        #[arg(long, default_value = "🍽️")]
        icon: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = CalorieTrack::from_env().context("failed to configure client")?;

    let email = cli.email.ok_or_else(|| anyhow!("--email is required"))?;
    let password = cli
        .password
        .ok_or_else(|| anyhow!("--password is required"))?;

    if let Commands::Signup = cli.command {
        let response = app.auth().sign_up(&email, &password).await?;
        match response.session {
            Some(_) => println!("Account created, you are signed in."),
            None => println!("Check your email for the confirmation link."),
        }
        return Ok(());
    }

    let session = app
        .auth()
        .sign_in_with_password(&email, &password)
        .await
        .context("sign in failed")?;
    app.store().refresh(session.user.id).await;

    let result = run(&app, cli.command, &email).await;
    if let Err(e) = app.auth().sign_out().await {
        tracing::warn!(error = %e, "sign out failed");
    }
    result
}

async fn run(app: &CalorieTrack, command: Commands, email: &str) -> anyhow::Result<()> {
    let store = app.store();

    match command {
        Commands::Signup => bail!("already signed in as {}", email),
        Commands::Today => {
            let summary = store.daily_summary();
            println!(
                "{} / {} kcal ({:.0}%)",
                summary.consumed, summary.goal, summary.progress_percent
            );
            let entries = store.food_entries();
            for meal in store.meal_summaries() {
                let icon = meal.meal.icon.as_deref().unwrap_or("");
                println!("{} {} ({} kcal)", icon, meal.meal.name, meal.calories);
                for entry in entries.iter().filter(|e| e.meal_id == meal.meal.id) {
                    println!("    {:<28} {:>5}", entry.name, entry.calories);
                }
            }
        }
        Commands::Foods { query } => {
            for food in Catalog::default().search(&query) {
                println!("{:<28} {:>5}", food.name, food.calories);
            }
        }
        Commands::Add { meal, foods } => {
            let catalog = Catalog::default();
            let meals = store.meals();
            let mut selection = match meal {
                Some(name) => Selection::new().for_meal(find_meal(&meals, &name)?),
                None => Selection::new(),
            };
            for arg in &foods {
                selection.add(parse_food(&catalog, arg)?);
            }

            let meal_name = selection.meal_name(&meals).to_string();
            let report = selection.save(store).await?;
            println!(
                "Added {} item(s), {} kcal to {}",
                report.saved, report.calories, meal_name
            );
            if report.failed > 0 {
                bail!("{} item(s) could not be saved", report.failed);
            }
        }
        Commands::Profile { command } => match command.unwrap_or(ProfileCommand::Show) {
            ProfileCommand::Show => {
                let profile = store.profile().unwrap_or_default();
                let name = app.profiles().display_name(Some(email)).unwrap_or_default();
                println!("Name:   {}", name);
                println!("Goal:   {} kcal", store.calorie_goal());
                if let Some(url) = profile.avatar_url {
                    println!("Avatar: {}", url);
                }
            }
            ProfileCommand::Set { username, goal } => {
                app.profiles().save_profile(&username, goal).await?;
                println!("Profile updated");
            }
        },
        Commands::Avatar { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("invalid file name"))?;
            let url = app.profiles().upload_avatar(file_name, bytes).await?;
            println!("{}", url);
        }
        Commands::Meal {
            command: MealCommand::New { name, icon },
        } => {
            let meal = store.create_meal(&name, &icon).await?;
            println!("Created {}", meal.name);
        }
    }

    Ok(())
}

fn find_meal(meals: &[Meal], name: &str) -> anyhow::Result<Uuid> {
    meals
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
        .map(|m| m.id)
        .ok_or_else(|| anyhow!("no meal named '{}'", name))
}

fn parse_food(catalog: &Catalog, arg: &str) -> anyhow::Result<Food> {
    if let Some((name, calories)) = arg.rsplit_once('=') {
        let calories = calories
            .trim()
            .parse()
            .with_context(|| format!("invalid calories in '{}'", arg))?;
        return Ok(Food::new(name.trim(), calories));
    }
    catalog
        .find(arg)
        .cloned()
        .ok_or_else(|| anyhow!("'{}' is not in the food list; use name=calories", arg))
}
