use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod db;
mod models;
mod report;
mod score;

use models::{MatchCandidate, UserProfile};
use score::FixedRating;

#[derive(Parser)]
#[command(name = "peer-mentor-matching")]
#[command(about = "Mentor-learner match scorer for the peer mentoring platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import a user/skill roster from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Rank mentors for a learner and a requested skill
    Match {
        #[arg(long)]
        learner: String,
        #[arg(long)]
        skill: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show the full score breakdown for one learner/mentor pair
    Detail {
        #[arg(long)]
        learner: String,
        #[arg(long)]
        mentor: String,
        #[arg(long)]
        skill: String,
    },
    /// Generate a markdown match report
    Report {
        #[arg(long)]
        learner: String,
        #[arg(long)]
        skill: String,
        #[arg(long, default_value = "matches.md")]
        out: PathBuf,
    },
    /// Export recorded match history as CSV training data
    ExportMatches {
        #[arg(long, default_value = "match-history.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Imported {inserted} skill records from {}.", csv.display());
        }
        Commands::Match {
            learner,
            skill,
            limit,
        } => {
            let learner = db::find_user_by_email(&pool, &learner).await?;
            let skill_id = db::find_skill_by_name(&pool, &skill).await?;
            let candidates = score_candidates(&pool, &learner, skill_id).await?;

            if candidates.is_empty() {
                println!("No mentors offer this skill.");
                return Ok(());
            }

            println!("Top mentors for {} requesting {}:", learner.full_name, skill);
            for candidate in candidates.iter().take(limit) {
                println!(
                    "- {} ({}) score {:.2} ({})",
                    candidate.mentor.full_name,
                    candidate.mentor.email,
                    candidate.result.total_score,
                    score::recommendation(candidate.result.total_score)
                );
            }
        }
        Commands::Detail {
            learner,
            mentor,
            skill,
        } => {
            let learner = db::find_user_by_email(&pool, &learner).await?;
            let mentor = db::find_user_by_email(&pool, &mentor).await?;
            let skill_id = db::find_skill_by_name(&pool, &skill).await?;

            let inputs = db::load_match_inputs(&pool, &learner, &mentor, skill_id).await?;
            let result = score::score_match(&inputs, &FixedRating);

            if let Some(needed) = &inputs.learner_needed {
                println!(
                    "Learner self-assessed proficiency: {}/5",
                    needed.proficiency_level
                );
            }
            println!(
                "{} -> {} for {}: {:.2} ({})",
                learner.full_name,
                mentor.full_name,
                skill,
                result.total_score,
                score::recommendation(result.total_score)
            );
            for (label, factor) in [
                ("skills", &result.breakdown.skills),
                ("campus", &result.breakdown.campus),
                ("availability", &result.breakdown.availability),
                ("experience", &result.breakdown.experience),
                ("rating", &result.breakdown.rating),
            ] {
                println!(
                    "  {label}: score {:.2} x weight {:.2} = {:.3}",
                    factor.score, factor.weight, factor.contribution
                );
            }
        }
        Commands::Report {
            learner,
            skill,
            out,
        } => {
            let learner = db::find_user_by_email(&pool, &learner).await?;
            let skill_id = db::find_skill_by_name(&pool, &skill).await?;
            let candidates = score_candidates(&pool, &learner, skill_id).await?;
            let report = report::build_report(&learner, &skill, &candidates);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::ExportMatches { out } => {
            let matches = db::fetch_match_history(&pool).await?;
            let mut writer = csv::Writer::from_path(&out)?;
            writer.write_record([
                "learner_email",
                "mentor_email",
                "skill_name",
                "total_score",
                "breakdown",
                "created_at",
            ])?;
            for record in &matches {
                let total = format!("{:.2}", record.total_score);
                let breakdown = record.breakdown.to_string();
                let created_at = record.created_at.to_rfc3339();
                writer.write_record([
                    record.learner_email.as_str(),
                    record.mentor_email.as_str(),
                    record.skill_name.as_str(),
                    total.as_str(),
                    breakdown.as_str(),
                    created_at.as_str(),
                ])?;
            }
            writer.flush()?;
            println!("Exported {} matches to {}.", matches.len(), out.display());
        }
    }

    Ok(())
}

/// Score every mentor offering the skill, record each result for training
/// data, and return the candidates sorted by total score descending.
async fn score_candidates(
    pool: &PgPool,
    learner: &UserProfile,
    skill_id: uuid::Uuid,
) -> anyhow::Result<Vec<MatchCandidate>> {
    let mentors = db::fetch_candidates(pool, skill_id, learner.user_id).await?;
    let mut candidates = Vec::with_capacity(mentors.len());

    for mentor in mentors {
        let inputs = db::load_match_inputs(pool, learner, &mentor, skill_id).await?;
        let result = score::score_match(&inputs, &FixedRating);

        // Training-data collection only; never fail a scoring pass over it.
        if let Err(error) =
            db::record_match(pool, learner.user_id, mentor.user_id, skill_id, &result).await
        {
            eprintln!("warning: failed to record match: {error:#}");
        }

        candidates.push(MatchCandidate { mentor, result });
    }

    candidates.sort_by(|a, b| {
        b.result
            .total_score
            .partial_cmp(&a.result.total_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(candidates)
}
