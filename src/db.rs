use anyhow::Context;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    MatchResult, RatingInputs, RecordedMatch, SkillRecord, SkillType, UserProfile,
};
use crate::score::MatchInputs;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let users = vec![
        (
            Uuid::parse_str("8e1f7c2a-5b7d-4b1e-9c3a-2f6d8a913b54")?,
            "Priya Nair",
            "priya.nair@campus.edu",
            Some("North Campus"),
            Some(r#"[{"day":"monday","start":"14:00","end":"16:00"},{"day":"wednesday","start":"10:00","end":"12:00"}]"#),
        ),
        (
            Uuid::parse_str("1b9c4e6d-83a1-4f2b-b0d7-4c5e9f217a36")?,
            "Marcus Webb",
            "marcus.webb@campus.edu",
            Some("North Campus"),
            Some(r#"[{"day":"monday","start":"15:00","end":"17:00"},{"day":"friday","start":"09:00","end":"11:00"}]"#),
        ),
        (
            Uuid::parse_str("f42d8a17-6e3b-4c89-a5f1-9d0b2c648e73")?,
            "Sofia Reyes",
            "sofia.reyes@campus.edu",
            Some("South Campus"),
            Some(r#"[{"day":"tuesday","start":"13:00","end":"15:00"}]"#),
        ),
        (
            Uuid::parse_str("3a6b0d92-4f18-4e57-8c2d-b71e5a09f4c8")?,
            "Daniel Osei",
            "daniel.osei@campus.edu",
            None,
            None,
        ),
    ];

    for (id, full_name, email, campus, availability) in users {
        sqlx::query(
            r#"
            INSERT INTO peer_matching.users (id, full_name, email, campus, availability)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                campus = EXCLUDED.campus,
                availability = EXCLUDED.availability
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(email)
        .bind(campus)
        .bind(availability)
        .execute(pool)
        .await?;
    }

    let skills = vec!["Data Structures", "Web Development", "Statistics"];
    for name in &skills {
        sqlx::query(
            r#"
            INSERT INTO peer_matching.skills (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .execute(pool)
        .await?;
    }

    let user_skills = vec![
        ("marcus.webb@campus.edu", "Data Structures", "offered", 5),
        ("marcus.webb@campus.edu", "Web Development", "offered", 3),
        ("sofia.reyes@campus.edu", "Data Structures", "offered", 4),
        ("daniel.osei@campus.edu", "Statistics", "offered", 2),
        ("priya.nair@campus.edu", "Data Structures", "needed", 2),
        ("priya.nair@campus.edu", "Statistics", "needed", 1),
    ];

    for (email, skill_name, skill_type, proficiency_level) in user_skills {
        sqlx::query(
            r#"
            INSERT INTO peer_matching.user_skills (user_id, skill_id, skill_type, proficiency_level)
            SELECT u.id, s.id, $3, $4
            FROM peer_matching.users u, peer_matching.skills s
            WHERE u.email = $1 AND s.name = $2
            ON CONFLICT (user_id, skill_id, skill_type) DO UPDATE
            SET proficiency_level = EXCLUDED.proficiency_level
            "#,
        )
        .bind(email)
        .bind(skill_name)
        .bind(skill_type)
        .bind(proficiency_level)
        .execute(pool)
        .await?;
    }

    // Completed teaching history so the experience factor has signal.
    let sessions = vec![
        ("marcus.webb@campus.edu", "priya.nair@campus.edu", "Data Structures", "completed", Some(5)),
        ("marcus.webb@campus.edu", "sofia.reyes@campus.edu", "Data Structures", "completed", Some(4)),
        ("sofia.reyes@campus.edu", "priya.nair@campus.edu", "Data Structures", "completed", None),
        ("marcus.webb@campus.edu", "daniel.osei@campus.edu", "Web Development", "cancelled", None),
    ];

    for (mentor_email, learner_email, skill_name, status, mentor_rating) in sessions {
        let session_id = Uuid::new_v4();
        let inserted = sqlx::query(
            r#"
            INSERT INTO peer_matching.sessions (id, mentor_id, learner_id, skill_id, status, scheduled_at)
            SELECT $1, m.id, l.id, s.id, $5, now()
            FROM peer_matching.users m, peer_matching.users l, peer_matching.skills s
            WHERE m.email = $2 AND l.email = $3 AND s.name = $4
            "#,
        )
        .bind(session_id)
        .bind(mentor_email)
        .bind(learner_email)
        .bind(skill_name)
        .bind(status)
        .execute(pool)
        .await?;

        if inserted.rows_affected() > 0 {
            if let Some(rating) = mentor_rating {
                sqlx::query(
                    r#"
                    INSERT INTO peer_matching.session_feedback (session_id, mentor_rating)
                    VALUES ($1, $2)
                    ON CONFLICT (session_id) DO NOTHING
                    "#,
                )
                .bind(session_id)
                .bind(rating)
                .execute(pool)
                .await?;
            }
        }
    }

    Ok(())
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> anyhow::Result<UserProfile> {
    let row = sqlx::query(
        "SELECT id, full_name, email, campus, availability \
         FROM peer_matching.users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("no user with email {email}"))?;

    Ok(UserProfile {
        user_id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        campus: row.get("campus"),
        availability: row.get("availability"),
    })
}

pub async fn find_skill_by_name(pool: &PgPool, name: &str) -> anyhow::Result<Uuid> {
    let row = sqlx::query("SELECT id FROM peer_matching.skills WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("unknown skill \"{name}\""))?;
    Ok(row.get("id"))
}

pub async fn find_skill_record(
    pool: &PgPool,
    user_id: Uuid,
    skill_id: Uuid,
    skill_type: SkillType,
) -> anyhow::Result<Option<SkillRecord>> {
    let row = sqlx::query(
        "SELECT proficiency_level FROM peer_matching.user_skills \
         WHERE user_id = $1 AND skill_id = $2 AND skill_type = $3",
    )
    .bind(user_id)
    .bind(skill_id)
    .bind(skill_type.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| SkillRecord {
        skill_type,
        proficiency_level: row.get("proficiency_level"),
    }))
}

pub async fn count_completed_sessions(
    pool: &PgPool,
    mentor_id: Uuid,
    skill_id: Uuid,
) -> anyhow::Result<i64> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS session_count FROM peer_matching.sessions \
         WHERE mentor_id = $1 AND skill_id = $2 AND status = 'completed'",
    )
    .bind(mentor_id)
    .bind(skill_id)
    .fetch_one(pool)
    .await?;
    Ok(row.get("session_count"))
}

pub async fn fetch_rating_inputs(pool: &PgPool, mentor_id: Uuid) -> anyhow::Result<RatingInputs> {
    let row = sqlx::query(
        "SELECT AVG(f.mentor_rating)::FLOAT8 AS avg_rating, \
                COUNT(f.mentor_rating) AS rating_count \
         FROM peer_matching.sessions s \
         JOIN peer_matching.session_feedback f ON f.session_id = s.id \
         WHERE s.mentor_id = $1 AND s.status = 'completed'",
    )
    .bind(mentor_id)
    .fetch_one(pool)
    .await?;

    Ok(RatingInputs {
        avg_rating: row.get("avg_rating"),
        rating_count: row.get("rating_count"),
    })
}

/// Gather the full snapshot one score_match call consumes. Reads only; a
/// failed lookup is an infrastructure error and propagates, while missing
/// rows come back as None and degrade inside the scorer.
pub async fn load_match_inputs(
    pool: &PgPool,
    learner: &UserProfile,
    mentor: &UserProfile,
    skill_id: Uuid,
) -> anyhow::Result<MatchInputs> {
    let mentor_offered =
        find_skill_record(pool, mentor.user_id, skill_id, SkillType::Offered).await?;
    let learner_needed =
        find_skill_record(pool, learner.user_id, skill_id, SkillType::Needed).await?;
    let completed_sessions = count_completed_sessions(pool, mentor.user_id, skill_id).await?;
    let rating = fetch_rating_inputs(pool, mentor.user_id).await?;

    Ok(MatchInputs {
        mentor_offered,
        learner_needed,
        learner_campus: learner.campus.clone(),
        mentor_campus: mentor.campus.clone(),
        learner_availability: learner.availability.clone(),
        mentor_availability: mentor.availability.clone(),
        completed_sessions,
        rating,
    })
}

/// All users holding an `offered` record for the skill, minus the learner.
pub async fn fetch_candidates(
    pool: &PgPool,
    skill_id: Uuid,
    exclude_user: Uuid,
) -> anyhow::Result<Vec<UserProfile>> {
    let rows = sqlx::query(
        "SELECT DISTINCT u.id, u.full_name, u.email, u.campus, u.availability \
         FROM peer_matching.users u \
         JOIN peer_matching.user_skills us ON us.user_id = u.id \
         WHERE us.skill_id = $1 AND us.skill_type = 'offered' AND u.id != $2",
    )
    .bind(skill_id)
    .bind(exclude_user)
    .fetch_all(pool)
    .await?;

    let mut candidates = Vec::new();
    for row in rows {
        candidates.push(UserProfile {
            user_id: row.get("id"),
            full_name: row.get("full_name"),
            email: row.get("email"),
            campus: row.get("campus"),
            availability: row.get("availability"),
        });
    }

    Ok(candidates)
}

/// Persist one scored pair for later training-data collection. Callers treat
/// a failure here as non-fatal; scoring output must not depend on it.
pub async fn record_match(
    pool: &PgPool,
    learner_id: Uuid,
    mentor_id: Uuid,
    skill_id: Uuid,
    result: &MatchResult,
) -> anyhow::Result<()> {
    let breakdown = serde_json::to_value(&result.breakdown)
        .context("failed to serialize score breakdown")?;

    sqlx::query(
        r#"
        INSERT INTO peer_matching.match_history
        (id, learner_id, mentor_id, skill_id, total_score, breakdown)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(learner_id)
    .bind(mentor_id)
    .bind(skill_id)
    .bind(result.total_score)
    .bind(breakdown)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn fetch_match_history(pool: &PgPool) -> anyhow::Result<Vec<RecordedMatch>> {
    let rows = sqlx::query(
        "SELECT l.email AS learner_email, m.email AS mentor_email, sk.name AS skill_name, \
                mh.total_score, mh.breakdown, mh.created_at \
         FROM peer_matching.match_history mh \
         JOIN peer_matching.users l ON l.id = mh.learner_id \
         JOIN peer_matching.users m ON m.id = mh.mentor_id \
         JOIN peer_matching.skills sk ON sk.id = mh.skill_id \
         ORDER BY mh.created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    let mut matches = Vec::new();
    for row in rows {
        matches.push(RecordedMatch {
            learner_email: row.get("learner_email"),
            mentor_email: row.get("mentor_email"),
            skill_name: row.get("skill_name"),
            total_score: row.get("total_score"),
            breakdown: row.get("breakdown"),
            created_at: row.get("created_at"),
        });
    }

    Ok(matches)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        campus: Option<String>,
        availability: Option<String>,
        skill: String,
        skill_type: String,
        proficiency_level: i32,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        if row.skill_type != "offered" && row.skill_type != "needed" {
            anyhow::bail!(
                "invalid skill_type \"{}\" for {} (expected offered or needed)",
                row.skill_type,
                row.email
            );
        }
        if !(1..=5).contains(&row.proficiency_level) {
            anyhow::bail!(
                "proficiency_level {} for {} out of range 1-5",
                row.proficiency_level,
                row.email
            );
        }

        let user_id: Uuid = sqlx::query(
            r#"
            INSERT INTO peer_matching.users (id, full_name, email, campus, availability)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                campus = COALESCE(EXCLUDED.campus, peer_matching.users.campus),
                availability = COALESCE(EXCLUDED.availability, peer_matching.users.availability)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.full_name)
        .bind(&row.email)
        .bind(&row.campus)
        .bind(&row.availability)
        .fetch_one(pool)
        .await?
        .get("id");

        let skill_id: Uuid = sqlx::query(
            r#"
            INSERT INTO peer_matching.skills (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.skill)
        .fetch_one(pool)
        .await?
        .get("id");

        let result = sqlx::query(
            r#"
            INSERT INTO peer_matching.user_skills (user_id, skill_id, skill_type, proficiency_level)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, skill_id, skill_type) DO UPDATE
            SET proficiency_level = EXCLUDED.proficiency_level
            "#,
        )
        .bind(user_id)
        .bind(skill_id)
        .bind(&row.skill_type)
        .bind(row.proficiency_level)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
